//! Charts module - Choropleth rendering

mod geo;
mod layer;
mod palette;
mod plotter;
mod renderer;

pub use geo::{GeoError, PrefectureShapes};
pub use layer::{thousands, MapLayer};
pub use palette::{ColorRange, ColorScale};
pub use plotter::ChoroplethPlotter;
pub use renderer::{RenderError, StaticMapRenderer};
