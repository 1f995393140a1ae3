//! GUI module - User interface components

mod app;
mod control_panel;
mod map_viewer;

pub use app::RiskMapApp;
pub use control_panel::{ControlPanel, ControlPanelAction, SourceKind};
pub use map_viewer::MapViewer;
