//! Static Map Renderer
//! Renders a choropleth to an in-memory RGB image with plotters, for PNG export.
//!
//! Layout:
//! 1. Title centered at the top
//! 2. Prefecture polygons filled by the layer's colour scale
//! 3. Colour bar with the range endpoints along the bottom

use crate::charts::geo::PrefectureShapes;
use crate::charts::layer::MapLayer;
use crate::charts::palette::NO_DATA_RGB;
use crate::stats::RiskTable;
use image::RgbImage;
use plotters::prelude::*;
use std::path::Path;
use thiserror::Error;

const LEGEND_HEIGHT: u32 = 60;
const LEGEND_STEPS: u32 = 100;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("No prefecture shapes to draw")]
    NoShapes,
    #[error("Drawing failed: {0}")]
    Draw(String),
    #[error("Image buffer size mismatch")]
    Buffer,
    #[error("Failed to write image: {0}")]
    Image(#[from] image::ImageError),
}

pub struct StaticMapRenderer;

impl StaticMapRenderer {
    /// Render one layer into an RGB image of the requested size.
    pub fn render(
        layer: MapLayer,
        table: &RiskTable,
        shapes: &PrefectureShapes,
        width: u32,
        height: u32,
    ) -> Result<RgbImage, RenderError> {
        let (lon_range, lat_range) = shapes.bounds().ok_or(RenderError::NoShapes)?;
        let range = layer.range(table);
        let scale = layer.scale();

        let mut buffer = vec![0u8; (width * height * 3) as usize];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            root.fill(&WHITE).map_err(draw_err)?;

            let (map_area, legend_area) = root.split_vertically(height.saturating_sub(LEGEND_HEIGHT));
            // Text needs a system font; the map is still drawn without one
            let map_area = match map_area.titled(&layer.title(), ("sans-serif", 24)) {
                Ok(area) => area,
                Err(e) => {
                    tracing::warn!(error = %e, "map title skipped");
                    map_area
                }
            };

            let mut chart = ChartBuilder::on(&map_area)
                .margin(20)
                .build_cartesian_2d(lon_range, lat_range)
                .map_err(draw_err)?;

            for (prefecture, rings) in shapes.iter() {
                let (r, g, b) = match table.get(prefecture) {
                    Some(record) => scale.rgb_at(range.position(layer.value(record))),
                    None => NO_DATA_RGB,
                };
                let fill = RGBColor(r, g, b).filled();
                let border = BLACK.mix(0.4).stroke_width(1);

                for ring in rings {
                    let points: Vec<(f64, f64)> = ring.iter().map(|p| (p[0], p[1])).collect();
                    chart
                        .draw_series(std::iter::once(Polygon::new(points.clone(), fill)))
                        .map_err(draw_err)?;
                    chart
                        .draw_series(std::iter::once(PathElement::new(points, border)))
                        .map_err(draw_err)?;
                }
            }

            // Colour bar
            let bar_left = 80i32;
            let bar_width = width.saturating_sub(160) as i32;
            let step = (bar_width / LEGEND_STEPS as i32).max(1);
            for i in 0..LEGEND_STEPS as i32 {
                let t = i as f64 / (LEGEND_STEPS - 1) as f64;
                let (r, g, b) = scale.rgb_at(t);
                let x = bar_left + i * step;
                legend_area
                    .draw(&Rectangle::new(
                        [(x, 10), (x + step, 30)],
                        RGBColor(r, g, b).filled(),
                    ))
                    .map_err(draw_err)?;
            }
            let label_style = ("sans-serif", 14).into_font().color(&BLACK);
            let labels = [
                (format!("{:.2}", range.min), bar_left),
                (format!("{:.2}", range.max), bar_left + step * LEGEND_STEPS as i32 - 40),
            ];
            for (text, x) in labels {
                if let Err(e) = legend_area.draw_text(&text, &label_style, (x, 36)) {
                    tracing::warn!(error = %e, "legend label skipped");
                }
            }

            root.present().map_err(draw_err)?;
        }

        RgbImage::from_raw(width, height, buffer).ok_or(RenderError::Buffer)
    }

    /// Render one layer and write it as PNG.
    pub fn save_png(
        layer: MapLayer,
        table: &RiskTable,
        shapes: &PrefectureShapes,
        path: &Path,
        width: u32,
        height: u32,
    ) -> Result<(), RenderError> {
        let image = Self::render(layer, table, shapes, width, height)?;
        image.save(path)?;
        tracing::debug!(path = %path.display(), "wrote map image");
        Ok(())
    }
}

fn draw_err(e: impl std::fmt::Display) -> RenderError {
    RenderError::Draw(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineSettings;
    use crate::pipeline::{fixtures, RiskPipeline};

    const SQUARES: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "id": "Tokyo",
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[139.0, 35.0], [140.0, 35.0], [140.0, 36.0], [139.0, 36.0], [139.0, 35.0]]]
                }
            },
            {
                "type": "Feature",
                "id": "Osaka",
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[135.0, 34.0], [136.0, 34.0], [136.0, 35.0], [135.0, 35.0], [135.0, 34.0]]]
                }
            },
            {
                "type": "Feature",
                "id": "Atlantis",
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[130.0, 31.0], [131.0, 31.0], [131.0, 32.0], [130.0, 31.0]]]
                }
            }
        ]
    }"#;

    fn table() -> RiskTable {
        RiskPipeline::run_frames(
            &fixtures::population(),
            &fixtures::disaster(),
            &PipelineSettings::default(),
        )
        .unwrap()
    }

    #[test]
    fn renders_every_layer_at_requested_size() {
        let table = table();
        let shapes = PrefectureShapes::from_geojson(SQUARES).unwrap();

        for layer in MapLayer::all() {
            let image = StaticMapRenderer::render(layer, &table, &shapes, 400, 300).unwrap();
            assert_eq!(image.width(), 400);
            assert_eq!(image.height(), 300);
            // Polygons were filled over the white background
            assert!(image.pixels().any(|p| p.0 != [255, 255, 255]));
        }
    }

    #[test]
    fn save_png_writes_a_readable_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.png");
        let shapes = PrefectureShapes::from_geojson(SQUARES).unwrap();

        StaticMapRenderer::save_png(MapLayer::RiskScore, &table(), &shapes, &path, 320, 240)
            .unwrap();

        let image = image::open(&path).unwrap();
        assert_eq!((image.width(), image.height()), (320, 240));
    }

    #[test]
    fn empty_shapes_cannot_be_rendered() {
        let table = RiskTable::from_records(Vec::new());
        let err = StaticMapRenderer::render(
            MapLayer::RiskScore,
            &table,
            &PrefectureShapes::default(),
            400,
            300,
        )
        .unwrap_err();
        assert!(matches!(err, RenderError::NoShapes));
    }
}
