//! Map Viewer Widget
//! Central scrollable panel: three choropleth cards, then the cleaned data,
//! summary statistics and sources.

use crate::charts::{ChoroplethPlotter, MapLayer, PrefectureShapes};
use crate::config::SourceSet;
use crate::stats::{ColumnSummary, MapFeature, RiskTable, SummaryCalculator};
use egui::{Color32, RichText, ScrollArea};
use polars::prelude::DataFrame;
use std::sync::Arc;

const CARD_SPACING: f32 = 15.0;
const MAP_HEIGHT: f32 = 420.0;
const CARD_WIDTH: f32 = 620.0;

/// Everything one finished load produced.
struct LoadedView {
    table: Arc<RiskTable>,
    shapes: Arc<PrefectureShapes>,
    frame: Option<DataFrame>,
    summaries: Vec<ColumnSummary>,
    sources: SourceSet,
    fingerprint: String,
}

#[derive(Default)]
pub struct MapViewer {
    view: Option<LoadedView>,
}

impl MapViewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.view = None;
    }

    pub fn table(&self) -> Option<&Arc<RiskTable>> {
        self.view.as_ref().map(|v| &v.table)
    }

    pub fn shapes(&self) -> Option<&Arc<PrefectureShapes>> {
        self.view.as_ref().map(|v| &v.shapes)
    }

    /// Install a finished table. The display frame and summaries are built
    /// once here rather than every repaint.
    pub fn set_table(
        &mut self,
        table: Arc<RiskTable>,
        shapes: Arc<PrefectureShapes>,
        sources: SourceSet,
        fingerprint: String,
    ) {
        let frame = match table.to_dataframe() {
            Ok(df) => Some(df),
            Err(e) => {
                tracing::warn!(error = %e, "could not build display frame");
                None
            }
        };
        let summaries = SummaryCalculator::summarize(&table);
        self.view = Some(LoadedView {
            table,
            shapes,
            frame,
            summaries,
            sources,
            fingerprint,
        });
    }

    pub fn show(&self, ui: &mut egui::Ui, feature: MapFeature) {
        let Some(view) = &self.view else {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("No Data").size(20.0));
            });
            return;
        };

        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                if view.shapes.is_empty() {
                    ui.label(
                        RichText::new("⚠ No prefecture boundaries loaded, maps unavailable")
                            .color(Color32::from_rgb(220, 53, 69)),
                    );
                } else {
                    ui.horizontal_wrapped(|ui| {
                        for layer in [
                            MapLayer::Feature(feature),
                            MapLayer::RiskScore,
                            MapLayer::Population,
                        ] {
                            Self::draw_map_card(ui, layer, &view.table, &view.shapes);
                            ui.add_space(CARD_SPACING);
                        }
                    });
                }

                ui.add_space(CARD_SPACING);
                ui.label(RichText::new("Cleaned Data").size(18.0).strong());
                ui.add_space(5.0);
                match &view.frame {
                    Some(df) => ChoroplethPlotter::draw_data_table(ui, df),
                    None => {
                        ui.label("Table unavailable");
                    }
                }

                ui.add_space(CARD_SPACING);
                ui.label(RichText::new("Summary").size(18.0).strong());
                ui.add_space(5.0);
                ChoroplethPlotter::draw_summary_table(ui, &view.summaries);

                ui.add_space(CARD_SPACING);
                ui.label(RichText::new("Sources").size(18.0).strong());
                ui.add_space(5.0);
                for path in [
                    &view.sources.disaster_path,
                    &view.sources.population_path,
                    &view.sources.geojson_path,
                ] {
                    ui.label(RichText::new(path.display().to_string()).size(11.0));
                }
                ui.label(
                    RichText::new(format!("fingerprint {}", view.fingerprint))
                        .size(10.0)
                        .color(Color32::GRAY),
                );
            });
    }

    fn draw_map_card(
        ui: &mut egui::Ui,
        layer: MapLayer,
        table: &RiskTable,
        shapes: &PrefectureShapes,
    ) {
        egui::Frame::none()
            .rounding(8.0)
            .stroke(egui::Stroke::new(1.0, Color32::from_rgb(100, 149, 237)))
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .inner_margin(12.0)
            .show(ui, |ui| {
                ui.set_width(CARD_WIDTH);
                ui.vertical(|ui| {
                    ui.label(RichText::new(layer.title()).size(16.0).strong());
                    ui.add_space(8.0);
                    ChoroplethPlotter::draw_map(ui, layer, table, shapes, MAP_HEIGHT);
                });
            });
    }
}
