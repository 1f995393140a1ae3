//! Choropleth Plotter Module
//! Interactive prefecture maps and tables using egui_plot.

use crate::charts::geo::PrefectureShapes;
use crate::charts::layer::MapLayer;
use crate::charts::palette::{ColorRange, NO_DATA_RGB};
use crate::stats::{ColumnSummary, RankingEntry, RiskTable};
use egui::{Color32, RichText, Stroke};
use egui_plot::{Plot, PlotPoints, Polygon};
use polars::prelude::DataFrame;

const BORDER_COLOR: Color32 = Color32::from_rgb(90, 90, 90);
const LEGEND_STEPS: usize = 40;

/// Draws maps and tables for the dashboard.
pub struct ChoroplethPlotter;

impl ChoroplethPlotter {
    /// Draw one choropleth. Hovering a prefecture shows its tooltip.
    pub fn draw_map(
        ui: &mut egui::Ui,
        layer: MapLayer,
        table: &RiskTable,
        shapes: &PrefectureShapes,
        height: f32,
    ) {
        let range = layer.range(table);
        let scale = layer.scale();

        let response = Plot::new(format!("choropleth_{}", layer.file_stem()))
            .height(height)
            .data_aspect(1.0)
            .show_axes([false, false])
            .show_grid([false, false])
            .show_x(false)
            .show_y(false)
            .allow_scroll(false)
            .show(ui, |plot_ui| {
                for (prefecture, rings) in shapes.iter() {
                    let fill = match table.get(prefecture) {
                        Some(record) => scale.color32(range.position(layer.value(record))),
                        None => Color32::from_rgb(NO_DATA_RGB.0, NO_DATA_RGB.1, NO_DATA_RGB.2),
                    }
                    .gamma_multiply(0.85);

                    for ring in rings {
                        let points: PlotPoints = ring.iter().copied().collect();
                        plot_ui.polygon(
                            Polygon::new(points)
                                .fill_color(fill)
                                .stroke(Stroke::new(0.5, BORDER_COLOR)),
                        );
                    }
                }

                plot_ui
                    .pointer_coordinate()
                    .and_then(|p| shapes.locate(p.x, p.y).map(str::to_string))
            });

        let hovered = response.inner.and_then(|name| table.get(&name));
        if let Some(record) = hovered {
            response
                .response
                .on_hover_text(layer.hover_lines(record).join("\n"));
        }

        Self::draw_legend(ui, layer, range);
    }

    /// Horizontal colour bar with the range endpoints.
    pub fn draw_legend(ui: &mut egui::Ui, layer: MapLayer, range: ColorRange) {
        let scale = layer.scale();
        ui.horizontal(|ui| {
            ui.label(RichText::new(format_value(range.min)).size(11.0));
            let (rect, _) =
                ui.allocate_exact_size(egui::vec2(240.0, 12.0), egui::Sense::hover());
            let step = rect.width() / LEGEND_STEPS as f32;
            for i in 0..LEGEND_STEPS {
                let t = i as f64 / (LEGEND_STEPS - 1) as f64;
                let cell = egui::Rect::from_min_size(
                    rect.min + egui::vec2(step * i as f32, 0.0),
                    egui::vec2(step + 0.5, rect.height()),
                );
                ui.painter().rect_filled(cell, 0.0, scale.color32(t));
            }
            ui.label(RichText::new(format_value(range.max)).size(11.0));
        });
    }

    /// Two-column ranking grid.
    pub fn draw_ranking_table<V: Copy>(
        ui: &mut egui::Ui,
        id: &str,
        value_header: &str,
        entries: &[RankingEntry<V>],
        format: impl Fn(V) -> String,
    ) {
        egui::Grid::new(ui.make_persistent_id(id))
            .striped(true)
            .min_col_width(60.0)
            .spacing([12.0, 4.0])
            .show(ui, |ui| {
                ui.label(RichText::new("#").strong().size(11.0));
                ui.label(RichText::new("prefecture").strong().size(11.0));
                ui.label(RichText::new(value_header).strong().size(11.0));
                ui.end_row();

                for (i, entry) in entries.iter().enumerate() {
                    ui.label(RichText::new(i.to_string()).size(11.0));
                    ui.label(RichText::new(&entry.prefecture).size(11.0));
                    ui.label(RichText::new(format(entry.value)).size(11.0));
                    ui.end_row();
                }
            });
    }

    /// Full cleaned table, one grid row per DataFrame row.
    pub fn draw_data_table(ui: &mut egui::Ui, df: &DataFrame) {
        egui::ScrollArea::both()
            .id_salt("cleaned_data")
            .max_height(400.0)
            .show(ui, |ui| {
                egui::Grid::new(ui.make_persistent_id("cleaned_data_grid"))
                    .striped(true)
                    .spacing([10.0, 3.0])
                    .show(ui, |ui| {
                        for name in df.get_column_names() {
                            ui.label(RichText::new(name.as_str()).strong().size(11.0));
                        }
                        ui.end_row();

                        for i in 0..df.height() {
                            for column in df.get_columns() {
                                let text = column
                                    .get(i)
                                    .map(|v| v.to_string().trim_matches('"').to_string())
                                    .unwrap_or_default();
                                ui.label(RichText::new(text).size(11.0));
                            }
                            ui.end_row();
                        }
                    });
            });
    }

    /// Descriptive statistics per derived column.
    pub fn draw_summary_table(ui: &mut egui::Ui, summaries: &[ColumnSummary]) {
        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                egui::Grid::new(ui.make_persistent_id("summary_table"))
                    .striped(true)
                    .min_col_width(55.0)
                    .spacing([8.0, 4.0])
                    .show(ui, |ui| {
                        for header in ["Column", "N", "Mean", "Median", "Std", "Min", "Max"] {
                            ui.label(RichText::new(header).strong().size(11.0));
                        }
                        ui.end_row();

                        for s in summaries {
                            ui.label(RichText::new(&s.column).size(11.0));
                            ui.label(RichText::new(s.count.to_string()).size(11.0));
                            for value in [s.mean, s.median, s.std_dev, s.min, s.max] {
                                ui.label(RichText::new(format!("{:.3}", value)).size(11.0));
                            }
                            ui.end_row();
                        }
                    });
            });
    }
}

fn format_value(value: f64) -> String {
    if value.abs() >= 1_000.0 {
        crate::charts::layer::thousands(value.round() as u64)
    } else {
        format!("{:.2}", value)
    }
}
