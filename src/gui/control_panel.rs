//! Control Panel Widget
//! Left side panel with source selection, feature picker, rankings and export.

use crate::charts::{thousands, ChoroplethPlotter};
use crate::config::SourceSet;
use crate::stats::{MapFeature, RankingEntry};
use egui::{Color32, ComboBox, RichText};
use std::path::PathBuf;

/// Which source file a Browse button targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Disaster,
    Population,
    Boundaries,
}

impl SourceKind {
    const ALL: [SourceKind; 3] = [
        SourceKind::Disaster,
        SourceKind::Population,
        SourceKind::Boundaries,
    ];

    fn label(self) -> &'static str {
        match self {
            SourceKind::Disaster => "Disaster Workbook",
            SourceKind::Population => "Population CSV",
            SourceKind::Boundaries => "Prefecture GeoJSON",
        }
    }

    pub fn filter(self) -> (&'static str, &'static [&'static str]) {
        match self {
            SourceKind::Disaster => ("Excel Files", &["xlsx", "xls"]),
            SourceKind::Population => ("CSV Files", &["csv"]),
            SourceKind::Boundaries => ("GeoJSON Files", &["geojson", "json"]),
        }
    }

    fn path(self, sources: &SourceSet) -> &PathBuf {
        match self {
            SourceKind::Disaster => &sources.disaster_path,
            SourceKind::Population => &sources.population_path,
            SourceKind::Boundaries => &sources.geojson_path,
        }
    }

    pub fn set_path(self, sources: &mut SourceSet, path: PathBuf) {
        match self {
            SourceKind::Disaster => sources.disaster_path = path,
            SourceKind::Population => sources.population_path = path,
            SourceKind::Boundaries => sources.geojson_path = path,
        }
    }
}

/// Left side control panel.
pub struct ControlPanel {
    pub sources: SourceSet,
    pub feature: MapFeature,
    pub top_risk: Vec<RankingEntry>,
    pub top_population: Vec<RankingEntry<u64>>,
    pub progress: f32,
    pub status: String,
    pub export_enabled: bool,
}

impl ControlPanel {
    pub fn new(sources: SourceSet) -> Self {
        Self {
            sources,
            feature: MapFeature::default(),
            top_risk: Vec::new(),
            top_population: Vec::new(),
            progress: 0.0,
            status: "Ready".to_string(),
            export_enabled: false,
        }
    }

    pub fn set_rankings(
        &mut self,
        top_risk: Vec<RankingEntry>,
        top_population: Vec<RankingEntry<u64>>,
    ) {
        self.top_risk = top_risk;
        self.top_population = top_population;
        self.export_enabled = !self.top_risk.is_empty();
    }

    pub fn clear_rankings(&mut self) {
        self.set_rankings(Vec::new(), Vec::new());
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui, busy: bool) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("🗾 Japan Risk Map")
                    .size(22.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
            ui.label(
                RichText::new("Holistic Disaster Risk Index")
                    .size(11.0)
                    .color(Color32::GRAY),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Sources =====
        ui.label(RichText::new("📁 Data Sources").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                for kind in SourceKind::ALL {
                    ui.label(RichText::new(kind.label()).size(11.0).color(Color32::GRAY));
                    ui.horizontal(|ui| {
                        let path = kind.path(&self.sources);
                        let name = path
                            .file_name()
                            .map(|n| n.to_string_lossy().to_string())
                            .unwrap_or_else(|| "No file selected".to_string());
                        let color = if path.exists() {
                            Color32::WHITE
                        } else {
                            Color32::from_rgb(220, 53, 69)
                        };
                        ui.label(RichText::new(name).size(12.0).color(color));

                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if ui.small_button("📂 Browse").clicked() {
                                action = ControlPanelAction::Browse(kind);
                            }
                        });
                    });
                    ui.add_space(4.0);
                }
            });

        ui.add_space(8.0);
        ui.vertical_centered(|ui| {
            ui.add_enabled_ui(!busy, |ui| {
                let button = egui::Button::new(RichText::new("▶ Load Data").size(16.0))
                    .min_size(egui::vec2(200.0, 35.0));
                if ui.add(button).clicked() {
                    action = ControlPanelAction::Load;
                }
                ui.horizontal(|ui| {
                    if ui.small_button("🔄 Reload").clicked() {
                        action = ControlPanelAction::Reload;
                    }
                    if ui.small_button("🗑 Clear Cache").clicked() {
                        action = ControlPanelAction::ClearCache;
                    }
                });
            });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Feature =====
        ui.label(RichText::new("🗺 Map Feature").size(14.0).strong());
        ui.add_space(5.0);
        ComboBox::from_id_salt("map_feature")
            .width(220.0)
            .selected_text(self.feature.column_name())
            .show_ui(ui, |ui| {
                for feature in MapFeature::ALL {
                    if ui
                        .selectable_value(&mut self.feature, feature, feature.column_name())
                        .clicked()
                    {
                        action = ControlPanelAction::FeatureChanged;
                    }
                }
            });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Rankings =====
        ui.label(RichText::new("⚠ Top Prefectures At Risk").size(14.0).strong());
        ui.add_space(5.0);
        ChoroplethPlotter::draw_ranking_table(
            ui,
            "top_risk",
            "holistic_risk_score",
            &self.top_risk,
            |v| format!("{:.3}", v),
        );

        ui.add_space(10.0);
        ui.label(RichText::new("👥 Most Populated Prefectures").size(14.0).strong());
        ui.add_space(5.0);
        ChoroplethPlotter::draw_ranking_table(
            ui,
            "top_population",
            "population",
            &self.top_population,
            thousands,
        );

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        ui.vertical_centered(|ui| {
            ui.add_enabled_ui(self.export_enabled && !busy, |ui| {
                let button = egui::Button::new(RichText::new("💾 Export").size(14.0))
                    .min_size(egui::vec2(150.0, 30.0));
                if ui.add(button).clicked() {
                    action = ControlPanelAction::Export;
                }
            });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Progress =====
        ui.label(RichText::new("📊 Progress").size(14.0).strong());
        ui.add_space(5.0);

        ui.add(
            egui::ProgressBar::new(self.progress / 100.0)
                .show_percentage()
                .animate(busy),
        );

        ui.add_space(5.0);

        let status_color = if self.status.contains("Error") {
            Color32::from_rgb(220, 53, 69)
        } else if self.status.contains("Complete") {
            Color32::from_rgb(40, 167, 69)
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));

        action
    }

    /// Set progress and status
    pub fn set_progress(&mut self, progress: f32, status: &str) {
        self.progress = progress;
        self.status = status.to_string();
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    Browse(SourceKind),
    Load,
    /// Rebuild the current table, bypassing the cache.
    Reload,
    ClearCache,
    FeatureChanged,
    Export,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn browse_targets_the_right_source() {
        let mut sources = SourceSet::default();
        SourceKind::Population.set_path(&mut sources, PathBuf::from("/data/pop.csv"));
        SourceKind::Boundaries.set_path(&mut sources, PathBuf::from("/data/jp.geojson"));

        assert_eq!(sources.population_path, PathBuf::from("/data/pop.csv"));
        assert_eq!(sources.geojson_path, PathBuf::from("/data/jp.geojson"));
        assert_eq!(sources.disaster_path, SourceSet::default().disaster_path);
    }

    #[test]
    fn export_enabled_once_rankings_exist() {
        let mut panel = ControlPanel::new(SourceSet::default());
        assert!(!panel.export_enabled);

        let risk = RankingEntry {
            prefecture: "Gifu".to_string(),
            value: 2.5,
        };
        let population = RankingEntry {
            prefecture: "Gifu".to_string(),
            value: 1_978_000u64,
        };
        panel.set_rankings(vec![risk], vec![population]);
        assert!(panel.export_enabled);

        panel.clear_rankings();
        assert!(!panel.export_enabled);
    }
}
