//! Japan Risk Map Main Application
//! Main window with control panel and map viewer.

use crate::cache::{RiskTableCache, SourceFingerprint};
use crate::charts::PrefectureShapes;
use crate::config::{AppConfig, PipelineSettings, SourceSet};
use crate::export;
use crate::gui::{ControlPanel, ControlPanelAction, MapViewer, SourceKind};
use crate::pipeline::RiskPipeline;
use crate::stats::{MapFeature, RiskTable};
use egui::SidePanel;
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;

/// Pipeline result from background thread
enum LoadResult {
    Progress(f32, String),
    Complete {
        table: Arc<RiskTable>,
        shapes: Arc<PrefectureShapes>,
        sources: SourceSet,
        fingerprint: SourceFingerprint,
    },
    Error(String),
}

/// Main application window.
pub struct RiskMapApp {
    settings: PipelineSettings,
    cache: Arc<RiskTableCache>,
    control_panel: ControlPanel,
    map_viewer: MapViewer,
    current: Option<SourceFingerprint>,

    load_rx: Option<Receiver<LoadResult>>,
    is_loading: bool,
}

impl RiskMapApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        config: AppConfig,
        feature: MapFeature,
    ) -> Self {
        let mut control_panel = ControlPanel::new(config.sources);
        control_panel.feature = feature;
        let mut app = Self {
            settings: config.pipeline,
            cache: Arc::new(RiskTableCache::new()),
            control_panel,
            map_viewer: MapViewer::new(),
            current: None,
            load_rx: None,
            is_loading: false,
        };
        // Default sources are often already in place
        if app.control_panel.sources.disaster_path.exists()
            && app.control_panel.sources.population_path.exists()
        {
            app.start_load();
        }
        app
    }

    fn handle_browse(&mut self, kind: SourceKind) {
        let (name, extensions) = kind.filter();
        if let Some(path) = rfd::FileDialog::new()
            .add_filter(name, extensions)
            .pick_file()
        {
            kind.set_path(&mut self.control_panel.sources, path);
        }
    }

    /// Run the pipeline in a background thread.
    fn start_load(&mut self) {
        if self.is_loading {
            return;
        }

        let sources = self.control_panel.sources.clone();
        let settings = self.settings.clone();
        let cache = Arc::clone(&self.cache);

        let (tx, rx) = channel();
        self.load_rx = Some(rx);
        self.is_loading = true;
        self.map_viewer.clear();
        self.control_panel.clear_rankings();
        self.control_panel.set_progress(5.0, "Loading sources...");

        thread::spawn(move || {
            Self::run_load(tx, cache, sources, settings);
        });
    }

    /// Run the pipeline (called from background thread)
    fn run_load(
        tx: Sender<LoadResult>,
        cache: Arc<RiskTableCache>,
        sources: SourceSet,
        settings: PipelineSettings,
    ) {
        let _ = tx.send(LoadResult::Progress(20.0, "Running pipeline...".to_string()));

        let (fingerprint, table) = match cache.get_or_build(&sources, &settings, RiskPipeline::run_bytes) {
            Ok(built) => built,
            Err(e) => {
                tracing::error!(error = %e, "pipeline failed");
                let _ = tx.send(LoadResult::Error(e.to_string()));
                return;
            }
        };

        let _ = tx.send(LoadResult::Progress(
            70.0,
            "Loading prefecture boundaries...".to_string(),
        ));

        // Maps are optional; the table is still useful without them
        let shapes = match PrefectureShapes::load(&sources.geojson_path) {
            Ok(shapes) => {
                let missing = shapes.missing(&table);
                if !missing.is_empty() {
                    tracing::warn!(?missing, "prefectures without boundaries");
                }
                shapes
            }
            Err(e) => {
                tracing::warn!(error = %e, "boundaries unavailable");
                PrefectureShapes::default()
            }
        };

        let _ = tx.send(LoadResult::Complete {
            table,
            shapes: Arc::new(shapes),
            sources,
            fingerprint,
        });
    }

    /// Check for load results
    fn check_load_results(&mut self) {
        let rx = self.load_rx.take();
        if let Some(rx) = rx {
            let mut should_keep_receiver = true;

            while should_keep_receiver {
                let Some(result) = poll(&rx) else {
                    break;
                };
                match result {
                    LoadResult::Progress(progress, status) => {
                        self.control_panel.set_progress(progress, &status);
                    }
                    LoadResult::Complete {
                        table,
                        shapes,
                        sources,
                        fingerprint,
                    } => {
                        let n = self.settings.ranking_size;
                        self.control_panel
                            .set_rankings(table.top_by_risk(n), table.top_by_population(n));
                        self.control_panel.set_progress(
                            100.0,
                            &format!("Complete! {} prefectures scored", table.len()),
                        );
                        self.map_viewer
                            .set_table(table, shapes, sources, fingerprint.to_string());
                        self.current = Some(fingerprint);
                        self.is_loading = false;
                        should_keep_receiver = false;
                    }
                    LoadResult::Error(error) => {
                        self.control_panel
                            .set_progress(0.0, &format!("Error: {}", error));
                        self.is_loading = false;
                        should_keep_receiver = false;
                    }
                }
            }

            if should_keep_receiver {
                self.load_rx = Some(rx);
            }
        }
    }

    /// Drop the current table from the cache and run the pipeline again.
    fn handle_reload(&mut self) {
        if let Some(fingerprint) = self.current.take() {
            self.cache.invalidate(&fingerprint);
        }
        self.start_load();
    }

    fn handle_clear_cache(&mut self) {
        let dropped = self.cache.len();
        self.cache.clear();
        self.current = None;
        tracing::info!(dropped, "risk table cache cleared");
        self.control_panel
            .set_progress(0.0, &format!("Cache cleared ({} tables)", dropped));
    }

    /// Write CSV, JSON and map images to a chosen folder, then reveal it.
    fn handle_export(&mut self) {
        let Some(table) = self.map_viewer.table().cloned() else {
            self.control_panel.set_progress(0.0, "Nothing to export");
            return;
        };

        let Some(dir) = rfd::FileDialog::new().pick_folder() else {
            return;
        };

        self.control_panel.set_progress(50.0, "Exporting...");
        let shapes = self.map_viewer.shapes().cloned();
        match export::export_all(
            &table,
            shapes.as_deref(),
            self.settings.ranking_size,
            &dir,
        ) {
            Ok(files) => {
                self.control_panel.set_progress(
                    100.0,
                    &format!("Export Complete! {} files written", files.len()),
                );
                if let Err(e) = open::that(&dir) {
                    tracing::warn!(error = %e, "could not open export folder");
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "export failed");
                self.control_panel
                    .set_progress(0.0, &format!("Export Error: {}", e));
            }
        }
    }
}

/// One non-blocking read of the worker channel. A worker that went away
/// without reporting (it panicked) surfaces as an error.
fn poll(rx: &Receiver<LoadResult>) -> Option<LoadResult> {
    match rx.try_recv() {
        Ok(result) => Some(result),
        Err(TryRecvError::Empty) => None,
        Err(TryRecvError::Disconnected) => Some(LoadResult::Error(
            "loader thread stopped unexpectedly".to_string(),
        )),
    }
}

impl eframe::App for RiskMapApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_load_results();

        if self.is_loading {
            ctx.request_repaint();
        }

        SidePanel::left("control_panel")
            .min_width(300.0)
            .max_width(350.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    match self.control_panel.show(ui, self.is_loading) {
                        ControlPanelAction::Browse(kind) => self.handle_browse(kind),
                        ControlPanelAction::Load => self.start_load(),
                        ControlPanelAction::Reload => self.handle_reload(),
                        ControlPanelAction::ClearCache => self.handle_clear_cache(),
                        ControlPanelAction::Export => self.handle_export(),
                        ControlPanelAction::FeatureChanged | ControlPanelAction::None => {}
                    }
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.map_viewer.show(ui, self.control_panel.feature);
        });
    }
}
