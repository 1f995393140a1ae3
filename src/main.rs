//! Japan Risk Map - Prefecture Disaster Risk Dashboard
//!
//! Joins prefecture disaster statistics with population data, scores each
//! prefecture and shows the result as interactive choropleth maps.

mod cache;
mod charts;
mod config;
mod data;
mod export;
mod gui;
mod logging;
mod pipeline;
mod stats;

use anyhow::{Context, Result};
use charts::PrefectureShapes;
use clap::Parser;
use config::AppConfig;
use eframe::egui;
use gui::RiskMapApp;
use pipeline::RiskPipeline;
use stats::MapFeature;
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(
    name = "japan_risk_map",
    about = "Holistic disaster risk index for Japanese prefectures"
)]
struct Cli {
    /// JSON config file with source paths and pipeline settings
    #[arg(long, env = "RISK_MAP_CONFIG")]
    config: Option<PathBuf>,

    /// Run headless and write CSV, JSON and map images into this directory
    #[arg(long)]
    export: Option<PathBuf>,

    /// Feature shown on the first dashboard map
    #[arg(long, default_value = "total_floods", value_parser = parse_feature)]
    feature: MapFeature,
}

fn parse_feature(name: &str) -> Result<MapFeature, String> {
    MapFeature::from_column_name(name).ok_or_else(|| {
        let valid: Vec<&str> = MapFeature::ALL.iter().map(|f| f.column_name()).collect();
        format!("unknown feature '{}', expected one of {}", name, valid.join(", "))
    })
}

fn main() -> Result<()> {
    logging::init_tracing();
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;

    match cli.export {
        Some(dir) => run_headless(&config, &dir),
        None => run_gui(config, cli.feature),
    }
}

fn run_headless(config: &AppConfig, dir: &Path) -> Result<()> {
    let table = RiskPipeline::run(&config.sources, &config.pipeline)
        .context("Risk pipeline failed")?;

    let shapes = match PrefectureShapes::load(&config.sources.geojson_path) {
        Ok(shapes) => Some(shapes),
        Err(e) => {
            tracing::warn!(error = %e, "boundaries unavailable, exporting tables only");
            None
        }
    };

    let files = export::export_all(&table, shapes.as_ref(), config.pipeline.ranking_size, dir)
        .with_context(|| format!("Failed to export into {}", dir.display()))?;
    for file in files {
        println!("{}", file.display());
    }
    Ok(())
}

fn run_gui(config: AppConfig, feature: MapFeature) -> Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([1200.0, 700.0])
            .with_title("Japan Risk Map"),
        ..Default::default()
    };

    eframe::run_native(
        "Japan Risk Map",
        options,
        Box::new(move |cc| Ok(Box::new(RiskMapApp::new(cc, config, feature)))),
    )
    .map_err(|e| anyhow::anyhow!("GUI failed: {e}"))
}
