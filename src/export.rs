//! Export Module
//! Writes the enriched table as CSV and JSON, and every map layer as PNG.

use crate::charts::{MapLayer, PrefectureShapes, RenderError, StaticMapRenderer};
use crate::stats::{PrefectureRecord, RankingEntry, RiskTable};
use polars::prelude::*;
use rayon::prelude::*;
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const TABLE_CSV: &str = "risk_table.csv";
pub const TABLE_JSON: &str = "risk_table.json";
pub const MAP_WIDTH: u32 = 1200;
pub const MAP_HEIGHT: u32 = 800;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to write CSV: {0}")]
    Csv(#[from] PolarsError),
    #[error("Failed to write JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to render map: {0}")]
    Render(#[from] RenderError),
}

/// JSON layout of `risk_table.json`.
#[derive(Serialize)]
struct TableDocument<'a> {
    prefectures: &'a [PrefectureRecord],
    top_by_risk: Vec<RankingEntry>,
    top_by_population: Vec<RankingEntry<u64>>,
}

/// Write the table to `dir/risk_table.csv`.
pub fn write_csv(table: &RiskTable, dir: &Path) -> Result<PathBuf, ExportError> {
    let path = dir.join(TABLE_CSV);
    let mut df = table.to_dataframe()?;
    let mut file = File::create(&path)?;
    CsvWriter::new(&mut file).include_header(true).finish(&mut df)?;
    Ok(path)
}

/// Write the table and both rankings to `dir/risk_table.json`.
pub fn write_json(table: &RiskTable, ranking_size: usize, dir: &Path) -> Result<PathBuf, ExportError> {
    let path = dir.join(TABLE_JSON);
    let document = TableDocument {
        prefectures: table.records(),
        top_by_risk: table.top_by_risk(ranking_size),
        top_by_population: table.top_by_population(ranking_size),
    };
    let file = File::create(&path)?;
    serde_json::to_writer_pretty(file, &document)?;
    Ok(path)
}

/// Render every map layer to PNG in parallel.
pub fn write_maps(
    table: &RiskTable,
    shapes: &PrefectureShapes,
    dir: &Path,
) -> Result<Vec<PathBuf>, ExportError> {
    MapLayer::all()
        .par_iter()
        .map(|layer| {
            let path = dir.join(format!("{}.png", layer.file_stem()));
            StaticMapRenderer::save_png(*layer, table, shapes, &path, MAP_WIDTH, MAP_HEIGHT)?;
            Ok(path)
        })
        .collect()
}

/// Write everything into `dir`, creating it if needed. Maps are skipped
/// when no shapes are available.
pub fn export_all(
    table: &RiskTable,
    shapes: Option<&PrefectureShapes>,
    ranking_size: usize,
    dir: &Path,
) -> Result<Vec<PathBuf>, ExportError> {
    std::fs::create_dir_all(dir)?;

    let mut written = vec![write_csv(table, dir)?, write_json(table, ranking_size, dir)?];
    match shapes {
        Some(shapes) if !shapes.is_empty() => written.extend(write_maps(table, shapes, dir)?),
        _ => tracing::warn!("no prefecture shapes, skipping map images"),
    }

    tracing::info!(dir = %dir.display(), files = written.len(), "export complete");
    Ok(written)
}
