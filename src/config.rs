//! Configuration Module
//! Source paths and pipeline settings, loaded from an optional JSON file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Looked up in the working directory when no config path is given.
pub const DEFAULT_CONFIG_FILE: &str = "risk_map.json";

/// Input files for one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSet {
    pub disaster_path: PathBuf,
    pub population_path: PathBuf,
    /// Prefecture boundaries, used for map rendering only.
    pub geojson_path: PathBuf,
}

impl Default for SourceSet {
    fn default() -> Self {
        Self {
            disaster_path: PathBuf::from("flood.xlsx"),
            population_path: PathBuf::from("Japan_population_data.csv"),
            geojson_path: PathBuf::from("japan_prefectures.geojson"),
        }
    }
}

/// Settings that change the pipeline output. Part of the cache key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Zero-based sheet row of the disaster headers.
    pub header_row: usize,
    /// Population rows must have `year > min_year`.
    pub min_year: i64,
    /// Zero-based positions of unused population columns.
    pub population_drop_columns: Vec<usize>,
    pub ranking_size: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            header_row: 7,
            min_year: 2015,
            population_drop_columns: vec![3, 4],
            ranking_size: 5,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub sources: SourceSet,
    pub pipeline: PipelineSettings,
}

impl AppConfig {
    /// Load from `path`, else `risk_map.json` if present, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.exists() {
                    Self::from_file(fallback)
                } else {
                    tracing::debug!("no config file, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("invalid config {}", path.display()))?;
        tracing::info!(path = %path.display(), "loaded config");
        Ok(config)
    }
}
