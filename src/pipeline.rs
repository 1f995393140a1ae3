//! Risk Pipeline Module
//! Runs load -> clean/join -> derive -> score for one set of sources.

use crate::config::{PipelineSettings, SourceSet};
use crate::data::{DataLoader, DataProcessor, LoaderError, ProcessorError};
use crate::stats::{MetricDeriver, MetricError, RiskScorer, RiskTable};
use polars::prelude::DataFrame;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Data format error: {0}")]
    DataFormat(#[from] LoaderError),
    #[error("Data format error: {0}")]
    Join(#[from] ProcessorError),
    #[error("Arithmetic domain error: {0}")]
    Arithmetic(#[from] MetricError),
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

/// Raw contents of both tabular sources, read once per run so the cache key
/// and the table come from the same bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceBytes {
    pub disaster: Vec<u8>,
    pub population: Vec<u8>,
}

impl SourceBytes {
    pub fn read(sources: &SourceSet) -> Result<Self, PipelineError> {
        Ok(Self {
            disaster: read_source(&sources.disaster_path)?,
            population: read_source(&sources.population_path)?,
        })
    }
}

/// Single-pass, stateless pipeline.
pub struct RiskPipeline;

impl RiskPipeline {
    /// Load both sources from disk and build the scored table.
    pub fn run(sources: &SourceSet, settings: &PipelineSettings) -> Result<RiskTable, PipelineError> {
        Self::run_bytes(&SourceBytes::read(sources)?, settings)
    }

    /// Build the scored table from source contents already in memory.
    pub fn run_bytes(
        bytes: &SourceBytes,
        settings: &PipelineSettings,
    ) -> Result<RiskTable, PipelineError> {
        let span = tracing::info_span!("pipeline", min_year = settings.min_year);
        let _enter = span.enter();

        let loader = DataLoader::new(settings.header_row, settings.population_drop_columns.clone());
        let disaster = loader.disaster_from_bytes(&bytes.disaster)?;
        let population = loader.population_from_bytes(&bytes.population)?;

        Self::run_frames(&population, &disaster, settings)
    }

    /// Build the scored table from already loaded frames.
    pub fn run_frames(
        population: &DataFrame,
        disaster: &DataFrame,
        settings: &PipelineSettings,
    ) -> Result<RiskTable, PipelineError> {
        let population = DataProcessor::prepare_population(population, settings.min_year)?;
        let disaster = DataProcessor::prepare_disaster(disaster)?;
        let joined = DataProcessor::join(&population, &disaster)?;
        let derived = MetricDeriver::derive_all(joined)?;
        Ok(RiskScorer::score(derived))
    }
}

fn read_source(path: &Path) -> Result<Vec<u8>, PipelineError> {
    std::fs::read(path).map_err(|source| PipelineError::Io {
        path: path.display().to_string(),
        source,
    })
}


#[cfg(test)]
mod tests {
    use super::fixtures;
    use super::*;
    use crate::stats::RiskMetric;

    fn run() -> RiskTable {
        RiskPipeline::run_frames(
            &fixtures::population(),
            &fixtures::disaster(),
            &PipelineSettings::default(),
        )
        .unwrap()
    }

    #[test]
    fn produces_one_row_per_prefecture() {
        let table = run();
        assert_eq!(table.len(), 47);
        for name in fixtures::PREFECTURES {
            assert!(table.get(name).is_some(), "{name}");
        }
        assert!(table.records().iter().all(|r| r.year == 2016));
    }

    #[test]
    fn table_invariants_hold() {
        let table = run();
        for record in table.records() {
            assert_eq!(
                record.metrics.total_floods,
                (record.counts.flood_above_floor + record.counts.flood_below_floor) as f64
            );
            assert!((1.0..=8.0).contains(&record.holistic_risk_score));
        }
        for metric in RiskMetric::ALL {
            let values: Vec<f64> = table.records().iter().map(|r| r.normalized.get(metric)).collect();
            assert_eq!(values.iter().cloned().fold(f64::INFINITY, f64::min), 0.0);
            assert_eq!(values.iter().cloned().fold(f64::NEG_INFINITY, f64::max), 1.0);
        }
    }

    #[test]
    fn unmatched_tokyo_is_zero_filled() {
        let table = run();
        let tokyo = table.get("Tokyo").unwrap();
        assert!(tokyo.counts.is_empty());
        assert_eq!(tokyo.metrics.total_floods_per_km2, 0.0);
    }

    #[test]
    fn rankings_are_subsets_of_table() {
        let table = run();
        let top = table.top_by_risk(5);
        assert_eq!(top.len(), 5);
        assert!(top.windows(2).all(|w| w[0].value >= w[1].value));
        assert!(top.iter().all(|e| table.get(&e.prefecture).is_some()));

        let populous = table.top_by_population(5);
        assert_eq!(populous[0].prefecture, "Okinawa");
    }

    #[test]
    fn runs_are_idempotent() {
        assert_eq!(run(), run());
    }

    #[test]
    fn zero_area_aborts_the_run() {
        let mut population = fixtures::population();
        let areas: Vec<f64> = (0..population.height())
            .map(|i| if i == 1 { 0.0 } else { 1_000.0 })
            .collect();
        population
            .with_column(polars::prelude::Column::new("estimated_area".into(), areas))
            .unwrap();

        let err = RiskPipeline::run_frames(
            &population,
            &fixtures::disaster(),
            &PipelineSettings::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Arithmetic(MetricError::ZeroDenominator { ref prefecture, .. })
                if prefecture == "Hokkaido"
        ));
    }

    #[test]
    fn missing_source_file_is_an_io_error() {
        let sources = SourceSet {
            disaster_path: "does/not/exist.xlsx".into(),
            population_path: "does/not/exist.csv".into(),
            geojson_path: "does/not/exist.geojson".into(),
        };
        let err = RiskPipeline::run(&sources, &PipelineSettings::default()).unwrap_err();
        assert!(matches!(err, PipelineError::Io { ref path, .. } if path == "does/not/exist.xlsx"));
    }

    #[test]
    fn corrupt_workbook_is_a_format_error() {
        let bytes = SourceBytes {
            disaster: b"garbage".to_vec(),
            population: b"prefecture,year\nTokyo-to,2016\n".to_vec(),
        };
        let err = RiskPipeline::run_bytes(&bytes, &PipelineSettings::default()).unwrap_err();
        assert!(matches!(err, PipelineError::DataFormat(LoaderError::WorkbookError(_))));
    }
}
