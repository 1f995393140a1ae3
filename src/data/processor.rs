//! Data Processor Module
//! Cleans the population table, joins it against the disaster statistics and
//! coerces the disaster counts into typed records.

use crate::data::record::{
    DisasterCounts, JoinedPrefecture, DISASTER_COUNT_COLUMNS, ESTIMATED_AREA, JOIN_KEY,
    POPULATION, PREFECTURE, YEAR,
};
use polars::prelude::*;
use std::collections::HashSet;
use thiserror::Error;

/// Administrative-division suffixes removed from population prefecture names.
pub const ADMIN_SUFFIXES: [&str; 3] = ["-ken", "-to", "-fu"];

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("No population rows with year after {min_year}")]
    NoQualifyingRows { min_year: i64 },
    #[error("Prefecture '{prefecture}' appears more than once in the {source_name}")]
    DuplicatePrefecture {
        prefecture: String,
        source_name: &'static str,
    },
    #[error("Invalid {column} for prefecture '{prefecture}'")]
    InvalidValue {
        prefecture: String,
        column: &'static str,
    },
}

/// Strip one administrative suffix from the end of a prefecture name.
///
/// "Tokyo-to" -> "Tokyo", "Osaka-fu" -> "Osaka", "Kanagawa-ken" -> "Kanagawa".
pub fn canonical_prefecture(name: &str) -> &str {
    let name = name.trim();
    ADMIN_SUFFIXES
        .iter()
        .find_map(|suffix| name.strip_suffix(suffix))
        .unwrap_or(name)
}

/// Handles data cleaning and join operations.
pub struct DataProcessor;

impl DataProcessor {
    /// Normalize keys and keep the latest year after `min_year` per prefecture.
    ///
    /// Output columns: [join_key, year, population, estimated_area]
    pub fn prepare_population(raw: &DataFrame, min_year: i64) -> Result<DataFrame, ProcessorError> {
        let keys: Vec<Option<String>> = raw
            .column(PREFECTURE)?
            .cast(&DataType::String)?
            .str()?
            .into_iter()
            .map(|name| name.map(|n| canonical_prefecture(n).to_string()))
            .collect();

        let mut df = raw.clone();
        df.with_column(Column::new(JOIN_KEY.into(), keys))?;

        let df = df
            .lazy()
            .with_columns([
                col(YEAR).cast(DataType::Int64),
                col(POPULATION).cast(DataType::Float64),
                col(ESTIMATED_AREA).cast(DataType::Float64),
            ])
            .filter(col(YEAR).gt(lit(min_year)))
            // Single snapshot per prefecture: its most recent qualifying year
            .filter(col(YEAR).eq(col(YEAR).max().over([col(JOIN_KEY)])))
            .select([col(JOIN_KEY), col(YEAR), col(POPULATION), col(ESTIMATED_AREA)])
            .collect()?;

        if df.height() == 0 {
            return Err(ProcessorError::NoQualifyingRows { min_year });
        }
        Self::ensure_unique_keys(&df, "population table")?;

        tracing::info!(rows = df.height(), min_year, "filtered population table");
        Ok(df)
    }

    /// Trim disaster join keys and reject duplicates.
    pub fn prepare_disaster(raw: &DataFrame) -> Result<DataFrame, ProcessorError> {
        let keys: Vec<Option<String>> = raw
            .column(JOIN_KEY)?
            .str()?
            .into_iter()
            .map(|key| key.map(|k| k.trim().to_string()))
            .collect();

        let mut df = raw.clone();
        df.with_column(Column::new(JOIN_KEY.into(), keys))?;
        Self::ensure_unique_keys(&df, "disaster table")?;
        Ok(df)
    }

    /// Left join population onto disaster statistics, coercing and zero-filling counts.
    pub fn join(
        population: &DataFrame,
        disaster: &DataFrame,
    ) -> Result<Vec<JoinedPrefecture>, ProcessorError> {
        let disaster_keys: HashSet<String> = string_values(disaster, JOIN_KEY)?
            .into_iter()
            .flatten()
            .collect();
        let unmatched: Vec<String> = string_values(population, JOIN_KEY)?
            .into_iter()
            .flatten()
            .filter(|key| !disaster_keys.contains(key))
            .collect();
        for prefecture in &unmatched {
            tracing::debug!(%prefecture, "no disaster row, counts default to zero");
        }

        let fill: Vec<Expr> = DISASTER_COUNT_COLUMNS
            .iter()
            .map(|name| col(*name).cast(DataType::Float64).fill_null(lit(0.0)))
            .collect();

        let joined = population
            .clone()
            .lazy()
            .left_join(disaster.clone().lazy(), col(JOIN_KEY), col(JOIN_KEY))
            .with_columns(fill)
            .collect()?;

        let records = Self::into_records(&joined)?;

        tracing::info!(
            rows = records.len(),
            unmatched = unmatched.len(),
            "joined population and disaster tables"
        );
        Ok(records)
    }

    /// Convert the joined frame into typed rows.
    fn into_records(joined: &DataFrame) -> Result<Vec<JoinedPrefecture>, ProcessorError> {
        let keys = string_values(joined, JOIN_KEY)?;
        let years: Vec<Option<i64>> = joined
            .column(YEAR)?
            .cast(&DataType::Int64)?
            .i64()?
            .into_iter()
            .collect();
        let populations = f64_values(joined, POPULATION)?;
        let areas = f64_values(joined, ESTIMATED_AREA)?;
        let counts = DISASTER_COUNT_COLUMNS
            .iter()
            .map(|name| f64_values(joined, name))
            .collect::<Result<Vec<_>, _>>()?;

        let mut records = Vec::with_capacity(joined.height());

        for i in 0..joined.height() {
            let Some(prefecture) = keys[i].clone() else {
                return Err(ProcessorError::InvalidValue {
                    prefecture: String::new(),
                    column: PREFECTURE,
                });
            };

            let invalid = |column: &'static str| ProcessorError::InvalidValue {
                prefecture: prefecture.clone(),
                column,
            };

            let year = years[i].ok_or_else(|| invalid(YEAR))?;
            let population = match populations[i] {
                Some(p) if p.is_finite() && p >= 0.0 => p.round() as u64,
                _ => return Err(invalid(POPULATION)),
            };
            let estimated_area = match areas[i] {
                Some(a) if a.is_finite() && a >= 0.0 => a,
                _ => return Err(invalid(ESTIMATED_AREA)),
            };

            let mut ordered = [0u64; 9];
            for (slot, column) in ordered.iter_mut().zip(&counts) {
                *slot = coerce_count(column[i]);
            }

            records.push(JoinedPrefecture {
                prefecture,
                year,
                population,
                estimated_area,
                counts: DisasterCounts::from_ordered(ordered),
            });
        }

        Ok(records)
    }

    fn ensure_unique_keys(df: &DataFrame, source_name: &'static str) -> Result<(), ProcessorError> {
        let mut seen = HashSet::new();
        for key in string_values(df, JOIN_KEY)?.into_iter().flatten() {
            if !seen.insert(key.clone()) {
                return Err(ProcessorError::DuplicatePrefecture {
                    prefecture: key,
                    source_name,
                });
            }
        }
        Ok(())
    }
}

/// Missing, negative and non-finite counts become zero.
fn coerce_count(value: Option<f64>) -> u64 {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => v.round() as u64,
        _ => 0,
    }
}

fn string_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>, ProcessorError> {
    Ok(df
        .column(name)?
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

fn f64_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>, ProcessorError> {
    let column = df.column(name)?.cast(&DataType::Float64)?;
    Ok(column.f64()?.into_iter().collect())
}
