//! Summary Statistics Module
//! Descriptive statistics for each derived column of the risk table.

use crate::stats::metrics::DERIVED_COLUMNS;
use crate::stats::table::{RiskTable, HOLISTIC_RISK_SCORE};
use statrs::statistics::{Data, Distribution, Max, Median, Min};

/// Statistics for a single column.
#[derive(Debug, Clone)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl Default for ColumnSummary {
    fn default() -> Self {
        Self {
            column: String::new(),
            count: 0,
            mean: f64::NAN,
            median: f64::NAN,
            std_dev: f64::NAN,
            min: f64::NAN,
            max: f64::NAN,
        }
    }
}

pub struct SummaryCalculator;

impl SummaryCalculator {
    /// Compute descriptive statistics for an array of values.
    pub fn describe(column: &str, values: &[f64]) -> ColumnSummary {
        if values.is_empty() {
            return ColumnSummary {
                column: column.to_string(),
                ..Default::default()
            };
        }

        let data = Data::new(values.to_vec());
        ColumnSummary {
            column: column.to_string(),
            count: values.len(),
            mean: data.mean().unwrap_or(f64::NAN),
            median: data.median(),
            // Sample standard deviation; a single value has no spread
            std_dev: if values.len() > 1 {
                data.std_dev().unwrap_or(f64::NAN)
            } else {
                0.0
            },
            min: data.min(),
            max: data.max(),
        }
    }

    /// Summaries for every derived metric plus the holistic risk score.
    pub fn summarize(table: &RiskTable) -> Vec<ColumnSummary> {
        let mut summaries: Vec<ColumnSummary> = DERIVED_COLUMNS
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let values: Vec<f64> = table
                    .records()
                    .iter()
                    .map(|r| r.metrics.ordered()[i])
                    .collect();
                Self::describe(name, &values)
            })
            .collect();

        let scores: Vec<f64> = table
            .records()
            .iter()
            .map(|r| r.holistic_risk_score)
            .collect();
        summaries.push(Self::describe(HOLISTIC_RISK_SCORE, &scores));

        summaries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describes_values() {
        let summary = SummaryCalculator::describe("x", &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(summary.count, 4);
        assert_eq!(summary.mean, 2.5);
        assert_eq!(summary.median, 2.5);
        assert_eq!(summary.min, 1.0);
        assert_eq!(summary.max, 4.0);
        assert!((summary.std_dev - 1.2909944487358056).abs() < 1e-12);
    }

    #[test]
    fn single_value_has_zero_spread() {
        let summary = SummaryCalculator::describe("x", &[7.0]);
        assert_eq!(summary.std_dev, 0.0);
        assert_eq!(summary.median, 7.0);
    }

    #[test]
    fn empty_column_is_nan() {
        let summary = SummaryCalculator::describe("x", &[]);
        assert_eq!(summary.count, 0);
        assert!(summary.mean.is_nan());
    }

    #[test]
    fn summarizes_every_derived_column_and_score() {
        let table = RiskTable::from_records(Vec::new());
        let summaries = SummaryCalculator::summarize(&table);
        assert_eq!(summaries.len(), DERIVED_COLUMNS.len() + 1);
        assert_eq!(summaries.last().unwrap().column, HOLISTIC_RISK_SCORE);
    }
}
