//! Risk Scorer Module
//! Min-max normalizes the seven rate columns across the whole table and sums
//! them into the holistic risk score.

use crate::data::JoinedPrefecture;
use crate::stats::metrics::DerivedMetrics;
use crate::stats::table::{PrefectureRecord, RiskComponents, RiskTable};
use serde::Serialize;
use statrs::statistics::{Data, Max, Min};

/// Rate columns feeding the holistic risk score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RiskMetric {
    TotalFloodsPerKm2,
    LandslidesPerKm2,
    HousesRuinedPerKm2,
    HousesHalfRuinedPerKm2,
    PersonsAffectedPer100k,
    KilledOrMissingPer100k,
    InjuredPer100k,
}

impl RiskMetric {
    pub const ALL: [RiskMetric; 7] = [
        RiskMetric::TotalFloodsPerKm2,
        RiskMetric::LandslidesPerKm2,
        RiskMetric::HousesRuinedPerKm2,
        RiskMetric::HousesHalfRuinedPerKm2,
        RiskMetric::PersonsAffectedPer100k,
        RiskMetric::KilledOrMissingPer100k,
        RiskMetric::InjuredPer100k,
    ];

    pub fn column_name(self) -> &'static str {
        match self {
            RiskMetric::TotalFloodsPerKm2 => "total_floods_per_km2",
            RiskMetric::LandslidesPerKm2 => "landslides_per_km2",
            RiskMetric::HousesRuinedPerKm2 => "houses_ruined_per_km2",
            RiskMetric::HousesHalfRuinedPerKm2 => "houses_half_ruined_per_km2",
            RiskMetric::PersonsAffectedPer100k => "persons_affected_per_100k_people",
            RiskMetric::KilledOrMissingPer100k => "killed_or_missing_per_100k_people",
            RiskMetric::InjuredPer100k => "injured_per_100k_people",
        }
    }

    /// Position in `RiskMetric::ALL` and in `RiskComponents`.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn value(self, metrics: &DerivedMetrics) -> f64 {
        match self {
            RiskMetric::TotalFloodsPerKm2 => metrics.total_floods_per_km2,
            RiskMetric::LandslidesPerKm2 => metrics.landslides_per_km2,
            RiskMetric::HousesRuinedPerKm2 => metrics.houses_ruined_per_km2,
            RiskMetric::HousesHalfRuinedPerKm2 => metrics.houses_half_ruined_per_km2,
            RiskMetric::PersonsAffectedPer100k => metrics.persons_affected_per_100k_people,
            RiskMetric::KilledOrMissingPer100k => metrics.killed_or_missing_per_100k_people,
            RiskMetric::InjuredPer100k => metrics.injured_per_100k_people,
        }
    }
}

/// Column minimum and maximum across the full table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnExtrema {
    pub min: f64,
    pub max: f64,
}

impl ColumnExtrema {
    /// Extrema of a column, `None` for an empty column.
    pub fn of(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let data = Data::new(values.to_vec());
        Some(Self {
            min: data.min(),
            max: data.max(),
        })
    }

    /// Rescale into [0, 1]. A zero-variance column maps to 0.
    pub fn normalize(&self, value: f64) -> f64 {
        let span = self.max - self.min;
        if span > 0.0 {
            ((value - self.min) / span).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.max <= self.min
    }
}

/// Whole-table scoring: collect extrema, then map every row.
pub struct RiskScorer;

impl RiskScorer {
    /// First pass: per-column extrema in `RiskMetric::ALL` order.
    pub fn extrema(rows: &[(JoinedPrefecture, DerivedMetrics)]) -> Option<[ColumnExtrema; 7]> {
        let mut extrema = [ColumnExtrema { min: 0.0, max: 0.0 }; 7];
        for metric in RiskMetric::ALL {
            let values: Vec<f64> = rows.iter().map(|(_, m)| metric.value(m)).collect();
            extrema[metric.index()] = ColumnExtrema::of(&values)?;
        }
        Some(extrema)
    }

    /// Normalize one row against precomputed extrema.
    pub fn components(metrics: &DerivedMetrics, extrema: &[ColumnExtrema; 7]) -> RiskComponents {
        let mut values = [0.0; 7];
        for metric in RiskMetric::ALL {
            values[metric.index()] = extrema[metric.index()].normalize(metric.value(metrics));
        }
        RiskComponents(values)
    }

    /// Score every row and build the table, sorted by population descending.
    pub fn score(rows: Vec<(JoinedPrefecture, DerivedMetrics)>) -> RiskTable {
        let Some(extrema) = Self::extrema(&rows) else {
            return RiskTable::from_records(Vec::new());
        };

        for metric in RiskMetric::ALL {
            let column = extrema[metric.index()];
            if column.is_degenerate() {
                tracing::debug!(
                    column = metric.column_name(),
                    value = column.min,
                    "zero-variance column normalizes to 0"
                );
            }
        }

        let records: Vec<PrefectureRecord> = rows
            .into_iter()
            .map(|(row, metrics)| {
                let normalized = Self::components(&metrics, &extrema);
                let holistic_risk_score = 1.0 + normalized.sum();
                PrefectureRecord {
                    prefecture: row.prefecture,
                    year: row.year,
                    population: row.population,
                    estimated_area: row.estimated_area,
                    counts: row.counts,
                    metrics,
                    normalized,
                    holistic_risk_score,
                }
            })
            .collect();

        tracing::info!(rows = records.len(), "scored prefectures");
        RiskTable::from_records(records)
    }
}
