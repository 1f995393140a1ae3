//! Metric Deriver Module
//! Per-area and per-capita disaster rates for a single prefecture.

use crate::data::JoinedPrefecture;
use serde::Serialize;
use thiserror::Error;

pub const PER_100K: f64 = 100_000.0;

/// Derived columns, in the order returned by `DerivedMetrics::ordered`.
pub const DERIVED_COLUMNS: [&str; 8] = [
    "total_floods",
    "total_floods_per_km2",
    "landslides_per_km2",
    "houses_ruined_per_km2",
    "houses_half_ruined_per_km2",
    "persons_affected_per_100k_people",
    "killed_or_missing_per_100k_people",
    "injured_per_100k_people",
];

#[derive(Error, Debug, PartialEq)]
pub enum MetricError {
    #[error("Prefecture '{prefecture}' has zero {denominator}; rates are undefined")]
    ZeroDenominator {
        prefecture: String,
        denominator: &'static str,
    },
}

/// Rates derived from one joined row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DerivedMetrics {
    pub total_floods: f64,
    pub total_floods_per_km2: f64,
    pub landslides_per_km2: f64,
    pub houses_ruined_per_km2: f64,
    pub houses_half_ruined_per_km2: f64,
    pub persons_affected_per_100k_people: f64,
    pub killed_or_missing_per_100k_people: f64,
    pub injured_per_100k_people: f64,
}

impl DerivedMetrics {
    pub fn ordered(&self) -> [f64; 8] {
        [
            self.total_floods,
            self.total_floods_per_km2,
            self.landslides_per_km2,
            self.houses_ruined_per_km2,
            self.houses_half_ruined_per_km2,
            self.persons_affected_per_100k_people,
            self.killed_or_missing_per_100k_people,
            self.injured_per_100k_people,
        ]
    }
}

/// Row-wise derivation. No cross-row state.
pub struct MetricDeriver;

impl MetricDeriver {
    /// Derive all rates for one prefecture.
    ///
    /// Zero area or zero population is rejected rather than producing a
    /// non-finite rate.
    pub fn derive(row: &JoinedPrefecture) -> Result<DerivedMetrics, MetricError> {
        if row.estimated_area <= 0.0 {
            return Err(MetricError::ZeroDenominator {
                prefecture: row.prefecture.clone(),
                denominator: "estimated_area",
            });
        }
        if row.population == 0 {
            return Err(MetricError::ZeroDenominator {
                prefecture: row.prefecture.clone(),
                denominator: "population",
            });
        }

        let counts = &row.counts;
        let area = row.estimated_area;
        let per_capita = |count: u64| count as f64 / row.population as f64 * PER_100K;

        // Summed in f64 so extreme counts cannot overflow
        let total_floods = counts.flood_above_floor as f64 + counts.flood_below_floor as f64;

        Ok(DerivedMetrics {
            total_floods,
            total_floods_per_km2: total_floods / area,
            landslides_per_km2: counts.landslides as f64 / area,
            houses_ruined_per_km2: counts.houses_ruined as f64 / area,
            houses_half_ruined_per_km2: counts.houses_half_ruined as f64 / area,
            persons_affected_per_100k_people: per_capita(counts.people_affected),
            killed_or_missing_per_100k_people: per_capita(counts.killed_or_missing),
            injured_per_100k_people: per_capita(counts.injured),
        })
    }

    /// Derive metrics for every row, failing on the first undefined rate.
    pub fn derive_all(
        rows: Vec<JoinedPrefecture>,
    ) -> Result<Vec<(JoinedPrefecture, DerivedMetrics)>, MetricError> {
        rows.into_iter()
            .map(|row| {
                let metrics = Self::derive(&row)?;
                Ok((row, metrics))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DisasterCounts;

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-9, "{actual} != {expected}");
    }

    fn row(population: u64, area: f64, counts: DisasterCounts) -> JoinedPrefecture {
        JoinedPrefecture {
            prefecture: "Shizuoka".to_string(),
            year: 2016,
            population,
            estimated_area: area,
            counts,
        }
    }

    #[test]
    fn derives_area_and_capita_rates() {
        let counts = DisasterCounts {
            killed_or_missing: 4,
            injured: 20,
            houses_ruined: 50,
            houses_half_ruined: 100,
            flood_above_floor: 300,
            flood_below_floor: 700,
            landslides: 25,
            households_affected: 900,
            people_affected: 2_000,
        };
        let metrics = MetricDeriver::derive(&row(2_000_000, 500.0, counts)).unwrap();

        assert_eq!(metrics.total_floods, 1000.0);
        assert_eq!(metrics.total_floods_per_km2, 2.0);
        assert_eq!(metrics.landslides_per_km2, 0.05);
        assert_eq!(metrics.houses_ruined_per_km2, 0.1);
        assert_eq!(metrics.houses_half_ruined_per_km2, 0.2);
        assert_close(metrics.persons_affected_per_100k_people, 100.0);
        assert_close(metrics.killed_or_missing_per_100k_people, 0.2);
        assert_close(metrics.injured_per_100k_people, 1.0);
    }

    #[test]
    fn total_floods_is_exact_sum() {
        let counts = DisasterCounts {
            flood_above_floor: 12_345,
            flood_below_floor: 67_890,
            ..Default::default()
        };
        let metrics = MetricDeriver::derive(&row(1_000, 10.0, counts)).unwrap();
        assert_eq!(metrics.total_floods, (12_345 + 67_890) as f64);
    }

    #[test]
    fn huge_flood_counts_do_not_overflow() {
        let counts = DisasterCounts {
            flood_above_floor: u64::MAX / 2 + 1,
            flood_below_floor: u64::MAX / 2 + 1,
            ..Default::default()
        };
        let metrics = MetricDeriver::derive(&row(1_000, 10.0, counts)).unwrap();
        assert!(metrics.total_floods.is_finite());
        assert_eq!(metrics.total_floods, 2.0 * (u64::MAX / 2 + 1) as f64);
    }

    #[test]
    fn zero_counts_give_zero_rates() {
        let metrics =
            MetricDeriver::derive(&row(13_000_000, 2194.0, DisasterCounts::default())).unwrap();
        assert_eq!(metrics, DerivedMetrics::default());
    }

    #[test]
    fn zero_area_is_rejected() {
        let err = MetricDeriver::derive(&row(1_000, 0.0, DisasterCounts::default())).unwrap_err();
        assert_eq!(
            err,
            MetricError::ZeroDenominator {
                prefecture: "Shizuoka".to_string(),
                denominator: "estimated_area",
            }
        );
    }

    #[test]
    fn zero_population_is_rejected() {
        let err = MetricDeriver::derive_all(vec![
            row(1_000, 10.0, DisasterCounts::default()),
            row(0, 10.0, DisasterCounts::default()),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            MetricError::ZeroDenominator { denominator: "population", .. }
        ));
    }
}
