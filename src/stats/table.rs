//! Risk Table Module
//! The enriched, scored table and its ranking projections.

use crate::data::record::{
    DISASTER_COUNT_COLUMNS, ESTIMATED_AREA, HOUSES_HALF_RUINED, HOUSES_RUINED, INJURED,
    LANDSLIDES, POPULATION, PREFECTURE, YEAR,
};
use crate::data::DisasterCounts;
use crate::stats::metrics::{DerivedMetrics, DERIVED_COLUMNS};
use crate::stats::scorer::RiskMetric;
use polars::prelude::*;
use serde::Serialize;
use std::cmp::Ordering;

pub const HOLISTIC_RISK_SCORE: &str = "holistic_risk_score";

/// Normalized risk inputs in `RiskMetric::ALL` order, each in [0, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RiskComponents(pub [f64; 7]);

impl RiskComponents {
    pub fn get(&self, metric: RiskMetric) -> f64 {
        self.0[metric.index()]
    }

    pub fn sum(&self) -> f64 {
        self.0.iter().sum()
    }
}

/// One fully enriched prefecture row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrefectureRecord {
    pub prefecture: String,
    pub year: i64,
    pub population: u64,
    pub estimated_area: f64,
    #[serde(flatten)]
    pub counts: DisasterCounts,
    #[serde(flatten)]
    pub metrics: DerivedMetrics,
    pub normalized: RiskComponents,
    pub holistic_risk_score: f64,
}

/// Minimal ranking projection. Scores rank as `f64`, head counts as `u64`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankingEntry<V = f64> {
    pub prefecture: String,
    pub value: V,
}

/// Raw columns a map can be coloured by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum MapFeature {
    #[default]
    TotalFloods,
    Injured,
    HousesRuined,
    HousesHalfRuined,
    Landslides,
}

impl MapFeature {
    pub const ALL: [MapFeature; 5] = [
        MapFeature::TotalFloods,
        MapFeature::Injured,
        MapFeature::HousesRuined,
        MapFeature::HousesHalfRuined,
        MapFeature::Landslides,
    ];

    pub fn column_name(self) -> &'static str {
        match self {
            MapFeature::TotalFloods => "total_floods",
            MapFeature::Injured => INJURED,
            MapFeature::HousesRuined => HOUSES_RUINED,
            MapFeature::HousesHalfRuined => HOUSES_HALF_RUINED,
            MapFeature::Landslides => LANDSLIDES,
        }
    }

    /// Parse a selector value such as "houses_ruined".
    pub fn from_column_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.column_name() == name)
    }

    pub fn value(self, record: &PrefectureRecord) -> f64 {
        match self {
            MapFeature::TotalFloods => record.metrics.total_floods,
            MapFeature::Injured => record.counts.injured as f64,
            MapFeature::HousesRuined => record.counts.houses_ruined as f64,
            MapFeature::HousesHalfRuined => record.counts.houses_half_ruined as f64,
            MapFeature::Landslides => record.counts.landslides as f64,
        }
    }
}

/// Immutable enriched table, sorted by population descending.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskTable {
    records: Vec<PrefectureRecord>,
}

impl RiskTable {
    pub fn from_records(mut records: Vec<PrefectureRecord>) -> Self {
        records.sort_by(|a, b| {
            b.population
                .cmp(&a.population)
                .then_with(|| a.prefecture.cmp(&b.prefecture))
        });
        Self { records }
    }

    pub fn records(&self) -> &[PrefectureRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, prefecture: &str) -> Option<&PrefectureRecord> {
        self.records.iter().find(|r| r.prefecture == prefecture)
    }

    /// Top `n` prefectures by holistic risk score.
    pub fn top_by_risk(&self, n: usize) -> Vec<RankingEntry> {
        self.top_by(n, |r| r.holistic_risk_score)
    }

    /// Top `n` prefectures by population.
    pub fn top_by_population(&self, n: usize) -> Vec<RankingEntry<u64>> {
        self.top_by(n, |r| r.population)
    }

    fn top_by<V: PartialOrd>(
        &self,
        n: usize,
        key: impl Fn(&PrefectureRecord) -> V,
    ) -> Vec<RankingEntry<V>> {
        let mut ranked: Vec<&PrefectureRecord> = self.records.iter().collect();
        // Stable: ties keep population order
        ranked.sort_by(|a, b| key(b).partial_cmp(&key(a)).unwrap_or(Ordering::Equal));
        ranked
            .into_iter()
            .take(n)
            .map(|r| RankingEntry {
                prefecture: r.prefecture.clone(),
                value: key(r),
            })
            .collect()
    }

    /// Largest value of a feature, 0 for an empty table.
    pub fn max_of(&self, value: impl Fn(&PrefectureRecord) -> f64) -> f64 {
        self.records.iter().map(value).fold(0.0, f64::max)
    }

    /// Convert to a DataFrame for display and CSV export.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let r = &self.records;

        let mut columns = vec![
            Column::new(
                PREFECTURE.into(),
                r.iter().map(|x| x.prefecture.clone()).collect::<Vec<_>>(),
            ),
            Column::new(YEAR.into(), r.iter().map(|x| x.year).collect::<Vec<_>>()),
            Column::new(
                POPULATION.into(),
                r.iter().map(|x| x.population).collect::<Vec<_>>(),
            ),
            Column::new(
                ESTIMATED_AREA.into(),
                r.iter().map(|x| x.estimated_area).collect::<Vec<_>>(),
            ),
        ];

        for (i, name) in DISASTER_COUNT_COLUMNS.iter().enumerate() {
            let values: Vec<u64> = r.iter().map(|x| x.counts.ordered()[i]).collect();
            columns.push(Column::new((*name).into(), values));
        }

        for (i, name) in DERIVED_COLUMNS.iter().enumerate() {
            let values: Vec<f64> = r.iter().map(|x| x.metrics.ordered()[i]).collect();
            columns.push(Column::new((*name).into(), values));
        }

        for metric in RiskMetric::ALL {
            let values: Vec<f64> = r.iter().map(|x| x.normalized.get(metric)).collect();
            let name = format!("{}_normalized", metric.column_name());
            columns.push(Column::new(name.into(), values));
        }

        columns.push(Column::new(
            HOLISTIC_RISK_SCORE.into(),
            r.iter().map(|x| x.holistic_risk_score).collect::<Vec<_>>(),
        ));

        DataFrame::new(columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(prefecture: &str, population: u64, score: f64) -> PrefectureRecord {
        PrefectureRecord {
            prefecture: prefecture.to_string(),
            year: 2016,
            population,
            estimated_area: 1_000.0,
            counts: DisasterCounts {
                injured: population / 1_000,
                flood_above_floor: 3,
                flood_below_floor: 4,
                ..Default::default()
            },
            metrics: DerivedMetrics {
                total_floods: 7.0,
                ..Default::default()
            },
            normalized: RiskComponents::default(),
            holistic_risk_score: score,
        }
    }

    fn table() -> RiskTable {
        RiskTable::from_records(vec![
            record("Saga", 800_000, 3.5),
            record("Tokyo", 13_000_000, 1.2),
            record("Kumamoto", 1_700_000, 5.0),
            record("Osaka", 8_800_000, 2.0),
            record("Nagasaki", 1_300_000, 3.5),
            record("Oita", 1_100_000, 4.1),
            record("Fukuoka", 5_100_000, 2.9),
        ])
    }

    #[test]
    fn sorted_by_population_descending() {
        let table = table();
        let populations: Vec<u64> = table.records().iter().map(|r| r.population).collect();
        let mut expected = populations.clone();
        expected.sort_by(|a, b| b.cmp(a));
        assert_eq!(populations, expected);
        assert_eq!(table.records()[0].prefecture, "Tokyo");
    }

    #[test]
    fn top_five_by_risk_is_descending() {
        let top = table().top_by_risk(5);
        let names: Vec<&str> = top.iter().map(|e| e.prefecture.as_str()).collect();
        // Nagasaki and Saga tie; population order breaks the tie
        assert_eq!(names, vec!["Kumamoto", "Oita", "Nagasaki", "Saga", "Fukuoka"]);
        assert!(top.windows(2).all(|w| w[0].value >= w[1].value));
    }

    #[test]
    fn top_five_by_population() {
        let top = table().top_by_population(5);
        assert_eq!(top.len(), 5);
        assert_eq!(top[0].prefecture, "Tokyo");
        assert_eq!(top[0].value, 13_000_000u64);
        assert_eq!(top[4].prefecture, "Nagasaki");
    }

    #[test]
    fn ranking_of_small_table_is_shorter() {
        let table = RiskTable::from_records(vec![record("Tottori", 550_000, 2.0)]);
        assert_eq!(table.top_by_risk(5).len(), 1);
        assert!(RiskTable::from_records(Vec::new()).top_by_population(5).is_empty());
    }

    #[test]
    fn map_features_read_raw_columns() {
        let table = table();
        let tokyo = table.get("Tokyo").unwrap();
        assert_eq!(MapFeature::TotalFloods.value(tokyo), 7.0);
        assert_eq!(MapFeature::Injured.value(tokyo), 13_000.0);
        assert_eq!(MapFeature::Landslides.value(tokyo), 0.0);
        assert_eq!(table.max_of(|r| MapFeature::Injured.value(r)), 13_000.0);

        for feature in MapFeature::ALL {
            assert_eq!(MapFeature::from_column_name(feature.column_name()), Some(feature));
        }
        assert_eq!(MapFeature::from_column_name("population"), None);
    }

    #[test]
    fn dataframe_has_every_column() {
        let df = table().to_dataframe().unwrap();
        assert_eq!(df.height(), 7);
        // 4 base + 9 counts + 8 derived + 7 normalized + score
        assert_eq!(df.width(), 29);
        let first = df.column(PREFECTURE).unwrap().str().unwrap().get(0);
        assert_eq!(first, Some("Tokyo"));
    }
}
