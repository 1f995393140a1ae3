//! Map Layers Module
//! What each choropleth colours by, with its scale, range and hover fields.

use crate::charts::palette::{ColorRange, ColorScale};
use crate::stats::{MapFeature, PrefectureRecord, RiskTable};

/// One choropleth map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapLayer {
    Feature(MapFeature),
    RiskScore,
    Population,
}

impl MapLayer {
    /// Every layer the export writes.
    pub fn all() -> Vec<MapLayer> {
        MapFeature::ALL
            .into_iter()
            .map(MapLayer::Feature)
            .chain([MapLayer::RiskScore, MapLayer::Population])
            .collect()
    }

    pub fn title(self) -> String {
        match self {
            MapLayer::Feature(feature) => format!("Map colored by {}", feature.column_name()),
            MapLayer::RiskScore => "Holistic Disaster Risk Index for Japan".to_string(),
            MapLayer::Population => {
                "Japan Prefecture Population and Disaster Impact per Prefecture".to_string()
            }
        }
    }

    /// File name without extension.
    pub fn file_stem(self) -> String {
        match self {
            MapLayer::Feature(feature) => format!("map_{}", feature.column_name()),
            MapLayer::RiskScore => "map_holistic_risk_score".to_string(),
            MapLayer::Population => "map_population".to_string(),
        }
    }

    pub fn scale(self) -> ColorScale {
        match self {
            MapLayer::Feature(_) => ColorScale::Sunset,
            MapLayer::RiskScore => ColorScale::Thermal,
            MapLayer::Population => ColorScale::Viridis,
        }
    }

    pub fn value(self, record: &PrefectureRecord) -> f64 {
        match self {
            MapLayer::Feature(feature) => feature.value(record),
            MapLayer::RiskScore => record.holistic_risk_score,
            MapLayer::Population => record.population as f64,
        }
    }

    /// Colour range: scores start at 1, everything else at 0.
    pub fn range(self, table: &RiskTable) -> ColorRange {
        let min = match self {
            MapLayer::RiskScore => 1.0,
            _ => 0.0,
        };
        ColorRange {
            min,
            max: table.max_of(|r| self.value(r)).max(min),
        }
    }

    /// Tooltip lines for one prefecture.
    pub fn hover_lines(self, record: &PrefectureRecord) -> Vec<String> {
        let c = &record.counts;
        let mut lines = vec![record.prefecture.clone()];
        match self {
            MapLayer::Feature(feature) => {
                lines.push(format!(
                    "{}: {}",
                    feature.column_name(),
                    thousands(feature.value(record) as u64)
                ));
                lines.push(format!("People Affected: {}", thousands(c.people_affected)));
                lines.push(format!(
                    "Households Affected: {}",
                    thousands(c.households_affected)
                ));
            }
            MapLayer::RiskScore => {
                lines.push(format!(
                    "Holistic Risk Score: {:.3}",
                    record.holistic_risk_score
                ));
                lines.push(format!("People Affected: {}", thousands(c.people_affected)));
                lines.push(format!("Killed/Missing: {}", thousands(c.killed_or_missing)));
                lines.push(format!("Injured: {}", thousands(c.injured)));
                lines.push(format!(
                    "Households Affected: {}",
                    thousands(c.households_affected)
                ));
            }
            MapLayer::Population => {
                lines.push(format!("Population: {}", thousands(record.population)));
                lines.push(format!("People Affected: {}", thousands(c.people_affected)));
                lines.push(format!("Killed/Missing: {}", thousands(c.killed_or_missing)));
                lines.push(format!("Injured: {}", thousands(c.injured)));
            }
        }
        lines
    }
}

/// 13515271 -> "13,515,271"
pub fn thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DisasterCounts;
    use crate::stats::metrics::DerivedMetrics;
    use crate::stats::table::RiskComponents;

    fn record(prefecture: &str, population: u64, score: f64) -> PrefectureRecord {
        PrefectureRecord {
            prefecture: prefecture.to_string(),
            year: 2016,
            population,
            estimated_area: 100.0,
            counts: DisasterCounts {
                injured: 12,
                people_affected: 4_500,
                ..Default::default()
            },
            metrics: DerivedMetrics::default(),
            normalized: RiskComponents::default(),
            holistic_risk_score: score,
        }
    }

    #[test]
    fn formats_thousands() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1_000), "1,000");
        assert_eq!(thousands(13_515_271), "13,515,271");
    }

    #[test]
    fn layer_ranges() {
        let table = RiskTable::from_records(vec![
            record("Gifu", 2_000_000, 2.5),
            record("Mie", 1_800_000, 3.25),
        ]);
        assert_eq!(
            MapLayer::RiskScore.range(&table),
            ColorRange { min: 1.0, max: 3.25 }
        );
        assert_eq!(
            MapLayer::Population.range(&table),
            ColorRange { min: 0.0, max: 2_000_000.0 }
        );
        assert_eq!(
            MapLayer::Feature(MapFeature::Landslides).range(&table),
            ColorRange { min: 0.0, max: 0.0 }
        );
    }

    #[test]
    fn every_layer_has_a_distinct_file() {
        let layers = MapLayer::all();
        assert_eq!(layers.len(), 7);
        let mut stems: Vec<String> = layers.iter().map(|l| l.file_stem()).collect();
        stems.sort();
        stems.dedup();
        assert_eq!(stems.len(), 7);
    }

    #[test]
    fn hover_lines_follow_layer() {
        let r = record("Gifu", 2_000_000, 2.5);
        let lines = MapLayer::Population.hover_lines(&r);
        assert_eq!(lines[0], "Gifu");
        assert_eq!(lines[1], "Population: 2,000,000");

        let lines = MapLayer::Feature(MapFeature::Injured).hover_lines(&r);
        assert_eq!(lines[1], "injured: 12");
        assert_eq!(lines[2], "People Affected: 4,500");
    }
}
