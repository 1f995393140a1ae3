//! Prefecture Shapes Module
//! GeoJSON boundary loading and point lookup for the choropleth maps.

use crate::stats::RiskTable;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::ops::Range;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeoError {
    #[error("Failed to read GeoJSON: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid GeoJSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Closed ring of [lon, lat] points.
pub type Ring = Vec<[f64; 2]>;

#[derive(Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Deserialize)]
struct Feature {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    properties: Option<serde_json::Map<String, Value>>,
    #[serde(default)]
    geometry: Option<Geometry>,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum Geometry {
    Polygon { coordinates: Vec<Vec<Vec<f64>>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Vec<f64>>>> },
    #[serde(other)]
    Unsupported,
}

impl Feature {
    /// Feature id as a prefecture key: top-level `id`, else `properties.id`.
    fn key(&self) -> Option<String> {
        let id = self
            .id
            .as_ref()
            .or_else(|| self.properties.as_ref().and_then(|p| p.get("id")))?;
        match id {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// Outer boundary rings per prefecture id.
#[derive(Debug, Clone, Default)]
pub struct PrefectureShapes {
    shapes: BTreeMap<String, Vec<Ring>>,
}

impl PrefectureShapes {
    pub fn load(path: &Path) -> Result<Self, GeoError> {
        let text = std::fs::read_to_string(path)?;
        let shapes = Self::from_geojson(&text)?;
        tracing::info!(path = %path.display(), prefectures = shapes.len(), "loaded prefecture shapes");
        Ok(shapes)
    }

    pub fn from_geojson(text: &str) -> Result<Self, GeoError> {
        let collection: FeatureCollection = serde_json::from_str(text)?;
        let mut shapes: BTreeMap<String, Vec<Ring>> = BTreeMap::new();

        for feature in collection.features {
            let Some(key) = feature.key() else {
                tracing::warn!("GeoJSON feature without id skipped");
                continue;
            };

            let polygons = match feature.geometry {
                Some(Geometry::Polygon { coordinates }) => vec![coordinates],
                Some(Geometry::MultiPolygon { coordinates }) => coordinates,
                _ => continue,
            };

            // Outer ring only; holes are painted over by neighbours
            let rings = polygons
                .into_iter()
                .filter_map(|polygon| polygon.into_iter().next())
                .map(|ring| {
                    ring.into_iter()
                        .filter(|p| p.len() >= 2)
                        .map(|p| [p[0], p[1]])
                        .collect::<Ring>()
                })
                .filter(|ring| ring.len() >= 3);

            shapes.entry(key).or_default().extend(rings);
        }

        Ok(Self { shapes })
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn get(&self, prefecture: &str) -> Option<&[Ring]> {
        self.shapes.get(prefecture).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Ring])> {
        self.shapes.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Longitude and latitude ranges covering every ring.
    pub fn bounds(&self) -> Option<(Range<f64>, Range<f64>)> {
        let mut points = self.shapes.values().flatten().flatten();
        let first = points.next()?;
        let (mut x0, mut x1, mut y0, mut y1) = (first[0], first[0], first[1], first[1]);
        for p in points {
            x0 = x0.min(p[0]);
            x1 = x1.max(p[0]);
            y0 = y0.min(p[1]);
            y1 = y1.max(p[1]);
        }
        Some((x0..x1, y0..y1))
    }

    /// Prefecture whose boundary contains the point.
    pub fn locate(&self, lon: f64, lat: f64) -> Option<&str> {
        self.shapes
            .iter()
            .find(|(_, rings)| rings.iter().any(|ring| ring_contains(ring, lon, lat)))
            .map(|(name, _)| name.as_str())
    }

    /// Table prefectures with no boundary to draw.
    pub fn missing(&self, table: &RiskTable) -> Vec<String> {
        table
            .records()
            .iter()
            .filter(|r| self.get(&r.prefecture).is_none())
            .map(|r| r.prefecture.clone())
            .collect()
    }
}

/// Even-odd ray casting.
fn ring_contains(ring: &[[f64; 2]], x: f64, y: f64) -> bool {
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let [xi, yi] = ring[i];
        let [xj, yj] = ring[j];
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}
