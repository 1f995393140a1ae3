//! Record Types Module
//! Column names shared by the loader and processor, plus the typed rows
//! produced by the join.

use serde::Serialize;

pub const JOIN_KEY: &str = "join_key";
pub const PREFECTURE: &str = "prefecture";
pub const YEAR: &str = "year";
pub const POPULATION: &str = "population";
pub const ESTIMATED_AREA: &str = "estimated_area";

pub const KILLED_OR_MISSING: &str = "killed_or_missing";
pub const INJURED: &str = "injured";
pub const HOUSES_RUINED: &str = "houses_ruined";
pub const HOUSES_HALF_RUINED: &str = "houses_half_ruined";
pub const FLOOD_ABOVE_FLOOR: &str = "flood_above_floor";
pub const FLOOD_BELOW_FLOOR: &str = "flood_below_floor";
pub const LANDSLIDES: &str = "landslides";
pub const HOUSEHOLDS_AFFECTED: &str = "households_affected";
pub const PEOPLE_AFFECTED: &str = "people_affected";

/// Numeric disaster columns, in the order they are stored in `DisasterCounts`.
pub const DISASTER_COUNT_COLUMNS: [&str; 9] = [
    KILLED_OR_MISSING,
    INJURED,
    HOUSES_RUINED,
    HOUSES_HALF_RUINED,
    FLOOD_ABOVE_FLOOR,
    FLOOD_BELOW_FLOOR,
    LANDSLIDES,
    HOUSEHOLDS_AFFECTED,
    PEOPLE_AFFECTED,
];

/// Columns the population table must carry after positional drops.
pub const POPULATION_COLUMNS: [&str; 4] = [YEAR, PREFECTURE, POPULATION, ESTIMATED_AREA];

/// Disaster counts for one prefecture. Absent or unparseable cells are zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DisasterCounts {
    pub killed_or_missing: u64,
    pub injured: u64,
    pub houses_ruined: u64,
    pub houses_half_ruined: u64,
    pub flood_above_floor: u64,
    pub flood_below_floor: u64,
    pub landslides: u64,
    pub households_affected: u64,
    pub people_affected: u64,
}

impl DisasterCounts {
    /// Build from values ordered like `DISASTER_COUNT_COLUMNS`.
    pub fn from_ordered(values: [u64; 9]) -> Self {
        let [killed_or_missing, injured, houses_ruined, houses_half_ruined, flood_above_floor, flood_below_floor, landslides, households_affected, people_affected] =
            values;
        Self {
            killed_or_missing,
            injured,
            houses_ruined,
            houses_half_ruined,
            flood_above_floor,
            flood_below_floor,
            landslides,
            households_affected,
            people_affected,
        }
    }

    /// Values ordered like `DISASTER_COUNT_COLUMNS`.
    pub fn ordered(&self) -> [u64; 9] {
        [
            self.killed_or_missing,
            self.injured,
            self.houses_ruined,
            self.houses_half_ruined,
            self.flood_above_floor,
            self.flood_below_floor,
            self.landslides,
            self.households_affected,
            self.people_affected,
        ]
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// One population row joined against the disaster table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinedPrefecture {
    pub prefecture: String,
    pub year: i64,
    pub population: u64,
    pub estimated_area: f64,
    #[serde(flatten)]
    pub counts: DisasterCounts,
}
