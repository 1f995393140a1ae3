//! Source Loader Module
//! Reads the disaster statistics workbook (calamine) and the population CSV
//! (Polars) into frames with English snake_case column names.

use crate::data::record::{
    DISASTER_COUNT_COLUMNS, ESTIMATED_AREA, FLOOD_ABOVE_FLOOR, FLOOD_BELOW_FLOOR,
    HOUSEHOLDS_AFFECTED, HOUSES_HALF_RUINED, HOUSES_RUINED, INJURED, JOIN_KEY,
    KILLED_OR_MISSING, LANDSLIDES, PEOPLE_AFFECTED, POPULATION_COLUMNS,
};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use polars::prelude::*;
use std::io::Cursor;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("Failed to open workbook: {0}")]
    WorkbookError(#[from] calamine::Error),
    #[error("Workbook has no worksheet")]
    NoWorksheet,
    #[error("Header row {row} is outside the worksheet")]
    HeaderRowMissing { row: usize },
    #[error("Column '{column}' not found in {source_name}")]
    MissingColumn {
        column: String,
        source_name: &'static str,
    },
    #[error("Cannot drop column {position}: {source_name} only has {width} columns")]
    DropPositionOutOfRange {
        position: usize,
        width: usize,
        source_name: &'static str,
    },
}

/// Header labels as they appear in the statistics workbook, whitespace removed.
const DISASTER_HEADER_ALIASES: [(&str, &str); 10] = [
    ("死者，行方不明者", KILLED_OR_MISSING),
    ("負傷者", INJURED),
    ("全壊", HOUSES_RUINED),
    ("半壊", HOUSES_HALF_RUINED),
    ("床上浸水", FLOOD_ABOVE_FLOOR),
    ("床下浸水", FLOOD_BELOW_FLOOR),
    ("崖くずれ（箇所）", LANDSLIDES),
    ("House-holdsaffected", HOUSEHOLDS_AFFECTED),
    ("Personsaffected", PEOPLE_AFFECTED),
    ("Prefecture", JOIN_KEY),
];

const DISASTER_SOURCE: &str = "disaster workbook";
const POPULATION_SOURCE: &str = "population table";

/// Loads both raw sources.
pub struct DataLoader {
    /// Zero-based sheet row holding the disaster headers.
    header_row: usize,
    /// Zero-based positions of unused population columns.
    population_drop_columns: Vec<usize>,
}

impl DataLoader {
    pub fn new(header_row: usize, population_drop_columns: Vec<usize>) -> Self {
        Self {
            header_row,
            population_drop_columns,
        }
    }

    /// Read the first worksheet of the disaster workbook from its raw bytes.
    ///
    /// Output columns: [join_key, killed_or_missing, ..., people_affected], all strings.
    pub fn disaster_from_bytes(&self, bytes: &[u8]) -> Result<DataFrame, LoaderError> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or(LoaderError::NoWorksheet)??;

        // calamine trims leading empty rows, pandas-style offsets count them
        let first_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);
        let skip = self
            .header_row
            .checked_sub(first_row)
            .ok_or(LoaderError::HeaderRowMissing {
                row: self.header_row,
            })?;

        let rows: Vec<&[Data]> = range.rows().skip(skip).collect();
        let df = self.disaster_frame_from_rows(&rows)?;

        tracing::info!(bytes = bytes.len(), rows = df.height(), "loaded disaster statistics");
        Ok(df)
    }

    /// Build the disaster frame from sheet rows, the first being the header.
    ///
    /// The leading index column is ignored. Rows missing any field, mapped or
    /// not, are dropped whole.
    pub fn disaster_frame_from_rows(&self, rows: &[&[Data]]) -> Result<DataFrame, LoaderError> {
        let (header, body) = rows.split_first().ok_or(LoaderError::HeaderRowMissing {
            row: self.header_row,
        })?;

        let targets: Vec<&'static str> = std::iter::once(JOIN_KEY)
            .chain(DISASTER_COUNT_COLUMNS)
            .collect();

        let positions = targets
            .iter()
            .map(|target| {
                header
                    .iter()
                    .enumerate()
                    .skip(1)
                    .find(|(_, cell)| english_header(cell) == Some(*target))
                    .map(|(i, _)| i)
                    .ok_or_else(|| LoaderError::MissingColumn {
                        column: target.to_string(),
                        source_name: DISASTER_SOURCE,
                    })
            })
            .collect::<Result<Vec<usize>, _>>()?;

        let mut values: Vec<Vec<String>> = vec![Vec::new(); targets.len()];
        let mut dropped = 0usize;

        for row in body {
            if (1..header.len()).any(|i| row.get(i).and_then(cell_text).is_none()) {
                dropped += 1;
                continue;
            }

            for (column, &i) in values.iter_mut().zip(&positions) {
                column.push(row.get(i).and_then(cell_text).unwrap_or_default());
            }
        }

        if dropped > 0 {
            tracing::debug!(dropped, "dropped incomplete disaster rows");
        }

        let columns: Vec<Column> = targets
            .iter()
            .zip(values)
            .map(|(name, column)| Column::new((*name).into(), column))
            .collect();

        Ok(DataFrame::new(columns)?)
    }

    /// Read the yearly population CSV from its raw bytes and drop the unused
    /// positional columns.
    pub fn population_from_bytes(&self, bytes: &[u8]) -> Result<DataFrame, LoaderError> {
        let df = CsvReadOptions::default()
            .with_infer_schema_length(Some(10000))
            .with_ignore_errors(true)
            .into_reader_with_file_handle(Cursor::new(bytes.to_vec()))
            .finish()?;

        let df = self.drop_unused_population_columns(df)?;

        tracing::info!(bytes = bytes.len(), rows = df.height(), "loaded population table");
        Ok(df)
    }

    fn drop_unused_population_columns(&self, df: DataFrame) -> Result<DataFrame, LoaderError> {
        let names = column_names(&df);

        if let Some(&position) = self
            .population_drop_columns
            .iter()
            .find(|&&p| p >= names.len())
        {
            return Err(LoaderError::DropPositionOutOfRange {
                position,
                width: names.len(),
                source_name: POPULATION_SOURCE,
            });
        }

        let kept: Vec<String> = names
            .into_iter()
            .enumerate()
            .filter(|(i, _)| !self.population_drop_columns.contains(i))
            .map(|(_, name)| name)
            .collect();

        let df = df.select(kept)?;
        require_columns(&df, &POPULATION_COLUMNS, POPULATION_SOURCE)?;
        Ok(df)
    }
}

/// Get list of column names from a DataFrame.
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn require_columns(
    df: &DataFrame,
    required: &[&str],
    source_name: &'static str,
) -> Result<(), LoaderError> {
    let present = column_names(df);
    match required
        .iter()
        .find(|column| !present.iter().any(|name| name == *column))
    {
        Some(column) => Err(LoaderError::MissingColumn {
            column: column.to_string(),
            source_name,
        }),
        None => Ok(()),
    }
}

/// Map a workbook header cell to its English column name.
fn english_header(cell: &Data) -> Option<&'static str> {
    let label: String = cell
        .to_string()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    DISASTER_HEADER_ALIASES
        .iter()
        .find(|(alias, target)| *alias == label || *target == label)
        .map(|(_, target)| *target)
}

/// Text of a cell, `None` when the cell holds no value.
fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Data {
        Data::String(s.to_string())
    }

    fn header() -> Vec<Data> {
        vec![
            Data::Empty,
            text("Prefecture"),
            text("死者，\n行方不明者"),
            text("負傷者"),
            text("全壊"),
            text("半壊"),
            text("床上\n浸水"),
            text("床下\n浸水"),
            text("河川\n（箇所）"),
            text("崖くずれ（箇所）"),
            text("House-holds \naffected"),
            text("Persons affected"),
        ]
    }

    fn row(index: i64, prefecture: &str, counts: [f64; 10]) -> Vec<Data> {
        let mut cells = vec![Data::Int(index), text(prefecture)];
        cells.extend(counts.iter().map(|v| Data::Float(*v)));
        cells
    }

    #[test]
    fn maps_japanese_headers_to_english_columns() {
        let loader = DataLoader::new(7, vec![3, 4]);
        let header = header();
        let hokkaido = row(1, "Hokkaido", [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0]);
        let rows: Vec<&[Data]> = vec![&header, &hokkaido];

        let df = loader.disaster_frame_from_rows(&rows).unwrap();

        assert_eq!(df.height(), 1);
        assert_eq!(df.width(), 10);
        let names = column_names(&df);
        assert_eq!(names[0], JOIN_KEY);
        assert_eq!(&names[1..], &DISASTER_COUNT_COLUMNS.map(String::from));

        let key = df.column(JOIN_KEY).unwrap().str().unwrap().get(0);
        assert_eq!(key, Some("Hokkaido"));
        // rivers column sits between flood_below_floor and landslides
        let landslides = df.column(LANDSLIDES).unwrap().str().unwrap().get(0);
        assert_eq!(landslides, Some("8"));
    }

    #[test]
    fn drops_rows_with_missing_fields() {
        let loader = DataLoader::new(7, vec![3, 4]);
        let header = header();
        let complete = row(1, "Aomori", [0.0; 10]);
        let mut partial = row(2, "Iwate", [1.0; 10]);
        partial[3] = Data::Empty;
        let mut blank_name = row(3, "   ", [1.0; 10]);
        blank_name[0] = Data::Empty;
        let rows: Vec<&[Data]> = vec![&header, &complete, &partial, &blank_name];

        let df = loader.disaster_frame_from_rows(&rows).unwrap();

        assert_eq!(df.height(), 1);
        let key = df.column(JOIN_KEY).unwrap().str().unwrap().get(0);
        assert_eq!(key, Some("Aomori"));
    }

    #[test]
    fn blank_unmapped_cell_drops_the_row() {
        let loader = DataLoader::new(7, vec![3, 4]);
        let header = header();
        let mut no_rivers = row(1, "Miyagi", [1.0; 10]);
        // Column 8 is the rivers count, which has no target column
        no_rivers[8] = Data::Empty;
        let complete = row(2, "Akita", [2.0; 10]);
        let rows: Vec<&[Data]> = vec![&header, &no_rivers, &complete];

        let df = loader.disaster_frame_from_rows(&rows).unwrap();

        assert_eq!(df.height(), 1);
        let key = df.column(JOIN_KEY).unwrap().str().unwrap().get(0);
        assert_eq!(key, Some("Akita"));
    }

    #[test]
    fn unreadable_workbook_is_rejected() {
        let loader = DataLoader::new(7, vec![3, 4]);
        let err = loader.disaster_from_bytes(b"not a workbook").unwrap_err();
        assert!(matches!(err, LoaderError::WorkbookError(_)));
    }

    #[test]
    fn keeps_non_numeric_cells_for_later_coercion() {
        let loader = DataLoader::new(7, vec![3, 4]);
        let header = header();
        let mut dashes = row(1, "Akita", [0.0; 10]);
        dashes[3] = text("-");
        let rows: Vec<&[Data]> = vec![&header, &dashes];

        let df = loader.disaster_frame_from_rows(&rows).unwrap();

        let injured = df.column(INJURED).unwrap().str().unwrap().get(0);
        assert_eq!(injured, Some("-"));
    }

    #[test]
    fn leading_column_is_never_a_data_column() {
        let loader = DataLoader::new(7, vec![3, 4]);
        let mut header = header();
        // A "Prefecture" label in the index column must not satisfy the lookup
        header[0] = text("Prefecture");
        header[1] = text("Name");
        let rows: Vec<&[Data]> = vec![&header];

        let err = loader.disaster_frame_from_rows(&rows).unwrap_err();
        assert!(matches!(err, LoaderError::MissingColumn { ref column, .. } if column == JOIN_KEY));
    }

    #[test]
    fn missing_header_is_a_format_error() {
        let loader = DataLoader::new(7, vec![3, 4]);
        let mut header = header();
        header.truncate(5);
        let rows: Vec<&[Data]> = vec![&header];

        let err = loader.disaster_frame_from_rows(&rows).unwrap_err();
        assert!(matches!(
            err,
            LoaderError::MissingColumn { ref column, .. } if column == HOUSES_HALF_RUINED
        ));

        let empty: Vec<&[Data]> = Vec::new();
        assert!(matches!(
            loader.disaster_frame_from_rows(&empty),
            Err(LoaderError::HeaderRowMissing { row: 7 })
        ));
    }

    #[test]
    fn english_headers_map_to_themselves() {
        assert_eq!(english_header(&text("landslides")), Some(LANDSLIDES));
        assert_eq!(english_header(&text(" join_key ")), Some(JOIN_KEY));
        assert_eq!(english_header(&text("河川（箇所）")), None);
    }

    #[test]
    fn population_csv_drops_positional_columns() {
        let csv = "prefecture,year,population,capital,region,estimated_area,island\n\
                   Tokyo-to,2016,13515271,Tokyo,Kanto,2194,Honshu\n\
                   Osaka-fu,2016,8839469,Osaka,Kinki,1905,Honshu\n";

        let loader = DataLoader::new(7, vec![3, 4]);
        let df = loader.population_from_bytes(csv.as_bytes()).unwrap();

        assert_eq!(df.height(), 2);
        assert_eq!(
            column_names(&df),
            vec!["prefecture", "year", "population", "estimated_area", "island"]
        );
    }

    #[test]
    fn population_csv_without_area_is_rejected() {
        let csv = "prefecture,year,population,capital,region\nTokyo-to,2016,13515271,Tokyo,Kanto\n";

        let loader = DataLoader::new(7, vec![3, 4]);
        let err = loader.population_from_bytes(csv.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            LoaderError::MissingColumn { ref column, .. } if column == ESTIMATED_AREA
        ));
    }

    #[test]
    fn drop_position_past_last_column_is_rejected() {
        let df = df!(
            "prefecture" => ["Tokyo-to"],
            "year" => [2016i64],
        )
        .unwrap();

        let loader = DataLoader::new(7, vec![3, 4]);
        let err = loader.drop_unused_population_columns(df).unwrap_err();
        assert!(matches!(
            err,
            LoaderError::DropPositionOutOfRange { position: 3, width: 2, .. }
        ));
    }
}
