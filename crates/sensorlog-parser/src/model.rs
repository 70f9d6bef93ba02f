use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use csv::StringRecord;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::TableError;

pub const TIMESTAMP_COLUMN: &str = "timestamp";
pub const DISPLAY_COLUMN: &str = "index";
pub const DISPLAY_FORMAT: &str = "%m/%d/%Y %H %M";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceFormat {
    #[default]
    Generic,
    NamedPlatform,
    ModelExport,
}

impl SourceFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceFormat::Generic => "generic",
            SourceFormat::NamedPlatform => "named-platform",
            SourceFormat::ModelExport => "model-export",
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "generic" => Ok(SourceFormat::Generic),
            "named-platform" | "platform" => Ok(SourceFormat::NamedPlatform),
            "model-export" | "model" => Ok(SourceFormat::ModelExport),
            other => Err(format!("unknown source format '{other}'")),
        }
    }
}

// Header rows beneath the name row. A single name row aligned with the data spans 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HeaderSpan(pub usize);

impl HeaderSpan {
    pub fn rows(&self) -> usize {
        self.0
    }
}

impl fmt::Display for HeaderSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Every row above the first data row, name row included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HeaderBlock(pub usize);

impl HeaderBlock {
    pub fn rows(&self) -> usize {
        self.0
    }

    pub fn span(&self) -> HeaderSpan {
        HeaderSpan(self.0.saturating_sub(1))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColumnKey(String);

impl ColumnKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ColumnKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ColumnKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ColumnKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RawTable {
    rows: Vec<StringRecord>,
    width: usize,
}

impl RawTable {
    pub fn from_text(text: &str, delimiter: u8) -> Result<Self, csv::Error> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(delimiter)
            .from_reader(text.as_bytes());

        let rows = reader.records().collect::<Result<Vec<_>, _>>()?;
        let width = rows.iter().map(StringRecord::len).max().unwrap_or(0);
        Ok(Self { rows, width })
    }

    pub fn rows(&self) -> &[StringRecord] {
        &self.rows
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn split_header(&self, block: HeaderBlock) -> (&[StringRecord], &[StringRecord]) {
        self.rows.split_at(block.rows().min(self.rows.len()))
    }
}

// 1-based source line, or 0 when the reader did not track it.
pub(crate) fn line_of(record: &StringRecord) -> u64 {
    record.position().map(|pos| pos.line()).unwrap_or(0)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSeriesTable {
    timestamps: Vec<NaiveDateTime>,
    keys: Vec<ColumnKey>,
    positions: HashMap<ColumnKey, usize>,
    values: Vec<Vec<Option<f64>>>,
}

impl TimeSeriesTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_columns(
        timestamps: Vec<NaiveDateTime>,
        columns: Vec<(ColumnKey, Vec<Option<f64>>)>,
    ) -> Result<Self, TableError> {
        let rows = timestamps.len();
        let mut table = Self {
            timestamps,
            keys: Vec::with_capacity(columns.len()),
            positions: HashMap::with_capacity(columns.len()),
            values: Vec::with_capacity(columns.len()),
        };

        for (key, values) in columns {
            if values.len() != rows {
                return Err(TableError::LengthMismatch {
                    column: key.to_string(),
                    expected: rows,
                    found: values.len(),
                });
            }
            if table.positions.contains_key(&key) {
                return Err(TableError::DuplicateColumn(key.to_string()));
            }
            table.positions.insert(key.clone(), table.keys.len());
            table.keys.push(key);
            table.values.push(values);
        }

        Ok(table)
    }

    pub fn height(&self) -> usize {
        self.timestamps.len()
    }

    pub fn width(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty() && self.keys.is_empty()
    }

    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    pub fn column_keys(&self) -> &[ColumnKey] {
        &self.keys
    }

    pub fn column(&self, key: &str) -> Option<&[Option<f64>]> {
        self.positions
            .get(key)
            .map(|&position| self.values[position].as_slice())
    }

    pub fn columns(&self) -> impl Iterator<Item = (&ColumnKey, &[Option<f64>])> {
        self.keys
            .iter()
            .zip(self.values.iter().map(Vec::as_slice))
    }

    pub fn display_index(&self) -> Vec<String> {
        self.timestamps
            .iter()
            .map(|ts| ts.format(DISPLAY_FORMAT).to_string())
            .collect()
    }

    // Columns are outer-joined by key; a column absent on either side reads as missing.
    pub fn append(&mut self, other: TimeSeriesTable) {
        let existing = self.height();
        let incoming = other.height();
        let mut touched = vec![false; self.keys.len()];

        for (key, values) in other.keys.into_iter().zip(other.values) {
            match self.positions.get(&key) {
                Some(&position) => {
                    self.values[position].extend(values);
                    touched[position] = true;
                }
                None => {
                    let mut column = vec![None; existing];
                    column.extend(values);
                    self.positions.insert(key.clone(), self.keys.len());
                    self.keys.push(key);
                    self.values.push(column);
                    touched.push(true);
                }
            }
        }

        for (column, seen) in self.values.iter_mut().zip(touched) {
            if !seen {
                column.resize(existing + incoming, None);
            }
        }

        self.timestamps.extend(other.timestamps);
    }

    pub fn to_dataframe(&self) -> Result<DataFrame, TableError> {
        let micros: Vec<i64> = self
            .timestamps
            .iter()
            .map(|ts| ts.and_utc().timestamp_micros())
            .collect();
        let ts_series = Series::new(TIMESTAMP_COLUMN.into(), micros)
            .cast(&DataType::Datetime(TimeUnit::Microseconds, None))?;

        let mut columns: Vec<Column> = Vec::with_capacity(self.keys.len() + 2);
        columns.push(ts_series.into());
        for (key, values) in self.columns() {
            columns.push(Series::new(key.as_str().into(), values).into());
        }
        columns.push(Series::new(DISPLAY_COLUMN.into(), self.display_index()).into());

        Ok(DataFrame::new(columns)?)
    }
}
