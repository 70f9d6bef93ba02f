use std::path::Path;

use chrono::NaiveDateTime;
use csv::StringRecord;
use tracing::warn;

use crate::errors::LoadError;
use crate::model::SourceFormat;

use super::common::index_with;
use super::{cell, parse_generic_timestamp, SourceConvention};

#[derive(Debug, Default, Clone, Copy)]
pub struct ModelExportConvention;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexLayout {
    Fixed,
    Generic,
}

impl ModelExportConvention {
    pub const MIN_HEADER_ROWS: usize = 2;
    pub const DATE_LAYOUT: &'static str = "%m/%d/%y %H:%M";
    const INDEX_LABEL: &'static str = "date";
    const RENAMES: &'static [(&'static str, &'static str)] = &[("T Amb", "TAmb")];

    fn parse_fast(value: &str) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(value.trim(), Self::DATE_LAYOUT).ok()
    }

    // One layout per file: a single miss re-parses the whole column generically.
    pub fn index_dates(
        &self,
        path: &Path,
        rows: &[&StringRecord],
        column: usize,
    ) -> Result<(Vec<NaiveDateTime>, IndexLayout), LoadError> {
        let fast: Option<Vec<NaiveDateTime>> = rows
            .iter()
            .map(|record| Self::parse_fast(cell(record, column)))
            .collect();

        match fast {
            Some(timestamps) => Ok((timestamps, IndexLayout::Fixed)),
            None => {
                warn!(
                    file = %path.display(),
                    layout = Self::DATE_LAYOUT,
                    "model export dates did not match the fixed layout, using the generic parser"
                );
                let timestamps = index_with(path, rows, column, parse_generic_timestamp)?;
                Ok((timestamps, IndexLayout::Generic))
            }
        }
    }
}

impl SourceConvention for ModelExportConvention {
    fn format(&self) -> SourceFormat {
        SourceFormat::ModelExport
    }

    fn collapse_header(
        &self,
        path: &Path,
        header: &[StringRecord],
        width: usize,
    ) -> Result<Vec<String>, LoadError> {
        if header.len() < Self::MIN_HEADER_ROWS {
            return Err(LoadError::FormatMismatch {
                path: path.to_path_buf(),
                format: self.format(),
                expected: "at least 2",
                found: header.len(),
            });
        }

        let names = &header[header.len() - 2];
        let labels = (0..width)
            .map(|column| {
                let name = cell(names, column).trim();
                Self::RENAMES
                    .iter()
                    .find(|(from, _)| *from == name)
                    .map_or(name, |(_, to)| *to)
                    .to_string()
            })
            .collect();
        Ok(labels)
    }

    fn index_column(&self, labels: &[String]) -> usize {
        labels
            .iter()
            .position(|label| label.eq_ignore_ascii_case(Self::INDEX_LABEL))
            .unwrap_or(0)
    }

    fn parse_index(
        &self,
        path: &Path,
        rows: &[&StringRecord],
        column: usize,
    ) -> Result<Vec<NaiveDateTime>, LoadError> {
        self.index_dates(path, rows, column).map(|(timestamps, _)| timestamps)
    }
}
