use std::path::PathBuf;

use polars::prelude::PolarsError;
use thiserror::Error;

use crate::model::SourceFormat;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} could not be decoded with any of {attempted:?}", .path.display())]
    Decode {
        path: PathBuf,
        attempted: Vec<&'static str>,
    },

    #[error("{} CSV error: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error(
        "{}: no timestamp found in the first column of the first {scanned} rows",
        .path.display()
    )]
    HeaderDetection { path: PathBuf, scanned: usize },

    #[error(
        "{} {format} format mismatch: expected {expected} header rows, found {found}",
        .path.display()
    )]
    FormatMismatch {
        path: PathBuf,
        format: SourceFormat,
        expected: &'static str,
        found: usize,
    },

    #[error("{} line {line}: invalid timestamp '{value}'", .path.display())]
    InvalidTimestamp {
        path: PathBuf,
        line: u64,
        value: String,
    },

    #[error("delimiter '{0}' is not a single-byte ASCII character")]
    InvalidDelimiter(char),

    #[error("model export marker must not be empty")]
    EmptyModelExportMarker,

    #[error(transparent)]
    Table(#[from] TableError),

    #[error("aggregation aborted at {}: {source}", .path.display())]
    AggregationAbort {
        path: PathBuf,
        #[source]
        source: Box<LoadError>,
    },
}

impl LoadError {
    pub fn root(&self) -> &LoadError {
        match self {
            LoadError::AggregationAbort { source, .. } => source.root(),
            other => other,
        }
    }
}

#[derive(Debug, Error)]
pub enum TableError {
    #[error("duplicate column key '{0}'")]
    DuplicateColumn(String),

    #[error("column length mismatch for {column}: expected {expected}, found {found}")]
    LengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error(transparent)]
    Polars(#[from] PolarsError),
}
