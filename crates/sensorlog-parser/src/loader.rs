use std::fs;
use std::path::{Path, PathBuf};

use blake3::Hasher;
use csv::StringRecord;
use serde::Deserialize;
use tracing::debug;

use crate::encoding::decode_and_parse;
use crate::errors::LoadError;
use crate::formats::{
    cell, coerce_cell, convention_for, disambiguate_keys, is_blank, SourceConvention,
};
use crate::header::detect_header_block;
use crate::model::{HeaderBlock, HeaderSpan, RawTable, SourceFormat, TimeSeriesTable};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    pub delimiter: char,
    pub header_scan_limit: usize,
    pub model_export_marker: String,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: ',',
            header_scan_limit: 64,
            model_export_marker: "pvsyst".to_string(),
        }
    }
}

impl LoadOptions {
    pub fn delimiter_byte(&self) -> Result<u8, LoadError> {
        if self.delimiter.is_ascii() {
            Ok(self.delimiter as u8)
        } else {
            Err(LoadError::InvalidDelimiter(self.delimiter))
        }
    }

    pub fn validate(&self) -> Result<(), LoadError> {
        self.delimiter_byte()?;
        if self.model_export_marker.trim().is_empty() {
            return Err(LoadError::EmptyModelExportMarker);
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct FileLoad {
    pub path: PathBuf,
    pub hash: String,
    pub encoding: &'static str,
    pub header_block: HeaderBlock,
    pub header_span: HeaderSpan,
    pub table: TimeSeriesTable,
}

pub fn load_file(
    path: &Path,
    format: SourceFormat,
    options: &LoadOptions,
) -> Result<FileLoad, LoadError> {
    let bytes = fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_bytes(path, &bytes, format, options)
}

pub fn load_bytes(
    path: &Path,
    bytes: &[u8],
    format: SourceFormat,
    options: &LoadOptions,
) -> Result<FileLoad, LoadError> {
    let delimiter = options.delimiter_byte()?;
    let decoded = decode_and_parse(path, bytes, |text| {
        RawTable::from_text(text, delimiter).map_err(|source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        })
    })?;
    let raw = decoded.value;

    let header_block = detect_header_block(path, &raw, options.header_scan_limit)?;
    let table = build_table(path, &raw, header_block, convention_for(format))?;
    debug!(
        file = %path.display(),
        encoding = decoded.encoding,
        rows = table.height(),
        columns = table.width(),
        "built table"
    );

    Ok(FileLoad {
        path: path.to_path_buf(),
        hash: compute_hash(bytes),
        encoding: decoded.encoding,
        header_block,
        header_span: header_block.span(),
        table,
    })
}

fn build_table(
    path: &Path,
    raw: &RawTable,
    block: HeaderBlock,
    convention: &dyn SourceConvention,
) -> Result<TimeSeriesTable, LoadError> {
    let (header, data) = raw.split_header(block);
    let labels = convention.collapse_header(path, header, raw.width())?;
    let index_column = convention.index_column(&labels);

    let rows: Vec<&StringRecord> = data.iter().filter(|record| !is_blank(record)).collect();
    let timestamps = convention.parse_index(path, &rows, index_column)?;

    let data_columns: Vec<usize> = (0..raw.width())
        .filter(|&column| column != index_column)
        .collect();
    let keys = disambiguate_keys(
        data_columns
            .iter()
            .map(|&column| (column, labels.get(column).cloned().unwrap_or_default()))
            .collect(),
    );

    let columns: Vec<_> = keys
        .into_iter()
        .zip(&data_columns)
        .map(|(key, &column)| {
            let values: Vec<Option<f64>> = rows
                .iter()
                .map(|record| coerce_cell(cell(record, column)))
                .collect();
            (key, values)
        })
        .collect();

    Ok(TimeSeriesTable::from_columns(timestamps, columns)?)
}

fn compute_hash(contents: &[u8]) -> String {
    let mut hasher = Hasher::new();
    hasher.update(contents);
    hasher.finalize().to_hex().to_string()
}
