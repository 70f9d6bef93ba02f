use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use glob::MatchOptions;
use tracing::info;

use crate::errors::LoadError;
use crate::loader::{load_file, FileLoad, LoadOptions};
use crate::model::{HeaderSpan, SourceFormat, TimeSeriesTable};

pub const CANDIDATE_EXTENSION: &str = "csv";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub path: PathBuf,
    pub format: SourceFormat,
    pub file_name: Option<String>,
    pub include_model_exports: bool,
}

impl LoadRequest {
    pub fn new(path: impl Into<PathBuf>, format: SourceFormat) -> Self {
        Self {
            path: path.into(),
            format,
            file_name: None,
            include_model_exports: false,
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn with_model_exports(mut self, include: bool) -> Self {
        self.include_model_exports = include;
        self
    }

    pub fn effective_format(&self) -> SourceFormat {
        if self.include_model_exports {
            SourceFormat::ModelExport
        } else {
            self.format
        }
    }

    fn single_file(&self) -> Option<PathBuf> {
        match &self.file_name {
            Some(name) => Some(self.path.join(name)),
            None if self.path.is_file() => Some(self.path.clone()),
            None => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    ModelExport,
    NotModelExport,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::ModelExport => f.write_str("model export"),
            SkipReason::NotModelExport => f.write_str("not a model export"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedFile {
    pub path: PathBuf,
    pub hash: String,
    pub encoding: &'static str,
    pub header_rows: usize,
    pub header_span: HeaderSpan,
    pub rows: usize,
}

#[derive(Debug, Clone, Default)]
pub struct AggregateReport {
    pub table: TimeSeriesTable,
    pub loaded: Vec<LoadedFile>,
    pub skipped: Vec<SkippedFile>,
}

impl AggregateReport {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    fn accumulate(&mut self, file: FileLoad) {
        self.loaded.push(LoadedFile {
            path: file.path,
            hash: file.hash,
            encoding: file.encoding,
            header_rows: file.header_block.rows(),
            header_span: file.header_span,
            rows: file.table.height(),
        });
        self.table.append(file.table);
    }
}

// The first file that fails aborts the whole load.
pub fn load(request: &LoadRequest, options: &LoadOptions) -> Result<AggregateReport, LoadError> {
    options.validate()?;
    let format = request.effective_format();
    let mut report = AggregateReport::default();

    if let Some(path) = request.single_file() {
        let file = load_file(&path, format, options)?;
        info!(file = %path.display(), rows = file.table.height(), "read file");
        report.accumulate(file);
        return Ok(report);
    }

    for path in list_candidates(&request.path)? {
        if let Some(reason) = skip_reason(
            &path,
            &options.model_export_marker,
            request.include_model_exports,
        ) {
            info!(file = %path.display(), %reason, "skipped file");
            report.skipped.push(SkippedFile { path, reason });
            continue;
        }

        let file = load_file(&path, format, options).map_err(|source| {
            LoadError::AggregationAbort {
                path: path.clone(),
                source: Box::new(source),
            }
        })?;
        info!(file = %path.display(), rows = file.table.height(), "read file");
        report.accumulate(file);
    }

    Ok(report)
}

pub fn list_candidates(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    fs::metadata(dir).map_err(|source| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let pattern = format!(
        "{}/*.{CANDIDATE_EXTENSION}",
        glob::Pattern::escape(&dir.to_string_lossy())
    );
    let options = MatchOptions {
        case_sensitive: false,
        ..MatchOptions::new()
    };
    let entries = glob::glob_with(&pattern, options).map_err(|err| LoadError::Io {
        path: dir.to_path_buf(),
        source: io::Error::new(io::ErrorKind::InvalidInput, err),
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry.map_err(|err| LoadError::Io {
            path: err.path().to_path_buf(),
            source: err.into_error(),
        })?;
        if path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

fn skip_reason(path: &Path, marker: &str, model_export_mode: bool) -> Option<SkipReason> {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    let marked = name.contains(&marker.trim().to_lowercase());

    match (model_export_mode, marked) {
        (false, true) => Some(SkipReason::ModelExport),
        (true, false) => Some(SkipReason::NotModelExport),
        _ => None,
    }
}
