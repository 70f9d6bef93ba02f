mod common;
mod generic;
mod model_export;
mod named_platform;

use std::path::Path;

use chrono::NaiveDateTime;
use csv::StringRecord;

use crate::errors::LoadError;
use crate::model::SourceFormat;

pub use generic::GenericConvention;
pub use model_export::{IndexLayout, ModelExportConvention};
pub use named_platform::NamedPlatformConvention;

pub(crate) use common::{cell, coerce_cell, disambiguate_keys, is_blank, parse_generic_timestamp};

pub trait SourceConvention {
    fn format(&self) -> SourceFormat;

    fn collapse_header(
        &self,
        path: &Path,
        header: &[StringRecord],
        width: usize,
    ) -> Result<Vec<String>, LoadError>;

    fn index_column(&self, _labels: &[String]) -> usize {
        0
    }

    fn parse_index(
        &self,
        path: &Path,
        rows: &[&StringRecord],
        column: usize,
    ) -> Result<Vec<NaiveDateTime>, LoadError> {
        common::index_with(path, rows, column, parse_generic_timestamp)
    }
}

pub fn convention_for(format: SourceFormat) -> &'static dyn SourceConvention {
    match format {
        SourceFormat::Generic => &GenericConvention,
        SourceFormat::NamedPlatform => &NamedPlatformConvention,
        SourceFormat::ModelExport => &ModelExportConvention,
    }
}
