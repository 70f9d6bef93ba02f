use std::path::Path;

use csv::StringRecord;

use crate::errors::LoadError;
use crate::model::SourceFormat;

use super::{cell, SourceConvention};

#[derive(Debug, Default, Clone, Copy)]
pub struct GenericConvention;

impl SourceConvention for GenericConvention {
    fn format(&self) -> SourceFormat {
        SourceFormat::Generic
    }

    fn collapse_header(
        &self,
        _path: &Path,
        header: &[StringRecord],
        width: usize,
    ) -> Result<Vec<String>, LoadError> {
        let labels = (0..width)
            .map(|column| {
                header
                    .iter()
                    .map(|row| cell(row, column).trim())
                    .filter(|token| !token.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect();
        Ok(labels)
    }
}
