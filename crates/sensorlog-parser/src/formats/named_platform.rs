use std::path::Path;

use csv::StringRecord;

use crate::errors::LoadError;
use crate::model::SourceFormat;

use super::{cell, SourceConvention};

#[derive(Debug, Default, Clone, Copy)]
pub struct NamedPlatformConvention;

impl NamedPlatformConvention {
    fn device_label(value: &str) -> &str {
        value.split('(').next().unwrap_or_default().trim()
    }

    fn measurement_label(value: &str) -> &str {
        match value.rsplit_once(',') {
            Some((_, last)) => last.trim(),
            None => value.trim(),
        }
    }

    fn unit_label(value: &str) -> &str {
        value.trim()
    }
}

impl SourceConvention for NamedPlatformConvention {
    fn format(&self) -> SourceFormat {
        SourceFormat::NamedPlatform
    }

    fn collapse_header(
        &self,
        path: &Path,
        header: &[StringRecord],
        width: usize,
    ) -> Result<Vec<String>, LoadError> {
        let [devices, measurements, units] = header else {
            return Err(LoadError::FormatMismatch {
                path: path.to_path_buf(),
                format: self.format(),
                expected: "exactly 3",
                found: header.len(),
            });
        };

        let labels = (0..width)
            .map(|column| {
                format!(
                    "{} {}, {}",
                    Self::device_label(cell(devices, column)),
                    Self::measurement_label(cell(measurements, column)),
                    Self::unit_label(cell(units, column)),
                )
            })
            .collect();
        Ok(labels)
    }
}
