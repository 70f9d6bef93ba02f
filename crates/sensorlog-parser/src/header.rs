use std::path::Path;

use tracing::debug;

use crate::errors::LoadError;
use crate::formats::{cell, parse_generic_timestamp};
use crate::model::{HeaderBlock, RawTable};

// The first row, within `scan_limit`, whose first cell parses as a date starts the data.
pub fn detect_header_block(
    path: &Path,
    table: &RawTable,
    scan_limit: usize,
) -> Result<HeaderBlock, LoadError> {
    let scanned = table.len().min(scan_limit);

    let block = table
        .rows()
        .iter()
        .take(scanned)
        .position(|row| parse_generic_timestamp(cell(row, 0)).is_some())
        .map(HeaderBlock)
        .ok_or_else(|| LoadError::HeaderDetection {
            path: path.to_path_buf(),
            scanned,
        })?;

    debug!(
        file = %path.display(),
        header_rows = block.rows(),
        header_span = block.span().rows(),
        "detected header block"
    );
    Ok(block)
}
