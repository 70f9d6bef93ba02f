pub mod aggregate;
pub mod encoding;
pub mod errors;
pub mod formats;
pub mod header;
pub mod loader;
pub mod model;

pub use aggregate::{load, AggregateReport, LoadRequest, LoadedFile, SkipReason, SkippedFile};
pub use errors::{LoadError, TableError};
pub use formats::{convention_for, SourceConvention};
pub use header::detect_header_block;
pub use loader::{load_bytes, load_file, FileLoad, LoadOptions};
pub use model::{
    ColumnKey, HeaderBlock, HeaderSpan, RawTable, SourceFormat, TimeSeriesTable, DISPLAY_COLUMN,
    DISPLAY_FORMAT, TIMESTAMP_COLUMN,
};
