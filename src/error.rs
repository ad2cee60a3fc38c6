use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Convenience alias for fallible load operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors raised while loading the source tables.
///
/// A file that is absent on disk is not an error at this level; the store
/// degrades to an empty table and records the gap in its [`LoadReport`].
/// A file that exists but cannot be opened or parsed is fatal.
///
/// [`LoadReport`]: crate::store::LoadReport
#[derive(Debug, Error)]
pub enum StoreError {
    /// The file exists but could not be opened or read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path of the offending file.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// The file was read but a record failed to parse.
    #[error("failed to parse {path}: {source}")]
    Csv {
        /// Path of the offending file.
        path: PathBuf,
        /// Underlying CSV error.
        source: csv::Error,
    },
    /// The header row lacks a column the table schema requires.
    #[error("{path}: missing required column '{column}'")]
    MissingColumn {
        /// Path of the offending file.
        path: PathBuf,
        /// Name of the expected column.
        column: &'static str,
    },
    /// A record holds a value that cannot be parsed for its column.
    #[error("{path}: line {line}: invalid {column} value {value:?}")]
    InvalidField {
        /// Path of the offending file.
        path: PathBuf,
        /// 1-based line number of the record, 0 when unknown.
        line: u64,
        /// Name of the offending column.
        column: &'static str,
        /// Raw text that failed to parse.
        value: String,
    },
}
