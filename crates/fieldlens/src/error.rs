//! Error types for the fieldlens library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for fieldlens operations.
#[derive(Debug, Error)]
pub enum FieldlensError {
    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Error from the workbook reader.
    #[error("Workbook error: {0}")]
    Workbook(#[from] calamine::Error),

    /// File format not supported by the raw loader.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Empty file or no data to load.
    #[error("Empty data: {0}")]
    EmptyData(String),

    /// Columns of a table disagree on the row count.
    #[error("Invalid table: {0}")]
    InvalidTable(String),

    /// A snapshot could not be decompressed or parsed.
    #[error("Corrupt snapshot: {0}")]
    CorruptSnapshot(String),

    /// A table could not be written as a snapshot.
    #[error("Cannot encode column '{column}': {message}")]
    Encode { column: String, message: String },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FieldlensError {
    /// Whether this error means the source file itself could not be loaded.
    ///
    /// These are the failures an operator sees; they leave no partial table.
    pub fn is_load_failure(&self) -> bool {
        matches!(
            self,
            FieldlensError::Io { .. }
                | FieldlensError::Csv(_)
                | FieldlensError::Workbook(_)
                | FieldlensError::UnsupportedFormat(_)
                | FieldlensError::EmptyData(_)
        )
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FieldlensError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for fieldlens operations.
pub type Result<T> = std::result::Result<T, FieldlensError>;
