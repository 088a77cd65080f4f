//! Error types for loading and assembling tables.

use std::path::PathBuf;
use thiserror::Error;

/// Everything that can stop a render pass before a table exists.
#[derive(Debug, Error)]
pub enum LoadError {
    /// No upload was given and none of the default paths exist.
    #[error("Default file not found: {}. Upload a file or place data there.", display_paths(.tried))]
    SourceNotFound { tried: Vec<PathBuf> },

    /// The source exists but could not be decoded.
    #[error("Could not parse '{source_name}': {message}")]
    Parse {
        source_name: String,
        message: String,
    },

    /// File extension with no known decoder.
    #[error("Unsupported file type '{source_name}' (expected csv, xlsx, xls, parquet or json)")]
    UnsupportedFormat { source_name: String },

    /// Error reading a file from disk.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A column whose length differs from the rest of the table.
    #[error("Column '{column}' has {found} rows, expected {expected}")]
    ShapeMismatch {
        column: String,
        expected: usize,
        found: usize,
    },
}

impl LoadError {
    pub(crate) fn parse(source_name: &str, message: impl std::fmt::Display) -> Self {
        LoadError::Parse {
            source_name: source_name.to_string(),
            message: message.to_string(),
        }
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" or ")
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, LoadError>;
