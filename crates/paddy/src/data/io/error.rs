//! Shared error types for dataset I/O.

use std::io;
use std::path::PathBuf;

use crate::data::TableError;

/// Errors that can occur when loading a dataset.
#[derive(Debug, thiserror::Error)]
pub enum DatasetLoadError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[cfg(feature = "io-parquet")]
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("invalid table: {0}")]
    Table(#[from] TableError),

    #[error("no dataset path configured")]
    NoSource,

    #[error("unsupported dataset format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("unsupported column type for {column}: got {got}")]
    UnsupportedType { column: String, got: String },
}
