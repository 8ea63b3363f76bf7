//! Error handling for the dashboard pipeline.

pub mod util;

use std::io;
use std::path::PathBuf;

use arrow::error::ArrowError;
use parquet::errors::ParquetError;

/// Specialized error type for loading and aggregating patient data
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    /// Error opening or reading a file
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    /// Error raised by an Arrow kernel or reader
    #[error("Arrow error: {0}")]
    ArrowError(#[from] ArrowError),

    /// Error processing Parquet data
    #[error("Parquet error: {0}")]
    ParquetError(#[from] ParquetError),

    /// Error reading or writing JSON documents
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The dataset file does not exist
    #[error("Dataset not found: {}", .0.display())]
    DatasetNotFound(PathBuf),

    /// The dataset file has an extension we cannot read
    #[error("Unsupported dataset format: {0}")]
    UnsupportedFormat(String),

    /// One or more required columns are absent from the dataset
    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// A column exists but has an unexpected type
    #[error("Schema error: {0}")]
    SchemaError(String),

    /// Error evaluating a filter expression
    #[error("Filter error: {0}")]
    FilterError(String),

    /// Error converting a column to its canonical type
    #[error("Conversion error: {0}")]
    ConversionError(String),

    /// Invalid configuration or filter selection
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl DashboardError {
    /// Create a filter error from any message
    pub fn filter_error(message: impl Into<String>) -> Self {
        Self::FilterError(message.into())
    }

    /// Create a schema error from any message
    pub fn schema_error(message: impl Into<String>) -> Self {
        Self::SchemaError(message.into())
    }

    /// Create a configuration error from any message
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }
}

/// Result type for dashboard operations
pub type Result<T> = std::result::Result<T, DashboardError>;
