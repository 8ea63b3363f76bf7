//! Configuration for the dashboard.

use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{DashboardError, Result};
use crate::schema::DateFormatConfig;

/// Default batch size for reading the dataset
pub const DEFAULT_BATCH_SIZE: usize = 8192;

/// Default number of CSV rows used for schema inference
pub const DEFAULT_INFERENCE_ROWS: usize = 1000;

/// Default dataset location, relative to the working directory
pub const DEFAULT_DATASET: &str = "Healthcare Analysis Dataset.csv";

/// How the binary renders pipeline output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Plain-text report
    #[default]
    Text,
    /// JSON document for a rendering front end
    Json,
}

impl FromStr for OutputFormat {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(DashboardError::config_error(format!(
                "Unknown output format '{other}' (expected 'text' or 'json')"
            ))),
        }
    }
}

/// Configuration for loading the dataset and running the pipeline
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Path of the CSV or Parquet dataset
    pub dataset_path: PathBuf,
    /// Optional JSON filter selection; all observed values when absent
    pub selection_path: Option<PathBuf>,
    /// Output rendering
    pub output_format: OutputFormat,
    /// Rows per record batch when reading
    pub batch_size: usize,
    /// CSV rows used for schema inference (`None` reads the whole file)
    pub schema_inference_rows: Option<usize>,
    /// Read one selection per stdin line instead of running once
    pub interactive: bool,
    /// Show a spinner while the dataset loads
    pub show_progress: bool,
    /// Date format configuration for string-to-date conversions
    pub date_format_config: DateFormatConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from(DEFAULT_DATASET),
            selection_path: None,
            output_format: OutputFormat::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            schema_inference_rows: Some(DEFAULT_INFERENCE_ROWS),
            interactive: false,
            show_progress: true,
            date_format_config: DateFormatConfig::default(),
        }
    }
}

impl DashboardConfig {
    /// Build a configuration from `DASHBOARD_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup("DASHBOARD_DATASET") {
            config.dataset_path = PathBuf::from(path);
        }
        config.selection_path = lookup("DASHBOARD_SELECTION").map(PathBuf::from);
        if let Some(format) = lookup("DASHBOARD_OUTPUT") {
            config.output_format = format.parse()?;
        }
        if let Some(size) = lookup("DASHBOARD_BATCH_SIZE") {
            config.batch_size = parse_positive("DASHBOARD_BATCH_SIZE", &size)?;
        }
        if let Some(rows) = lookup("DASHBOARD_INFER_ROWS") {
            // 0 means scan the whole file
            let rows = parse_number("DASHBOARD_INFER_ROWS", &rows)?;
            config.schema_inference_rows = (rows > 0).then_some(rows);
        }
        if let Some(flag) = lookup("DASHBOARD_INTERACTIVE") {
            config.interactive = parse_flag("DASHBOARD_INTERACTIVE", &flag)?;
        }
        if let Some(flag) = lookup("DASHBOARD_PROGRESS") {
            config.show_progress = parse_flag("DASHBOARD_PROGRESS", &flag)?;
        }

        Ok(config)
    }

    /// Replace the dataset path
    #[must_use]
    pub fn with_dataset_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.dataset_path = path.into();
        self
    }
}

fn parse_number(key: &str, value: &str) -> Result<usize> {
    value
        .trim()
        .parse::<usize>()
        .map_err(|e| DashboardError::config_error(format!("{key}='{value}' is not a number: {e}")))
}

fn parse_positive(key: &str, value: &str) -> Result<usize> {
    match parse_number(key, value)? {
        0 => Err(DashboardError::config_error(format!("{key} must be greater than zero"))),
        n => Ok(n),
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(DashboardError::config_error(format!(
            "{key}='{other}' is not a boolean"
        ))),
    }
}
