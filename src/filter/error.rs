//! Error handling utilities for the filter module

use crate::error::{DashboardError, Result};

/// Create a filter error with context
pub fn filter_err<T>(message: impl AsRef<str>) -> Result<T> {
    Err(DashboardError::filter_error(message.as_ref()))
}

/// Create a column not found error
pub fn column_not_found<T>(column_name: &str) -> Result<T> {
    filter_err(format!("Column '{column_name}' not found"))
}

/// Create a column type error
pub fn column_type_error<T>(column_name: &str, expected_type: &str) -> Result<T> {
    filter_err(format!(
        "Column '{column_name}' is not a {expected_type} array"
    ))
}
