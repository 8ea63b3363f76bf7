//! Utility functions for error handling
//!
//! Helpers that turn filesystem failures into errors that name the file
//! and what it was needed for.

use std::fs;
use std::io;
use std::path::Path;

use crate::error::{DashboardError, Result};

/// Safely open a file with rich error information
///
/// # Arguments
/// * `path` - The path to the file to open
/// * `purpose` - Why the file is being opened (for error context)
///
/// # Returns
/// * `Result<fs::File>` - The opened file or a detailed error
pub fn safe_open_file(path: &Path, purpose: &str) -> Result<fs::File> {
    if !path.exists() {
        return Err(DashboardError::DatasetNotFound(path.to_path_buf()));
    }

    if !path.is_file() {
        return Err(DashboardError::IoError(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("Path is not a file: {} (needed for {purpose})", path.display()),
        )));
    }

    fs::File::open(path).map_err(|e| {
        let context = match e.kind() {
            io::ErrorKind::PermissionDenied => "Permission denied - check file permissions",
            io::ErrorKind::NotFound => "File not found - it may have been deleted during operation",
            _ => "Failed to open file",
        };
        DashboardError::IoError(io::Error::new(
            e.kind(),
            format!("{context}: {} ({purpose}): {e}", path.display()),
        ))
    })
}

/// Safely read a file to string with rich error information
pub fn safe_read_to_string(path: &Path, purpose: &str) -> Result<String> {
    let mut file = safe_open_file(path, purpose)?;

    let mut content = String::new();
    io::Read::read_to_string(&mut file, &mut content).map_err(|e| {
        let context = match e.kind() {
            io::ErrorKind::InvalidData => "File contains invalid UTF-8 data - cannot read as text",
            _ => "Failed to read file content",
        };
        DashboardError::IoError(io::Error::new(
            e.kind(),
            format!("{context}: {} ({purpose})", path.display()),
        ))
    })?;

    Ok(content)
}
