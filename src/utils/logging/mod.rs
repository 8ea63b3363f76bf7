//! Logging utilities for output and progress tracking
//!
//! This module provides utilities for logging, the dashboard text report and
//! the load spinner.

pub mod console;
pub mod log;
pub mod progress;

pub use console::write_report;
pub use self::log::{init_logging, log_operation_complete, log_operation_start, log_warning};
pub use progress::{create_spinner, finish_and_clear};
