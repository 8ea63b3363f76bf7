//! Shared utilities for logging, progress and console output

pub mod logging;
