//! Filtering capabilities for the patient dataset
//!
//! This module provides an expression-based filtering system over Arrow
//! record batches and the six-dimension filter selection built on it.

pub mod core;
pub mod error;
pub mod expr;
pub mod selection;

pub use self::core::{BatchFilter, filter_record_batch};
pub use expr::{Expr, ExpressionFilter, evaluate_expr, in_filter};
pub use selection::{FilterOptions, FilterSelection};
