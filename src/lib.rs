//! Filter-and-aggregate pipeline for a hospital patient analytics dashboard.
//!
//! The patient dataset (CSV or Parquet) is loaded and normalized once, then
//! every filter selection is turned into four KPIs and a fixed catalog of
//! grouped count and mean tables ready for charting.

pub mod aggregate;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod filter;
pub mod loader;
pub mod schema;
pub mod session;
pub mod utils;

// Core types
pub use config::{DashboardConfig, OutputFormat};
pub use error::{DashboardError, Result};
pub use loader::{PatientDataset, load_dataset};

// Pipeline
pub use aggregate::{AggregateSpec, AggregateTable, Kpis, aggregate, compute_kpis};
pub use dashboard::{DASHBOARD_AGGREGATES, Dashboard, DashboardOutcome, DashboardPipeline};
pub use session::{emit_outcome, run_selections};

// Filtering capabilities
pub use filter::{Expr, FilterOptions, FilterSelection};
pub use filter::{evaluate_expr, filter_record_batch};

// Arrow types
pub use arrow::record_batch::RecordBatch;
