//! Selection sessions for the binary
//!
//! A session evaluates filter selections against one pipeline and renders
//! every outcome, either as the text report or as one JSON document per
//! selection.

use std::io::{BufRead, Write};

use serde::Serialize;

use crate::config::OutputFormat;
use crate::dashboard::{DashboardOutcome, DashboardPipeline};
use crate::error::Result;
use crate::filter::{FilterOptions, FilterSelection};
use crate::utils::logging::{log_warning, write_report};

/// The JSON document written for each evaluated selection
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub options: &'a FilterOptions,
    pub selection: &'a FilterSelection,
    pub result: &'a DashboardOutcome,
}

/// Render one outcome to `out` in the requested format
pub fn emit_outcome<W: Write>(
    out: &mut W,
    pipeline: &DashboardPipeline,
    selection: &FilterSelection,
    outcome: &DashboardOutcome,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Text => write_report(out, outcome)?,
        OutputFormat::Json => {
            let report = JsonReport {
                options: pipeline.options(),
                selection,
                result: outcome,
            };
            serde_json::to_writer(&mut *out, &report)?;
            writeln!(out)?;
        }
    }
    out.flush()?;
    Ok(())
}

/// Evaluate one JSON selection per input line and render each outcome
///
/// Blank lines are skipped. A line that is not a valid selection is logged
/// and skipped, and the session continues. Returns the number of
/// selections evaluated.
pub fn run_selections<R: BufRead, W: Write>(
    pipeline: &DashboardPipeline,
    input: R,
    out: &mut W,
    format: OutputFormat,
) -> Result<usize> {
    let mut evaluated = 0;
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let selection = match FilterSelection::from_json(&line, pipeline.options()) {
            Ok(selection) => selection,
            Err(e) => {
                log_warning(&format!("Ignoring invalid selection: {e}"), None);
                continue;
            }
        };
        let outcome = pipeline.evaluate(&selection)?;
        emit_outcome(out, pipeline, &selection, &outcome, format)?;
        evaluated += 1;
    }
    Ok(evaluated)
}
