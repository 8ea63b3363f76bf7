//! Console output utilities
//!
//! Plain-text rendering of a pipeline outcome: KPI cards followed by one
//! block per aggregate table.

use std::io::{self, Write};

use crate::aggregate::{AggregateTable, AggregateValue, KeyValue};
use crate::dashboard::DashboardOutcome;

fn format_key(key: &[KeyValue]) -> String {
    key.iter()
        .map(|part| match part {
            KeyValue::Text(s) => s.clone(),
            KeyValue::Number(x) => format!("{x:.4}"),
        })
        .collect::<Vec<_>>()
        .join(" / ")
}

fn format_value(value: AggregateValue) -> String {
    match value {
        AggregateValue::Count(n) => n.to_string(),
        AggregateValue::Mean(x) => format!("{x:.2}"),
    }
}

fn write_table<W: Write>(out: &mut W, table: &AggregateTable) -> io::Result<()> {
    writeln!(out, "{} ({})", table.spec.title, table.spec.value_label)?;
    for row in &table.rows {
        writeln!(out, "  {}: {}", format_key(&row.key), format_value(row.value))?;
    }
    writeln!(out)
}

/// Write the text report of `outcome` to `out`
pub fn write_report<W: Write>(out: &mut W, outcome: &DashboardOutcome) -> io::Result<()> {
    let dashboard = match outcome {
        DashboardOutcome::NoData { message } => return writeln!(out, "{message}"),
        DashboardOutcome::Populated(dashboard) => dashboard,
    };

    writeln!(out, "Key Performance Indicators")?;
    for (label, value) in dashboard.kpis.display_pairs() {
        writeln!(out, "  {label}: {value}")?;
    }
    writeln!(out)?;

    for table in &dashboard.aggregates {
        write_table(out, table)?;
    }
    Ok(())
}
