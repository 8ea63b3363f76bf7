//! Scalar key performance indicators over the filtered rows

use arrow::array::{Array, StringArray};
use arrow::record_batch::RecordBatch;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;

use super::column_mean;
use crate::error::{DashboardError, Result};
use crate::schema::{Measure, columns};

/// The four headline figures of the dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpis {
    /// Distinct patient identifiers (not rows)
    pub total_patients: usize,
    pub average_length_of_stay: Option<f64>,
    pub average_billing_amount: Option<f64>,
    /// Most frequent condition; ties go to the lexicographically smallest
    pub most_common_condition: Option<String>,
}

impl Kpis {
    /// One `(label, value)` pair per KPI card, formatted for display
    #[must_use]
    pub fn display_pairs(&self) -> [(&'static str, String); 4] {
        let missing = || "n/a".to_string();
        [
            ("Total Patients", self.total_patients.to_string()),
            (
                "Average Length of Stay",
                self.average_length_of_stay.map_or_else(missing, format_length_of_stay),
            ),
            (
                "Average Billing Amount",
                self.average_billing_amount.map_or_else(missing, format_billing),
            ),
            (
                "Most Common Condition",
                self.most_common_condition.clone().unwrap_or_else(missing),
            ),
        ]
    }
}

#[must_use]
pub fn format_length_of_stay(days: f64) -> String {
    format!("{days:.2} days")
}

#[must_use]
pub fn format_billing(amount: f64) -> String {
    format!("${amount:.2}")
}

fn text_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .ok_or_else(|| DashboardError::schema_error(format!("Column '{name}' not found")))?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| DashboardError::schema_error(format!("Column '{name}' is not text")))
}

/// Compute the KPIs of a (filtered) patient batch
pub fn compute_kpis(batch: &RecordBatch) -> Result<Kpis> {
    let ids = text_column(batch, columns::PATIENT_ID)?;
    let total_patients = ids.iter().flatten().collect::<FxHashSet<_>>().len();

    let conditions = text_column(batch, columns::MEDICAL_CONDITION)?;
    let mut frequency: FxHashMap<&str, usize> = FxHashMap::default();
    for condition in conditions.iter().flatten() {
        *frequency.entry(condition).or_insert(0) += 1;
    }
    let most_common_condition = frequency
        .into_iter()
        .max_by(|(a, a_count), (b, b_count)| a_count.cmp(b_count).then_with(|| b.cmp(a)))
        .map(|(condition, _)| condition.to_string());

    Ok(Kpis {
        total_patients,
        average_length_of_stay: column_mean(batch, Measure::LengthOfStay)?,
        average_billing_amount: column_mean(batch, Measure::BillingAmount)?,
        most_common_condition,
    })
}
