//! The filter-and-aggregate pipeline
//!
//! [`DashboardPipeline`] holds the shared, read-only dataset. Each call to
//! [`DashboardPipeline::evaluate`] filters it by a selection and either
//! signals that nothing matched or computes the KPIs and every table of
//! [`DASHBOARD_AGGREGATES`].

use std::sync::Arc;
use std::time::Instant;

use arrow::record_batch::RecordBatch;
use serde::Serialize;

use crate::aggregate::{
    AggregateSpec, AggregateTable, ChartKind, Kpis, Reduction, SortOrder, aggregate, compute_kpis,
};
use crate::error::Result;
use crate::filter::{BatchFilter, ExpressionFilter, FilterOptions, FilterSelection};
use crate::loader::PatientDataset;
use crate::schema::{Dimension, Measure};

/// Shown in place of the dashboard when the selection matches no rows
pub const NO_DATA_MESSAGE: &str = "No data available for the selected filters.";

const PATIENTS: &str = "Number of Patients";
const PRESCRIPTIONS: &str = "Number of Prescriptions";
const AVERAGE_DAYS: &str = "Average Days";
const AVERAGE_BILLING: &str = "Average Billing Amount ($)";

const LOCATION: &[Dimension] = &[
    Dimension::HospitalLatitude,
    Dimension::HospitalLongitude,
    Dimension::Hospital,
];

const fn counts(
    id: &'static str,
    title: &'static str,
    group_by: &'static [Dimension],
    value_label: &'static str,
) -> AggregateSpec {
    let stacked = group_by.len() > 1;
    AggregateSpec {
        id,
        title,
        group_by,
        reduction: Reduction::Count,
        order: if stacked { SortOrder::KeyAscending } else { SortOrder::ValueDescending },
        chart: if stacked { ChartKind::StackedBar } else { ChartKind::Bar },
        value_label,
    }
}

const fn means(
    id: &'static str,
    title: &'static str,
    group_by: &'static [Dimension],
    measure: Measure,
    chart: ChartKind,
) -> AggregateSpec {
    let map = matches!(chart, ChartKind::Map);
    AggregateSpec {
        id,
        title,
        group_by,
        reduction: Reduction::Mean(measure),
        order: if map { SortOrder::KeyAscending } else { SortOrder::ValueDescending },
        chart,
        value_label: match measure {
            Measure::LengthOfStay => AVERAGE_DAYS,
            Measure::BillingAmount => AVERAGE_BILLING,
        },
    }
}

/// Every chart dataset of the dashboard, in display order
pub const DASHBOARD_AGGREGATES: [AggregateSpec; 14] = [
    counts("gender_distribution", "Gender Distribution", &[Dimension::Gender], PATIENTS),
    counts("blood_type_distribution", "Blood Type Distribution", &[Dimension::BloodType], PATIENTS),
    counts(
        "medical_condition_counts",
        "Most Common Medical Conditions",
        &[Dimension::MedicalCondition],
        PATIENTS,
    ),
    counts(
        "medical_condition_by_gender",
        "Medical Condition by Gender",
        &[Dimension::MedicalCondition, Dimension::Gender],
        PATIENTS,
    ),
    means(
        "average_stay_by_condition",
        "Average Length of Stay by Medical Condition",
        &[Dimension::MedicalCondition],
        Measure::LengthOfStay,
        ChartKind::Bar,
    ),
    means(
        "average_stay_by_admission_type",
        "Average Length of Stay by Admission Type",
        &[Dimension::AdmissionType],
        Measure::LengthOfStay,
        ChartKind::Bar,
    ),
    means(
        "average_billing_by_condition",
        "Average Billing Amount by Medical Condition",
        &[Dimension::MedicalCondition],
        Measure::BillingAmount,
        ChartKind::Bar,
    ),
    means(
        "average_billing_by_insurance",
        "Average Billing Amount by Insurance Provider",
        &[Dimension::InsuranceProvider],
        Measure::BillingAmount,
        ChartKind::Bar,
    ),
    counts(
        "patients_by_hospital",
        "Number of Patients Treated by Each Hospital",
        &[Dimension::Hospital],
        PATIENTS,
    ),
    counts(
        "test_results_by_hospital",
        "Test Results Distribution by Hospital",
        &[Dimension::Hospital, Dimension::TestResults],
        PATIENTS,
    ),
    counts(
        "medication_by_condition",
        "Medication Prescribed by Medical Condition",
        &[Dimension::MedicalCondition, Dimension::Medication],
        PRESCRIPTIONS,
    ),
    counts(
        "medication_by_hospital",
        "Medication Prescribed by Hospital",
        &[Dimension::Hospital, Dimension::Medication],
        PRESCRIPTIONS,
    ),
    means(
        "average_billing_by_location",
        "Average Billing Amount by Hospital Location",
        LOCATION,
        Measure::BillingAmount,
        ChartKind::Map,
    ),
    means(
        "average_stay_by_location",
        "Average Length of Stay by Hospital Location",
        LOCATION,
        Measure::LengthOfStay,
        ChartKind::Map,
    ),
];

/// KPIs and chart datasets for a non-empty selection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub row_count: usize,
    pub kpis: Kpis,
    pub aggregates: Vec<AggregateTable>,
}

impl Dashboard {
    /// Look a table up by its id
    #[must_use]
    pub fn table(&self, id: &str) -> Option<&AggregateTable> {
        self.aggregates.iter().find(|t| t.spec.id == id)
    }
}

/// Result of one pipeline pass
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DashboardOutcome {
    /// The selection matched no rows
    NoData { message: &'static str },
    /// The selection matched at least one row
    Populated(Dashboard),
}

impl DashboardOutcome {
    #[must_use]
    pub fn dashboard(&self) -> Option<&Dashboard> {
        match self {
            Self::Populated(dashboard) => Some(dashboard),
            Self::NoData { .. } => None,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::NoData { .. })
    }
}

fn no_data() -> DashboardOutcome {
    log::info!("{NO_DATA_MESSAGE}");
    DashboardOutcome::NoData {
        message: NO_DATA_MESSAGE,
    }
}

/// Runs selections against the shared dataset
#[derive(Debug, Clone)]
pub struct DashboardPipeline {
    dataset: Arc<PatientDataset>,
    options: FilterOptions,
}

impl DashboardPipeline {
    /// Create a pipeline over `dataset`, collecting its filter options
    pub fn new(dataset: Arc<PatientDataset>) -> Result<Self> {
        let options = FilterOptions::from_dataset(&dataset)?;
        Ok(Self { dataset, options })
    }

    #[must_use]
    pub fn dataset(&self) -> &PatientDataset {
        &self.dataset
    }

    /// Distinct observed values per filterable dimension
    #[must_use]
    pub fn options(&self) -> &FilterOptions {
        &self.options
    }

    /// The default selection: every observed value of every dimension
    #[must_use]
    pub fn default_selection(&self) -> FilterSelection {
        FilterSelection::all(&self.options)
    }

    /// Rows matching `selection` on all six dimensions
    pub fn filter_rows(&self, selection: &FilterSelection) -> Result<RecordBatch> {
        ExpressionFilter::new(selection.to_expr()).filter(self.dataset.batch())
    }

    /// Filter, then aggregate or signal that nothing matched
    ///
    /// A dimension with nothing selected matches no rows, so the dataset is
    /// not scanned at all.
    pub fn evaluate(&self, selection: &FilterSelection) -> Result<DashboardOutcome> {
        if selection.has_empty_dimension() {
            log::debug!("Selection leaves a dimension empty");
            return Ok(no_data());
        }

        let start = Instant::now();
        let filtered = self.filter_rows(selection)?;
        log::debug!(
            "Selection kept {} of {} rows",
            filtered.num_rows(),
            self.dataset.num_rows()
        );

        if filtered.num_rows() == 0 {
            return Ok(no_data());
        }

        let kpis = compute_kpis(&filtered)?;
        let aggregates = DASHBOARD_AGGREGATES
            .iter()
            .map(|spec| aggregate(&filtered, spec))
            .collect::<Result<Vec<_>>>()?;

        log::debug!("Computed dashboard in {:?}", start.elapsed());
        Ok(DashboardOutcome::Populated(Dashboard {
            row_count: filtered.num_rows(),
            kpis,
            aggregates,
        }))
    }
}
