//! Filter selections over the six categorical dimensions
//!
//! [`FilterOptions`] lists what the control surface offers (every distinct
//! value observed per dimension). [`FilterSelection`] is what the user
//! picked; it defaults to everything and turns into one `And` of `In`
//! expressions.

use std::collections::BTreeMap;

use arrow::array::StringArray;
use arrow::record_batch::RecordBatch;
use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::error::{DashboardError, Result};
use crate::filter::error::{column_not_found, column_type_error};
use crate::filter::expr::{Expr, in_filter};
use crate::loader::PatientDataset;
use crate::schema::Dimension;

/// Distinct observed values per filterable dimension, in discovery order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FilterOptions {
    values: BTreeMap<Dimension, Vec<String>>,
}

impl FilterOptions {
    /// Collect the distinct values of each filterable dimension in `batch`
    pub fn from_batch(batch: &RecordBatch) -> Result<Self> {
        let mut values = BTreeMap::new();
        for dimension in Dimension::FILTERABLE {
            values.insert(dimension, distinct_values(batch, dimension.column_name())?);
        }
        Ok(Self { values })
    }

    /// Collect the options of a loaded dataset
    pub fn from_dataset(dataset: &PatientDataset) -> Result<Self> {
        Self::from_batch(dataset.batch())
    }

    /// The options offered for `dimension` (empty for non-filterable ones)
    #[must_use]
    pub fn values(&self, dimension: Dimension) -> &[String] {
        self.values.get(&dimension).map_or(&[], Vec::as_slice)
    }
}

/// Distinct non-null values of a text column, in order of first appearance
fn distinct_values(batch: &RecordBatch, column: &str) -> Result<Vec<String>> {
    let Ok(idx) = batch.schema().index_of(column) else {
        return column_not_found(column);
    };
    let Some(array) = batch.column(idx).as_any().downcast_ref::<StringArray>() else {
        return column_type_error(column, "string");
    };

    let mut seen = FxHashSet::default();
    Ok(array
        .iter()
        .flatten()
        .filter(|value| seen.insert(*value))
        .map(str::to_string)
        .collect())
}

/// The allowed values for each of the six filterable dimensions
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FilterSelection {
    selected: BTreeMap<Dimension, Vec<String>>,
}

impl FilterSelection {
    /// Select every observed value of every dimension
    #[must_use]
    pub fn all(options: &FilterOptions) -> Self {
        let selected = Dimension::FILTERABLE
            .into_iter()
            .map(|d| (d, options.values(d).to_vec()))
            .collect();
        Self { selected }
    }

    /// Replace the selection for one dimension
    pub fn with<I, S>(mut self, dimension: Dimension, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if !dimension.is_filterable() {
            return Err(DashboardError::config_error(format!(
                "'{dimension}' is not a filterable dimension"
            )));
        }
        self.selected
            .insert(dimension, values.into_iter().map(Into::into).collect());
        Ok(self)
    }

    /// Parse a JSON selection such as `{"Gender": ["Female"]}`
    ///
    /// Dimensions the document does not mention keep all observed values.
    pub fn from_json(text: &str, options: &FilterOptions) -> Result<Self> {
        let overrides: BTreeMap<Dimension, Vec<String>> = serde_json::from_str(text)?;
        overrides
            .into_iter()
            .try_fold(Self::all(options), |selection, (dimension, values)| {
                selection.with(dimension, values)
            })
    }

    /// The selected values for `dimension`
    #[must_use]
    pub fn values(&self, dimension: Dimension) -> &[String] {
        self.selected.get(&dimension).map_or(&[], Vec::as_slice)
    }

    /// Whether some dimension has nothing selected, which filters out every row
    #[must_use]
    pub fn has_empty_dimension(&self) -> bool {
        Dimension::FILTERABLE
            .into_iter()
            .any(|d| self.values(d).is_empty())
    }

    /// The membership expression: every dimension must match one selected value
    #[must_use]
    pub fn to_expr(&self) -> Expr {
        Expr::And(
            Dimension::FILTERABLE
                .into_iter()
                .map(|d| in_filter(d.column_name(), self.values(d).iter().cloned()))
                .collect(),
        )
    }
}
