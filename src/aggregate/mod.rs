//! Grouped count and mean aggregation
//!
//! Every chart dataset is an [`AggregateSpec`] (grouping dimensions, a
//! reduction, an ordering and rendering hints) run through [`aggregate`].

pub mod kpi;

use std::cmp::Ordering;

use arrow::array::{Array, Float64Array, Int64Array, StringArray};
use arrow::record_batch::RecordBatch;
use rustc_hash::FxHashMap;
use serde::Serialize;
use smallvec::SmallVec;

use crate::error::{DashboardError, Result};
use crate::schema::{Dimension, Measure};

pub use kpi::{Kpis, compute_kpis, format_billing, format_length_of_stay};

/// How the rows of each group are reduced to a single value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "measure")]
pub enum Reduction {
    /// Number of rows in the group
    Count,
    /// Arithmetic mean of a measure, skipping nulls
    Mean(Measure),
}

/// Ordering of the output rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Largest value first; ties keep discovery order
    ValueDescending,
    /// By grouping key, first dimension first
    KeyAscending,
}

/// How the rendering collaborator draws the table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Bar,
    StackedBar,
    Map,
}

/// A named aggregate: grouping, reduction, ordering and rendering hints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AggregateSpec {
    pub id: &'static str,
    pub title: &'static str,
    pub group_by: &'static [Dimension],
    pub reduction: Reduction,
    pub order: SortOrder,
    pub chart: ChartKind,
    pub value_label: &'static str,
}

/// One component of a grouping key
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum KeyValue {
    Text(String),
    Number(f64),
}

impl KeyValue {
    /// The text value, if this is a categorical key
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Number(_) => None,
        }
    }

    fn cmp_key(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Number(_), Self::Text(_)) => Ordering::Less,
            (Self::Text(_), Self::Number(_)) => Ordering::Greater,
        }
    }
}

/// The reduced value of a group
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AggregateValue {
    Count(usize),
    Mean(f64),
}

impl AggregateValue {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Count(n) => n as f64,
            Self::Mean(x) => x,
        }
    }
}

/// A single (key, value) row of an aggregate table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    pub key: SmallVec<[KeyValue; 3]>,
    pub value: AggregateValue,
}

impl AggregateRow {
    fn matches(&self, key: &[&str]) -> bool {
        self.key.len() == key.len()
            && self
                .key
                .iter()
                .zip(key)
                .all(|(part, wanted)| part.as_str() == Some(*wanted))
    }
}

/// The output of one [`AggregateSpec`] over a filtered batch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateTable {
    #[serde(flatten)]
    pub spec: AggregateSpec,
    pub rows: Vec<AggregateRow>,
}

impl AggregateTable {
    /// Value of the row whose categorical key equals `key`
    #[must_use]
    pub fn value_for(&self, key: &[&str]) -> Option<f64> {
        self.rows
            .iter()
            .find(|row| row.matches(key))
            .map(|row| row.value.as_f64())
    }

    /// Number of groups
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A borrowed key component, hashable so groups can be found without allocating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum KeyPart<'a> {
    Text(&'a str),
    Number(u64),
}

impl KeyPart<'_> {
    fn to_owned_value(self) -> KeyValue {
        match self {
            Self::Text(s) => KeyValue::Text(s.to_string()),
            Self::Number(bits) => KeyValue::Number(f64::from_bits(bits)),
        }
    }
}

#[derive(Clone, Copy)]
enum KeyColumn<'a> {
    Text(&'a StringArray),
    Number(&'a Float64Array),
}

impl<'a> KeyColumn<'a> {
    fn get(self, row: usize) -> Option<KeyPart<'a>> {
        match self {
            Self::Text(array) => array.is_valid(row).then(|| KeyPart::Text(array.value(row))),
            Self::Number(array) => array
                .is_valid(row)
                .then(|| array.value(row))
                .filter(|v| !v.is_nan())
                .map(|v| KeyPart::Number(normalize_float(v).to_bits())),
        }
    }
}

enum MeasureColumn<'a> {
    Int(&'a Int64Array),
    Float(&'a Float64Array),
}

impl MeasureColumn<'_> {
    #[allow(clippy::cast_precision_loss)]
    fn get(&self, row: usize) -> Option<f64> {
        match self {
            Self::Int(array) => array.is_valid(row).then(|| array.value(row) as f64),
            Self::Float(array) => array
                .is_valid(row)
                .then(|| array.value(row))
                .filter(|v| !v.is_nan()),
        }
    }
}

// -0.0 and 0.0 must land in the same group
fn normalize_float(value: f64) -> f64 {
    if value == 0.0 { 0.0 } else { value }
}

fn key_column<'a>(batch: &'a RecordBatch, dimension: Dimension) -> Result<KeyColumn<'a>> {
    let name = dimension.column_name();
    let array = batch
        .column_by_name(name)
        .ok_or_else(|| DashboardError::schema_error(format!("Column '{name}' not found")))?;

    let column = if dimension.is_coordinate() {
        array.as_any().downcast_ref::<Float64Array>().map(KeyColumn::Number)
    } else {
        array.as_any().downcast_ref::<StringArray>().map(KeyColumn::Text)
    };
    column.ok_or_else(|| {
        DashboardError::schema_error(format!(
            "Column '{name}' has unexpected type {}",
            array.data_type()
        ))
    })
}

fn measure_column<'a>(batch: &'a RecordBatch, measure: Measure) -> Result<MeasureColumn<'a>> {
    let name = measure.column_name();
    let array = batch
        .column_by_name(name)
        .ok_or_else(|| DashboardError::schema_error(format!("Column '{name}' not found")))?;

    if let Some(ints) = array.as_any().downcast_ref::<Int64Array>() {
        return Ok(MeasureColumn::Int(ints));
    }
    if let Some(floats) = array.as_any().downcast_ref::<Float64Array>() {
        return Ok(MeasureColumn::Float(floats));
    }
    Err(DashboardError::schema_error(format!(
        "Column '{name}' is not numeric ({})",
        array.data_type()
    )))
}

/// Arithmetic mean of a measure over every row, skipping nulls
pub(crate) fn column_mean(batch: &RecordBatch, measure: Measure) -> Result<Option<f64>> {
    let column = measure_column(batch, measure)?;
    let mut acc = Accumulator::default();
    for row in 0..batch.num_rows() {
        if let Some(value) = column.get(row) {
            acc.add(value);
        }
    }
    Ok(acc.mean())
}

#[derive(Debug, Default, Clone, Copy)]
struct Accumulator {
    count: usize,
    sum: f64,
}

impl Accumulator {
    fn add(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
    }

    #[allow(clippy::cast_precision_loss)]
    fn mean(self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// Group `batch` by the table's dimensions and reduce each group
///
/// Rows with a null (or NaN coordinate) in any grouping column are skipped,
/// and so are rows with a null measure when the reduction is a mean.
///
/// # Errors
/// Returns a schema error if a grouping or measure column is missing or has
/// an unexpected type.
pub fn aggregate(batch: &RecordBatch, spec: &AggregateSpec) -> Result<AggregateTable> {
    let keys = spec
        .group_by
        .iter()
        .map(|d| key_column(batch, *d))
        .collect::<Result<Vec<_>>>()?;
    let measure = match spec.reduction {
        Reduction::Count => None,
        Reduction::Mean(m) => Some(measure_column(batch, m)?),
    };

    let mut index: FxHashMap<SmallVec<[KeyPart<'_>; 3]>, usize> = FxHashMap::default();
    let mut groups: Vec<(SmallVec<[KeyPart<'_>; 3]>, Accumulator)> = Vec::new();

    for row in 0..batch.num_rows() {
        let Some(key) = keys
            .iter()
            .map(|column| column.get(row))
            .collect::<Option<SmallVec<[KeyPart<'_>; 3]>>>()
        else {
            continue;
        };

        let value = match &measure {
            None => 1.0,
            Some(column) => match column.get(row) {
                Some(v) => v,
                None => continue,
            },
        };

        let slot = *index.entry(key.clone()).or_insert_with(|| {
            groups.push((key, Accumulator::default()));
            groups.len() - 1
        });
        groups[slot].1.add(value);
    }

    let mut rows: Vec<AggregateRow> = groups
        .into_iter()
        .filter_map(|(key, acc)| {
            let value = match spec.reduction {
                Reduction::Count => AggregateValue::Count(acc.count),
                Reduction::Mean(_) => AggregateValue::Mean(acc.mean()?),
            };
            Some(AggregateRow {
                key: key.into_iter().map(KeyPart::to_owned_value).collect(),
                value,
            })
        })
        .collect();

    match spec.order {
        SortOrder::ValueDescending => {
            rows.sort_by(|a, b| b.value.as_f64().total_cmp(&a.value.as_f64()));
        }
        SortOrder::KeyAscending => rows.sort_by(|a, b| {
            a.key
                .iter()
                .zip(&b.key)
                .map(|(x, y)| x.cmp_key(y))
                .find(|o| o.is_ne())
                .unwrap_or(Ordering::Equal)
        }),
    }

    log::trace!("Aggregate '{}' produced {} groups", spec.id, rows.len());
    Ok(AggregateTable { spec: *spec, rows })
}
