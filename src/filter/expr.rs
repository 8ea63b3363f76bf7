//! Expression-based filtering for patient record batches
//!
//! Expressions are evaluated column-wise into a boolean mask which is then
//! applied with [`filter_record_batch`].

use arrow::array::{Array, ArrayRef, BooleanArray, StringArray};
use arrow::compute::and;
use arrow::record_batch::RecordBatch;
use itertools::Itertools;
use rustc_hash::FxHashSet;

use crate::error::Result;
use crate::filter::core::{BatchFilter, filter_record_batch};
use crate::filter::error::{column_not_found, column_type_error};

/// Represents a filter expression over dataset columns
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// Column is in a set of values; an empty set matches nothing
    In(String, Vec<String>),

    /// Logical AND of expressions; an empty list matches everything
    And(Vec<Expr>),
}

/// Evaluates a filter expression against a record batch
///
/// # Returns
/// A boolean array indicating which rows match the filter
///
/// # Errors
/// Returns an error if a column is missing or is not a string column
pub fn evaluate_expr(batch: &RecordBatch, expr: &Expr) -> Result<BooleanArray> {
    match expr {
        Expr::And(exprs) => evaluate_and_expression(batch, exprs),
        Expr::In(col_name, values) => evaluate_in_expression(batch, col_name, values),
    }
}

/// Evaluates a logical AND expression
fn evaluate_and_expression(batch: &RecordBatch, exprs: &[Expr]) -> Result<BooleanArray> {
    let Some((first, rest)) = exprs.split_first() else {
        return Ok(BooleanArray::from(vec![true; batch.num_rows()]));
    };

    let mut result = evaluate_expr(batch, first)?;
    for expr in rest {
        let mask = evaluate_expr(batch, expr)?;
        result = and(&result, &mask)?;
    }

    Ok(result)
}

fn find_column<'a>(batch: &'a RecordBatch, col_name: &str) -> Result<&'a ArrayRef> {
    match batch.schema().index_of(col_name) {
        Ok(idx) => Ok(batch.column(idx)),
        Err(_) => column_not_found(col_name),
    }
}

/// Evaluates IN expression; null cells never match
fn evaluate_in_expression(
    batch: &RecordBatch,
    col_name: &str,
    values: &[String],
) -> Result<BooleanArray> {
    let column = find_column(batch, col_name)?;
    let Some(str_array) = column.as_any().downcast_ref::<StringArray>() else {
        return column_type_error(col_name, "string");
    };

    if values.is_empty() {
        return Ok(BooleanArray::from(vec![false; str_array.len()]));
    }

    let wanted: FxHashSet<&str> = values.iter().map(String::as_str).collect();
    let in_set = str_array
        .iter()
        .map(|v| v.is_some_and(|s| wanted.contains(s)))
        .collect_vec();
    Ok(BooleanArray::from(in_set))
}

/// A filter that evaluates an expression against a record batch
#[derive(Debug, Clone)]
pub struct ExpressionFilter {
    expr: Expr,
}

impl ExpressionFilter {
    /// Create a new expression filter
    #[must_use]
    pub fn new(expr: Expr) -> Self {
        Self { expr }
    }
}

impl BatchFilter for ExpressionFilter {
    fn filter(&self, batch: &RecordBatch) -> Result<RecordBatch> {
        let mask = evaluate_expr(batch, &self.expr)?;
        filter_record_batch(batch, &mask)
    }
}

/// Helper function to create an IN filter over string values
#[must_use]
pub fn in_filter<I, S>(column: &str, values: I) -> Expr
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Expr::In(column.to_string(), values.into_iter().map(Into::into).collect())
}
