//! Module for converting source columns to their canonical types.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Date32Array, NullArray, StringArray};
use arrow::compute::kernels::cast;
use arrow::datatypes::DataType;

use crate::error::{DashboardError, Result};
use crate::schema::date_utils::{DateFormatConfig, days_since_epoch, parse_date_string};

/// Convert an Arrow array to match the target data type
///
/// Text dates are parsed with the configured formats; every other
/// conversion goes through Arrow's cast kernel, which turns unparseable
/// values into nulls.
pub fn convert_array(
    array: &ArrayRef,
    target_type: &DataType,
    date_config: &DateFormatConfig,
) -> Result<ArrayRef> {
    let source_type = array.data_type();

    if source_type == target_type {
        return Ok(array.clone());
    }

    match (source_type, target_type) {
        (DataType::Utf8, DataType::Date32) => convert_string_to_date32(array, date_config),

        (DataType::LargeUtf8 | DataType::Utf8View, DataType::Date32) => {
            let utf8 = cast::cast(array, &DataType::Utf8)?;
            convert_string_to_date32(&utf8, date_config)
        }

        _ => cast::cast(array, target_type).map_err(|e| {
            DashboardError::ConversionError(format!(
                "Failed to convert from {source_type:?} to {target_type:?}: {e}"
            ))
        }),
    }
}

/// Create a null array of the specified type and length
pub fn create_null_array(data_type: &DataType, length: usize) -> Result<ArrayRef> {
    let null_array: ArrayRef = Arc::new(NullArray::new(length));
    cast::cast(&null_array, data_type).map_err(|e| {
        DashboardError::ConversionError(format!(
            "Failed to create null array of type {data_type:?}: {e}"
        ))
    })
}

/// Convert a string array to a Date32 array
fn convert_string_to_date32(array: &ArrayRef, date_config: &DateFormatConfig) -> Result<ArrayRef> {
    let string_array = array
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| DashboardError::ConversionError("Expected StringArray".to_string()))?;

    let mut builder = Date32Array::builder(string_array.len());
    let mut unparsed = 0usize;

    for value in string_array {
        match value.map(|s| parse_date_string(s, date_config)) {
            Some(Some(date)) => builder.append_value(days_since_epoch(date)),
            Some(None) => {
                unparsed += 1;
                builder.append_null();
            }
            None => builder.append_null(),
        }
    }

    if unparsed > 0 {
        log::warn!("{unparsed} date values could not be parsed and were set to null");
    }

    Ok(Arc::new(builder.finish()) as ArrayRef)
}
