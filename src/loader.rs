//! Dataset loading and normalization
//!
//! The dataset is read once at startup, from CSV or Parquet, concatenated
//! into a single record batch and normalized into the canonical patient
//! schema. `Length of Stay` is derived from the admission and discharge
//! dates when the source does not carry it.

use std::io::Seek;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use arrow::array::{Array, ArrayRef, Date32Array, Int64Array};
use arrow::compute::concat_batches;
use arrow::csv::ReaderBuilder;
use arrow::csv::reader::Format;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use crate::config::DashboardConfig;
use crate::error::util::safe_open_file;
use crate::error::{DashboardError, Result};
use crate::schema::{
    DATE_COLUMNS, DateFormatConfig, canonical_type, columns, convert_array, create_null_array,
    is_patient_column, missing_columns, patient_schema,
};
use crate::utils::logging::{
    create_spinner, finish_and_clear, log_operation_complete, log_operation_start, log_warning,
};

/// Supported dataset file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFormat {
    Csv,
    Parquet,
}

impl DatasetFormat {
    /// Detect the format from the file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "csv" => Ok(Self::Csv),
            "parquet" | "pq" => Ok(Self::Parquet),
            _ => Err(DashboardError::UnsupportedFormat(format!(
                "{} (expected .csv or .parquet)",
                path.display()
            ))),
        }
    }
}

/// The normalized, read-only patient table
#[derive(Debug, Clone)]
pub struct PatientDataset {
    batch: RecordBatch,
    source: Option<PathBuf>,
    derived_length_of_stay: bool,
}

impl PatientDataset {
    /// Normalize a raw record batch into the canonical patient schema
    ///
    /// # Errors
    /// Returns `MissingColumns` if a required column is absent, or a
    /// conversion error if a column cannot be cast to its canonical type.
    pub fn from_record_batch(batch: &RecordBatch, date_config: &DateFormatConfig) -> Result<Self> {
        let missing = missing_columns(&batch.schema());
        if !missing.is_empty() {
            return Err(DashboardError::MissingColumns(missing));
        }

        let num_rows = batch.num_rows();
        let source_column = |name: &str| -> Result<Option<ArrayRef>> {
            batch
                .column_by_name(name)
                .map(|array| convert_array(array, &canonical_type(name), date_config))
                .transpose()
        };

        let schema = patient_schema();
        let mut arrays: Vec<ArrayRef> = Vec::with_capacity(schema.fields().len());
        let mut derived_length_of_stay = false;

        for field in schema.fields() {
            let name = field.name().as_str();
            let array = match source_column(name)? {
                Some(array) => array,
                None if name == columns::LENGTH_OF_STAY => {
                    derived_length_of_stay = true;
                    Arc::new(derive_from_columns(&schema, &arrays)?) as ArrayRef
                }
                None => create_null_array(field.data_type(), num_rows)?,
            };
            arrays.push(array);
        }

        let normalized = RecordBatch::try_new(schema, arrays)?;
        report_negative_stays(&normalized);

        Ok(Self {
            batch: normalized,
            source: None,
            derived_length_of_stay,
        })
    }

    /// Attach the path the dataset was read from
    #[must_use]
    pub fn with_source(mut self, path: impl Into<PathBuf>) -> Self {
        self.source = Some(path.into());
        self
    }

    /// The normalized table
    #[must_use]
    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    /// Number of patient records
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    /// Where the dataset was read from, if it came from a file
    #[must_use]
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Whether `Length of Stay` was computed rather than read
    #[must_use]
    pub fn derived_length_of_stay(&self) -> bool {
        self.derived_length_of_stay
    }
}

/// Day count between discharge and admission; null when either date is null
///
/// Discharge before admission yields a negative stay, which is kept as-is.
#[must_use]
pub fn derive_length_of_stay(admission: &Date32Array, discharge: &Date32Array) -> Int64Array {
    admission
        .iter()
        .zip(discharge.iter())
        .map(|(admitted, discharged)| Some(i64::from(discharged?) - i64::from(admitted?)))
        .collect()
}

/// Derive `Length of Stay` from the already-normalized date columns
fn derive_from_columns(
    schema: &Schema,
    normalized: &[ArrayRef],
) -> Result<Int64Array> {
    let date_column = |name: &str| -> Result<&Date32Array> {
        let idx = schema.index_of(name)?;
        normalized
            .get(idx)
            .and_then(|array| array.as_any().downcast_ref::<Date32Array>())
            .ok_or_else(|| DashboardError::schema_error(format!("Column '{name}' is not a date")))
    };

    let admission = date_column(columns::DATE_OF_ADMISSION)?;
    let discharge = date_column(columns::DISCHARGE_DATE)?;
    Ok(derive_length_of_stay(admission, discharge))
}

fn report_negative_stays(batch: &RecordBatch) {
    let negative = batch
        .column_by_name(columns::LENGTH_OF_STAY)
        .and_then(|array| array.as_any().downcast_ref::<Int64Array>())
        .map_or(0, |stays| stays.iter().flatten().filter(|days| *days < 0).count());

    if negative > 0 {
        log_warning(
            &format!("{negative} records have a discharge date before their admission date"),
            None,
        );
    }
}

/// Type the CSV reader parses a column as
///
/// Patient columns are pinned to their canonical type instead of the type
/// guessed from the inference sample. Dates stay text until normalization
/// applies the configured formats. Other columns keep the inferred type.
fn csv_read_type(field: &Field) -> DataType {
    let name = field.name().as_str();
    if DATE_COLUMNS.contains(&name) {
        DataType::Utf8
    } else if is_patient_column(name) {
        canonical_type(name)
    } else {
        field.data_type().clone()
    }
}

/// Read a CSV file with a header row into a single record batch
///
/// Column names and the types of unknown columns are inferred from the
/// first `inference_rows` rows (the whole file when `None`).
pub fn read_csv(path: &Path, batch_size: usize, inference_rows: Option<usize>) -> Result<RecordBatch> {
    let mut file = safe_open_file(path, "reading CSV dataset")?;

    let (inferred, _) = Format::default()
        .with_header(true)
        .infer_schema(&mut file, inference_rows)?;
    file.rewind()?;

    let fields: Vec<Field> = inferred
        .fields()
        .iter()
        .map(|field| field.as_ref().clone().with_data_type(csv_read_type(field)))
        .collect();
    let schema = Arc::new(Schema::new(fields));
    let reader = ReaderBuilder::new(Arc::clone(&schema))
        .with_header(true)
        .with_batch_size(batch_size)
        .build(file)?;

    let batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(concat_batches(&schema, &batches)?)
}

/// Read a Parquet file into a single record batch
pub fn read_parquet(path: &Path, batch_size: usize) -> Result<RecordBatch> {
    let file = safe_open_file(path, "reading parquet dataset")?;

    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?.with_batch_size(batch_size);
    let schema = Arc::clone(builder.schema());
    let reader = builder.build()?;

    let batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(concat_batches(&schema, &batches)?)
}

/// Read the raw dataset, dispatching on the file extension
pub fn read_dataset(path: &Path, config: &DashboardConfig) -> Result<RecordBatch> {
    match DatasetFormat::from_path(path)? {
        DatasetFormat::Csv => read_csv(path, config.batch_size, config.schema_inference_rows),
        DatasetFormat::Parquet => read_parquet(path, config.batch_size),
    }
}

/// Load and normalize the dataset named by the configuration
///
/// # Errors
/// Any error here is fatal for startup: missing file, unsupported format,
/// unreadable content or missing required columns.
pub fn load_dataset(config: &DashboardConfig) -> Result<PatientDataset> {
    let path = config.dataset_path.as_path();
    let start = Instant::now();
    log_operation_start("Loading patient dataset from", path);

    let spinner = config
        .show_progress
        .then(|| create_spinner(Some("Loading patient dataset")));
    let raw = read_dataset(path, config);
    if let Some(pb) = &spinner {
        finish_and_clear(pb);
    }
    let raw = raw?;

    let dataset = PatientDataset::from_record_batch(&raw, &config.date_format_config)?.with_source(path);
    if dataset.derived_length_of_stay() {
        log::debug!("Derived '{}' from admission and discharge dates", columns::LENGTH_OF_STAY);
    }

    log_operation_complete("loaded", path, dataset.num_rows(), Some(start.elapsed()));
    Ok(dataset)
}
