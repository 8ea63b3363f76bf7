//! Column catalog for the patient dataset.
//!
//! Names the source columns, groups them into categorical dimensions and
//! numeric measures, and defines the canonical Arrow schema every loaded
//! dataset is normalized into.

pub mod conversions;
pub mod date_utils;

use std::fmt;
use std::sync::Arc;

use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use serde::{Deserialize, Serialize};

pub use conversions::{convert_array, create_null_array};
pub use date_utils::{DateFormatConfig, detect_date_format, parse_date_string};

/// Source column names
pub mod columns {
    pub const PATIENT_ID: &str = "Patient ID";
    pub const GENDER: &str = "Gender";
    pub const BLOOD_TYPE: &str = "Blood Type";
    pub const MEDICAL_CONDITION: &str = "Medical Condition";
    pub const HOSPITAL: &str = "Hospital";
    pub const HOSPITAL_LATITUDE: &str = "Hospital Latitude";
    pub const HOSPITAL_LONGITUDE: &str = "Hospital Longitude";
    pub const INSURANCE_PROVIDER: &str = "Insurance Provider";
    pub const ADMISSION_TYPE: &str = "Admission Type";
    pub const DATE_OF_ADMISSION: &str = "Date of Admission";
    pub const DISCHARGE_DATE: &str = "Discharge Date";
    pub const BILLING_AMOUNT: &str = "Billing Amount";
    pub const MEDICATION: &str = "Medication";
    pub const TEST_RESULTS: &str = "Test Results";
    pub const LENGTH_OF_STAY: &str = "Length of Stay";
}

/// Columns that must be present in every dataset
pub const REQUIRED_COLUMNS: [&str; 12] = [
    columns::PATIENT_ID,
    columns::GENDER,
    columns::BLOOD_TYPE,
    columns::MEDICAL_CONDITION,
    columns::HOSPITAL,
    columns::HOSPITAL_LATITUDE,
    columns::HOSPITAL_LONGITUDE,
    columns::INSURANCE_PROVIDER,
    columns::ADMISSION_TYPE,
    columns::BILLING_AMOUNT,
    columns::MEDICATION,
    columns::TEST_RESULTS,
];

/// Columns only required when `Length of Stay` has to be derived
pub const DATE_COLUMNS: [&str; 2] = [columns::DATE_OF_ADMISSION, columns::DISCHARGE_DATE];

/// A column rows can be grouped or filtered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Dimension {
    #[serde(rename = "Gender")]
    Gender,
    #[serde(rename = "Blood Type")]
    BloodType,
    #[serde(rename = "Medical Condition")]
    MedicalCondition,
    #[serde(rename = "Hospital")]
    Hospital,
    #[serde(rename = "Insurance Provider")]
    InsuranceProvider,
    #[serde(rename = "Admission Type")]
    AdmissionType,
    #[serde(rename = "Medication")]
    Medication,
    #[serde(rename = "Test Results")]
    TestResults,
    #[serde(rename = "Hospital Latitude")]
    HospitalLatitude,
    #[serde(rename = "Hospital Longitude")]
    HospitalLongitude,
}

impl Dimension {
    /// The six dimensions exposed as filters, in control-surface order
    pub const FILTERABLE: [Self; 6] = [
        Self::Gender,
        Self::BloodType,
        Self::MedicalCondition,
        Self::Hospital,
        Self::InsuranceProvider,
        Self::AdmissionType,
    ];

    /// Name of the backing column
    #[must_use]
    pub const fn column_name(self) -> &'static str {
        match self {
            Self::Gender => columns::GENDER,
            Self::BloodType => columns::BLOOD_TYPE,
            Self::MedicalCondition => columns::MEDICAL_CONDITION,
            Self::Hospital => columns::HOSPITAL,
            Self::InsuranceProvider => columns::INSURANCE_PROVIDER,
            Self::AdmissionType => columns::ADMISSION_TYPE,
            Self::Medication => columns::MEDICATION,
            Self::TestResults => columns::TEST_RESULTS,
            Self::HospitalLatitude => columns::HOSPITAL_LATITUDE,
            Self::HospitalLongitude => columns::HOSPITAL_LONGITUDE,
        }
    }

    /// Whether the dimension is one of the six filters
    #[must_use]
    pub fn is_filterable(self) -> bool {
        Self::FILTERABLE.contains(&self)
    }

    /// Coordinates are numeric; every other dimension is text
    #[must_use]
    pub const fn is_coordinate(self) -> bool {
        matches!(self, Self::HospitalLatitude | Self::HospitalLongitude)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

/// A numeric column that can be averaged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Measure {
    #[serde(rename = "Length of Stay")]
    LengthOfStay,
    #[serde(rename = "Billing Amount")]
    BillingAmount,
}

impl Measure {
    /// Name of the backing column
    #[must_use]
    pub const fn column_name(self) -> &'static str {
        match self {
            Self::LengthOfStay => columns::LENGTH_OF_STAY,
            Self::BillingAmount => columns::BILLING_AMOUNT,
        }
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

/// Canonical type of each column after normalization
#[must_use]
pub fn canonical_type(column: &str) -> DataType {
    match column {
        columns::HOSPITAL_LATITUDE | columns::HOSPITAL_LONGITUDE | columns::BILLING_AMOUNT => {
            DataType::Float64
        }
        columns::DATE_OF_ADMISSION | columns::DISCHARGE_DATE => DataType::Date32,
        columns::LENGTH_OF_STAY => DataType::Int64,
        _ => DataType::Utf8,
    }
}

/// Whether `name` is a column of the canonical patient schema
#[must_use]
pub fn is_patient_column(name: &str) -> bool {
    REQUIRED_COLUMNS.contains(&name) || DATE_COLUMNS.contains(&name) || name == columns::LENGTH_OF_STAY
}

/// The schema of a normalized patient dataset
#[must_use]
pub fn patient_schema() -> SchemaRef {
    let fields: Vec<Field> = REQUIRED_COLUMNS
        .iter()
        .chain(DATE_COLUMNS.iter())
        .chain(std::iter::once(&columns::LENGTH_OF_STAY))
        .map(|name| Field::new(*name, canonical_type(*name), true))
        .collect();
    Arc::new(Schema::new(fields))
}

/// Names of the required columns missing from `schema`
///
/// Date columns are only required when `Length of Stay` is absent.
#[must_use]
pub fn missing_columns(schema: &Schema) -> Vec<String> {
    let has = |name: &str| schema.index_of(name).is_ok();
    let needs_dates = !has(columns::LENGTH_OF_STAY);

    REQUIRED_COLUMNS
        .iter()
        .chain(DATE_COLUMNS.iter().filter(|_| needs_dates))
        .filter(|name| !has(**name))
        .map(|name| (*name).to_string())
        .collect()
}
