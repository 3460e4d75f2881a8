//! Error taxonomy for the compensation engine
//!
//! - [`ValidationErrors`]: bad or missing case input, always reported as a complete set
//! - [`TableLoadError`]: statutory data files missing or malformed (fatal at construction)
//! - [`TableLookupError`]: a lookup key outside the loaded tables (fatal for the request)
//! - [`AggregationError`]: an upstream calculator produced an invalid amount (a defect)
//! - [`ConfigError`] / [`CaseLoadError`]: unreadable configuration or case input files

use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::case::{CaseCategory, Field};
use crate::damages::DamageCategory;

/// A single violation found while normalizing a raw case record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: Field,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: Field, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Every violation found in one normalization pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: Field, message: impl Into<String>) {
        self.errors.push(ValidationError::new(field, message));
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter()
    }

    /// Whether any violation concerns the given field
    pub fn contains(&self, field: Field) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    pub fn into_vec(self) -> Vec<ValidationError> {
        self.errors
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} validation error(s)", self.errors.len())?;
        for error in &self.errors {
            write!(f, "\n  - {}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Statutory data could not be loaded
#[derive(Debug, Error)]
pub enum TableLoadError {
    #[error("cannot read table file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse table file {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{path} line {line}: {reason}")]
    Malformed {
        path: PathBuf,
        line: u64,
        reason: String,
    },

    #[error("{path}: {reason}")]
    Incomplete { path: PathBuf, reason: String },
}

/// A lookup key fell outside the loaded statutory tables
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TableLookupError {
    #[error("no present-value coefficients configured for rate {rate}")]
    UnknownRate { rate: Decimal },

    #[error("{years} years exceeds the coefficient horizon of {max_years} years at rate {rate}")]
    HorizonExceeded {
        years: u32,
        rate: Decimal,
        max_years: u32,
    },

    #[error("grade {grade} has no schedule entry for category {category}")]
    GradeNotScheduled { grade: u8, category: CaseCategory },

    #[error("no treatment schedule {schedule} loaded")]
    TreatmentScheduleMissing { schedule: &'static str },

    #[error("no fee schedule loaded for standard {standard}")]
    FeeScheduleMissing { standard: &'static str },

    #[error("no statutory interest rate in force on {date}")]
    LegalRateUndefined { date: NaiveDate },

    #[error("no life expectancy entry at or below age {age}")]
    LifeExpectancyMissing { age: u8 },
}

/// An upstream calculator produced an amount the aggregator refuses to sum
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AggregationError {
    #[error("{category} produced a negative amount {amount}")]
    NegativeAmount {
        category: DamageCategory,
        amount: Decimal,
    },

    #[error("{category} produced an unrounded amount {amount}")]
    Unrounded {
        category: DamageCategory,
        amount: Decimal,
    },

    #[error("{category} amount {amount} exceeds the ceiling {ceiling}")]
    OutOfRange {
        category: DamageCategory,
        amount: Decimal,
        ceiling: Decimal,
    },

    #[error("{category} appears more than once")]
    DuplicateCategory { category: DamageCategory },
}

/// A calculation aborted; no partial result exists
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalculationError {
    #[error("case {case_id}: table lookup failed: {source}")]
    Lookup {
        case_id: String,
        #[source]
        source: TableLookupError,
    },

    #[error("case {case_id}: aggregation defect: {source}")]
    Aggregation {
        case_id: String,
        #[source]
        source: AggregationError,
    },
}

/// Configuration file could not be used
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config: {reason}")]
    Invalid { reason: String },
}

/// Top-level error for the raw-input convenience path
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Calculation(#[from] CalculationError),
}

/// Case input file could not be read
#[derive(Debug, Error)]
pub enum CaseLoadError {
    #[error("cannot read case file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid CSV in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{path}: unsupported case file type (expected .json or .csv)")]
    UnsupportedFormat { path: PathBuf },
}
