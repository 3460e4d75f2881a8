//! CSV-based statutory table loader
//!
//! Loads the statutory data files from data/tables/. Each file is read once,
//! fingerprinted with SHA-256 and parsed into typed rows; any unparsable cell
//! fails the load with the file path and line number.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};

use super::coefficients::CoefficientRow;
use super::fees::FeeRow;
use super::grades::GradeRow;
use super::life::LifeRow;
use super::rates::LegalRateRow;
use super::treatment::TreatmentRow;
use super::wages::WageRow;
use crate::case::{CalculationStandard, CaseCategory, OccupationClass, Sex};
use crate::error::TableLoadError;

/// Default path to the table directory
pub const DEFAULT_TABLE_PATH: &str = "data/tables";

pub const COEFFICIENT_FILE: &str = "leibniz_coefficients.csv";
pub const GRADE_FILE: &str = "grade_schedule.csv";
pub const TREATMENT_FILE: &str = "treatment_schedule.csv";
pub const FEE_FILE: &str = "fee_schedule.csv";
pub const LEGAL_RATE_FILE: &str = "legal_interest_rates.csv";
pub const WAGE_FILE: &str = "average_wages.csv";
pub const LIFE_FILE: &str = "life_expectancy.csv";

/// Wildcard used in key columns for "applies to every value"
pub const WILDCARD: &str = "*";

/// A table file read into memory with its content version
pub struct SourceFile {
    pub path: PathBuf,
    /// `<file name>@<first 12 hex digits of sha256>`
    pub version: String,
    bytes: Vec<u8>,
}

impl SourceFile {
    pub fn open(dir: &Path, name: &str) -> Result<Self, TableLoadError> {
        let path = dir.join(name);
        let bytes = fs::read(&path).map_err(|source| TableLoadError::Io {
            path: path.clone(),
            source,
        })?;
        let digest = hex::encode(Sha256::digest(&bytes));
        Ok(Self {
            version: format!("{}@{}", name, &digest[..12]),
            path,
            bytes,
        })
    }

    /// Parse every data row, handing each record and its line number to `parse`
    fn rows<T>(
        &self,
        columns: usize,
        mut parse: impl FnMut(&Cell<'_>) -> Result<T, TableLoadError>,
    ) -> Result<Vec<T>, TableLoadError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(self.bytes.as_slice());

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result.map_err(|source| TableLoadError::Csv {
                path: self.path.clone(),
                source,
            })?;
            let line = record.position().map_or(0, |p| p.line());
            if record.len() != columns {
                return Err(self.malformed(
                    line,
                    format!("expected {} columns, found {}", columns, record.len()),
                ));
            }
            let cell = Cell {
                source: self,
                record: &record,
                line,
            };
            rows.push(parse(&cell)?);
        }

        if rows.is_empty() {
            return Err(TableLoadError::Incomplete {
                path: self.path.clone(),
                reason: "no data rows".to_string(),
            });
        }
        Ok(rows)
    }

    fn malformed(&self, line: u64, reason: String) -> TableLoadError {
        TableLoadError::Malformed {
            path: self.path.clone(),
            line,
            reason,
        }
    }

    /// Wrap a table-level consistency failure
    pub fn incomplete(&self, reason: String) -> TableLoadError {
        TableLoadError::Incomplete {
            path: self.path.clone(),
            reason,
        }
    }
}

/// Cell access for one CSV record
struct Cell<'a> {
    source: &'a SourceFile,
    record: &'a csv::StringRecord,
    line: u64,
}

impl Cell<'_> {
    fn text(&self, index: usize) -> &str {
        self.record.get(index).unwrap_or("")
    }

    fn parse<T: FromStr>(&self, index: usize, name: &str) -> Result<T, TableLoadError>
    where
        T::Err: std::fmt::Display,
    {
        self.text(index)
            .parse()
            .map_err(|e| self.source.malformed(self.line, format!("{} {:?}: {}", name, self.text(index), e)))
    }

    fn decimal(&self, index: usize, name: &str) -> Result<Decimal, TableLoadError> {
        self.parse::<Decimal>(index, name)
    }

    fn optional_decimal(&self, index: usize, name: &str) -> Result<Option<Decimal>, TableLoadError> {
        if self.text(index).is_empty() {
            Ok(None)
        } else {
            self.decimal(index, name).map(Some)
        }
    }

    fn date(&self, index: usize, name: &str) -> Result<NaiveDate, TableLoadError> {
        NaiveDate::parse_from_str(self.text(index), "%Y-%m-%d")
            .map_err(|e| self.source.malformed(self.line, format!("{} {:?}: {}", name, self.text(index), e)))
    }

    /// Parse a key column that may hold the wildcard
    fn keyed<T>(&self, index: usize, name: &str, parse: fn(&str) -> Option<T>) -> Result<Option<T>, TableLoadError> {
        let text = self.text(index);
        if text == WILDCARD {
            return Ok(None);
        }
        parse(text)
            .map(Some)
            .ok_or_else(|| self.source.malformed(self.line, format!("unknown {} {:?}", name, text)))
    }

    fn invalid(&self, reason: impl Into<String>) -> TableLoadError {
        self.source.malformed(self.line, reason.into())
    }
}

/// Load present-value coefficients
pub fn load_coefficients(file: &SourceFile) -> Result<Vec<CoefficientRow>, TableLoadError> {
    file.rows(3, |cell| {
        Ok(CoefficientRow {
            years: cell.parse(0, "years")?,
            rate: cell.decimal(1, "rate")?,
            multiplier: cell.decimal(2, "multiplier")?,
        })
    })
}

/// Load the after-effect grade schedule
pub fn load_grades(file: &SourceFile) -> Result<Vec<GradeRow>, TableLoadError> {
    file.rows(4, |cell| {
        Ok(GradeRow {
            grade: cell.parse(0, "grade")?,
            category: cell.keyed(1, "category", CaseCategory::parse)?,
            consolation: cell.decimal(2, "consolation")?,
            loss_ratio: cell.decimal(3, "loss_ratio")?,
        })
    })
}

/// Load the treatment-period consolation matrix
pub fn load_treatment(file: &SourceFile) -> Result<Vec<TreatmentRow>, TableLoadError> {
    file.rows(4, |cell| {
        let schedule = match cell.text(0) {
            "I" => super::treatment::Schedule::I,
            "II" => super::treatment::Schedule::II,
            other => return Err(cell.invalid(format!("unknown schedule {:?}", other))),
        };
        Ok(TreatmentRow {
            schedule,
            hospital_months: cell.parse(1, "hospital_months")?,
            outpatient_months: cell.parse(2, "outpatient_months")?,
            amount_man_yen: cell.decimal(3, "amount_man_yen")?,
        })
    })
}

/// Load fee brackets; a blank upper limit marks the open-ended top bracket
pub fn load_fees(file: &SourceFile) -> Result<Vec<FeeRow>, TableLoadError> {
    file.rows(5, |cell| {
        let standard = CalculationStandard::parse(cell.text(0))
            .ok_or_else(|| cell.invalid(format!("unknown standard {:?}", cell.text(0))))?;
        Ok(FeeRow {
            standard,
            upper_limit: cell.optional_decimal(1, "upper_limit")?,
            rate: cell.decimal(2, "rate")?,
            fixed_amount: cell.decimal(3, "fixed_amount")?,
            minimum_fee: cell.optional_decimal(4, "minimum_fee")?,
        })
    })
}

/// Load the statutory legal-interest history
pub fn load_legal_rates(file: &SourceFile) -> Result<Vec<LegalRateRow>, TableLoadError> {
    file.rows(2, |cell| {
        Ok(LegalRateRow {
            effective_from: cell.date(0, "effective_from")?,
            rate: cell.decimal(1, "rate")?,
        })
    })
}

/// Load statutory average wages
pub fn load_wages(file: &SourceFile) -> Result<Vec<WageRow>, TableLoadError> {
    file.rows(3, |cell| {
        let occupation = OccupationClass::parse(cell.text(0))
            .ok_or_else(|| cell.invalid(format!("unknown occupation {:?}", cell.text(0))))?;
        Ok(WageRow {
            occupation,
            sex: cell.keyed(1, "sex", Sex::parse)?,
            annual_wage: cell.decimal(2, "annual_wage")?,
        })
    })
}

/// Load the abridged life table
pub fn load_life(file: &SourceFile) -> Result<Vec<LifeRow>, TableLoadError> {
    file.rows(3, |cell| {
        Ok(LifeRow {
            age: cell.parse(0, "age")?,
            male: cell.decimal(1, "male")?,
            female: cell.decimal(2, "female")?,
        })
    })
}
