//! Engine configuration
//!
//! Held by the engine for its whole life. Every field has a default matching
//! the usual calculation settings, so a JSON config file only needs to name
//! what differs.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::case::{CalculationStandard, CaseCategory};
use crate::damages::DamageCategory;
use crate::error::ConfigError;
use crate::money::Rounding;
use crate::tables::loader::DEFAULT_TABLE_PATH;

/// Where an annual rate comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateSelection {
    /// A fixed annual rate
    Fixed(Decimal),
    /// The statutory legal rate in force on the governing date
    Statutory,
}

/// Day-count basis for interest accrual
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayCount {
    #[default]
    Actual365,
    Actual360,
}

impl DayCount {
    pub fn basis(&self) -> Decimal {
        match self {
            DayCount::Actual365 => dec!(365),
            DayCount::Actual360 => dec!(360),
        }
    }
}

/// Divisor turning annual income into a daily rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DailyRateBasis {
    /// 365 calendar days
    CalendarDays,
    /// A count of working days per year
    WorkingDays(u32),
}

impl DailyRateBasis {
    pub fn divisor(&self) -> u32 {
        match self {
            DailyRateBasis::CalendarDays => 365,
            DailyRateBasis::WorkingDays(days) => *days,
        }
    }
}

/// Daily-rate divisor per case category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IncomeDivisors {
    pub traffic: DailyRateBasis,
    pub workplace: DailyRateBasis,
    pub medical_malpractice: DailyRateBasis,
}

impl Default for IncomeDivisors {
    fn default() -> Self {
        Self {
            traffic: DailyRateBasis::CalendarDays,
            workplace: DailyRateBasis::WorkingDays(250),
            medical_malpractice: DailyRateBasis::CalendarDays,
        }
    }
}

impl IncomeDivisors {
    pub fn for_category(&self, category: CaseCategory) -> DailyRateBasis {
        match category {
            CaseCategory::Traffic => self.traffic,
            CaseCategory::Workplace => self.workplace,
            CaseCategory::MedicalMalpractice => self.medical_malpractice,
        }
    }
}

/// Conventions for reading the treatment-period matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreatmentConventions {
    pub days_per_month: u32,
    /// Outpatient period cap as a multiple of actual visit days, Schedule I
    pub sparse_visit_multiplier: Decimal,
    /// Same cap for Schedule II
    pub sparse_visit_multiplier_soft_tissue: Decimal,
}

impl Default for TreatmentConventions {
    fn default() -> Self {
        Self {
            days_per_month: 30,
            sparse_visit_multiplier: dec!(3.5),
            sparse_visit_multiplier_soft_tissue: dec!(3),
        }
    }
}

/// Configuration for the compensation engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Standard used when a case does not name one
    pub default_standard: CalculationStandard,

    /// Interest rate; statutory selection uses the accrual start date
    pub interest_rate: RateSelection,

    /// Discount rate for future losses; statutory selection uses the accident date
    pub discount_rate: RateSelection,

    pub rounding: Rounding,

    /// Day count for interest under the old standard
    pub old_standard_day_count: DayCount,

    /// Day count for interest under the new standard
    pub new_standard_day_count: DayCount,

    /// Count the reference date itself as an accrual day
    pub interest_end_inclusive: bool,

    pub accrue_interest: bool,

    pub table_dir: PathBuf,

    pub retirement_age: u8,

    /// Floor on the future-loss period in years for graded cases
    pub minimum_working_years: u32,

    pub income_divisors: IncomeDivisors,

    /// Categories excluded from the negligence offset and added back in full
    pub offset_exempt: BTreeSet<DamageCategory>,

    /// Daily allowance for incidental hospitalization expenses
    pub hospital_allowance_daily: Decimal,

    pub treatment: TreatmentConventions,

    /// Run damage calculators on the rayon pool
    pub parallel: bool,

    /// Sanity ceiling for any single amount
    pub max_line_amount: Decimal,

    /// Largest income, prior payment or cost total accepted from a case record
    pub max_input_amount: Decimal,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_standard: CalculationStandard::Old,
            interest_rate: RateSelection::Fixed(dec!(0.03)),
            discount_rate: RateSelection::Statutory,
            rounding: Rounding::HalfUp,
            old_standard_day_count: DayCount::Actual365,
            new_standard_day_count: DayCount::Actual365,
            interest_end_inclusive: true,
            accrue_interest: true,
            table_dir: PathBuf::from(DEFAULT_TABLE_PATH),
            retirement_age: 67,
            minimum_working_years: 1,
            income_divisors: IncomeDivisors::default(),
            offset_exempt: BTreeSet::new(),
            hospital_allowance_daily: dec!(1500),
            treatment: TreatmentConventions::default(),
            parallel: false,
            max_line_amount: dec!(1000000000000000),
            max_input_amount: dec!(1000000000000),
        }
    }
}

impl EngineConfig {
    /// Read a JSON config file; missing fields take their defaults
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings no calculation can use
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| {
            Err(ConfigError::Invalid {
                reason: reason.to_string(),
            })
        };
        if self.treatment.days_per_month == 0 {
            return invalid("treatment.days_per_month must be positive");
        }
        for category in CaseCategory::ALL {
            if self.income_divisors.for_category(category).divisor() == 0 {
                return invalid("income divisors must be positive");
            }
        }
        for selection in [self.interest_rate, self.discount_rate] {
            if let RateSelection::Fixed(rate) = selection {
                if rate < Decimal::ZERO {
                    return invalid("rates must not be negative");
                }
            }
        }
        if self.hospital_allowance_daily < Decimal::ZERO || self.max_line_amount <= Decimal::ZERO {
            return invalid("allowance must be non-negative and the ceiling positive");
        }
        if self.max_input_amount <= Decimal::ZERO || self.max_input_amount > self.max_line_amount {
            return invalid("max_input_amount must be positive and at most max_line_amount");
        }
        Ok(())
    }

    pub fn day_count(&self, standard: CalculationStandard) -> DayCount {
        match standard {
            CalculationStandard::Old => self.old_standard_day_count,
            CalculationStandard::New => self.new_standard_day_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.default_standard, CalculationStandard::Old);
        assert_eq!(config.interest_rate, RateSelection::Fixed(dec!(0.03)));
        assert_eq!(config.retirement_age, 67);
        assert_eq!(config.day_count(CalculationStandard::New).basis(), dec!(365));
        assert_eq!(config.income_divisors.for_category(CaseCategory::Workplace).divisor(), 250);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "default_standard": "new",
                "interest_rate": "statutory",
                "discount_rate": {{"fixed": "0.05"}},
                "rounding": "down",
                "new_standard_day_count": "actual360",
                "offset_exempt": ["medical_costs"],
                "income_divisors": {{"traffic": {{"working_days": 240}}}}
            }}"#
        )
        .unwrap();

        let config = EngineConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.default_standard, CalculationStandard::New);
        assert_eq!(config.interest_rate, RateSelection::Statutory);
        assert_eq!(config.discount_rate, RateSelection::Fixed(dec!(0.05)));
        assert_eq!(config.rounding, Rounding::Down);
        assert_eq!(config.day_count(CalculationStandard::New), DayCount::Actual360);
        assert!(config.offset_exempt.contains(&DamageCategory::MedicalCosts));
        assert_eq!(config.income_divisors.traffic.divisor(), 240);
        assert_eq!(config.income_divisors.workplace.divisor(), 250);
        assert_eq!(config.retirement_age, 67);
    }

    #[test]
    fn test_invalid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{\"retirement_age\": \"old\"}}").unwrap();
        assert!(matches!(
            EngineConfig::from_json_file(file.path()),
            Err(ConfigError::Parse { .. })
        ));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{\"treatment\": {{\"days_per_month\": 0}}}}").unwrap();
        assert!(matches!(
            EngineConfig::from_json_file(file.path()),
            Err(ConfigError::Invalid { .. })
        ));

        let above_ceiling = EngineConfig {
            max_input_amount: dec!(2000000000000000),
            ..EngineConfig::default()
        };
        assert!(matches!(above_ceiling.validate(), Err(ConfigError::Invalid { .. })));

        assert!(matches!(
            EngineConfig::from_json_file(Path::new("/nonexistent/config.json")),
            Err(ConfigError::Io { .. })
        ));
    }
}
