//! Damage item calculators
//!
//! One calculator per damage category. Each is a pure function of the
//! normalized case, the statutory tables and the configuration, and returns a
//! single line item with a trace that reconstructs its arithmetic. Calculators
//! never see each other's output, so they may run in any order or in parallel.

mod after_effect;
mod future_earnings;
mod incidental;
mod lost_income;
mod medical;
mod trace;
mod treatment;

pub use after_effect::AfterEffectConsolation;
pub use future_earnings::{loss_period_years, FutureEarnings, LossPeriod};
pub use incidental::IncidentalCosts;
pub use lost_income::LostIncome;
pub use medical::MedicalCosts;
pub use trace::Trace;
pub use treatment::TreatmentConsolation;

use std::fmt;

use rayon::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::case::NormalizedCase;
use crate::config::EngineConfig;
use crate::error::TableLookupError;
use crate::tables::TableStore;

/// Damage categories in result order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageCategory {
    MedicalCosts,
    IncidentalCosts,
    LostIncome,
    TreatmentConsolation,
    AfterEffectConsolation,
    FutureEarnings,
}

impl DamageCategory {
    pub const ALL: [DamageCategory; 6] = [
        DamageCategory::MedicalCosts,
        DamageCategory::IncidentalCosts,
        DamageCategory::LostIncome,
        DamageCategory::TreatmentConsolation,
        DamageCategory::AfterEffectConsolation,
        DamageCategory::FutureEarnings,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DamageCategory::MedicalCosts => "medical_costs",
            DamageCategory::IncidentalCosts => "incidental_costs",
            DamageCategory::LostIncome => "lost_income",
            DamageCategory::TreatmentConsolation => "treatment_consolation",
            DamageCategory::AfterEffectConsolation => "after_effect_consolation",
            DamageCategory::FutureEarnings => "future_earnings",
        }
    }

    /// Label used on printed statements
    pub fn label(&self) -> &'static str {
        match self {
            DamageCategory::MedicalCosts => "治療費",
            DamageCategory::IncidentalCosts => "入院雑費・交通費等",
            DamageCategory::LostIncome => "休業損害",
            DamageCategory::TreatmentConsolation => "入通院慰謝料",
            DamageCategory::AfterEffectConsolation => "後遺障害慰謝料",
            DamageCategory::FutureEarnings => "後遺障害逸失利益",
        }
    }
}

impl fmt::Display for DamageCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a line adds to or reduces the award
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Award,
    Deduction,
}

/// One itemized damage amount
///
/// `amount` is always non-negative whole yen; `direction` gives the sign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageLineItem {
    pub category: DamageCategory,
    pub amount: Decimal,
    pub direction: Direction,
    /// Subject to the negligence offset
    pub offsettable: bool,
    pub trace: Trace,
}

impl DamageLineItem {
    /// An award line, offsettable unless the category is configured exempt
    pub fn award(category: DamageCategory, amount: Decimal, trace: Trace, config: &EngineConfig) -> Self {
        Self {
            category,
            amount,
            direction: Direction::Award,
            offsettable: !config.offset_exempt.contains(&category),
            trace,
        }
    }

    pub fn signed_amount(&self) -> Decimal {
        match self.direction {
            Direction::Award => self.amount,
            Direction::Deduction => -self.amount,
        }
    }
}

/// Inputs shared by every calculator for one case
#[derive(Clone, Copy)]
pub struct CalculationContext<'a> {
    pub case: &'a NormalizedCase,
    pub tables: &'a TableStore,
    pub config: &'a EngineConfig,
}

impl CalculationContext<'_> {
    pub fn round(&self, amount: Decimal) -> Decimal {
        self.config.rounding.round(amount)
    }
}

/// A calculator for one damage category
pub trait DamageCalculator: Send + Sync {
    fn category(&self) -> DamageCategory;

    fn calculate(&self, ctx: &CalculationContext<'_>) -> Result<DamageLineItem, TableLookupError>;
}

/// Every calculator, in `DamageCategory::ALL` order
pub fn standard_calculators() -> Vec<Box<dyn DamageCalculator>> {
    vec![
        Box::new(MedicalCosts),
        Box::new(IncidentalCosts),
        Box::new(LostIncome),
        Box::new(TreatmentConsolation),
        Box::new(AfterEffectConsolation),
        Box::new(FutureEarnings),
    ]
}

/// Run calculators sequentially or on the rayon pool; output keeps input order
pub fn run_calculators(
    calculators: &[Box<dyn DamageCalculator>],
    ctx: &CalculationContext<'_>,
    parallel: bool,
) -> Result<Vec<DamageLineItem>, TableLookupError> {
    if parallel {
        calculators.par_iter().map(|c| c.calculate(ctx)).collect()
    } else {
        calculators.iter().map(|c| c.calculate(ctx)).collect()
    }
}
