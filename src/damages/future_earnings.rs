//! Future lost earnings (後遺障害逸失利益)
//!
//! annual income × labour-capacity-loss ratio × Leibniz coefficient for the
//! loss period. The period runs from symptom fixation to the retirement age,
//! or half the remaining life expectancy when that is longer, never below the
//! configured minimum. A court-set override may only shorten it.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{CalculationContext, DamageCalculator, DamageCategory, DamageLineItem, Trace};
use crate::case::{AfterEffectGrade, NormalizedCase};
use crate::config::{EngineConfig, RateSelection};
use crate::error::TableLookupError;
use crate::money::format_yen;
use crate::tables::TableStore;

/// How the loss period was arrived at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LossPeriod {
    pub years: u32,
    pub age_at_fixation: u8,
    pub to_retirement: u32,
    pub half_life_expectancy: u32,
    pub overridden: bool,
}

/// Whole years of future loss for a case
pub fn loss_period_years(
    case: &NormalizedCase,
    tables: &TableStore,
    config: &EngineConfig,
) -> Result<LossPeriod, TableLookupError> {
    let age = case.age_at_fixation();
    let to_retirement = u32::from(config.retirement_age.saturating_sub(age));
    let expectancy = tables.life.expectancy(case.victim.sex, age)?;
    let half_life_expectancy = (expectancy / Decimal::TWO).floor().to_u32().unwrap_or(0);

    let statutory = to_retirement
        .max(half_life_expectancy)
        .max(config.minimum_working_years);

    let (years, overridden) = match case.injury.loss_period_override {
        Some(limit) if limit < statutory => (limit, true),
        _ => (statutory, false),
    };

    Ok(LossPeriod {
        years,
        age_at_fixation: age,
        to_retirement,
        half_life_expectancy,
        overridden,
    })
}

fn discount_rate(ctx: &CalculationContext<'_>) -> Result<Decimal, TableLookupError> {
    match ctx.config.discount_rate {
        RateSelection::Fixed(rate) => Ok(rate),
        RateSelection::Statutory => ctx.tables.legal_rates.rate_on(ctx.case.case.accident_date),
    }
}

pub struct FutureEarnings;

impl DamageCalculator for FutureEarnings {
    fn category(&self) -> DamageCategory {
        DamageCategory::FutureEarnings
    }

    fn calculate(&self, ctx: &CalculationContext<'_>) -> Result<DamageLineItem, TableLookupError> {
        let case = ctx.case;
        let grade = match case.injury.grade {
            AfterEffectGrade::None => {
                let trace = Trace::new("no certified after-effect").input("grade", "none");
                return Ok(DamageLineItem::award(self.category(), Decimal::ZERO, trace, ctx.config));
            }
            AfterEffectGrade::Graded(grade) => grade,
        };

        let loss_ratio = ctx.tables.grades.lookup(grade, case.case.category)?.loss_ratio;
        let rate = discount_rate(ctx)?;
        let period = loss_period_years(case, ctx.tables, ctx.config)?;
        let coefficient = ctx.tables.coefficients.lookup(period.years, rate)?;

        let income = case.victim.annual_income;
        let amount = ctx.round(income * loss_ratio * coefficient);

        let mut trace = Trace::new("annual_income * loss_ratio * leibniz(years, rate)")
            .input("annual_income", format_yen(income))
            .input("loss_ratio", loss_ratio)
            .input("years", period.years)
            .input("rate", rate)
            .input("coefficient", coefficient)
            .table(ctx.tables.coefficients.version())
            .note(format!(
                "age at fixation {}: {} years to retirement, {} years half life expectancy",
                period.age_at_fixation, period.to_retirement, period.half_life_expectancy
            ));
        if period.overridden {
            trace = trace.note(format!("loss period limited to {} years", period.years));
        }

        Ok(DamageLineItem::award(self.category(), amount, trace, ctx.config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::damages::test_support::sample_case;
    use crate::tables::test_support::shipped_tables;
    use rust_decimal_macros::dec;

    fn config_retiring_at(age: u8) -> EngineConfig {
        EngineConfig {
            retirement_age: age,
            ..EngineConfig::default()
        }
    }

    #[test]
    fn test_grade_14_at_40() {
        let tables = shipped_tables();
        let config = config_retiring_at(65);
        let case = sample_case();
        let ctx = CalculationContext { case: &case, tables: &tables, config: &config };

        // 5,000,000 * 0.05 * 17.413
        let item = FutureEarnings.calculate(&ctx).unwrap();
        assert_eq!(item.amount, dec!(4353250));
        assert!(item.trace.render().contains("years=25"));
    }

    #[test]
    fn test_elderly_uses_half_life_expectancy() {
        let tables = shipped_tables();
        let config = EngineConfig::default();
        let mut case = sample_case();
        case.victim.age_at_accident = 70;

        let period = loss_period_years(&case, &tables, &config).unwrap();
        let expectancy = tables.life.expectancy(case.victim.sex, 70).unwrap();
        assert_eq!(period.to_retirement, 0);
        assert_eq!(period.years, (expectancy / Decimal::TWO).floor().to_u32().unwrap());
        assert!(period.years >= 1);
    }

    #[test]
    fn test_override_only_shortens() {
        let tables = shipped_tables();
        let config = config_retiring_at(65);
        let mut case = sample_case();

        case.injury.loss_period_override = Some(5);
        let period = loss_period_years(&case, &tables, &config).unwrap();
        assert_eq!(period.years, 5);
        assert!(period.overridden);

        case.injury.loss_period_override = Some(40);
        let period = loss_period_years(&case, &tables, &config).unwrap();
        assert_eq!(period.years, 25);
        assert!(!period.overridden);
    }

    #[test]
    fn test_statutory_rate_follows_accident_date() {
        let tables = shipped_tables();
        let config = config_retiring_at(65);
        let mut case = sample_case();
        case.case.accident_date = chrono::NaiveDate::from_ymd_opt(2019, 4, 1).unwrap();
        case.case.symptom_fixation_date = chrono::NaiveDate::from_ymd_opt(2019, 4, 30).unwrap();
        let ctx = CalculationContext { case: &case, tables: &tables, config: &config };

        let item = FutureEarnings.calculate(&ctx).unwrap();
        let coefficient = tables.coefficients.lookup(25, dec!(0.05)).unwrap();
        assert_eq!(item.amount, ctx.round(dec!(250000) * coefficient));
    }

    #[test]
    fn test_none_grade_is_zero() {
        let tables = shipped_tables();
        let config = EngineConfig::default();
        let mut case = sample_case();
        case.injury.grade = AfterEffectGrade::None;
        let ctx = CalculationContext { case: &case, tables: &tables, config: &config };
        assert_eq!(FutureEarnings.calculate(&ctx).unwrap().amount, Decimal::ZERO);
    }

    #[test]
    fn test_unknown_fixed_rate_is_lookup_error() {
        let tables = shipped_tables();
        let config = EngineConfig {
            discount_rate: RateSelection::Fixed(dec!(0.04)),
            ..EngineConfig::default()
        };
        let case = sample_case();
        let ctx = CalculationContext { case: &case, tables: &tables, config: &config };
        assert_eq!(
            FutureEarnings.calculate(&ctx),
            Err(TableLookupError::UnknownRate { rate: dec!(0.04) })
        );
    }
}
