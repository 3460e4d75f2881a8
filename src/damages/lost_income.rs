use rust_decimal::Decimal;

use super::{CalculationContext, DamageCalculator, DamageCategory, DamageLineItem, Trace};
use crate::error::TableLookupError;
use crate::money::format_yen;

/// Income lost while off work during treatment
///
/// annual income / divisor × lost working days, where the divisor is the
/// per-category daily-rate basis from the configuration.
pub struct LostIncome;

impl DamageCalculator for LostIncome {
    fn category(&self) -> DamageCategory {
        DamageCategory::LostIncome
    }

    fn calculate(&self, ctx: &CalculationContext<'_>) -> Result<DamageLineItem, TableLookupError> {
        let victim = &ctx.case.victim;
        let days = ctx.case.injury.lost_work_days;
        let divisor = ctx
            .config
            .income_divisors
            .for_category(ctx.case.case.category)
            .divisor()
            .max(1);

        let raw = victim.annual_income * Decimal::from(days) / Decimal::from(divisor);
        let amount = ctx.round(raw);

        let trace = Trace::new("annual_income / divisor * lost_work_days")
            .input("annual_income", format_yen(victim.annual_income))
            .input("income_basis", format!("{:?}", victim.income_basis))
            .input("divisor", divisor)
            .input("lost_work_days", days);

        Ok(DamageLineItem::award(self.category(), amount, trace, ctx.config))
    }
}
