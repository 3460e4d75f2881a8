use rust_decimal::Decimal;

use super::{CalculationContext, DamageCalculator, DamageCategory, DamageLineItem, Trace};
use crate::case::CostKind;
use crate::error::TableLookupError;
use crate::money::format_yen;

/// Hospitalization allowance plus non-covered transport, nursing and other expenses
pub struct IncidentalCosts;

impl DamageCalculator for IncidentalCosts {
    fn category(&self) -> DamageCategory {
        DamageCategory::IncidentalCosts
    }

    fn calculate(&self, ctx: &CalculationContext<'_>) -> Result<DamageLineItem, TableLookupError> {
        let injury = &ctx.case.injury;
        let daily = ctx.config.hospital_allowance_daily;
        let allowance = daily * Decimal::from(injury.hospitalization_days);

        let ancillary: Decimal = injury
            .costs
            .iter()
            .filter(|c| c.kind != CostKind::Medical && !c.covered_by_payer)
            .map(|c| c.amount)
            .sum();

        let amount = ctx.round(allowance + ancillary);
        let trace = Trace::new("daily_allowance * hospitalization_days + ancillary")
            .input("daily_allowance", format_yen(daily))
            .input("hospitalization_days", injury.hospitalization_days)
            .input("ancillary", format_yen(ancillary));

        Ok(DamageLineItem::award(self.category(), amount, trace, ctx.config))
    }
}
