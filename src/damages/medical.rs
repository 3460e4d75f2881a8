use rust_decimal::Decimal;

use super::{CalculationContext, DamageCalculator, DamageCategory, DamageLineItem, Trace};
use crate::case::CostKind;
use crate::error::TableLookupError;
use crate::money::format_yen;

/// Medical expenses not already reimbursed by a payer
pub struct MedicalCosts;

impl DamageCalculator for MedicalCosts {
    fn category(&self) -> DamageCategory {
        DamageCategory::MedicalCosts
    }

    fn calculate(&self, ctx: &CalculationContext<'_>) -> Result<DamageLineItem, TableLookupError> {
        let mut claimed = Decimal::ZERO;
        let mut covered = Decimal::ZERO;
        let mut entries = 0usize;

        for cost in ctx.case.injury.costs.iter().filter(|c| c.kind == CostKind::Medical) {
            entries += 1;
            if cost.covered_by_payer {
                covered += cost.amount;
            } else {
                claimed += cost.amount;
            }
        }

        let amount = ctx.round(claimed);
        let mut trace = Trace::new("sum(medical entries not covered by payer)")
            .input("entries", entries)
            .input("claimed", format_yen(claimed));
        if covered > Decimal::ZERO {
            trace = trace.note(format!("{} yen already paid by insurer excluded", format_yen(covered)));
        }

        Ok(DamageLineItem::award(self.category(), amount, trace, ctx.config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::CostEntry;
    use crate::config::EngineConfig;
    use crate::damages::test_support::sample_case;
    use crate::tables::test_support::shipped_tables;
    use rust_decimal_macros::dec;

    fn cost(kind: CostKind, amount: Decimal, covered: bool) -> CostEntry {
        CostEntry {
            kind,
            amount,
            covered_by_payer: covered,
            description: String::new(),
        }
    }

    #[test]
    fn test_excludes_covered_and_other_kinds() {
        let tables = shipped_tables();
        let config = EngineConfig::default();
        let mut case = sample_case();
        case.injury.costs = vec![
            cost(CostKind::Medical, dec!(120000), false),
            cost(CostKind::Medical, dec!(80000), true),
            cost(CostKind::Medical, dec!(3500.4), false),
            cost(CostKind::Transportation, dec!(9000), false),
        ];
        let ctx = CalculationContext { case: &case, tables: &tables, config: &config };

        let item = MedicalCosts.calculate(&ctx).unwrap();
        assert_eq!(item.amount, dec!(123500));
        assert!(item.trace.render().contains("80,000"));
    }

    #[test]
    fn test_no_entries_is_zero() {
        let tables = shipped_tables();
        let config = EngineConfig::default();
        let case = sample_case();
        let ctx = CalculationContext { case: &case, tables: &tables, config: &config };
        assert_eq!(MedicalCosts.calculate(&ctx).unwrap().amount, Decimal::ZERO);
    }
}
