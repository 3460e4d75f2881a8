//! Aggregation of line items, offsets, fee and interest into the final result

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::case::{CalculationStandard, NormalizedCase};
use crate::damages::{DamageCategory, DamageLineItem};
use crate::error::AggregationError;
use crate::offset::OffsetSummary;
use crate::postprocess::{FeeResult, InterestResult, PostProcessed};

/// Itemized, reproducible damage award for one case
///
/// Immutable once produced; recalculation yields a new value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationResult {
    pub case_id: String,
    /// Fingerprint of the normalized input
    pub fingerprint: String,
    pub standard: CalculationStandard,
    pub table_version: String,
    /// One item per category, in category order
    pub line_items: Vec<DamageLineItem>,
    pub subtotals: BTreeMap<DamageCategory, Decimal>,
    /// Sum of category subtotals before any offset
    pub gross_total: Decimal,
    pub offset: OffsetSummary,
    pub post_offset_total: Decimal,
    pub fee: FeeResult,
    pub interest: InterestResult,
    /// post-offset total + fee + interest
    pub grand_total: Decimal,
}

impl CalculationResult {
    pub fn subtotal(&self, category: DamageCategory) -> Decimal {
        self.subtotals.get(&category).copied().unwrap_or(Decimal::ZERO)
    }
}

/// Validates upstream amounts and merges them deterministically
#[derive(Debug, Clone, Copy)]
pub struct Aggregator {
    ceiling: Decimal,
}

impl Aggregator {
    pub fn new(ceiling: Decimal) -> Self {
        Self { ceiling }
    }

    fn check(&self, item: &DamageLineItem) -> Result<(), AggregationError> {
        let category = item.category;
        let amount = item.amount;
        if amount < Decimal::ZERO {
            return Err(AggregationError::NegativeAmount { category, amount });
        }
        if amount.fract() != Decimal::ZERO {
            return Err(AggregationError::Unrounded { category, amount });
        }
        if amount > self.ceiling {
            return Err(AggregationError::OutOfRange {
                category,
                amount,
                ceiling: self.ceiling,
            });
        }
        Ok(())
    }

    /// Reject any invalid item before it is summed; invalid amounts are never clamped
    pub fn validate(&self, items: &[DamageLineItem]) -> Result<(), AggregationError> {
        let mut seen = Vec::with_capacity(items.len());
        for item in items {
            if seen.contains(&item.category) {
                return Err(AggregationError::DuplicateCategory {
                    category: item.category,
                });
            }
            seen.push(item.category);
            self.check(item)?;
        }
        Ok(())
    }

    pub fn aggregate(
        &self,
        case: &NormalizedCase,
        mut items: Vec<DamageLineItem>,
        offset: OffsetSummary,
        post: PostProcessed,
        table_version: &str,
    ) -> Result<CalculationResult, AggregationError> {
        if let Err(err) = self.validate(&items) {
            log::error!("Case {}: {}", case.case.id, err);
            return Err(err);
        }
        items.sort_by_key(|item| item.category);

        let subtotals: BTreeMap<DamageCategory, Decimal> = items
            .iter()
            .map(|item| (item.category, item.signed_amount()))
            .collect();
        let gross_total: Decimal = subtotals.values().copied().sum();
        let post_offset_total = offset.post_offset_total;
        let grand_total = post_offset_total + post.total();

        Ok(CalculationResult {
            case_id: case.case.id.clone(),
            fingerprint: case.fingerprint(),
            standard: case.case.standard,
            table_version: table_version.to_string(),
            line_items: items,
            subtotals,
            gross_total,
            offset,
            post_offset_total,
            fee: post.fee,
            interest: post.interest,
            grand_total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::damages::test_support::sample_case;
    use crate::damages::Trace;
    use crate::money::Rounding;
    use crate::offset::apply_offsets;
    use crate::postprocess::post_process;
    use crate::tables::test_support::shipped_tables;
    use rust_decimal_macros::dec;

    fn item(category: DamageCategory, amount: Decimal) -> DamageLineItem {
        DamageLineItem::award(category, amount, Trace::new("t"), &EngineConfig::default())
    }

    fn run(items: Vec<DamageLineItem>) -> Result<CalculationResult, AggregationError> {
        let tables = shipped_tables();
        let config = EngineConfig::default();
        let case = sample_case();
        let offset = apply_offsets(&items, Decimal::ZERO, Decimal::ZERO, Rounding::HalfUp);
        let post = post_process(offset.post_offset_total, &case, &tables, &config).unwrap();
        Aggregator::new(config.max_line_amount).aggregate(&case, items, offset, post, tables.version())
    }

    #[test]
    fn test_merge_restores_category_order() {
        let result = run(vec![
            item(DamageCategory::FutureEarnings, dec!(300)),
            item(DamageCategory::MedicalCosts, dec!(100)),
        ])
        .unwrap();

        assert_eq!(result.line_items[0].category, DamageCategory::MedicalCosts);
        assert_eq!(result.gross_total, dec!(400));
        assert_eq!(result.post_offset_total, dec!(400));
        assert_eq!(
            result.grand_total,
            result.post_offset_total + result.fee.amount + result.interest.amount
        );
        assert_eq!(result.subtotal(DamageCategory::LostIncome), Decimal::ZERO);
    }

    #[test]
    fn test_rejects_invalid_amounts() {
        assert!(matches!(
            run(vec![item(DamageCategory::LostIncome, dec!(-1))]),
            Err(AggregationError::NegativeAmount { .. })
        ));
        assert!(matches!(
            run(vec![item(DamageCategory::LostIncome, dec!(10.5))]),
            Err(AggregationError::Unrounded { .. })
        ));
        assert!(matches!(
            run(vec![item(DamageCategory::LostIncome, dec!(1000000000000001))]),
            Err(AggregationError::OutOfRange { .. })
        ));
        assert!(matches!(
            run(vec![
                item(DamageCategory::LostIncome, dec!(1)),
                item(DamageCategory::LostIncome, dec!(2)),
            ]),
            Err(AggregationError::DuplicateCategory { .. })
        ));
    }
}
