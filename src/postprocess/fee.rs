use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::case::CalculationStandard;
use crate::damages::Trace;
use crate::error::TableLookupError;
use crate::money::{format_yen, Rounding};
use crate::tables::FeeSchedule;

/// Professional fee on the post-offset total
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeResult {
    pub standard: CalculationStandard,
    pub amount: Decimal,
    pub rate: Decimal,
    pub fixed_amount: Decimal,
    /// The bracket minimum raised the fee
    pub minimum_applied: bool,
    pub trace: Trace,
}

/// max(total × rate + fixed amount, minimum fee), from the bracket containing the total
pub fn professional_fee(
    total: Decimal,
    standard: CalculationStandard,
    schedule: &FeeSchedule,
    rounding: Rounding,
) -> Result<FeeResult, TableLookupError> {
    let brackets = schedule.brackets(standard)?;
    let base = total.max(Decimal::ZERO);

    if base.is_zero() {
        return Ok(FeeResult {
            standard,
            amount: Decimal::ZERO,
            rate: Decimal::ZERO,
            fixed_amount: Decimal::ZERO,
            minimum_applied: false,
            trace: Trace::new("no award, no fee").input("standard", standard),
        });
    }

    let bracket = brackets
        .iter()
        .find(|b| b.contains(base))
        .ok_or(TableLookupError::FeeScheduleMissing {
            standard: standard.as_str(),
        })?;
    let computed = rounding.round(base * bracket.rate + bracket.fixed_amount);
    let minimum = bracket.minimum_fee.map(|m| rounding.round(m));
    let (amount, minimum_applied) = match minimum {
        Some(minimum) if minimum > computed => (minimum, true),
        _ => (computed, false),
    };

    let limit = bracket
        .upper_limit
        .map_or_else(|| "open".to_string(), format_yen);
    let mut trace = Trace::new("max(total * rate + fixed_amount, minimum_fee)")
        .input("standard", standard)
        .input("total", format_yen(base))
        .input("bracket_upper_limit", limit)
        .input("rate", bracket.rate)
        .input("fixed_amount", format_yen(bracket.fixed_amount))
        .table(schedule.version());
    if let Some(minimum) = minimum {
        trace = trace.input("minimum_fee", format_yen(minimum));
    }
    if minimum_applied {
        trace = trace.note(format!("bracket minimum replaces computed fee {}", format_yen(computed)));
    }

    Ok(FeeResult {
        standard,
        amount,
        rate: bracket.rate,
        fixed_amount: bracket.fixed_amount,
        minimum_applied,
        trace,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::test_support::shipped_tables;
    use rust_decimal_macros::dec;

    fn fee(total: Decimal, standard: CalculationStandard) -> Decimal {
        professional_fee(total, standard, &shipped_tables().fees, Rounding::HalfUp)
            .unwrap()
            .amount
    }

    #[test]
    fn test_old_standard_brackets() {
        assert_eq!(fee(dec!(1000000), CalculationStandard::Old), dec!(240000));
        assert_eq!(fee(dec!(3000000), CalculationStandard::Old), dec!(720000));
        // 6,144,209 * 0.15 + 270,000
        assert_eq!(fee(dec!(6144209), CalculationStandard::Old), dec!(1191631));
        assert_eq!(fee(dec!(100000000), CalculationStandard::Old), dec!(11070000));
        assert_eq!(fee(dec!(400000000), CalculationStandard::Old), dec!(35070000));
    }

    #[test]
    fn test_bracket_minimum_fee() {
        let result = professional_fee(
            dec!(500000),
            CalculationStandard::Old,
            &shipped_tables().fees,
            Rounding::HalfUp,
        )
        .unwrap();
        // 500,000 * 0.24 = 120,000 is below the 200,000 floor
        assert_eq!(result.amount, dec!(200000));
        assert!(result.minimum_applied);
        assert!(result.trace.render().contains("minimum_fee=200,000"));

        // 0.24 * 1,000,000 clears the floor
        let above = professional_fee(
            dec!(1000000),
            CalculationStandard::Old,
            &shipped_tables().fees,
            Rounding::HalfUp,
        )
        .unwrap();
        assert_eq!(above.amount, dec!(240000));
        assert!(!above.minimum_applied);
    }

    #[test]
    fn test_new_standard_flat_rate() {
        assert_eq!(fee(dec!(6144209), CalculationStandard::New), dec!(614421));
    }

    #[test]
    fn test_zero_total_has_no_fee() {
        assert_eq!(fee(Decimal::ZERO, CalculationStandard::Old), Decimal::ZERO);
    }
}
