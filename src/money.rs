//! Whole-yen rounding applied uniformly to every monetary sub-result

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Rounding mode for monetary amounts
///
/// One mode is configured per engine and used on every path, so accumulated
/// drift is identical between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rounding {
    /// Round half away from zero (四捨五入)
    #[default]
    HalfUp,
    /// Truncate toward zero (切り捨て)
    Down,
    /// Round away from zero (切り上げ)
    Up,
}

impl Rounding {
    /// Round to whole units
    pub fn round(self, amount: Decimal) -> Decimal {
        let strategy = match self {
            Rounding::HalfUp => RoundingStrategy::MidpointAwayFromZero,
            Rounding::Down => RoundingStrategy::ToZero,
            Rounding::Up => RoundingStrategy::AwayFromZero,
        };
        amount.round_dp_with_strategy(0, strategy).normalize()
    }
}

/// Format a whole amount with thousands separators, e.g. `1,234,567`
pub fn format_yen(amount: Decimal) -> String {
    let text = amount.trunc().abs().to_string();
    let mut grouped = String::with_capacity(text.len() + text.len() / 3);
    for (i, ch) in text.chars().enumerate() {
        if i > 0 && (text.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if amount.is_sign_negative() && !amount.trunc().is_zero() {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_half_up_rounds_midpoint_away() {
        assert_eq!(Rounding::HalfUp.round(dec!(410958.5)), dec!(410959));
        assert_eq!(Rounding::HalfUp.round(dec!(410958.49)), dec!(410958));
    }

    #[test]
    fn test_down_and_up() {
        assert_eq!(Rounding::Down.round(dec!(99.99)), dec!(99));
        assert_eq!(Rounding::Up.round(dec!(99.01)), dec!(100));
        assert_eq!(Rounding::Up.round(dec!(99)), dec!(99));
    }

    #[test]
    fn test_rounded_amount_has_no_scale() {
        let rounded = Rounding::HalfUp.round(dec!(1200.000));
        assert_eq!(rounded.scale(), 0);
    }

    #[test]
    fn test_format_yen() {
        assert_eq!(format_yen(dec!(0)), "0");
        assert_eq!(format_yen(dec!(999)), "999");
        assert_eq!(format_yen(dec!(1000)), "1,000");
        assert_eq!(format_yen(dec!(6144209)), "6,144,209");
        assert_eq!(format_yen(dec!(-25000)), "-25,000");
    }
}
