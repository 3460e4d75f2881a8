//! Professional fee brackets per calculation standard

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::case::CalculationStandard;
use crate::error::TableLookupError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeRow {
    pub standard: CalculationStandard,
    /// Inclusive upper bound; `None` for the open-ended top bracket
    pub upper_limit: Option<Decimal>,
    pub rate: Decimal,
    pub fixed_amount: Decimal,
    pub minimum_fee: Option<Decimal>,
}

/// fee = max(base × rate + fixed_amount, minimum_fee) for a base up to `upper_limit`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeBracket {
    pub upper_limit: Option<Decimal>,
    pub rate: Decimal,
    pub fixed_amount: Decimal,
    /// Floor on the computed fee within this bracket
    pub minimum_fee: Option<Decimal>,
}

impl FeeBracket {
    pub fn contains(&self, amount: Decimal) -> bool {
        self.upper_limit.map_or(true, |limit| amount <= limit)
    }
}

#[derive(Debug, Clone)]
pub struct FeeSchedule {
    brackets: BTreeMap<CalculationStandard, Vec<FeeBracket>>,
    version: String,
}

impl FeeSchedule {
    /// Build from rows; each standard needs ascending limits ending open-ended
    pub fn from_rows(rows: &[FeeRow], version: impl Into<String>) -> Result<Self, String> {
        let mut brackets: BTreeMap<CalculationStandard, Vec<FeeBracket>> = BTreeMap::new();
        for row in rows {
            if row.rate < Decimal::ZERO
                || row.fixed_amount < Decimal::ZERO
                || row.minimum_fee.is_some_and(|m| m < Decimal::ZERO)
            {
                return Err(format!(
                    "standard {}: negative rate, fixed amount or minimum fee",
                    row.standard
                ));
            }
            brackets.entry(row.standard).or_default().push(FeeBracket {
                upper_limit: row.upper_limit,
                rate: row.rate,
                fixed_amount: row.fixed_amount,
                minimum_fee: row.minimum_fee,
            });
        }

        for (standard, list) in brackets.iter_mut() {
            list.sort_by(|a, b| match (a.upper_limit, b.upper_limit) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            });
            let open_ended = list.iter().filter(|b| b.upper_limit.is_none()).count();
            if open_ended != 1 {
                return Err(format!(
                    "standard {}: expected exactly one open-ended bracket, found {}",
                    standard, open_ended
                ));
            }
            let limits: Vec<Decimal> = list.iter().filter_map(|b| b.upper_limit).collect();
            if limits.windows(2).any(|w| w[0] == w[1]) {
                return Err(format!("standard {}: duplicate upper limit", standard));
            }
        }

        Ok(Self {
            brackets,
            version: version.into(),
        })
    }

    /// Brackets for a standard in ascending order
    pub fn brackets(&self, standard: CalculationStandard) -> Result<&[FeeBracket], TableLookupError> {
        self.brackets
            .get(&standard)
            .map(Vec::as_slice)
            .ok_or(TableLookupError::FeeScheduleMissing {
                standard: standard.as_str(),
            })
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}
