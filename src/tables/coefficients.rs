//! Present-value (Leibniz) coefficient table
//!
//! Maps (whole years, annual rate) to the multiplier that discounts a level
//! annual loss stream to its value at the calculation date. Rates are discrete
//! legal values; there is no interpolation between rates and no extrapolation
//! beyond the horizon loaded for a rate.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::error::TableLookupError;

/// One row of the coefficient file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoefficientRow {
    pub years: u32,
    pub rate: Decimal,
    pub multiplier: Decimal,
}

/// Immutable coefficient table, versioned by its source file
#[derive(Debug, Clone)]
pub struct CoefficientTable {
    /// Multipliers per rate, index = years - 1
    by_rate: BTreeMap<Decimal, Vec<Decimal>>,
    version: String,
}

impl CoefficientTable {
    /// Build from rows; every rate must cover 1..=horizon without gaps
    pub fn from_rows(rows: &[CoefficientRow], version: impl Into<String>) -> Result<Self, String> {
        let mut grouped: BTreeMap<Decimal, BTreeMap<u32, Decimal>> = BTreeMap::new();

        for row in rows {
            if row.years == 0 {
                return Err(format!("rate {}: years must start at 1", row.rate));
            }
            if row.rate <= Decimal::ZERO {
                return Err(format!("rate {} must be positive", row.rate));
            }
            if row.multiplier <= Decimal::ZERO {
                return Err(format!(
                    "rate {} year {}: multiplier must be positive",
                    row.rate, row.years
                ));
            }
            let per_rate = grouped.entry(row.rate.normalize()).or_default();
            if per_rate.insert(row.years, row.multiplier).is_some() {
                return Err(format!("duplicate entry for {} years at rate {}", row.years, row.rate));
            }
        }

        if grouped.is_empty() {
            return Err("no coefficients".to_string());
        }

        let mut by_rate = BTreeMap::new();
        for (rate, per_year) in grouped {
            let horizon = per_year.len() as u32;
            if per_year.keys().copied().ne(1..=horizon) {
                return Err(format!("rate {}: years are not contiguous from 1", rate));
            }
            by_rate.insert(rate, per_year.into_values().collect());
        }

        Ok(Self {
            by_rate,
            version: version.into(),
        })
    }

    /// Multiplier for `years` whole years at `rate`
    ///
    /// Zero years means no future loss stream and yields zero.
    pub fn lookup(&self, years: u32, rate: Decimal) -> Result<Decimal, TableLookupError> {
        let multipliers = self
            .by_rate
            .get(&rate.normalize())
            .ok_or(TableLookupError::UnknownRate { rate })?;

        if years == 0 {
            return Ok(Decimal::ZERO);
        }

        multipliers
            .get(years as usize - 1)
            .copied()
            .ok_or(TableLookupError::HorizonExceeded {
                years,
                rate,
                max_years: multipliers.len() as u32,
            })
    }

    /// Longest duration loaded for a rate
    pub fn max_horizon(&self, rate: Decimal) -> Option<u32> {
        self.by_rate.get(&rate.normalize()).map(|m| m.len() as u32)
    }

    /// Rates with loaded coefficients
    pub fn rates(&self) -> impl Iterator<Item = Decimal> + '_ {
        self.by_rate.keys().copied()
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::test_support::table_dir;
    use crate::tables::TableStore;
    use approx::assert_abs_diff_eq;
    use rust_decimal::prelude::ToPrimitive;
    use rust_decimal_macros::dec;

    fn small_table() -> CoefficientTable {
        let rows = vec![
            CoefficientRow { years: 1, rate: dec!(0.03), multiplier: dec!(0.971) },
            CoefficientRow { years: 2, rate: dec!(0.03), multiplier: dec!(1.913) },
            CoefficientRow { years: 3, rate: dec!(0.03), multiplier: dec!(2.829) },
        ];
        CoefficientTable::from_rows(&rows, "test").unwrap()
    }

    #[test]
    fn test_lookup_within_horizon() {
        let table = small_table();
        assert_eq!(table.lookup(2, dec!(0.03)).unwrap(), dec!(1.913));
        assert_eq!(table.lookup(2, dec!(0.030)).unwrap(), dec!(1.913));
    }

    #[test]
    fn test_horizon_boundary() {
        let table = small_table();
        assert_eq!(table.lookup(3, dec!(0.03)).unwrap(), dec!(2.829));
        assert_eq!(
            table.lookup(4, dec!(0.03)),
            Err(TableLookupError::HorizonExceeded {
                years: 4,
                rate: dec!(0.03),
                max_years: 3
            })
        );
    }

    #[test]
    fn test_zero_years_is_zero() {
        assert_eq!(small_table().lookup(0, dec!(0.03)).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_unknown_rate() {
        let err = small_table().lookup(1, dec!(0.04)).unwrap_err();
        assert_eq!(err, TableLookupError::UnknownRate { rate: dec!(0.04) });
    }

    #[test]
    fn test_rejects_gaps_and_duplicates() {
        let gap = vec![
            CoefficientRow { years: 1, rate: dec!(0.03), multiplier: dec!(0.971) },
            CoefficientRow { years: 3, rate: dec!(0.03), multiplier: dec!(2.829) },
        ];
        assert!(CoefficientTable::from_rows(&gap, "t").is_err());

        let dup = vec![
            CoefficientRow { years: 1, rate: dec!(0.03), multiplier: dec!(0.971) },
            CoefficientRow { years: 1, rate: dec!(0.030), multiplier: dec!(0.972) },
        ];
        assert!(CoefficientTable::from_rows(&dup, "t").is_err());
    }

    #[test]
    fn test_shipped_table_matches_annuity_formula() {
        let store = TableStore::load(&table_dir()).unwrap();
        let table = &store.coefficients;

        for rate in [0.03_f64, 0.05] {
            let key = Decimal::try_from(rate).unwrap();
            let horizon = table.max_horizon(key).unwrap();
            assert_eq!(horizon, 67);
            for years in 1..=horizon {
                let expected = (1.0 - (1.0 + rate).powi(-(years as i32))) / rate;
                let actual = table.lookup(years, key).unwrap().to_f64().unwrap();
                assert_abs_diff_eq!(actual, expected, epsilon = 5e-4);
            }
        }
    }
}
