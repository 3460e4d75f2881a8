//! Statutory legal-interest rate history

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::TableLookupError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegalRateRow {
    pub effective_from: NaiveDate,
    pub rate: Decimal,
}

#[derive(Debug, Clone)]
pub struct LegalRateHistory {
    /// Ascending by effective date
    periods: Vec<LegalRateRow>,
    version: String,
}

impl LegalRateHistory {
    pub fn from_rows(rows: &[LegalRateRow], version: impl Into<String>) -> Result<Self, String> {
        let mut periods = rows.to_vec();
        periods.sort_by_key(|r| r.effective_from);
        if periods.windows(2).any(|w| w[0].effective_from == w[1].effective_from) {
            return Err("duplicate effective date".to_string());
        }
        if let Some(bad) = periods.iter().find(|r| r.rate < Decimal::ZERO) {
            return Err(format!("negative rate effective {}", bad.effective_from));
        }
        Ok(Self {
            periods,
            version: version.into(),
        })
    }

    /// Rate in force on `date`
    pub fn rate_on(&self, date: NaiveDate) -> Result<Decimal, TableLookupError> {
        self.periods
            .iter()
            .rev()
            .find(|p| p.effective_from <= date)
            .map(|p| p.rate)
            .ok_or(TableLookupError::LegalRateUndefined { date })
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn history() -> LegalRateHistory {
        let rows = vec![
            LegalRateRow { effective_from: date(2020, 4, 1), rate: dec!(0.03) },
            LegalRateRow { effective_from: date(1898, 7, 16), rate: dec!(0.05) },
        ];
        LegalRateHistory::from_rows(&rows, "t").unwrap()
    }

    #[test]
    fn test_rate_switches_on_effective_date() {
        let history = history();
        assert_eq!(history.rate_on(date(2020, 3, 31)).unwrap(), dec!(0.05));
        assert_eq!(history.rate_on(date(2020, 4, 1)).unwrap(), dec!(0.03));
    }

    #[test]
    fn test_before_history_is_error() {
        assert!(matches!(
            history().rate_on(date(1800, 1, 1)),
            Err(TableLookupError::LegalRateUndefined { .. })
        ));
    }
}
