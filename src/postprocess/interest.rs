use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::{DayCount, RateSelection};
use crate::damages::Trace;
use crate::error::TableLookupError;
use crate::money::{format_yen, Rounding};
use crate::tables::LegalRateHistory;

/// Statutory delay interest on the post-offset total
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterestResult {
    pub amount: Decimal,
    pub rate: Decimal,
    pub days: u32,
    pub day_count: DayCount,
    pub trace: Trace,
}

/// Accrual window and conventions for one case
#[derive(Debug, Clone, Copy)]
pub struct InterestTerms {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub end_inclusive: bool,
    pub rate: RateSelection,
    pub day_count: DayCount,
    pub accrue: bool,
}

impl InterestTerms {
    /// Days from start to end, counting the end date when inclusive
    pub fn days(&self) -> u32 {
        let elapsed = (self.end - self.start).num_days() + i64::from(self.end_inclusive);
        u32::try_from(elapsed.max(0)).unwrap_or(u32::MAX)
    }
}

/// total × rate × days / basis
pub fn delay_interest(
    total: Decimal,
    terms: &InterestTerms,
    legal_rates: &LegalRateHistory,
    rounding: Rounding,
) -> Result<InterestResult, TableLookupError> {
    let rate = match terms.rate {
        RateSelection::Fixed(rate) => rate,
        RateSelection::Statutory => legal_rates.rate_on(terms.start)?,
    };
    let days = terms.days();

    if !terms.accrue {
        return Ok(InterestResult {
            amount: Decimal::ZERO,
            rate,
            days,
            day_count: terms.day_count,
            trace: Trace::new("interest accrual disabled"),
        });
    }

    let base = total.max(Decimal::ZERO);
    let basis = terms.day_count.basis();
    let amount = rounding.round(base * rate * Decimal::from(days) / basis);

    let mut trace = Trace::new("total * rate * days / basis")
        .input("total", format_yen(base))
        .input("rate", rate)
        .input("days", days)
        .input("basis", basis)
        .note(format!(
            "{} to {} {}",
            terms.start,
            terms.end,
            if terms.end_inclusive { "inclusive" } else { "exclusive of end" }
        ));
    if matches!(terms.rate, RateSelection::Statutory) {
        trace = trace.table(legal_rates.version());
    }

    Ok(InterestResult {
        amount,
        rate,
        days,
        day_count: terms.day_count,
        trace,
    })
}
