//! Fee and interest post-processing, applied to the post-offset total

mod fee;
mod interest;

pub use fee::{professional_fee, FeeResult};
pub use interest::{delay_interest, InterestResult, InterestTerms};

use rust_decimal::Decimal;

use crate::case::NormalizedCase;
use crate::config::EngineConfig;
use crate::error::TableLookupError;
use crate::tables::TableStore;

/// Fee and interest for one case
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostProcessed {
    pub fee: FeeResult,
    pub interest: InterestResult,
}

impl PostProcessed {
    pub fn total(&self) -> Decimal {
        self.fee.amount + self.interest.amount
    }
}

/// Interest accrual terms the configuration gives for a case
pub fn interest_terms(case: &NormalizedCase, config: &EngineConfig) -> InterestTerms {
    InterestTerms {
        start: case.case.interest_start_date,
        end: case.case.reference_date,
        end_inclusive: config.interest_end_inclusive,
        rate: config.interest_rate,
        day_count: config.day_count(case.case.standard),
        accrue: config.accrue_interest,
    }
}

pub fn post_process(
    post_offset_total: Decimal,
    case: &NormalizedCase,
    tables: &TableStore,
    config: &EngineConfig,
) -> Result<PostProcessed, TableLookupError> {
    let fee = professional_fee(post_offset_total, case.case.standard, &tables.fees, config.rounding)?;
    let interest = delay_interest(
        post_offset_total,
        &interest_terms(case, config),
        &tables.legal_rates,
        config.rounding,
    )?;
    Ok(PostProcessed { fee, interest })
}
