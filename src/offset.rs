//! Negligence offset (過失相殺) and deduction of payments already received
//!
//! Order is fixed: the fault offset is computed once against the subtotal of
//! offsettable items, exempt items are added back unreduced, then prior
//! payments are deducted with the total floored at zero.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::damages::{DamageLineItem, Trace};
use crate::money::{format_yen, Rounding};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffsetSummary {
    /// Signed subtotal of items subject to the offset
    pub offsettable_base: Decimal,
    /// Signed subtotal of exempt items
    pub exempt_total: Decimal,
    pub fault_ratio: Decimal,
    pub fault_offset: Decimal,
    /// Prior payments actually deducted (never more than what remained)
    pub prior_payment_deduction: Decimal,
    /// Prior payments in excess of the remaining award
    pub prior_payment_excess: Decimal,
    pub post_offset_total: Decimal,
    pub trace: Trace,
}

/// Apply the fault offset and prior-payment deduction to the calculated items
pub fn apply_offsets(
    items: &[DamageLineItem],
    fault_ratio: Decimal,
    prior_payments: Decimal,
    rounding: Rounding,
) -> OffsetSummary {
    let (offsettable_base, exempt_total) =
        items
            .iter()
            .fold((Decimal::ZERO, Decimal::ZERO), |(base, exempt), item| {
                if item.offsettable {
                    (base + item.signed_amount(), exempt)
                } else {
                    (base, exempt + item.signed_amount())
                }
            });

    let fault_offset = rounding.round(offsettable_base.max(Decimal::ZERO) * fault_ratio);
    let after_fault = offsettable_base - fault_offset + exempt_total;

    let prior_payment_deduction = prior_payments.min(after_fault.max(Decimal::ZERO));
    let prior_payment_excess = prior_payments - prior_payment_deduction;
    let post_offset_total = after_fault - prior_payment_deduction;

    let mut trace = Trace::new("round(offsettable * fault_ratio); base - offset + exempt - prior_payments")
        .input("offsettable", format_yen(offsettable_base))
        .input("exempt", format_yen(exempt_total))
        .input("fault_ratio", fault_ratio)
        .input("fault_offset", format_yen(fault_offset))
        .input("prior_payments", format_yen(prior_payments));
    if prior_payment_excess > Decimal::ZERO {
        trace = trace.note(format!(
            "prior payments exceed the award by {}; total floored at 0",
            format_yen(prior_payment_excess)
        ));
    }

    OffsetSummary {
        offsettable_base,
        exempt_total,
        fault_ratio,
        fault_offset,
        prior_payment_deduction,
        prior_payment_excess,
        post_offset_total,
        trace,
    }
}
