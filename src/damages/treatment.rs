//! Treatment-period consolation (入通院慰謝料)
//!
//! The matrix is indexed by whole months of hospitalization and outpatient
//! treatment. A partial month is paid pro rata between the neighbouring cells
//! along each axis. The outpatient period is the treatment duration after
//! discharge, capped at a multiple of actual visit days when attendance was
//! sparse.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use super::{CalculationContext, DamageCalculator, DamageCategory, DamageLineItem, Trace};
use crate::error::TableLookupError;
use crate::tables::{Schedule, TreatmentMatrix};

pub struct TreatmentConsolation;

/// Position along one matrix axis
struct AxisPoint {
    index: u32,
    fraction: Decimal,
    clamped: bool,
}

fn axis_point(months: Decimal, max: u32) -> AxisPoint {
    let whole = months.trunc();
    let index = whole.to_u32().unwrap_or(u32::MAX);
    if index >= max {
        AxisPoint {
            index: max,
            fraction: Decimal::ZERO,
            clamped: index > max || months > whole,
        }
    } else {
        AxisPoint {
            index,
            fraction: months - whole,
            clamped: false,
        }
    }
}

/// Pro-rata matrix value; cells beyond the edge clamp to it
fn interpolate(matrix: &TreatmentMatrix, hospital: &AxisPoint, outpatient: &AxisPoint) -> Decimal {
    let cell = |h: u32, o: u32| matrix.amount(h, o).unwrap_or(Decimal::ZERO);
    let base = cell(hospital.index, outpatient.index);

    let mut value = base;
    if hospital.fraction > Decimal::ZERO {
        value += hospital.fraction * (cell(hospital.index + 1, outpatient.index) - base);
    }
    if outpatient.fraction > Decimal::ZERO {
        value += outpatient.fraction * (cell(hospital.index, outpatient.index + 1) - base);
    }
    value
}

impl DamageCalculator for TreatmentConsolation {
    fn category(&self) -> DamageCategory {
        DamageCategory::TreatmentConsolation
    }

    fn calculate(&self, ctx: &CalculationContext<'_>) -> Result<DamageLineItem, TableLookupError> {
        let injury = &ctx.case.injury;
        let conventions = &ctx.config.treatment;

        let (schedule, multiplier) = if injury.soft_tissue_only {
            (Schedule::II, conventions.sparse_visit_multiplier_soft_tissue)
        } else {
            (Schedule::I, conventions.sparse_visit_multiplier)
        };
        let matrix = ctx.tables.treatment.matrix(schedule)?;

        let hospital_days = Decimal::from(injury.hospitalization_days);
        let elapsed_after_discharge =
            Decimal::from(injury.treatment_days.saturating_sub(injury.hospitalization_days));
        let visit_cap = Decimal::from(injury.outpatient_days) * multiplier;
        let outpatient_days = elapsed_after_discharge.min(visit_cap);

        let days_per_month = Decimal::from(conventions.days_per_month.max(1));
        let hospital_months = hospital_days / days_per_month;
        let outpatient_months = outpatient_days / days_per_month;

        let hospital = axis_point(hospital_months, matrix.max_hospital_months());
        let outpatient = axis_point(outpatient_months, matrix.max_outpatient_months());
        let amount = ctx.round(interpolate(matrix, &hospital, &outpatient));

        let mut trace = Trace::new("schedule[hospital_months][outpatient_months], pro rata")
            .input("schedule", schedule)
            .input("hospital_days", injury.hospitalization_days)
            .input("outpatient_period_days", outpatient_days.round_dp(2).normalize())
            .input("hospital_months", hospital_months.round_dp(4).normalize())
            .input("outpatient_months", outpatient_months.round_dp(4).normalize())
            .table(ctx.tables.treatment.version());

        if elapsed_after_discharge > visit_cap {
            trace = trace.note(format!(
                "outpatient period capped at {} visit days x {}",
                injury.outpatient_days, multiplier
            ));
        }
        for (axis, point) in [("hospital", &hospital), ("outpatient", &outpatient)] {
            if point.clamped {
                log::warn!(
                    "Case {}: {} months beyond schedule {} edge, clamped to {}",
                    ctx.case.case.id,
                    axis,
                    schedule,
                    point.index
                );
                trace = trace.note(format!("{} months clamped to schedule edge {}", axis, point.index));
            }
        }

        Ok(DamageLineItem::award(self.category(), amount, trace, ctx.config))
    }
}
