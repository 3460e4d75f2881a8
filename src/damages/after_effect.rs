use rust_decimal::Decimal;

use super::{CalculationContext, DamageCalculator, DamageCategory, DamageLineItem, Trace};
use crate::case::AfterEffectGrade;
use crate::error::TableLookupError;

/// Consolation for a certified after-effect, straight from the grade schedule
pub struct AfterEffectConsolation;

impl DamageCalculator for AfterEffectConsolation {
    fn category(&self) -> DamageCategory {
        DamageCategory::AfterEffectConsolation
    }

    fn calculate(&self, ctx: &CalculationContext<'_>) -> Result<DamageLineItem, TableLookupError> {
        let case = ctx.case;
        let (amount, trace) = match case.injury.grade {
            AfterEffectGrade::None => (
                Decimal::ZERO,
                Trace::new("no certified after-effect").input("grade", "none"),
            ),
            AfterEffectGrade::Graded(grade) => {
                let entry = ctx.tables.grades.lookup(grade, case.case.category)?;
                (
                    ctx.round(entry.consolation),
                    Trace::new("grade_schedule.consolation(grade, category)")
                        .input("grade", grade.value())
                        .input("category", case.case.category)
                        .table(ctx.tables.grades.version()),
                )
            }
        };

        Ok(DamageLineItem::award(self.category(), amount, trace, ctx.config))
    }
}
