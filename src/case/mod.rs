//! Case input: raw records, typed entities and the normalizer between them

mod normalizer;
mod raw;
mod types;
pub mod loader;

pub use normalizer::{normalize, required_fields, MAX_AGE, MAX_DAYS, MAX_DEPENDENTS};
pub use raw::{Field, RawCase, RawCostEntry, RawValue};
pub use types::{
    AfterEffectGrade, CalculationStandard, Case, CaseCategory, CostEntry, CostKind, Grade,
    IncomeBasis, Injury, NormalizedCase, OccupationClass, Sex, Victim,
};
