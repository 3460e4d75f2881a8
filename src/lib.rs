//! Compensation Engine - attorney-standard damage calculation for personal-injury claims
//!
//! This library provides:
//! - Case normalization with per-category required fields and statutory defaults
//! - Versioned coefficient, grade, treatment, fee, interest, wage and life tables
//! - Per-category damage calculators with audit traces
//! - Comparative-negligence and prior-payment offsets
//! - Professional fee and delay interest post-processing
//! - Deterministic aggregation, result caching and parallel batch evaluation

pub mod aggregate;
pub mod case;
pub mod config;
pub mod damages;
pub mod engine;
pub mod error;
pub mod money;
pub mod offset;
pub mod postprocess;
pub mod tables;

// Re-export commonly used types
pub use aggregate::{Aggregator, CalculationResult};
pub use case::{CaseCategory, CalculationStandard, NormalizedCase, RawCase};
pub use config::EngineConfig;
pub use damages::{DamageCalculator, DamageCategory, DamageLineItem, Trace};
pub use engine::{CalculationCache, Engine};
pub use error::{CalculationError, EngineError, TableLoadError, ValidationErrors};
pub use money::Rounding;
pub use tables::TableStore;
