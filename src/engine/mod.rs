//! Compensation engine: normalizer → calculators → offset → fee/interest → aggregator

mod cache;
#[cfg(test)]
mod tests;

pub use cache::CalculationCache;

use std::sync::Arc;

use rayon::prelude::*;
use sha2::{Digest, Sha256};

use crate::aggregate::{Aggregator, CalculationResult};
use crate::case::{normalize, NormalizedCase, RawCase};
use crate::config::EngineConfig;
use crate::damages::{run_calculators, standard_calculators, CalculationContext, DamageCalculator};
use crate::error::{CalculationError, EngineError, TableLoadError, ValidationErrors};
use crate::money::format_yen;
use crate::offset::apply_offsets;
use crate::postprocess::post_process;
use crate::tables::TableStore;

/// Holds the configuration and shared tables; one per process is typical
pub struct Engine {
    config: EngineConfig,
    tables: Arc<TableStore>,
    calculators: Vec<Box<dyn DamageCalculator>>,
    /// Digest of configuration and table version, prefixed to cache keys
    settings_digest: String,
}

impl Engine {
    /// Create an engine, loading tables from the configured directory
    pub fn new(config: EngineConfig) -> Result<Self, TableLoadError> {
        let tables = TableStore::load(&config.table_dir)?;
        Ok(Self::with_tables(config, Arc::new(tables)))
    }

    /// Create an engine sharing tables that are already loaded
    pub fn with_tables(config: EngineConfig, tables: Arc<TableStore>) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(tables.version().as_bytes());
        if let Ok(bytes) = serde_json::to_vec(&config) {
            hasher.update(&bytes);
        }
        let settings_digest = hex::encode(hasher.finalize())[..16].to_string();

        Self {
            config,
            tables,
            calculators: standard_calculators(),
            settings_digest,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn tables(&self) -> &Arc<TableStore> {
        &self.tables
    }

    /// Validate a raw record against this engine's tables and defaults
    pub fn normalize(&self, raw: &RawCase) -> Result<NormalizedCase, ValidationErrors> {
        normalize(raw, &self.tables, &self.config)
    }

    /// Calculate the itemized award for a validated case
    pub fn calculate(&self, case: &NormalizedCase) -> Result<CalculationResult, CalculationError> {
        let case_id = &case.case.id;
        let ctx = CalculationContext {
            case,
            tables: &self.tables,
            config: &self.config,
        };

        let items = run_calculators(&self.calculators, &ctx, self.config.parallel).map_err(|source| {
            CalculationError::Lookup {
                case_id: case_id.clone(),
                source,
            }
        })?;

        let offset = apply_offsets(
            &items,
            case.case.fault_ratio,
            case.case.prior_payments,
            self.config.rounding,
        );
        let post = post_process(offset.post_offset_total, case, &self.tables, &self.config).map_err(
            |source| CalculationError::Lookup {
                case_id: case_id.clone(),
                source,
            },
        )?;

        let result = Aggregator::new(self.config.max_line_amount)
            .aggregate(case, items, offset, post, self.tables.version())
            .map_err(|source| CalculationError::Aggregation {
                case_id: case_id.clone(),
                source,
            })?;

        log::debug!(
            "Case {}: grand total {} yen (post-offset {}, fee {}, interest {})",
            case_id,
            format_yen(result.grand_total),
            format_yen(result.post_offset_total),
            format_yen(result.fee.amount),
            format_yen(result.interest.amount)
        );
        Ok(result)
    }

    /// Normalize then calculate one raw record
    pub fn evaluate(&self, raw: &RawCase) -> Result<CalculationResult, EngineError> {
        let case = self.normalize(raw)?;
        Ok(self.calculate(&case)?)
    }

    /// Calculate through a caller-owned cache
    pub fn calculate_cached(
        &self,
        case: &NormalizedCase,
        cache: &mut CalculationCache,
    ) -> Result<Arc<CalculationResult>, CalculationError> {
        let key = format!("{}:{}", self.settings_digest, case.fingerprint());
        if let Some(result) = cache.get(&key) {
            cache.record_hit();
            return Ok(result);
        }
        cache.record_miss();
        let result = Arc::new(self.calculate(case)?);
        cache.insert(key, Arc::clone(&result));
        Ok(result)
    }

    /// Calculate many cases in parallel; results keep input order
    pub fn calculate_batch(&self, cases: &[NormalizedCase]) -> Vec<Result<CalculationResult, CalculationError>> {
        let results: Vec<_> = cases.par_iter().map(|case| self.calculate(case)).collect();
        let failed = results.iter().filter(|r| r.is_err()).count();
        log::info!("Calculated {} cases ({} failed)", results.len(), failed);
        results
    }

    /// Normalize and calculate many raw records in parallel
    pub fn evaluate_batch(&self, raws: &[RawCase]) -> Vec<Result<CalculationResult, EngineError>> {
        raws.par_iter().map(|raw| self.evaluate(raw)).collect()
    }
}
