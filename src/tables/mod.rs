//! Statutory tables: coefficients, grade and treatment schedules, fees, rates, wages, life table
//!
//! Pure data access. Tables load once per engine from CSV files and are shared
//! read-only afterwards.

mod coefficients;
mod fees;
mod grades;
mod life;
mod rates;
mod treatment;
mod wages;
pub mod loader;

pub use coefficients::{CoefficientRow, CoefficientTable};
pub use fees::{FeeBracket, FeeRow, FeeSchedule};
pub use grades::{GradeEntry, GradeRow, GradeSchedule};
pub use life::{LifeRow, LifeTable};
pub use rates::{LegalRateHistory, LegalRateRow};
pub use treatment::{Schedule, TreatmentMatrix, TreatmentRow, TreatmentSchedule, MAN_YEN};
pub use wages::{WageRow, WageTable};

use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::TableLoadError;
use loader::SourceFile;

/// Container for every statutory table the calculators consume
#[derive(Debug, Clone)]
pub struct TableStore {
    pub coefficients: CoefficientTable,
    pub grades: GradeSchedule,
    pub treatment: TreatmentSchedule,
    pub fees: FeeSchedule,
    pub legal_rates: LegalRateHistory,
    pub wages: WageTable,
    pub life: LifeTable,
    version: String,
}

impl TableStore {
    /// Load tables from the default location (data/tables/)
    pub fn load_default() -> Result<Self, TableLoadError> {
        Self::load(Path::new(loader::DEFAULT_TABLE_PATH))
    }

    /// Load tables from CSV files in a specific directory
    pub fn load(dir: &Path) -> Result<Self, TableLoadError> {
        let file = SourceFile::open(dir, loader::COEFFICIENT_FILE)?;
        let coefficients = CoefficientTable::from_rows(&loader::load_coefficients(&file)?, &file.version)
            .map_err(|reason| file.incomplete(reason))?;
        log_loaded(&file);

        let file = SourceFile::open(dir, loader::GRADE_FILE)?;
        let grades = GradeSchedule::from_rows(&loader::load_grades(&file)?, &file.version)
            .map_err(|reason| file.incomplete(reason))?;
        log_loaded(&file);

        let file = SourceFile::open(dir, loader::TREATMENT_FILE)?;
        let treatment = TreatmentSchedule::from_rows(&loader::load_treatment(&file)?, &file.version)
            .map_err(|reason| file.incomplete(reason))?;
        log_loaded(&file);

        let file = SourceFile::open(dir, loader::FEE_FILE)?;
        let fees = FeeSchedule::from_rows(&loader::load_fees(&file)?, &file.version)
            .map_err(|reason| file.incomplete(reason))?;
        log_loaded(&file);

        let file = SourceFile::open(dir, loader::LEGAL_RATE_FILE)?;
        let legal_rates = LegalRateHistory::from_rows(&loader::load_legal_rates(&file)?, &file.version)
            .map_err(|reason| file.incomplete(reason))?;
        log_loaded(&file);

        let file = SourceFile::open(dir, loader::WAGE_FILE)?;
        let wages = WageTable::from_rows(&loader::load_wages(&file)?, &file.version)
            .map_err(|reason| file.incomplete(reason))?;
        log_loaded(&file);

        let file = SourceFile::open(dir, loader::LIFE_FILE)?;
        let life = LifeTable::from_rows(&loader::load_life(&file)?, &file.version)
            .map_err(|reason| file.incomplete(reason))?;
        log_loaded(&file);

        let store = Self::from_parts(coefficients, grades, treatment, fees, legal_rates, wages, life);
        log::info!("Loaded statutory tables from {} ({})", dir.display(), store.version);
        Ok(store)
    }

    /// Assemble a store from tables built in memory
    pub fn from_parts(
        coefficients: CoefficientTable,
        grades: GradeSchedule,
        treatment: TreatmentSchedule,
        fees: FeeSchedule,
        legal_rates: LegalRateHistory,
        wages: WageTable,
        life: LifeTable,
    ) -> Self {
        let mut hasher = Sha256::new();
        for part in [
            coefficients.version(),
            grades.version(),
            treatment.version(),
            fees.version(),
            legal_rates.version(),
            wages.version(),
            life.version(),
        ] {
            hasher.update(part.as_bytes());
            hasher.update(b"\n");
        }
        let version = format!("tables@{}", &hex::encode(hasher.finalize())[..12]);

        Self {
            coefficients,
            grades,
            treatment,
            fees,
            legal_rates,
            wages,
            life,
            version,
        }
    }

    /// Combined version of every loaded file
    pub fn version(&self) -> &str {
        &self.version
    }
}

fn log_loaded(file: &SourceFile) {
    log::info!("Loaded {} ({})", file.path.display(), file.version);
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::PathBuf;
    use std::sync::{Arc, OnceLock};

    use super::TableStore;

    pub fn table_dir() -> PathBuf {
        PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/data/tables"))
    }

    /// The shipped tables, loaded once per test binary
    pub fn shipped_tables() -> Arc<TableStore> {
        static TABLES: OnceLock<Arc<TableStore>> = OnceLock::new();
        TABLES
            .get_or_init(|| Arc::new(TableStore::load(&table_dir()).expect("shipped tables load")))
            .clone()
    }
}
