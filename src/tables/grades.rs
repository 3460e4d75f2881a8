//! After-effect grade schedule
//!
//! Grade 1 is the most severe. Each grade carries the consolation base amount
//! and the labour-capacity-loss ratio. A row keyed `*` applies to every case
//! category; a category-specific row overrides it.

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::case::{CaseCategory, Grade};
use crate::error::TableLookupError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradeRow {
    pub grade: u8,
    /// `None` for the wildcard row
    pub category: Option<CaseCategory>,
    pub consolation: Decimal,
    pub loss_ratio: Decimal,
}

/// Values scheduled for one grade
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GradeEntry {
    pub consolation: Decimal,
    pub loss_ratio: Decimal,
}

#[derive(Debug, Clone)]
pub struct GradeSchedule {
    entries: HashMap<(u8, Option<CaseCategory>), GradeEntry>,
    version: String,
}

impl GradeSchedule {
    /// Build from rows; every grade must resolve for every category
    pub fn from_rows(rows: &[GradeRow], version: impl Into<String>) -> Result<Self, String> {
        let mut entries = HashMap::new();
        for row in rows {
            if Grade::new(row.grade).is_none() {
                return Err(format!("grade {} outside 1-14", row.grade));
            }
            if row.consolation < Decimal::ZERO {
                return Err(format!("grade {}: negative consolation", row.grade));
            }
            if row.loss_ratio < Decimal::ZERO || row.loss_ratio > Decimal::ONE {
                return Err(format!("grade {}: loss ratio {} outside 0-1", row.grade, row.loss_ratio));
            }
            let entry = GradeEntry {
                consolation: row.consolation,
                loss_ratio: row.loss_ratio,
            };
            if entries.insert((row.grade, row.category), entry).is_some() {
                return Err(format!(
                    "duplicate entry for grade {} category {}",
                    row.grade,
                    row.category.map_or("*", |c| c.as_str())
                ));
            }
        }

        let schedule = Self {
            entries,
            version: version.into(),
        };
        for grade in Grade::MOST_SEVERE..=Grade::LEAST_SEVERE {
            for category in CaseCategory::ALL {
                if schedule.resolve(grade, category).is_none() {
                    return Err(format!("grade {} has no entry for {}", grade, category));
                }
            }
        }
        Ok(schedule)
    }

    fn resolve(&self, grade: u8, category: CaseCategory) -> Option<&GradeEntry> {
        self.entries
            .get(&(grade, Some(category)))
            .or_else(|| self.entries.get(&(grade, None)))
    }

    pub fn lookup(&self, grade: Grade, category: CaseCategory) -> Result<GradeEntry, TableLookupError> {
        self.resolve(grade.value(), category)
            .copied()
            .ok_or(TableLookupError::GradeNotScheduled {
                grade: grade.value(),
                category,
            })
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}
