//! Statutory average wages (wage census) used when actual income is absent

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::case::{OccupationClass, Sex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WageRow {
    pub occupation: OccupationClass,
    /// `None` applies to both sexes
    pub sex: Option<Sex>,
    pub annual_wage: Decimal,
}

#[derive(Debug, Clone)]
pub struct WageTable {
    wages: HashMap<(OccupationClass, Option<Sex>), Decimal>,
    version: String,
}

impl WageTable {
    pub fn from_rows(rows: &[WageRow], version: impl Into<String>) -> Result<Self, String> {
        let mut wages = HashMap::new();
        for row in rows {
            if row.annual_wage < Decimal::ZERO {
                return Err(format!("{}: negative wage", row.occupation.as_str()));
            }
            if wages.insert((row.occupation, row.sex), row.annual_wage).is_some() {
                return Err(format!(
                    "duplicate wage for {} {}",
                    row.occupation.as_str(),
                    row.sex.map_or("*", |s| s.as_str())
                ));
            }
        }
        Ok(Self {
            wages,
            version: version.into(),
        })
    }

    /// Annual wage for the class and sex, falling back to the both-sexes row
    pub fn average_wage(&self, occupation: OccupationClass, sex: Sex) -> Option<Decimal> {
        self.wages
            .get(&(occupation, Some(sex)))
            .or_else(|| self.wages.get(&(occupation, None)))
            .copied()
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}
