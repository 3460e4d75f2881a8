//! Abridged life table: remaining life expectancy by age and sex

use rust_decimal::Decimal;

use crate::case::Sex;
use crate::error::TableLookupError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifeRow {
    pub age: u8,
    pub male: Decimal,
    pub female: Decimal,
}

#[derive(Debug, Clone)]
pub struct LifeTable {
    /// Ascending by age
    rows: Vec<LifeRow>,
    version: String,
}

impl LifeTable {
    pub fn from_rows(rows: &[LifeRow], version: impl Into<String>) -> Result<Self, String> {
        let mut sorted = rows.to_vec();
        sorted.sort_by_key(|r| r.age);
        if sorted.windows(2).any(|w| w[0].age == w[1].age) {
            return Err("duplicate age".to_string());
        }
        if sorted.first().map(|r| r.age) != Some(0) {
            return Err("table must start at age 0".to_string());
        }
        if let Some(bad) = sorted.iter().find(|r| r.male < Decimal::ZERO || r.female < Decimal::ZERO) {
            return Err(format!("age {}: negative expectancy", bad.age));
        }
        Ok(Self {
            rows: sorted,
            version: version.into(),
        })
    }

    /// Expectancy at the nearest listed age at or below `age`
    pub fn expectancy(&self, sex: Sex, age: u8) -> Result<Decimal, TableLookupError> {
        let row = self
            .rows
            .iter()
            .rev()
            .find(|r| r.age <= age)
            .ok_or(TableLookupError::LifeExpectancyMissing { age })?;
        Ok(match sex {
            Sex::Male => row.male,
            Sex::Female => row.female,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}
