//! Treatment-period consolation matrix
//!
//! Indexed by whole months of hospitalization and of outpatient treatment.
//! Schedule I is the general table; Schedule II is the reduced table for
//! soft-tissue injuries without objective findings.

use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::TableLookupError;

/// Table cells are stated in units of 10,000 yen
pub const MAN_YEN: Decimal = dec!(10000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Schedule {
    I,
    II,
}

impl Schedule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Schedule::I => "I",
            Schedule::II => "II",
        }
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreatmentRow {
    pub schedule: Schedule,
    pub hospital_months: u32,
    pub outpatient_months: u32,
    pub amount_man_yen: Decimal,
}

/// One rectangular matrix, amounts in yen, `cells[hospital][outpatient]`
#[derive(Debug, Clone)]
pub struct TreatmentMatrix {
    cells: Vec<Vec<Decimal>>,
}

impl TreatmentMatrix {
    pub fn max_hospital_months(&self) -> u32 {
        self.cells.len() as u32 - 1
    }

    pub fn max_outpatient_months(&self) -> u32 {
        self.cells.first().map_or(0, |row| row.len() as u32 - 1)
    }

    /// Amount in yen for whole months, `None` outside the matrix
    pub fn amount(&self, hospital_months: u32, outpatient_months: u32) -> Option<Decimal> {
        self.cells
            .get(hospital_months as usize)?
            .get(outpatient_months as usize)
            .copied()
    }
}

#[derive(Debug, Clone)]
pub struct TreatmentSchedule {
    matrices: BTreeMap<Schedule, TreatmentMatrix>,
    version: String,
}

impl TreatmentSchedule {
    /// Build from rows; each schedule must fill a rectangle from (0, 0)
    pub fn from_rows(rows: &[TreatmentRow], version: impl Into<String>) -> Result<Self, String> {
        let mut grouped: BTreeMap<Schedule, BTreeMap<(u32, u32), Decimal>> = BTreeMap::new();
        for row in rows {
            if row.amount_man_yen < Decimal::ZERO {
                return Err(format!(
                    "schedule {} ({}, {}): negative amount",
                    row.schedule, row.hospital_months, row.outpatient_months
                ));
            }
            let cells = grouped.entry(row.schedule).or_default();
            if cells
                .insert((row.hospital_months, row.outpatient_months), row.amount_man_yen * MAN_YEN)
                .is_some()
            {
                return Err(format!(
                    "schedule {}: duplicate cell ({}, {})",
                    row.schedule, row.hospital_months, row.outpatient_months
                ));
            }
        }

        let mut matrices = BTreeMap::new();
        for (schedule, cells) in grouped {
            let max_h = cells.keys().map(|(h, _)| *h).max().unwrap_or(0);
            let max_o = cells.keys().map(|(_, o)| *o).max().unwrap_or(0);
            let mut matrix = Vec::with_capacity(max_h as usize + 1);
            for h in 0..=max_h {
                let mut row = Vec::with_capacity(max_o as usize + 1);
                for o in 0..=max_o {
                    let amount = cells
                        .get(&(h, o))
                        .ok_or_else(|| format!("schedule {}: missing cell ({}, {})", schedule, h, o))?;
                    row.push(*amount);
                }
                matrix.push(row);
            }
            matrices.insert(schedule, TreatmentMatrix { cells: matrix });
        }

        for schedule in [Schedule::I, Schedule::II] {
            if !matrices.contains_key(&schedule) {
                return Err(format!("schedule {} missing", schedule));
            }
        }

        Ok(Self {
            matrices,
            version: version.into(),
        })
    }

    pub fn matrix(&self, schedule: Schedule) -> Result<&TreatmentMatrix, TableLookupError> {
        self.matrices
            .get(&schedule)
            .ok_or(TableLookupError::TreatmentScheduleMissing {
                schedule: schedule.as_str(),
            })
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(schedule: Schedule, max_h: u32, max_o: u32) -> Vec<TreatmentRow> {
        let mut rows = Vec::new();
        for h in 0..=max_h {
            for o in 0..=max_o {
                rows.push(TreatmentRow {
                    schedule,
                    hospital_months: h,
                    outpatient_months: o,
                    amount_man_yen: Decimal::from(h * 50 + o * 20),
                });
            }
        }
        rows
    }

    #[test]
    fn test_matrix_in_yen() {
        let mut all = rows(Schedule::I, 2, 3);
        all.extend(rows(Schedule::II, 1, 1));
        let schedule = TreatmentSchedule::from_rows(&all, "t").unwrap();
        let matrix = schedule.matrix(Schedule::I).unwrap();

        assert_eq!(matrix.max_hospital_months(), 2);
        assert_eq!(matrix.max_outpatient_months(), 3);
        assert_eq!(matrix.amount(1, 2), Some(dec!(900000)));
        assert_eq!(matrix.amount(3, 0), None);
    }

    #[test]
    fn test_hole_rejected() {
        let mut all = rows(Schedule::I, 2, 2);
        all.extend(rows(Schedule::II, 1, 1));
        all.retain(|r| !(r.schedule == Schedule::I && r.hospital_months == 1 && r.outpatient_months == 1));
        let err = TreatmentSchedule::from_rows(&all, "t").unwrap_err();
        assert!(err.contains("missing cell (1, 1)"));
    }

    #[test]
    fn test_both_schedules_required() {
        assert!(TreatmentSchedule::from_rows(&rows(Schedule::I, 1, 1), "t").is_err());
    }
}
