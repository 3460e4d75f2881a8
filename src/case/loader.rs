//! Raw case input from JSON or CSV files
//!
//! JSON files hold one case object or an array of them. CSV files hold one case
//! per row with a header naming the fields; itemized costs are given as
//! per-kind amount columns.

use std::collections::BTreeSet;
use std::fs;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use super::raw::{RawCase, RawCostEntry, RawValue};
use crate::error::CaseLoadError;

/// CSV amount columns and the cost entry each becomes: (column, kind, covered)
const COST_COLUMNS: [(&str, &str, bool); 5] = [
    ("medical_costs", "medical", false),
    ("transport_costs", "transportation", false),
    ("nursing_costs", "nursing", false),
    ("other_costs", "other", false),
    ("covered_costs", "medical", true),
];

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<RawCase>),
    One(Box<RawCase>),
}

/// Load raw cases, choosing the format by file extension
pub fn load_cases(path: &Path) -> Result<Vec<RawCase>, CaseLoadError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("json") => load_cases_json(path),
        Some("csv") => load_cases_csv(path),
        _ => Err(CaseLoadError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}

pub fn load_cases_json(path: &Path) -> Result<Vec<RawCase>, CaseLoadError> {
    let text = fs::read_to_string(path).map_err(|source| CaseLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_cases_json(&text).map_err(|source| CaseLoadError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse a single case object or an array of cases
pub fn parse_cases_json(text: &str) -> Result<Vec<RawCase>, serde_json::Error> {
    Ok(match serde_json::from_str(text)? {
        OneOrMany::Many(cases) => cases,
        OneOrMany::One(case) => vec![*case],
    })
}

pub fn load_cases_csv(path: &Path) -> Result<Vec<RawCase>, CaseLoadError> {
    let file = fs::File::open(path).map_err(|source| CaseLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_cases_csv(file).map_err(|source| CaseLoadError::Csv {
        path: path.to_path_buf(),
        source,
    })
}

/// Read one case per CSV row; unknown columns are ignored with a warning
pub fn read_cases_csv<R: Read>(reader: R) -> Result<Vec<RawCase>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = reader.headers()?.clone();

    let mut unknown = BTreeSet::new();
    let mut cases = Vec::new();
    for result in reader.records() {
        let record = result?;
        let mut case = RawCase::default();

        for (column, value) in headers.iter().zip(record.iter()) {
            if value.is_empty() {
                continue;
            }
            if let Some((_, kind, covered)) = COST_COLUMNS.iter().find(|(name, _, _)| *name == column) {
                case.costs.push(RawCostEntry {
                    kind: Some(RawValue::from(*kind)),
                    amount: Some(RawValue::from(value)),
                    covered_by_payer: Some(RawValue::from(*covered)),
                    description: Some(column.to_string()),
                });
            } else if !case.set_column(column, RawValue::from(value)) {
                unknown.insert(column.to_string());
            }
        }
        cases.push(case);
    }

    for column in unknown {
        log::warn!("Ignoring unknown case column {:?}", column);
    }
    log::info!("Read {} case rows", cases.len());
    Ok(cases)
}
