//! Raw, unvalidated case records as delivered by the input layer
//!
//! Every field is optional and loosely typed. The normalizer is the only
//! place that interprets these values.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A loosely typed scalar from JSON or CSV input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Bool(bool),
    Integer(i64),
    Number(f64),
    Text(String),
}

impl RawValue {
    /// The value as it would have been typed into a form
    pub fn as_text(&self) -> String {
        match self {
            RawValue::Bool(b) => b.to_string(),
            RawValue::Integer(i) => i.to_string(),
            RawValue::Number(n) => n.to_string(),
            RawValue::Text(s) => s.trim().to_string(),
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, RawValue::Text(s) if s.trim().is_empty())
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        RawValue::Integer(value)
    }
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        RawValue::Bool(value)
    }
}

/// One itemized expense as entered
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawCostEntry {
    pub kind: Option<RawValue>,
    pub amount: Option<RawValue>,
    pub covered_by_payer: Option<RawValue>,
    pub description: Option<String>,
}

/// Flat case record, the input contract of the normalizer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawCase {
    pub case_id: Option<RawValue>,
    pub category: Option<RawValue>,
    pub accident_date: Option<RawValue>,
    pub symptom_fixation_date: Option<RawValue>,
    pub reference_date: Option<RawValue>,
    pub interest_start_date: Option<RawValue>,
    pub standard: Option<RawValue>,
    pub fault_ratio: Option<RawValue>,
    pub fault_percentage: Option<RawValue>,
    pub prior_payments: Option<RawValue>,

    pub age: Option<RawValue>,
    pub sex: Option<RawValue>,
    pub occupation: Option<RawValue>,
    pub annual_income: Option<RawValue>,
    pub dependents: Option<RawValue>,

    pub grade: Option<RawValue>,
    pub treatment_days: Option<RawValue>,
    pub hospitalization_days: Option<RawValue>,
    pub outpatient_days: Option<RawValue>,
    pub lost_work_days: Option<RawValue>,
    pub soft_tissue_only: Option<RawValue>,
    pub loss_period_years: Option<RawValue>,

    pub costs: Vec<RawCostEntry>,
}

/// Identifies a raw input field in validation messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    CaseId,
    Category,
    AccidentDate,
    SymptomFixationDate,
    ReferenceDate,
    InterestStartDate,
    Standard,
    FaultRatio,
    PriorPayments,
    Age,
    Sex,
    Occupation,
    AnnualIncome,
    Dependents,
    Grade,
    TreatmentDays,
    HospitalizationDays,
    OutpatientDays,
    LostWorkDays,
    SoftTissueOnly,
    LossPeriodYears,
    Costs,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::CaseId => "case_id",
            Field::Category => "category",
            Field::AccidentDate => "accident_date",
            Field::SymptomFixationDate => "symptom_fixation_date",
            Field::ReferenceDate => "reference_date",
            Field::InterestStartDate => "interest_start_date",
            Field::Standard => "standard",
            Field::FaultRatio => "fault_ratio",
            Field::PriorPayments => "prior_payments",
            Field::Age => "age",
            Field::Sex => "sex",
            Field::Occupation => "occupation",
            Field::AnnualIncome => "annual_income",
            Field::Dependents => "dependents",
            Field::Grade => "grade",
            Field::TreatmentDays => "treatment_days",
            Field::HospitalizationDays => "hospitalization_days",
            Field::OutpatientDays => "outpatient_days",
            Field::LostWorkDays => "lost_work_days",
            Field::SoftTissueOnly => "soft_tissue_only",
            Field::LossPeriodYears => "loss_period_years",
            Field::Costs => "costs",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl RawCase {
    /// The raw value of a scalar field, treating blank text as absent
    pub fn get(&self, field: Field) -> Option<&RawValue> {
        let value = match field {
            Field::CaseId => &self.case_id,
            Field::Category => &self.category,
            Field::AccidentDate => &self.accident_date,
            Field::SymptomFixationDate => &self.symptom_fixation_date,
            Field::ReferenceDate => &self.reference_date,
            Field::InterestStartDate => &self.interest_start_date,
            Field::Standard => &self.standard,
            Field::FaultRatio => {
                if self.fault_is_percentage() {
                    &self.fault_percentage
                } else {
                    &self.fault_ratio
                }
            }
            Field::PriorPayments => &self.prior_payments,
            Field::Age => &self.age,
            Field::Sex => &self.sex,
            Field::Occupation => &self.occupation,
            Field::AnnualIncome => &self.annual_income,
            Field::Dependents => &self.dependents,
            Field::Grade => &self.grade,
            Field::TreatmentDays => &self.treatment_days,
            Field::HospitalizationDays => &self.hospitalization_days,
            Field::OutpatientDays => &self.outpatient_days,
            Field::LostWorkDays => &self.lost_work_days,
            Field::SoftTissueOnly => &self.soft_tissue_only,
            Field::LossPeriodYears => &self.loss_period_years,
            Field::Costs => return None,
        };
        value.as_ref().filter(|v| !v.is_blank())
    }

    /// Set a scalar field from a column name, as used by the CSV loader
    ///
    /// Returns `false` when the column is not a known scalar field.
    pub fn set_column(&mut self, column: &str, value: RawValue) -> bool {
        let slot = match column.trim() {
            "case_id" => &mut self.case_id,
            "category" => &mut self.category,
            "accident_date" => &mut self.accident_date,
            "symptom_fixation_date" => &mut self.symptom_fixation_date,
            "reference_date" => &mut self.reference_date,
            "interest_start_date" => &mut self.interest_start_date,
            "standard" => &mut self.standard,
            "fault_ratio" => &mut self.fault_ratio,
            "fault_percentage" => &mut self.fault_percentage,
            "prior_payments" => &mut self.prior_payments,
            "age" => &mut self.age,
            "sex" => &mut self.sex,
            "occupation" => &mut self.occupation,
            "annual_income" => &mut self.annual_income,
            "dependents" => &mut self.dependents,
            "grade" => &mut self.grade,
            "treatment_days" => &mut self.treatment_days,
            "hospitalization_days" => &mut self.hospitalization_days,
            "outpatient_days" => &mut self.outpatient_days,
            "lost_work_days" => &mut self.lost_work_days,
            "soft_tissue_only" => &mut self.soft_tissue_only,
            "loss_period_years" => &mut self.loss_period_years,
            _ => return false,
        };
        *slot = Some(value);
        true
    }

    /// Whether the fault share was given both as a ratio and as a percentage
    pub fn has_conflicting_fault(&self) -> bool {
        let present = |v: &Option<RawValue>| v.as_ref().is_some_and(|v| !v.is_blank());
        present(&self.fault_ratio) && present(&self.fault_percentage)
    }

    /// Whether the fault share was given as a percentage (0-100)
    pub fn fault_is_percentage(&self) -> bool {
        self.fault_ratio.as_ref().map_or(true, |v| v.is_blank())
            && self.fault_percentage.as_ref().is_some_and(|v| !v.is_blank())
    }
}
