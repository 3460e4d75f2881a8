//! Typed case entities produced by the normalizer

use std::fmt;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Kind of incident the claim arises from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseCategory {
    Traffic,
    Workplace,
    MedicalMalpractice,
}

impl CaseCategory {
    pub const ALL: [CaseCategory; 3] = [
        CaseCategory::Traffic,
        CaseCategory::Workplace,
        CaseCategory::MedicalMalpractice,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CaseCategory::Traffic => "traffic",
            CaseCategory::Workplace => "workplace",
            CaseCategory::MedicalMalpractice => "medical_malpractice",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "traffic" | "交通事故" => Some(CaseCategory::Traffic),
            "workplace" | "労働災害" => Some(CaseCategory::Workplace),
            "medical_malpractice" | "malpractice" | "医療過誤" => {
                Some(CaseCategory::MedicalMalpractice)
            }
            _ => None,
        }
    }
}

impl fmt::Display for CaseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Professional fee / interest schedule variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculationStandard {
    /// Former bar association remuneration standard (retainer + success fee brackets)
    #[default]
    Old,
    /// Court-recognized attorney fee as damages
    New,
}

impl CalculationStandard {
    pub fn as_str(&self) -> &'static str {
        match self {
            CalculationStandard::Old => "old",
            CalculationStandard::New => "new",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "old" | "old_standard" | "旧基準" => Some(CalculationStandard::Old),
            "new" | "new_standard" | "新基準" => Some(CalculationStandard::New),
            _ => None,
        }
    }
}

impl fmt::Display for CalculationStandard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sex of the victim (selects the life table column)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "male" | "m" | "男" | "男性" => Some(Sex::Male),
            "female" | "f" | "女" | "女性" => Some(Sex::Female),
            _ => None,
        }
    }
}

/// Occupation class used for statutory average wage substitution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OccupationClass {
    Salaried,
    SelfEmployed,
    Homemaker,
    Student,
    Unemployed,
    /// Not stated on the input; no statutory wage applies
    Unspecified,
}

impl OccupationClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            OccupationClass::Salaried => "salaried",
            OccupationClass::SelfEmployed => "self_employed",
            OccupationClass::Homemaker => "homemaker",
            OccupationClass::Student => "student",
            OccupationClass::Unemployed => "unemployed",
            OccupationClass::Unspecified => "unspecified",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "salaried" | "employee" | "給与所得者" => Some(OccupationClass::Salaried),
            "self_employed" | "自営業" => Some(OccupationClass::SelfEmployed),
            "homemaker" | "家事従事者" => Some(OccupationClass::Homemaker),
            "student" | "学生" => Some(OccupationClass::Student),
            "unemployed" | "無職" => Some(OccupationClass::Unemployed),
            _ => None,
        }
    }
}

/// Certified after-effect grade, 1 (most severe) to 14
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Grade(u8);

impl Grade {
    pub const MOST_SEVERE: u8 = 1;
    pub const LEAST_SEVERE: u8 = 14;

    pub fn new(value: u8) -> Option<Self> {
        (Self::MOST_SEVERE..=Self::LEAST_SEVERE)
            .contains(&value)
            .then_some(Grade(value))
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

/// After-effect classification; `None` means no certified residual impairment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AfterEffectGrade {
    #[default]
    None,
    Graded(Grade),
}

impl AfterEffectGrade {
    pub fn grade(&self) -> Option<Grade> {
        match self {
            AfterEffectGrade::None => None,
            AfterEffectGrade::Graded(grade) => Some(*grade),
        }
    }
}

impl fmt::Display for AfterEffectGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AfterEffectGrade::None => f.write_str("none"),
            AfterEffectGrade::Graded(grade) => write!(f, "grade {}", grade.value()),
        }
    }
}

/// Whether the annual income is the victim's own or a statutory substitute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncomeBasis {
    Actual,
    StatutoryAverage,
}

/// Kind of an itemized expense
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostKind {
    Medical,
    Transportation,
    Nursing,
    Other,
}

impl CostKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "medical" | "治療費" => Some(CostKind::Medical),
            "transportation" | "transport" | "交通費" => Some(CostKind::Transportation),
            "nursing" | "看護費" => Some(CostKind::Nursing),
            "other" | "その他" => Some(CostKind::Other),
            _ => None,
        }
    }
}

/// One itemized medical or ancillary expense
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostEntry {
    pub kind: CostKind,
    pub amount: Decimal,
    /// Already reimbursed by an insurer or employer; excluded from recovery
    pub covered_by_payer: bool,
    pub description: String,
}

/// Case-level facts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Case {
    pub id: String,
    pub category: CaseCategory,
    pub accident_date: NaiveDate,
    pub symptom_fixation_date: NaiveDate,
    /// Calculation or judgment date; interest accrues up to here
    pub reference_date: NaiveDate,
    pub interest_start_date: NaiveDate,
    pub standard: CalculationStandard,
    /// Victim's own share of fault, 0 to 1
    pub fault_ratio: Decimal,
    /// Amounts already received from insurers, deducted after the fault offset
    pub prior_payments: Decimal,
}

/// The injured person
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Victim {
    pub age_at_accident: u8,
    pub sex: Sex,
    pub occupation: OccupationClass,
    pub annual_income: Decimal,
    pub income_basis: IncomeBasis,
    /// Carried for statements and reports; no injury calculator depends on it
    pub dependents: u8,
}

/// Injury classification and treatment history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Injury {
    pub grade: AfterEffectGrade,
    /// Days from start of treatment to symptom fixation
    pub treatment_days: u32,
    pub hospitalization_days: u32,
    /// Days the victim actually attended as an outpatient
    pub outpatient_days: u32,
    pub lost_work_days: u32,
    /// Soft-tissue injury without objective findings (consolation Schedule II)
    pub soft_tissue_only: bool,
    /// Court-shortened loss period in years
    pub loss_period_override: Option<u32>,
    pub costs: Vec<CostEntry>,
}

/// A fully validated case, ready for calculation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedCase {
    pub case: Case,
    pub victim: Victim,
    pub injury: Injury,
}

impl NormalizedCase {
    /// Victim's age on the symptom-fixation date
    pub fn age_at_fixation(&self) -> u8 {
        let accident = self.case.accident_date;
        let fixation = self.case.symptom_fixation_date;
        let mut elapsed = fixation.year() - accident.year();
        if (fixation.month(), fixation.day()) < (accident.month(), accident.day()) {
            elapsed -= 1;
        }
        let age = u32::from(self.victim.age_at_accident) + elapsed.max(0) as u32;
        age.min(u32::from(u8::MAX)) as u8
    }

    /// Hex SHA-256 of the canonical serialized form
    ///
    /// Equal fingerprints mean equal inputs, so results may be cached by it.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        // Serializing plain data with derived impls cannot fail
        if let Ok(bytes) = serde_json::to_vec(self) {
            hasher.update(&bytes);
        }
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample() -> NormalizedCase {
        NormalizedCase {
            case: Case {
                id: "A-1".to_string(),
                category: CaseCategory::Traffic,
                accident_date: NaiveDate::from_ymd_opt(2023, 6, 15).unwrap(),
                symptom_fixation_date: NaiveDate::from_ymd_opt(2024, 6, 14).unwrap(),
                reference_date: NaiveDate::from_ymd_opt(2024, 12, 1).unwrap(),
                interest_start_date: NaiveDate::from_ymd_opt(2023, 6, 15).unwrap(),
                standard: CalculationStandard::Old,
                fault_ratio: dec!(0.2),
                prior_payments: dec!(0),
            },
            victim: Victim {
                age_at_accident: 40,
                sex: Sex::Male,
                occupation: OccupationClass::Salaried,
                annual_income: dec!(5000000),
                income_basis: IncomeBasis::Actual,
                dependents: 2,
            },
            injury: Injury {
                grade: AfterEffectGrade::Graded(Grade::new(14).unwrap()),
                treatment_days: 180,
                hospitalization_days: 0,
                outpatient_days: 60,
                lost_work_days: 60,
                soft_tissue_only: true,
                loss_period_override: None,
                costs: Vec::new(),
            },
        }
    }

    #[test]
    fn test_grade_bounds() {
        assert!(Grade::new(0).is_none());
        assert!(Grade::new(15).is_none());
        assert_eq!(Grade::new(1).map(|g| g.value()), Some(1));
        assert_eq!(Grade::new(14).map(|g| g.value()), Some(14));
    }

    #[test]
    fn test_age_at_fixation_counts_whole_years() {
        let mut case = sample();
        assert_eq!(case.age_at_fixation(), 40);

        case.case.symptom_fixation_date = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        assert_eq!(case.age_at_fixation(), 41);
    }

    #[test]
    fn test_fingerprint_tracks_inputs() {
        let a = sample();
        let b = sample();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);

        let mut c = sample();
        c.case.fault_ratio = dec!(0.3);
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn test_parse_labels() {
        assert_eq!(CaseCategory::parse("Medical-Malpractice"), Some(CaseCategory::MedicalMalpractice));
        assert_eq!(CalculationStandard::parse("旧基準"), Some(CalculationStandard::Old));
        assert_eq!(Sex::parse("F"), Some(Sex::Female));
        assert_eq!(OccupationClass::parse("家事従事者"), Some(OccupationClass::Homemaker));
        assert_eq!(CostKind::parse("bogus"), None);
    }
}
