//! Case normalizer: the only validation boundary between raw input and the engine
//!
//! Coerces loosely typed values, checks ranges and cross-field consistency and
//! substitutes statutory defaults. Every violation is collected; a record with
//! any violation produces no `NormalizedCase`.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use super::raw::{Field, RawCase, RawCostEntry, RawValue};
use super::types::{
    AfterEffectGrade, CalculationStandard, Case, CaseCategory, CostEntry, CostKind, Grade,
    IncomeBasis, Injury, NormalizedCase, OccupationClass, Sex, Victim,
};
use crate::config::EngineConfig;
use crate::error::ValidationErrors;
use crate::tables::TableStore;

pub const MAX_AGE: u32 = 120;
pub const MAX_DEPENDENTS: u32 = 30;
/// Upper bound for every day count (100 years)
pub const MAX_DAYS: u32 = 36_600;

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d", "%Y年%m月%d日"];

/// Fields every case must supply
const COMMON_REQUIRED: [Field; 7] = [
    Field::CaseId,
    Field::Category,
    Field::AccidentDate,
    Field::SymptomFixationDate,
    Field::ReferenceDate,
    Field::Age,
    Field::Sex,
];

/// Additional fields a case category must supply
pub fn required_fields(category: CaseCategory) -> &'static [Field] {
    match category {
        CaseCategory::Traffic => &[
            Field::TreatmentDays,
            Field::HospitalizationDays,
            Field::OutpatientDays,
        ],
        CaseCategory::Workplace => &[Field::TreatmentDays, Field::Occupation, Field::LostWorkDays],
        CaseCategory::MedicalMalpractice => &[Field::TreatmentDays],
    }
}

/// Validate and canonicalize one raw case record
pub fn normalize(
    raw: &RawCase,
    tables: &TableStore,
    config: &EngineConfig,
) -> Result<NormalizedCase, ValidationErrors> {
    let mut reader = Reader {
        raw,
        max_amount: config.max_input_amount,
        errors: ValidationErrors::new(),
        required: Vec::from(COMMON_REQUIRED),
    };

    let category = reader.parsed(Field::Category, "a case category", CaseCategory::parse);
    if let Some(category) = category {
        reader.required.extend_from_slice(required_fields(category));
    }

    let id = reader.text(Field::CaseId);
    let accident_date = reader.date(Field::AccidentDate);
    let fixation_date = reader.date(Field::SymptomFixationDate);
    let reference_date = reader.date(Field::ReferenceDate);
    let interest_start = reader.date(Field::InterestStartDate).or(accident_date);
    let standard = reader
        .parsed(Field::Standard, "\"old\" or \"new\"", CalculationStandard::parse)
        .unwrap_or(config.default_standard);
    let fault_ratio = reader.fault_ratio();
    let prior_payments = reader
        .amount(Field::PriorPayments)
        .unwrap_or(Decimal::ZERO);

    let age = reader.count(Field::Age, MAX_AGE);
    let sex = reader.parsed(Field::Sex, "male or female", Sex::parse);
    let occupation = reader
        .parsed(Field::Occupation, "a known occupation class", OccupationClass::parse)
        .unwrap_or(OccupationClass::Unspecified);
    let dependents = reader.count(Field::Dependents, MAX_DEPENDENTS).unwrap_or(0);
    let income = reader.income(tables, occupation, sex);

    let grade = reader.grade();
    let treatment_days = reader.count(Field::TreatmentDays, MAX_DAYS);
    let hospitalization_days = reader.count(Field::HospitalizationDays, MAX_DAYS).unwrap_or(0);
    let outpatient_days = reader.count(Field::OutpatientDays, MAX_DAYS).unwrap_or(0);
    let lost_work_days = reader
        .count(Field::LostWorkDays, MAX_DAYS)
        .unwrap_or(hospitalization_days.saturating_add(outpatient_days));
    let soft_tissue_only = reader.flag(Field::SoftTissueOnly).unwrap_or(false);
    let loss_period_override = reader.count(Field::LossPeriodYears, u32::MAX);
    let costs = reader.costs();

    // Cross-field consistency, only where both sides parsed
    if let (Some(accident), Some(fixation)) = (accident_date, fixation_date) {
        if fixation < accident {
            reader.errors.push(
                Field::SymptomFixationDate,
                format!("{} is before the accident date {}", fixation, accident),
            );
        } else if let Some(treatment) = treatment_days {
            let span = (fixation - accident).num_days() + 1;
            if i64::from(treatment) > span {
                reader.errors.push(
                    Field::TreatmentDays,
                    format!("{} days exceeds the {} days from accident to symptom fixation", treatment, span),
                );
            }
        }
    }
    if let (Some(accident), Some(reference)) = (accident_date, reference_date) {
        if reference < accident {
            reader.errors.push(
                Field::ReferenceDate,
                format!("{} is before the accident date {}", reference, accident),
            );
        }
    }
    if let (Some(start), Some(reference)) = (interest_start, reference_date) {
        if start > reference {
            reader.errors.push(
                Field::InterestStartDate,
                format!("{} is after the reference date {}", start, reference),
            );
        }
    }
    if let Some(treatment) = treatment_days {
        let attended = u64::from(hospitalization_days) + u64::from(outpatient_days);
        if attended > u64::from(treatment) {
            reader.errors.push(
                Field::HospitalizationDays,
                format!(
                    "hospitalization + outpatient days ({}) exceed treatment days ({})",
                    attended, treatment
                ),
            );
        }
        if lost_work_days > treatment {
            reader.errors.push(
                Field::LostWorkDays,
                format!("{} exceeds treatment days ({})", lost_work_days, treatment),
            );
        }
    }
    if let Some(years) = loss_period_override {
        if years == 0 {
            reader.errors.push(Field::LossPeriodYears, "must be at least 1 year");
        }
        if grade == Some(AfterEffectGrade::None) {
            reader
                .errors
                .push(Field::LossPeriodYears, "given without an after-effect grade");
        }
    }

    let (
        Some(id),
        Some(category),
        Some(accident_date),
        Some(symptom_fixation_date),
        Some(reference_date),
        Some(interest_start_date),
        Some(fault_ratio),
        Some(age),
        Some(sex),
        Some((annual_income, income_basis)),
        Some(grade),
        Some(treatment_days),
        Some(costs),
    ) = (
        id,
        category,
        accident_date,
        fixation_date,
        reference_date,
        interest_start,
        fault_ratio,
        age,
        sex,
        income,
        grade,
        treatment_days,
        costs,
    )
    else {
        return Err(reader.errors);
    };
    if !reader.errors.is_empty() {
        return Err(reader.errors);
    }

    Ok(NormalizedCase {
        case: Case {
            id,
            category,
            accident_date,
            symptom_fixation_date,
            reference_date,
            interest_start_date,
            standard,
            fault_ratio,
            prior_payments,
        },
        victim: Victim {
            // Bounded by MAX_AGE above
            age_at_accident: age.min(MAX_AGE) as u8,
            sex,
            occupation,
            annual_income,
            income_basis,
            dependents: dependents.min(MAX_DEPENDENTS) as u8,
        },
        injury: Injury {
            grade,
            treatment_days,
            hospitalization_days,
            outpatient_days,
            lost_work_days,
            soft_tissue_only,
            loss_period_override,
            costs,
        },
    })
}

/// Field access that records a violation instead of failing
struct Reader<'a> {
    raw: &'a RawCase,
    /// Ceiling for monetary inputs
    max_amount: Decimal,
    errors: ValidationErrors,
    required: Vec<Field>,
}

impl Reader<'_> {
    /// The raw value, reporting absence when the field is required
    fn value(&mut self, field: Field) -> Option<RawValue> {
        match self.raw.get(field) {
            Some(value) => Some(value.clone()),
            None => {
                if self.required.contains(&field) {
                    self.errors.push(field, "required");
                }
                None
            }
        }
    }

    fn text(&mut self, field: Field) -> Option<String> {
        self.value(field).map(|v| v.as_text())
    }

    fn parsed<T>(&mut self, field: Field, expected: &str, parse: fn(&str) -> Option<T>) -> Option<T> {
        let text = self.text(field)?;
        let parsed = parse(&text);
        if parsed.is_none() {
            self.errors
                .push(field, format!("{:?} is not {}", text, expected));
        }
        parsed
    }

    fn date(&mut self, field: Field) -> Option<NaiveDate> {
        let text = self.text(field)?;
        let parsed = DATE_FORMATS
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(&text, format).ok());
        if parsed.is_none() {
            self.errors
                .push(field, format!("{:?} is not a date (YYYY-MM-DD)", text));
        }
        parsed
    }

    fn decimal(&mut self, field: Field) -> Option<Decimal> {
        let value = self.value(field)?;
        match parse_decimal(&value) {
            Some(decimal) => Some(decimal),
            None => {
                self.errors
                    .push(field, format!("{:?} is not a number", value.as_text()));
                None
            }
        }
    }

    fn non_negative(&mut self, field: Field) -> Option<Decimal> {
        let value = self.decimal(field)?;
        if value < Decimal::ZERO {
            self.errors.push(field, format!("{} is negative", value));
            return None;
        }
        Some(value)
    }

    /// A non-negative money amount no larger than the configured input ceiling
    fn amount(&mut self, field: Field) -> Option<Decimal> {
        let value = self.non_negative(field)?;
        if value > self.max_amount {
            self.errors.push(
                field,
                format!("{} exceeds the largest accepted amount {}", value, self.max_amount),
            );
            return None;
        }
        Some(value)
    }

    /// A whole count in `0..=max`
    fn count(&mut self, field: Field, max: u32) -> Option<u32> {
        let value = self.decimal(field)?;
        if value.fract() != Decimal::ZERO {
            self.errors
                .push(field, format!("{} is not a whole number", value));
            return None;
        }
        match value.to_u32() {
            Some(count) if count <= max => Some(count),
            _ => {
                self.errors
                    .push(field, format!("{} is outside 0-{}", value, max));
                None
            }
        }
    }

    fn flag(&mut self, field: Field) -> Option<bool> {
        let value = self.value(field)?;
        let parsed = parse_flag(&value);
        if parsed.is_none() {
            self.errors
                .push(field, format!("{:?} is not true or false", value.as_text()));
        }
        parsed
    }

    /// Victim's fault share as a ratio, from either the ratio or the percentage field
    fn fault_ratio(&mut self) -> Option<Decimal> {
        if self.raw.has_conflicting_fault() {
            self.errors.push(
                Field::FaultRatio,
                "give either fault_ratio or fault_percentage, not both",
            );
            return None;
        }
        if self.raw.get(Field::FaultRatio).is_none() {
            return Some(Decimal::ZERO);
        }
        let as_percentage = self.raw.fault_is_percentage();
        let value = self.decimal(Field::FaultRatio)?;
        let (ratio, upper) = if as_percentage {
            (value / Decimal::ONE_HUNDRED, Decimal::ONE_HUNDRED)
        } else {
            (value, Decimal::ONE)
        };
        if ratio < Decimal::ZERO || ratio > Decimal::ONE {
            self.errors
                .push(Field::FaultRatio, format!("{} is outside 0-{}", value, upper));
            return None;
        }
        Some(ratio.normalize())
    }

    /// Actual income, or the statutory average wage when none was given
    fn income(
        &mut self,
        tables: &TableStore,
        occupation: OccupationClass,
        sex: Option<Sex>,
    ) -> Option<(Decimal, IncomeBasis)> {
        if self.raw.get(Field::AnnualIncome).is_some() {
            return self
                .amount(Field::AnnualIncome)
                .map(|income| (income, IncomeBasis::Actual));
        }
        // Sex problems are already reported
        let sex = sex?;
        match tables.wages.average_wage(occupation, sex) {
            Some(wage) => Some((wage, IncomeBasis::StatutoryAverage)),
            None => {
                self.errors.push(
                    Field::AnnualIncome,
                    format!(
                        "missing, and no statutory average wage exists for occupation {}",
                        occupation.as_str()
                    ),
                );
                None
            }
        }
    }

    fn grade(&mut self) -> Option<AfterEffectGrade> {
        let Some(value) = self.value(Field::Grade) else {
            return Some(AfterEffectGrade::None);
        };
        let text = value.as_text();
        let trimmed = text.trim_start_matches('第').trim_end_matches('級').trim();
        if matches!(trimmed.to_ascii_lowercase().as_str(), "none" | "なし" | "非該当") {
            return Some(AfterEffectGrade::None);
        }
        let grade = trimmed.parse::<u8>().ok().and_then(Grade::new);
        if grade.is_none() {
            self.errors
                .push(Field::Grade, format!("{:?} is not a grade 1-14 or none", text));
        }
        grade.map(AfterEffectGrade::Graded)
    }

    fn costs(&mut self) -> Option<Vec<CostEntry>> {
        let raw = self.raw;
        let mut costs = Vec::with_capacity(raw.costs.len());
        let mut valid = true;
        for (index, entry) in raw.costs.iter().enumerate() {
            match self.cost(index + 1, entry) {
                Some(cost) => costs.push(cost),
                None => valid = false,
            }
        }
        if !valid {
            return None;
        }
        let total = costs
            .iter()
            .try_fold(Decimal::ZERO, |sum, cost| sum.checked_add(cost.amount))
            .filter(|total| *total <= self.max_amount);
        if total.is_none() {
            self.errors.push(
                Field::Costs,
                format!("itemized costs exceed the largest accepted amount {}", self.max_amount),
            );
            return None;
        }
        Some(costs)
    }

    fn cost(&mut self, position: usize, entry: &RawCostEntry) -> Option<CostEntry> {
        let present = |v: &Option<RawValue>| v.as_ref().filter(|v| !v.is_blank()).cloned();

        let kind = match present(&entry.kind) {
            Some(kind) => {
                let parsed = CostKind::parse(&kind.as_text());
                if parsed.is_none() {
                    self.errors.push(
                        Field::Costs,
                        format!("entry {}: unknown kind {:?}", position, kind.as_text()),
                    );
                }
                parsed
            }
            None => {
                self.errors
                    .push(Field::Costs, format!("entry {}: kind required", position));
                None
            }
        };

        let amount = match present(&entry.amount).map(|a| (parse_decimal(&a), a)) {
            Some((Some(amount), _)) if amount >= Decimal::ZERO => Some(amount),
            Some((Some(amount), _)) => {
                self.errors.push(
                    Field::Costs,
                    format!("entry {}: amount {} is negative", position, amount),
                );
                None
            }
            Some((None, raw)) => {
                self.errors.push(
                    Field::Costs,
                    format!("entry {}: {:?} is not a number", position, raw.as_text()),
                );
                None
            }
            None => {
                self.errors
                    .push(Field::Costs, format!("entry {}: amount required", position));
                None
            }
        };

        let covered_by_payer = match present(&entry.covered_by_payer) {
            Some(flag) => {
                let parsed = parse_flag(&flag);
                if parsed.is_none() {
                    self.errors.push(
                        Field::Costs,
                        format!("entry {}: {:?} is not true or false", position, flag.as_text()),
                    );
                }
                parsed
            }
            None => Some(false),
        };

        Some(CostEntry {
            kind: kind?,
            amount: amount?,
            covered_by_payer: covered_by_payer?,
            description: entry.description.clone().unwrap_or_default(),
        })
    }
}

/// Numbers may arrive as JSON numbers or as text with thousands separators
fn parse_decimal(value: &RawValue) -> Option<Decimal> {
    match value {
        RawValue::Integer(i) => Some(Decimal::from(*i)),
        RawValue::Number(n) if n.is_finite() => Decimal::from_str(&n.to_string()).ok(),
        RawValue::Number(_) | RawValue::Bool(_) => None,
        RawValue::Text(text) => {
            let cleaned: String = text
                .trim()
                .trim_end_matches('円')
                .chars()
                .filter(|c| *c != ',' && *c != '，' && *c != '_')
                .collect();
            Decimal::from_str(&cleaned).ok()
        }
    }
}

fn parse_flag(value: &RawValue) -> Option<bool> {
    match value {
        RawValue::Bool(b) => Some(*b),
        RawValue::Integer(0) => Some(false),
        RawValue::Integer(1) => Some(true),
        RawValue::Integer(_) | RawValue::Number(_) => None,
        RawValue::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "y" | "1" | "はい" | "有" => Some(true),
            "false" | "no" | "n" | "0" | "いいえ" | "無" => Some(false),
            _ => None,
        },
    }
}
