use std::sync::Arc;

use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::*;
use crate::case::{Field, RawValue, MAX_DAYS};
use crate::damages::DamageCategory;
use crate::error::TableLookupError;
use crate::tables::test_support::shipped_tables;

fn engine(config: EngineConfig) -> Engine {
    Engine::with_tables(config, shipped_tables())
}

fn retiring_at_65() -> EngineConfig {
    EngineConfig {
        retirement_age: 65,
        ..EngineConfig::default()
    }
}

/// Traffic case, 30 days of outpatient treatment, fixed one month after the accident
fn raw_case(income: u64, fault_percent: u32, grade: u8) -> RawCase {
    let mut raw = RawCase::default();
    let columns: [(&str, RawValue); 12] = [
        ("case_id", "E-1".into()),
        ("category", "traffic".into()),
        ("accident_date", "2023-04-01".into()),
        ("symptom_fixation_date", "2023-04-30".into()),
        ("reference_date", "2024-03-31".into()),
        ("standard", "old".into()),
        ("age", 40i64.into()),
        ("sex", "male".into()),
        ("annual_income", RawValue::Integer(income as i64)),
        ("treatment_days", 30i64.into()),
        ("hospitalization_days", 0i64.into()),
        ("outpatient_days", 30i64.into()),
    ];
    for (column, value) in columns {
        raw.set_column(column, value);
    }
    raw.set_column("fault_percentage", RawValue::Integer(i64::from(fault_percent)));
    let grade = if grade == 0 { "none".to_string() } else { grade.to_string() };
    raw.set_column("grade", RawValue::Text(grade));
    raw
}

#[test]
fn test_reference_scenario() {
    let engine = engine(retiring_at_65());
    let result = engine.evaluate(&raw_case(5_000_000, 0, 14)).unwrap();

    assert_eq!(result.subtotal(DamageCategory::TreatmentConsolation), dec!(280000));
    assert_eq!(result.subtotal(DamageCategory::AfterEffectConsolation), dec!(1100000));
    assert_eq!(result.subtotal(DamageCategory::FutureEarnings), dec!(4353250));
    assert_eq!(result.subtotal(DamageCategory::LostIncome), dec!(410959));
    assert_eq!(result.subtotal(DamageCategory::MedicalCosts), Decimal::ZERO);
    assert_eq!(result.gross_total, dec!(6144209));
    assert_eq!(result.post_offset_total, dec!(6144209));

    assert_eq!(result.fee.amount, dec!(1191631));
    assert_eq!(result.interest.days, 366);
    assert_eq!(result.interest.amount, dec!(184831));
    assert_eq!(result.grand_total, dec!(7520671));
    assert_eq!(result.table_version, engine.tables().version());
}

#[test]
fn test_validation_errors_surface_through_evaluate() {
    let mut raw = raw_case(5_000_000, 0, 14);
    raw.age = None;
    raw.sex = Some("x".into());
    match engine(EngineConfig::default()).evaluate(&raw) {
        Err(EngineError::Validation(errors)) => {
            assert!(errors.contains(Field::Age));
            assert!(errors.contains(Field::Sex));
        }
        other => panic!("expected validation failure, got {:?}", other.map(|r| r.grand_total)),
    }
}

#[test]
fn test_oversized_income_is_a_validation_error() {
    let engine = engine(EngineConfig::default());
    for income in ["100000000000000000000", "5000000000000000000000000000"] {
        let mut raw = raw_case(5_000_000, 0, 14);
        raw.annual_income = Some(income.into());
        match engine.evaluate(&raw) {
            Err(EngineError::Validation(errors)) => assert!(errors.contains(Field::AnnualIncome)),
            other => panic!("expected validation failure for {}, got {:?}", income, other.map(|r| r.grand_total)),
        }
    }
}

#[test]
fn test_largest_accepted_inputs_stay_under_the_ceiling() {
    let config = EngineConfig::default();
    let ceiling = config.max_input_amount;
    let engine = engine(config);

    let mut raw = raw_case(0, 0, 1);
    raw.set_column("category", "workplace".into());
    raw.set_column("occupation", "salaried".into());
    raw.set_column("accident_date", "1950-01-01".into());
    raw.set_column("symptom_fixation_date", "2050-03-31".into());
    raw.set_column("reference_date", "2050-04-30".into());
    raw.set_column("treatment_days", RawValue::Integer(i64::from(MAX_DAYS)));
    raw.set_column("lost_work_days", RawValue::Integer(i64::from(MAX_DAYS)));
    raw.annual_income = Some(RawValue::Text(ceiling.to_string()));

    let result = engine.evaluate(&raw).unwrap();
    assert!(result.gross_total <= engine.config().max_line_amount);
}

#[test]
fn test_horizon_boundary_through_engine() {
    let mut raw = raw_case(5_000_000, 0, 14);
    raw.age = Some(RawValue::Integer(0));

    // 67 years is the last tabulated duration
    assert!(engine(EngineConfig::default()).evaluate(&raw).is_ok());

    let beyond = EngineConfig {
        retirement_age: 68,
        ..EngineConfig::default()
    };
    match engine(beyond).evaluate(&raw) {
        Err(EngineError::Calculation(CalculationError::Lookup { case_id, source })) => {
            assert_eq!(case_id, "E-1");
            assert!(matches!(source, TableLookupError::HorizonExceeded { years: 68, max_years: 67, .. }));
        }
        other => panic!("expected horizon failure, got {:?}", other.map(|r| r.grand_total)),
    }
}

#[test]
fn test_cache_hit_returns_same_result() {
    let engine = engine(EngineConfig::default());
    let case = engine.normalize(&raw_case(4_200_000, 10, 12)).unwrap();
    let mut cache = CalculationCache::new();

    let first = engine.calculate_cached(&case, &mut cache).unwrap();
    let second = engine.calculate_cached(&case, &mut cache).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(cache.cache_hits, 1);
    assert_eq!(cache.cache_misses, 1);

    let other = Engine::with_tables(retiring_at_65(), shipped_tables());
    let third = other.calculate_cached(&case, &mut cache).unwrap();
    assert!(!Arc::ptr_eq(&first, &third));
    assert_eq!(cache.len(), 2);
}

#[test]
fn test_batch_keeps_order() {
    let engine = engine(EngineConfig::default());
    let cases: Vec<_> = (0..20u64)
        .map(|i| engine.normalize(&raw_case(3_000_000 + i * 100_000, 0, 14)).unwrap())
        .collect();

    let batch = engine.calculate_batch(&cases);
    for (case, result) in cases.iter().zip(&batch) {
        assert_eq!(result.as_ref().unwrap(), &engine.calculate(case).unwrap());
    }
}

#[test]
fn test_prior_payments_reduce_post_offset_total() {
    let engine = engine(EngineConfig::default());
    let mut raw = raw_case(5_000_000, 20, 14);
    raw.set_column("prior_payments", "1,000,000".into());
    let result = engine.evaluate(&raw).unwrap();

    assert_eq!(result.offset.prior_payment_deduction, dec!(1000000));
    assert_eq!(
        result.gross_total - result.offset.fault_offset - result.offset.prior_payment_deduction,
        result.post_offset_total
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_identical_input_identical_bytes(
        income in 0u64..50_000_000,
        fault in 0u32..=100,
        grade in 0u8..=14,
    ) {
        let engine = engine(EngineConfig::default());
        let raw = raw_case(income, fault, grade);
        let a = serde_json::to_vec(&engine.evaluate(&raw).unwrap()).unwrap();
        let b = serde_json::to_vec(&engine.evaluate(&raw).unwrap()).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn prop_grand_total_non_decreasing_in_income(
        low in 0u64..30_000_000,
        raise in 0u64..30_000_000,
        fault in 0u32..=100,
        grade in 0u8..=14,
    ) {
        let engine = engine(EngineConfig::default());
        let a = engine.evaluate(&raw_case(low, fault, grade)).unwrap();
        let b = engine.evaluate(&raw_case(low + raise, fault, grade)).unwrap();
        prop_assert!(a.grand_total <= b.grand_total);
    }

    #[test]
    fn prop_grand_total_non_increasing_in_fault(
        income in 0u64..50_000_000,
        fault in 0u32..=100,
        more in 0u32..=100,
        grade in 0u8..=14,
    ) {
        let engine = engine(EngineConfig::default());
        let higher = (fault + more).min(100);
        let a = engine.evaluate(&raw_case(income, fault, grade)).unwrap();
        let b = engine.evaluate(&raw_case(income, higher, grade)).unwrap();
        prop_assert!(b.grand_total <= a.grand_total);
    }

    #[test]
    fn prop_grade_none_zeroes_after_effect_items(income in 0u64..50_000_000, fault in 0u32..=100) {
        let result = engine(EngineConfig::default()).evaluate(&raw_case(income, fault, 0)).unwrap();
        prop_assert_eq!(result.subtotal(DamageCategory::AfterEffectConsolation), Decimal::ZERO);
        prop_assert_eq!(result.subtotal(DamageCategory::FutureEarnings), Decimal::ZERO);
    }

    #[test]
    fn prop_exempt_items_survive_full_fault(income in 0u64..50_000_000, grade in 1u8..=14) {
        let mut config = EngineConfig::default();
        config.offset_exempt.insert(DamageCategory::AfterEffectConsolation);
        let result = engine(config).evaluate(&raw_case(income, 100, grade)).unwrap();

        let exempt = result.subtotal(DamageCategory::AfterEffectConsolation);
        prop_assert!(exempt > Decimal::ZERO);
        prop_assert_eq!(result.offset.exempt_total, exempt);
        prop_assert_eq!(result.post_offset_total, exempt);
    }

    #[test]
    fn prop_totals_reconcile(
        income in 0u64..50_000_000,
        fault in 0u32..=100,
        grade in 0u8..=14,
        prior in 0u64..20_000_000,
    ) {
        let mut raw = raw_case(income, fault, grade);
        raw.set_column("prior_payments", RawValue::Integer(prior as i64));
        let result = engine(EngineConfig::default()).evaluate(&raw).unwrap();

        let subtotal_sum: Decimal = result.subtotals.values().copied().sum();
        prop_assert_eq!(subtotal_sum, result.gross_total);
        prop_assert_eq!(
            subtotal_sum - result.offset.fault_offset - result.offset.prior_payment_deduction,
            result.post_offset_total
        );
        prop_assert_eq!(
            result.grand_total,
            result.post_offset_total + result.fee.amount + result.interest.amount
        );
        if fault == 0 && prior == 0 {
            prop_assert_eq!(subtotal_sum, result.post_offset_total);
        }
    }

    #[test]
    fn prop_parallel_matches_sequential(
        income in 0u64..50_000_000,
        fault in 0u32..=100,
        grade in 0u8..=14,
    ) {
        let raw = raw_case(income, fault, grade);
        let sequential = engine(EngineConfig::default()).evaluate(&raw).unwrap();
        let parallel = engine(EngineConfig { parallel: true, ..EngineConfig::default() })
            .evaluate(&raw)
            .unwrap();
        prop_assert_eq!(sequential, parallel);
    }
}
