//! Integration tests for the profiling and cleaning pipeline.
//!
//! These tests load the CSV fixtures through the public API and check
//! end-to-end behavior.

use analyst_processing::analysis::{self, Aggregation, TrendPeriod};
use analyst_processing::{
    AnalystError, CleaningConfig, DuplicateStrategy, IssueKind, MissingStrategy, OutlierStrategy,
    Pipeline, Preferences, ProfileConfig, ReportGenerator, RuleKind, clean, io, profile,
};
use polars::prelude::*;
use pretty_assertions::assert_eq;
use std::path::PathBuf;

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_csv(filename: &str) -> DataFrame {
    io::load_csv(fixtures_path().join(filename)).expect("Failed to read CSV fixture")
}

fn int_cells(df: &DataFrame, column: &str) -> Vec<Option<i64>> {
    df.column(column)
        .unwrap()
        .cast(&DataType::Int64)
        .unwrap()
        .i64()
        .unwrap()
        .into_iter()
        .collect()
}

fn age_config() -> CleaningConfig {
    CleaningConfig::builder()
        .missing_strategy(MissingStrategy::Median)
        .outlier_strategy(OutlierStrategy::Clip)
        .build()
        .unwrap()
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_age_median_then_clip() {
    let df = load_csv("people.csv");
    let config = age_config();

    let before = profile(&df, &config.profile);
    let outcome = clean(df, &before.issues, &config).unwrap();

    assert_eq!(
        int_cells(&outcome.dataset, "age"),
        vec![Some(25), Some(30), Some(29), Some(140), Some(28)]
    );

    let age_records: Vec<_> = outcome.records_for("age").collect();
    assert_eq!(age_records.len(), 2);
    assert_eq!(age_records[0].rule, RuleKind::MissingValueRemediation);
    assert_eq!(age_records[0].strategy, "median");
    assert_eq!(age_records[0].rows_affected, 1);
    assert_eq!(age_records[1].rule, RuleKind::OutlierRemediation);
    assert_eq!(age_records[1].strategy, "clip");
    assert_eq!(age_records[1].rows_affected, 1);
}

#[test]
fn test_three_duplicates_keep_first() {
    let df = load_csv("duplicates.csv");
    let config = CleaningConfig::builder()
        .duplicate_strategy(DuplicateStrategy::KeepFirst)
        .build()
        .unwrap();

    let before = profile(&df, &config.profile);
    assert_eq!(before.issues_of(IssueKind::DuplicateRow).count(), 1);

    let outcome = clean(df, &before.issues, &config).unwrap();

    assert_eq!(outcome.dataset.height(), 3);
    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.records[0].rule, RuleKind::DuplicateResolution);
    assert_eq!(outcome.records[0].rows_affected, 2);
    assert_eq!(outcome.records[0].column, None);
}

#[test]
fn test_empty_dataset() {
    let df = load_csv("empty.csv");
    assert_eq!(df.height(), 0);

    let config = CleaningConfig::default();
    let empty_profile = profile(&df, &config.profile);
    assert!(empty_profile.columns.is_empty());
    assert!(empty_profile.issues.is_empty());

    let err = clean(df, &empty_profile.issues, &config).unwrap_err();
    assert!(matches!(err, AnalystError::DataShape(_)));
}

// ============================================================================
// Invariants
// ============================================================================

#[test]
fn test_profile_is_deterministic() {
    let df = load_csv("sales.csv");
    let config = ProfileConfig::default();

    assert_eq!(profile(&df, &config), profile(&df, &config));
}

#[test]
fn test_clean_is_deterministic() {
    let config = CleaningConfig::default();
    let run = || {
        let df = load_csv("sales.csv");
        let issues = profile(&df, &config.profile).issues;
        clean(df, &issues, &config).unwrap()
    };

    let first = run();
    let second = run();

    assert!(first.dataset.equals_missing(&second.dataset));
    assert_eq!(first.records.len(), second.records.len());
    for (a, b) in first.records.iter().zip(&second.records) {
        assert!(a.same_effect(b), "{:?} != {:?}", a, b);
    }
}

#[test]
fn test_columns_preserved_in_order() {
    let df = load_csv("sales.csv");
    let names: Vec<String> = df.get_column_names().iter().map(|n| n.to_string()).collect();

    let result = Pipeline::builder().build().unwrap().run(df).unwrap();
    let cleaned: Vec<String> = result
        .dataset
        .get_column_names()
        .iter()
        .map(|n| n.to_string())
        .collect();

    assert_eq!(cleaned, names);
}

#[test]
fn test_row_count_kept_without_drop_strategies() {
    let df = load_csv("sales.csv");
    let config = CleaningConfig::builder()
        .missing_strategy(MissingStrategy::Mode)
        .outlier_strategy(OutlierStrategy::Clip)
        .duplicate_strategy(DuplicateStrategy::FlagOnly)
        .build()
        .unwrap();

    let result = Pipeline::builder().config(config).build().unwrap().run(df).unwrap();

    assert_eq!(result.summary.rows_before, 8);
    assert_eq!(result.summary.rows_after, 8);
}

#[test]
fn test_drop_row_only_shrinks() {
    let df = load_csv("sales.csv");
    let config = CleaningConfig::builder()
        .missing_strategy(MissingStrategy::DropRow)
        .outlier_strategy(OutlierStrategy::DropRow)
        .build()
        .unwrap();

    let result = Pipeline::builder().config(config).build().unwrap().run(df).unwrap();

    // one missing region, one missing amount, one outlying amount
    assert_eq!(result.summary.rows_after, 5);
}

#[test]
fn test_missing_values_eliminated() {
    let df = load_csv("sales.csv");
    let result = Pipeline::builder().build().unwrap().run(df).unwrap();

    for column in &result.profile_after.columns {
        assert_eq!(column.null_count, 0, "column {} still has missing cells", column.name);
    }
    assert_eq!(result.profile_after.issues_of(IssueKind::MissingValue).count(), 0);
    assert_eq!(result.summary.completeness_after, 1.0);
}

#[test]
fn test_clean_output_stays_clean() {
    let df = load_csv("duplicates.csv");
    let pipeline = Pipeline::builder().build().unwrap();

    let first = pipeline.run(df).unwrap();
    let second = pipeline.run(first.dataset).unwrap();

    assert!(second.records.iter().all(|r| r.rows_affected == 0));
    assert_eq!(second.summary.rows_after, 3);
}

fn orders_config() -> CleaningConfig {
    CleaningConfig::builder()
        .missing_strategy_for("order_date", MissingStrategy::ForwardFill)
        .missing_strategy_for("category", MissingStrategy::Mode)
        .missing_strategy_for("quantity", MissingStrategy::Median)
        .duplicate_strategy(DuplicateStrategy::KeepFirst)
        .build()
        .unwrap()
}

#[test]
fn test_imputed_output_stays_clean() {
    let df = load_csv("orders.csv");
    let pipeline = Pipeline::builder().config(orders_config()).build().unwrap();

    let first = pipeline.run(df).unwrap();
    assert_eq!(first.dataset.height(), 7);
    assert_eq!(
        int_cells(&first.dataset, "quantity"),
        vec![Some(4), Some(6), Some(5), Some(7), Some(6), Some(3), Some(8)]
    );
    for (column, strategy) in [
        ("order_date", "forward_fill"),
        ("category", "mode"),
        ("quantity", "median"),
    ] {
        let records: Vec<_> = first
            .records
            .iter()
            .filter(|r| r.column.as_deref() == Some(column))
            .collect();
        assert_eq!(records.len(), 1, "{}", column);
        assert_eq!(records[0].strategy, strategy);
        assert_eq!(records[0].rows_affected, 1);
    }

    let second = pipeline.run(first.dataset).unwrap();
    assert!(second.profile_before.issues.is_empty());
    assert!(second.records.iter().all(|r| r.rows_affected == 0));
    assert_eq!(second.summary.rows_after, 7);
}

#[test]
fn test_clipping_can_expose_a_new_outlier() {
    let df = load_csv("people.csv");
    let pipeline = Pipeline::builder().config(age_config()).build().unwrap();

    let first = pipeline.run(df).unwrap();
    let second = pipeline.run(first.dataset).unwrap();

    // 140 sits above the fences of the clipped distribution
    assert_eq!(second.records.len(), 1);
    let record = &second.records[0];
    assert_eq!(record.rule, RuleKind::OutlierRemediation);
    assert_eq!(record.column.as_deref(), Some("age"));
    assert_eq!(record.strategy, "clip");
    assert_eq!(record.rows_affected, 1);
}

// ============================================================================
// Preferences, Analysis and Reports
// ============================================================================

#[test]
fn test_preferences_drive_pipeline() {
    let prefs = Preferences::load(fixtures_path().join("user_preference.txt")).unwrap();
    let dataset = prefs.dataset_path().unwrap();
    assert_eq!(dataset, PathBuf::from("tests/fixtures/people.csv"));

    let df = io::load_csv(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(dataset)).unwrap();
    let result = Pipeline::builder()
        .config(prefs.config)
        .build()
        .unwrap()
        .run(df)
        .unwrap();

    assert_eq!(
        int_cells(&result.dataset, "age"),
        vec![Some(25), Some(30), Some(29), Some(140), Some(28)]
    );
}

#[test]
fn test_analysis_on_fixture() {
    let df = load_csv("sales.csv");
    let config = ProfileConfig::default();

    let overview = analysis::overview(&df, &config);
    assert_eq!(overview.rows, 8);
    assert_eq!(overview.missing.len(), 2);

    let by_region =
        analysis::group_aggregate(&df, "region", "amount", Aggregation::Sum, &config).unwrap();
    assert_eq!(by_region[0].group, "north");
    assert_eq!(by_region[0].value, 42.0);

    let trend = analysis::trend(&df, "date", "amount", TrendPeriod::Quarterly, &config).unwrap();
    let labels: Vec<&str> = trend.periods.iter().map(|p| p.period.as_str()).collect();
    assert_eq!(labels, vec!["2024Q1", "2024Q2"]);

    let report = analysis::outlier_report(&df, "amount", &config).unwrap();
    assert_eq!(report.iqr.unwrap().outliers, 1);
}

#[test]
fn test_reports_render() {
    let df = load_csv("people.csv");
    let result = Pipeline::builder()
        .config(age_config())
        .build()
        .unwrap()
        .run(df)
        .unwrap();

    let json = ReportGenerator::schema_json(&result.profile_before, "people.csv").unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["column_count"], 2);

    let log = ReportGenerator::transformation_log_markdown(
        &result.records,
        &result.profile_before.issues,
    );
    assert!(log.contains("outlier_remediation `clip` on age"));

    let report = ReportGenerator::build_comprehensive_report("people.csv", &result);
    let json = serde_json::to_string(&report).unwrap();
    assert!(json.contains("\"profile_after\""));
}
