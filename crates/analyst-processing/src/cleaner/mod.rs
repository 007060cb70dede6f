//! Cleaning engine.
//!
//! [`DataCleaner::clean`] applies the remediation rules in a fixed order:
//! 1. Type coercion of mismatched columns
//! 2. Duplicate row resolution
//! 3. Missing-value remediation, column by column
//! 4. Outlier remediation, column by column
//!
//! Every applied rule appends a [`TransformationRecord`]. The engine only acts
//! on the issues it is given and never fails halfway: configuration and
//! shape problems are reported before any row is touched.

mod duplicates;
mod missing;
mod outliers;
mod type_corrector;

pub use duplicates::DuplicateResolver;
pub use missing::MissingValueHandler;
pub use outliers::OutlierHandler;
pub use type_corrector::TypeCorrector;

use crate::config::{CleaningConfig, MissingStrategy};
use crate::error::{AnalystError, Result};
use crate::frame::{Value, WorkingColumn, WorkingFrame};
use crate::profiler::DataProfiler;
use crate::types::{CleaningOutcome, IssueKind, QualityIssue, ValueSummary};
use polars::prelude::*;
use tracing::info;

/// Entry point of the cleaning engine.
pub struct DataCleaner;

impl DataCleaner {
    /// Clean `df` by remediating `issues` according to `config`.
    ///
    /// `issues` should come from profiling the same dataset with the same
    /// profile settings; `TransformationRecord::resolves` indexes into it.
    ///
    /// # Errors
    ///
    /// - [`AnalystError::DataShape`] when the dataset has no rows or columns.
    /// - [`AnalystError::Configuration`] when the configuration is invalid,
    ///   names a column that does not exist, or carries a constant fill value
    ///   that cannot be read as its column's type.
    pub fn clean(
        df: DataFrame,
        issues: &[QualityIssue],
        config: &CleaningConfig,
    ) -> Result<CleaningOutcome> {
        let (height, width) = df.shape();
        if width == 0 {
            return Err(AnalystError::DataShape("dataset has no columns".to_string()));
        }
        if height == 0 {
            return Err(AnalystError::DataShape("dataset has no rows".to_string()));
        }

        config.validate()?;
        let column_names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();
        let names: Vec<&str> = column_names.iter().map(String::as_str).collect();
        config.validate_against(&names)?;
        Self::validate_issues(issues, &names)?;

        info!(
            "Cleaning {} rows x {} columns against {} issues",
            height,
            width,
            issues.len()
        );

        let analyses = DataProfiler::analyze_columns(&df, &config.profile);
        drop(df);

        let plans = TypeCorrector::plan(&analyses, issues, config);
        Self::validate_constants(&plans, &analyses, issues, config)?;

        // Step 1: type coercion
        let coercion = TypeCorrector::apply(&analyses, &plans);
        let mut frame = coercion.frame;
        let mut records = coercion.records;

        // Step 2: duplicates
        let raw = analyses.iter().map(|a| &a.raw);
        if let Some(record) = DuplicateResolver::resolve(&mut frame, raw, issues, config)? {
            records.push(record);
        }

        // Step 3: missing values
        records.extend(MissingValueHandler::remediate(
            &mut frame,
            issues,
            config,
            &coercion.leftovers,
        )?);

        // Step 4: outliers
        records.extend(OutlierHandler::remediate(&mut frame, issues, config));

        info!(
            "Cleaning finished: {} rows remain, {} records",
            frame.height(),
            records.len()
        );

        let dataset = frame.into_dataframe()?;
        Ok(CleaningOutcome { dataset, records })
    }

    fn validate_issues(issues: &[QualityIssue], columns: &[&str]) -> Result<()> {
        for issue in issues {
            match (&issue.column, issue.kind) {
                (Some(name), _) if !columns.contains(&name.as_str()) => {
                    return Err(AnalystError::Configuration(format!(
                        "{} issue refers to column '{}', which is not in the dataset",
                        issue.kind, name
                    )));
                }
                (None, kind) if kind != IssueKind::DuplicateRow => {
                    return Err(AnalystError::Configuration(format!(
                        "{} issue has no column",
                        kind
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Every constant fill value must be readable as the type of each column
    /// it can be applied to.
    fn validate_constants(
        plans: &[type_corrector::ColumnPlan],
        analyses: &[crate::profiler::ColumnAnalysis],
        issues: &[QualityIssue],
        config: &CleaningConfig,
    ) -> Result<()> {
        for (plan, analysis) in plans.iter().zip(analyses) {
            let name = &analysis.profile.name;
            let needs_remediation = plan.mismatch_issue.is_some()
                || issues.iter().any(|i| {
                    i.kind == IssueKind::MissingValue && i.column.as_deref() == Some(name)
                });
            let explicit = config.missing_strategy.overrides.contains_key(name);
            if !explicit && !needs_remediation {
                continue;
            }

            if let MissingStrategy::Constant(value) =
                config.missing_strategy.resolve(name, plan.column_type)
                && Value::parse(&value, plan.column_type).is_none()
            {
                return Err(AnalystError::Configuration(format!(
                    "constant '{}' cannot be used to fill {} column '{}'",
                    value, plan.column_type, name
                )));
            }
        }
        Ok(())
    }
}

/// Clean a dataset. See [`DataCleaner::clean`].
pub fn clean(
    df: DataFrame,
    issues: &[QualityIssue],
    config: &CleaningConfig,
) -> Result<CleaningOutcome> {
    DataCleaner::clean(df, issues, config)
}

// =============================================================================
// Record Helpers
// =============================================================================

/// Summary statistics of one column.
pub(crate) fn summarize_column(column: &WorkingColumn) -> ValueSummary {
    let mut observed: Vec<&Value> = column.observed().collect();
    observed.sort_by(|a, b| a.compare(b));

    let mean = if column.column_type.is_numeric() {
        column.numeric_values().mean()
    } else {
        None
    };

    ValueSummary {
        rows: column.cells.len(),
        missing: column.missing_count(),
        distinct: column.distinct_count(),
        min: observed.first().map(|v| v.render()),
        max: observed.last().map(|v| v.render()),
        mean,
    }
}

/// Summary statistics of the whole frame; `distinct` counts distinct rows.
pub(crate) fn summarize_frame(frame: &WorkingFrame) -> PolarsResult<ValueSummary> {
    Ok(ValueSummary {
        rows: frame.height(),
        missing: frame.missing_cells(),
        distinct: frame.distinct_rows()?,
        min: None,
        max: None,
        mean: None,
    })
}

/// Index of the first issue of `kind` for `column`.
pub(crate) fn find_issue(issues: &[QualityIssue], kind: IssueKind, column: &str) -> Option<usize> {
    issues
        .iter()
        .position(|i| i.kind == kind && i.column.as_deref() == Some(column))
}
