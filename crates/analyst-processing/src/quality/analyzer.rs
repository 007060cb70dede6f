//! Issue detection over analysed columns.
//!
//! Reports type mismatches, missing values and IQR outliers per column, then
//! one dataset-wide duplicate-row issue.

use crate::config::ProfileConfig;
use crate::profiler::statistics::{duplicate_groups, iqr_bounds, key_frame, observed_count};
use crate::profiler::{ColumnAnalysis, DataProfiler};
use crate::types::{IssueDetail, IssueKind, QualityIssue, Severity};
use crate::utils::format_number;
use polars::prelude::DataFrame;
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Share of flagged values above which an outlier issue is high severity.
const HIGH_OUTLIER_FRACTION: f64 = 0.10;

pub struct DataQualityAnalyzer;

impl DataQualityAnalyzer {
    /// Detect the quality issues of a dataset.
    ///
    /// Same issues, in the same order, as [`DataProfiler::profile`] reports.
    pub fn detect(df: &DataFrame, config: &ProfileConfig) -> Vec<QualityIssue> {
        DataProfiler::profile(df, config).issues
    }

    /// Detect issues for every column, then duplicate rows.
    ///
    /// Per column the order is type mismatch, missing values, outliers; the
    /// dataset-wide duplicate issue comes last.
    pub(crate) fn identify_issues(
        analyses: &[ColumnAnalysis],
        row_count: usize,
        config: &ProfileConfig,
    ) -> Vec<QualityIssue> {
        let mut issues = Vec::new();

        for analysis in analyses {
            issues.extend(Self::analyze_column(analysis, row_count, config));
        }

        issues.extend(Self::analyze_duplicates(analyses, row_count, config));

        issues
    }

    fn analyze_column(
        analysis: &ColumnAnalysis,
        row_count: usize,
        config: &ProfileConfig,
    ) -> Vec<QualityIssue> {
        let mut issues = Vec::new();
        let name = &analysis.profile.name;
        let (typed, failures) = analysis.parse_target();

        // Type mismatch
        let declared_conflict = analysis
            .declared_type
            .is_some_and(|declared| declared != analysis.inferred_type());
        if declared_conflict || !failures.is_empty() {
            let severity = if failures.is_empty() {
                Severity::Low
            } else {
                Severity::from_fraction(failures.len() as f64 / row_count as f64)
            };
            issues.push(QualityIssue {
                column: Some(name.clone()),
                kind: IssueKind::TypeMismatch,
                affected_rows: failures.iter().copied().collect(),
                severity,
                description: format!(
                    "Column '{}' is expected to be {} but reads as {}; {} value(s) cannot be converted",
                    name,
                    analysis.target_type,
                    analysis.inferred_type(),
                    failures.len()
                ),
                detail: Some(IssueDetail::TypeMismatch {
                    inferred: analysis.inferred_type(),
                    target: analysis.target_type,
                }),
            });
        }

        // Missing values
        let missing: BTreeSet<usize> = analysis
            .raw
            .cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_none())
            .map(|(row, _)| row)
            .collect();
        if !missing.is_empty() {
            let fraction = missing.len() as f64 / row_count as f64;
            issues.push(QualityIssue {
                column: Some(name.clone()),
                kind: IssueKind::MissingValue,
                description: format!(
                    "{} of {} values missing in '{}' ({:.1}%)",
                    missing.len(),
                    row_count,
                    name,
                    fraction * 100.0
                ),
                affected_rows: missing,
                severity: Severity::from_fraction(fraction),
                detail: None,
            });
        }

        // Outliers
        if analysis.target_type.is_ordinal() && !config.is_identifier(name) {
            let values = typed.numeric_values();

            if let Some((lower, upper)) = iqr_bounds(&values) {
                let flagged: BTreeSet<usize> = values
                    .into_iter()
                    .enumerate()
                    .filter(|(_, v)| v.is_some_and(|v| v < lower || v > upper))
                    .map(|(row, _)| row)
                    .collect();

                if !flagged.is_empty() {
                    let fraction = flagged.len() as f64 / observed_count(&values) as f64;
                    let severity = if fraction > HIGH_OUTLIER_FRACTION {
                        Severity::High
                    } else {
                        Severity::Medium
                    };
                    debug!(
                        "Column '{}': {} outliers outside [{}, {}]",
                        name,
                        flagged.len(),
                        lower,
                        upper
                    );
                    issues.push(QualityIssue {
                        column: Some(name.clone()),
                        kind: IssueKind::Outlier,
                        description: format!(
                            "{} value(s) in '{}' outside the IQR bounds [{}, {}]",
                            flagged.len(),
                            name,
                            format_number(lower),
                            format_number(upper)
                        ),
                        affected_rows: flagged,
                        severity,
                        detail: Some(IssueDetail::OutlierBounds { lower, upper }),
                    });
                }
            }
        }

        issues
    }

    fn analyze_duplicates(
        analyses: &[ColumnAnalysis],
        row_count: usize,
        config: &ProfileConfig,
    ) -> Option<QualityIssue> {
        let key_columns: Vec<&ColumnAnalysis> = analyses
            .iter()
            .filter(|a| !config.is_identifier(&a.profile.name))
            .collect();
        if key_columns.is_empty() {
            return None;
        }

        let rows: Vec<usize> = (0..row_count).collect();
        let keys = key_frame(key_columns.iter().map(|a| a.raw.cells.as_slice()), &rows);
        let groups = match keys.and_then(|keys| duplicate_groups(&keys)) {
            Ok(groups) => groups,
            Err(e) => {
                warn!("Duplicate detection skipped: {}", e);
                return None;
            }
        };
        if groups.is_empty() {
            return None;
        }

        let redundant: usize = groups.iter().map(|g| g.len() - 1).sum();
        let affected_rows: BTreeSet<usize> = groups.iter().flatten().copied().collect();

        Some(QualityIssue {
            column: None,
            kind: IssueKind::DuplicateRow,
            description: format!(
                "{} duplicate group(s) covering {} rows ({} redundant)",
                groups.len(),
                affected_rows.len(),
                redundant
            ),
            affected_rows,
            severity: Severity::from_fraction(redundant as f64 / row_count as f64),
            detail: None,
        })
    }
}
