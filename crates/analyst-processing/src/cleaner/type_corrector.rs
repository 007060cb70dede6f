//! Type planning and coercion.
//!
//! Every column gets a working type before cleaning starts. Columns with a
//! type-mismatch issue are coerced to the issue's target type (when coercion
//! is enabled); cells that cannot be converted become missing and are handed
//! to missing-value remediation. Other columns take their inferred type when
//! every observed cell parses as it, and stay text otherwise.

use super::{find_issue, summarize_column};
use crate::config::CleaningConfig;
use crate::frame::{WorkingColumn, WorkingFrame};
use crate::profiler::ColumnAnalysis;
use crate::types::{
    ColumnType, IssueDetail, IssueKind, QualityIssue, RuleKind, TransformationRecord,
};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Working type chosen for one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ColumnPlan {
    pub column_type: ColumnType,
    /// Index of the type-mismatch issue this column is coerced for.
    pub mismatch_issue: Option<usize>,
}

/// Cells emptied by coercion, keyed by column index.
#[derive(Debug, Clone, Default)]
pub(crate) struct CoercionLeftovers {
    pub by_column: BTreeMap<usize, (usize, Vec<usize>)>,
}

impl CoercionLeftovers {
    /// Mismatch issue index for a column that has coercion-induced gaps.
    pub fn issue_for(&self, column: usize) -> Option<usize> {
        self.by_column
            .get(&column)
            .filter(|(_, rows)| !rows.is_empty())
            .map(|(issue, _)| *issue)
    }
}

pub(crate) struct Coercion {
    pub frame: WorkingFrame,
    pub records: Vec<TransformationRecord>,
    pub leftovers: CoercionLeftovers,
}

/// Chooses working types and converts raw cells.
pub struct TypeCorrector;

impl TypeCorrector {
    pub(crate) fn plan(
        analyses: &[ColumnAnalysis],
        issues: &[QualityIssue],
        config: &CleaningConfig,
    ) -> Vec<ColumnPlan> {
        analyses
            .iter()
            .map(|analysis| {
                let name = &analysis.profile.name;
                let mismatch = find_issue(issues, IssueKind::TypeMismatch, name);

                if config.type_coercion
                    && let Some(index) = mismatch
                {
                    let target = match issues[index].detail {
                        Some(IssueDetail::TypeMismatch { target, .. }) => target,
                        _ => analysis.target_type,
                    };
                    return ColumnPlan {
                        column_type: target,
                        mismatch_issue: Some(index),
                    };
                }

                if mismatch.is_some() {
                    debug!("Type coercion disabled, '{}' left as-is", name);
                }

                ColumnPlan {
                    column_type: Self::lossless_type(analysis),
                    mismatch_issue: None,
                }
            })
            .collect()
    }

    /// The inferred type when every observed cell parses as it, otherwise text.
    fn lossless_type(analysis: &ColumnAnalysis) -> ColumnType {
        let inferred = analysis.inferred_type();
        let (_, failures) = WorkingColumn::parse(&analysis.raw, inferred);
        if failures.is_empty() {
            inferred
        } else {
            debug!(
                "'{}' has {} cells that are not {}, keeping text",
                analysis.profile.name,
                failures.len(),
                inferred
            );
            ColumnType::Text
        }
    }

    /// Build the working frame, emitting one record per coerced column.
    pub(crate) fn apply(analyses: &[ColumnAnalysis], plans: &[ColumnPlan]) -> Coercion {
        let mut columns = Vec::with_capacity(analyses.len());
        let mut records = Vec::new();
        let mut leftovers = CoercionLeftovers::default();

        for (index, (analysis, plan)) in analyses.iter().zip(plans).enumerate() {
            let (column, failed) = WorkingColumn::parse(&analysis.raw, plan.column_type);

            if let Some(issue) = plan.mismatch_issue {
                let (original, _) = WorkingColumn::parse(&analysis.raw, ColumnType::Text);
                let converted = column.cells.iter().flatten().count();

                if !failed.is_empty() {
                    warn!(
                        "{} value(s) in '{}' could not be read as {} and are now missing",
                        failed.len(),
                        column.name,
                        plan.column_type
                    );
                }

                let record = TransformationRecord::new(
                    RuleKind::TypeCoercion,
                    plan.column_type.as_str(),
                    Some(&column.name),
                )
                .with_rows(failed.len())
                .with_summaries(summarize_column(&original), summarize_column(&column))
                .with_resolves(vec![issue])
                .with_note(format!(
                    "converted {} value(s) from {} to {}; {} could not be converted",
                    converted,
                    analysis.inferred_type(),
                    plan.column_type,
                    failed.len()
                ));
                records.push(record);
                leftovers.by_column.insert(index, (issue, failed));
            }

            columns.push(column);
        }

        Coercion {
            frame: WorkingFrame::new(columns),
            records,
            leftovers,
        }
    }
}
