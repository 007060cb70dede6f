//! Outlier remediation.
//!
//! Acts on outlier issues in the order they were reported, using the IQR
//! fences recorded in each issue. Only the flagged rows that are still
//! present and still outside the fences are touched.

use super::summarize_column;
use crate::config::{CleaningConfig, OutlierStrategy};
use crate::frame::{Value, WorkingFrame};
use crate::types::{
    ColumnType, IssueDetail, IssueKind, QualityIssue, RuleKind, TransformationRecord,
};
use tracing::{debug, info};

/// Handles outlier treatment.
pub struct OutlierHandler;

impl OutlierHandler {
    pub(crate) fn remediate(
        frame: &mut WorkingFrame,
        issues: &[QualityIssue],
        config: &CleaningConfig,
    ) -> Vec<TransformationRecord> {
        issues
            .iter()
            .enumerate()
            .filter(|(_, issue)| issue.kind == IssueKind::Outlier)
            .filter_map(|(index, issue)| {
                let name = issue.column.as_deref()?;
                let column = frame.column_index(name)?;
                Some(Self::remediate_column(
                    frame,
                    column,
                    index,
                    issue,
                    config.outlier_strategy,
                ))
            })
            .collect()
    }

    fn remediate_column(
        frame: &mut WorkingFrame,
        column: usize,
        issue_index: usize,
        issue: &QualityIssue,
        strategy: OutlierStrategy,
    ) -> TransformationRecord {
        let name = frame.columns[column].name.clone();
        let column_type = frame.columns[column].column_type;
        let before = summarize_column(&frame.columns[column]);
        let record = TransformationRecord::new(RuleKind::OutlierRemediation, strategy.name(), Some(&name));

        let bounds = match issue.detail {
            Some(IssueDetail::OutlierBounds { lower, upper }) if column_type.is_ordinal() => {
                (lower, upper)
            }
            _ => {
                debug!("Outlier issue on '{}' cannot be acted on", name);
                let after = summarize_column(&frame.columns[column]);
                return record
                    .with_summaries(before, after)
                    .with_note(format!("no usable bounds for {} column", column_type));
            }
        };
        let (lower, upper) = bounds;

        let rows: Vec<usize> = issue
            .affected_rows
            .iter()
            .filter_map(|&origin| frame.position_of(origin))
            .filter(|&row| {
                frame.columns[column].cells[row]
                    .as_ref()
                    .and_then(Value::as_f64)
                    .is_some_and(|v| v < lower || v > upper)
            })
            .collect();

        match strategy {
            OutlierStrategy::Clip => {
                let (low, high) = Self::clip_range(column_type, lower, upper);
                for &row in &rows {
                    let cell = &mut frame.columns[column].cells[row];
                    if let Some(v) = cell.as_ref().and_then(Value::as_f64) {
                        *cell = Value::from_f64(column_type, v.clamp(low, high));
                    }
                }
                debug!("Clipped {} values of '{}' to [{}, {}]", rows.len(), name, low, high);
            }
            OutlierStrategy::DropRow => {
                let mut keep = vec![true; frame.height()];
                for &row in &rows {
                    keep[row] = false;
                }
                frame.retain_rows(&keep);
                if !rows.is_empty() {
                    info!("Dropped {} rows with outliers in '{}'", rows.len(), name);
                }
            }
            OutlierStrategy::FlagOnly => {}
        }

        let after = summarize_column(&frame.columns[column]);
        let record = record
            .with_rows(rows.len())
            .with_summaries(before, after);

        if strategy == OutlierStrategy::FlagOnly {
            record.with_note(format!("{} outlier(s) left in place", rows.len()))
        } else {
            record.with_resolves(vec![issue_index])
        }
    }

    /// Fences adjusted so clipped values stay representable: integer and date
    /// columns round inwards to whole units.
    fn clip_range(column_type: ColumnType, lower: f64, upper: f64) -> (f64, f64) {
        match column_type {
            ColumnType::Integer | ColumnType::Date => (lower.ceil(), upper.floor()),
            _ => (lower, upper),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{RawColumn, WorkingColumn};
    use crate::types::Severity;

    fn frame(column_type: ColumnType, cells: &[&str]) -> WorkingFrame {
        let raw = RawColumn {
            name: "v".to_string(),
            storage_dtype: "str".to_string(),
            cells: cells.iter().map(|c| Some(c.to_string())).collect(),
        };
        WorkingFrame::new(vec![WorkingColumn::parse(&raw, column_type).0])
    }

    fn outlier_issue(rows: &[usize], lower: f64, upper: f64) -> QualityIssue {
        QualityIssue {
            column: Some("v".to_string()),
            kind: IssueKind::Outlier,
            affected_rows: rows.iter().copied().collect(),
            severity: Severity::Medium,
            description: "outliers".to_string(),
            detail: Some(IssueDetail::OutlierBounds { lower, upper }),
        }
    }

    fn config(strategy: OutlierStrategy) -> CleaningConfig {
        CleaningConfig::builder()
            .outlier_strategy(strategy)
            .build()
            .unwrap()
    }

    #[test]
    fn test_clip_integer_rounds_inward() {
        let mut f = frame(ColumnType::Integer, &["25", "30", "29", "200", "28"]);
        let issues = vec![outlier_issue(&[3], -40.625, 140.375)];

        let records = OutlierHandler::remediate(&mut f, &issues, &config(OutlierStrategy::Clip));

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].rows_affected, 1);
        assert_eq!(records[0].resolves, vec![0]);
        assert_eq!(f.columns[0].cells[3], Some(Value::Integer(140)));
    }

    #[test]
    fn test_clip_float_exact() {
        let mut f = frame(ColumnType::Float, &["1.0", "2.0", "-50.0"]);
        let issues = vec![outlier_issue(&[2], -3.5, 6.5)];

        OutlierHandler::remediate(&mut f, &issues, &config(OutlierStrategy::Clip));

        assert_eq!(f.columns[0].cells[2], Some(Value::Float(-3.5)));
    }

    #[test]
    fn test_drop_row() {
        let mut f = frame(ColumnType::Integer, &["1", "2", "100", "3"]);
        let issues = vec![outlier_issue(&[2], 0.0, 10.0)];

        let records = OutlierHandler::remediate(&mut f, &issues, &config(OutlierStrategy::DropRow));

        assert_eq!(records[0].rows_affected, 1);
        assert_eq!(f.origins, vec![0, 1, 3]);
    }

    #[test]
    fn test_flag_only_records_without_change() {
        let mut f = frame(ColumnType::Integer, &["1", "2", "100", "3"]);
        let issues = vec![outlier_issue(&[2], 0.0, 10.0)];

        let records = OutlierHandler::remediate(&mut f, &issues, &config(OutlierStrategy::FlagOnly));

        assert_eq!(records[0].rows_affected, 1);
        assert!(records[0].resolves.is_empty());
        assert_eq!(f.columns[0].cells[2], Some(Value::Integer(100)));
    }

    #[test]
    fn test_text_column_not_touched() {
        let mut f = frame(ColumnType::Text, &["a", "b"]);
        let issues = vec![outlier_issue(&[1], 0.0, 1.0)];

        let records = OutlierHandler::remediate(&mut f, &issues, &config(OutlierStrategy::Clip));

        assert_eq!(records[0].rows_affected, 0);
        assert!(records[0].note.is_some());
    }
}
