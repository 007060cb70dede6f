//! Missing-value remediation.
//!
//! Columns are visited in dataset order. A column is remediated when it has a
//! missing-value issue or when type coercion left cells missing in it.

use super::type_corrector::CoercionLeftovers;
use super::{find_issue, summarize_column};
use crate::config::{CleaningConfig, MissingStrategy};
use crate::error::Result;
use crate::frame::WorkingFrame;
use crate::imputers::{ForwardFillImputer, StatisticalImputer};
use crate::types::{IssueKind, QualityIssue, RuleKind, TransformationRecord};
use tracing::{debug, info, warn};

pub struct MissingValueHandler;

impl MissingValueHandler {
    pub(crate) fn remediate(
        frame: &mut WorkingFrame,
        issues: &[QualityIssue],
        config: &CleaningConfig,
        leftovers: &CoercionLeftovers,
    ) -> Result<Vec<TransformationRecord>> {
        let mut records = Vec::new();

        for index in 0..frame.columns.len() {
            let name = frame.columns[index].name.clone();
            let missing_issue = find_issue(issues, IssueKind::MissingValue, &name);
            let coercion_issue = leftovers.issue_for(index);

            if missing_issue.is_none() && coercion_issue.is_none() {
                continue;
            }

            let resolves: Vec<usize> = missing_issue.into_iter().chain(coercion_issue).collect();
            records.push(Self::remediate_column(frame, index, resolves, config)?);
        }

        Ok(records)
    }

    fn remediate_column(
        frame: &mut WorkingFrame,
        index: usize,
        resolves: Vec<usize>,
        config: &CleaningConfig,
    ) -> Result<TransformationRecord> {
        let column_type = frame.columns[index].column_type;
        let name = frame.columns[index].name.clone();
        let strategy = config.missing_strategy.resolve(&name, column_type);
        let before = summarize_column(&frame.columns[index]);

        let record = TransformationRecord::new(
            RuleKind::MissingValueRemediation,
            strategy.to_string(),
            Some(&name),
        );

        let gaps = frame.columns[index].missing_count();
        let has_source = gaps < frame.columns[index].cells.len();
        let needs_source = !matches!(
            strategy,
            MissingStrategy::Constant(_) | MissingStrategy::FlagOnly
        );
        if needs_source && !has_source {
            warn!("'{}' has no observed values, leaving it as-is", name);
            let after = summarize_column(&frame.columns[index]);
            return Ok(record
                .with_summaries(before, after)
                .with_note("no observed values to impute from"));
        }

        let mut note = None;
        let mut resolved = true;

        let rows_affected = match &strategy {
            MissingStrategy::Mean | MissingStrategy::Median | MissingStrategy::Mode => {
                let column = &frame.columns[index];
                let value = match &strategy {
                    MissingStrategy::Mean if column_type.is_ordinal() => {
                        StatisticalImputer::mean_value(column)
                    }
                    MissingStrategy::Median if column_type.is_ordinal() => {
                        StatisticalImputer::median_value(column)
                    }
                    MissingStrategy::Mode => StatisticalImputer::mode_value(column)?,
                    _ => {
                        warn!(
                            "{} is undefined for {} column '{}', using mode",
                            strategy.name(),
                            column_type,
                            name
                        );
                        note = Some(format!(
                            "{} is undefined for {} values; filled with mode",
                            strategy.name(),
                            column_type
                        ));
                        StatisticalImputer::mode_value(column)?
                    }
                };
                match value {
                    Some(value) => {
                        let filled = StatisticalImputer::fill(&mut frame.columns[index], &value);
                        debug!("Filled {} cells of '{}' with {}", filled, name, value.render());
                        if note.is_none() {
                            note = Some(format!("filled with {}", value.render()));
                        }
                        filled
                    }
                    None => {
                        resolved = false;
                        note = Some("no observed values to impute from".to_string());
                        0
                    }
                }
            }
            MissingStrategy::Constant(raw) => match StatisticalImputer::constant_value(raw, column_type) {
                Some(value) => StatisticalImputer::fill(&mut frame.columns[index], &value),
                None => {
                    // Constants are checked before cleaning starts
                    resolved = false;
                    note = Some(format!("constant '{}' is not a {} value", raw, column_type));
                    0
                }
            },
            MissingStrategy::ForwardFill => {
                let order = ForwardFillImputer::ordering(frame)?;
                let filled = ForwardFillImputer::fill(&mut frame.columns[index], &order)?;
                if filled < gaps {
                    resolved = false;
                    note = Some("no observed values to fill from".to_string());
                }
                filled
            }
            MissingStrategy::DropRow => {
                let keep: Vec<bool> = frame.columns[index]
                    .cells
                    .iter()
                    .map(Option::is_some)
                    .collect();
                frame.retain_rows(&keep);
                if gaps > 0 {
                    info!("Dropped {} rows with missing '{}'", gaps, name);
                }
                gaps
            }
            MissingStrategy::FlagOnly => {
                resolved = false;
                note = Some(format!("{} missing cell(s) left in place", gaps));
                gaps
            }
        };

        let after = summarize_column(&frame.columns[index]);
        let mut record = record
            .with_rows(rows_affected)
            .with_summaries(before, after);

        if resolved {
            record = record.with_resolves(resolves);
        }
        if let Some(note) = note {
            record = record.with_note(note);
        }
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{RawColumn, Value, WorkingColumn};
    use crate::types::{ColumnType, Severity};
    use std::collections::BTreeSet;

    fn column(name: &str, column_type: ColumnType, cells: &[Option<&str>]) -> WorkingColumn {
        let raw = RawColumn {
            name: name.to_string(),
            storage_dtype: "str".to_string(),
            cells: cells.iter().map(|c| c.map(str::to_string)).collect(),
        };
        WorkingColumn::parse(&raw, column_type).0
    }

    fn missing_issue(column: &str, rows: &[usize]) -> QualityIssue {
        QualityIssue {
            column: Some(column.to_string()),
            kind: IssueKind::MissingValue,
            affected_rows: rows.iter().copied().collect::<BTreeSet<_>>(),
            severity: Severity::Medium,
            description: "missing".to_string(),
            detail: None,
        }
    }

    #[test]
    fn test_median_fill() {
        let mut frame = WorkingFrame::new(vec![column(
            "age",
            ColumnType::Integer,
            &[Some("25"), Some("30"), None, Some("200"), Some("28")],
        )]);
        let issues = vec![missing_issue("age", &[2])];

        let records = MissingValueHandler::remediate(
            &mut frame,
            &issues,
            &CleaningConfig::default(),
            &CoercionLeftovers::default(),
        )
        .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].strategy, "median");
        assert_eq!(records[0].rows_affected, 1);
        assert_eq!(records[0].resolves, vec![0]);
        assert_eq!(frame.columns[0].cells[2], Some(Value::Integer(29)));
    }

    #[test]
    fn test_categorical_mean_falls_back_to_mode() {
        let mut frame = WorkingFrame::new(vec![column(
            "city",
            ColumnType::Categorical,
            &[Some("Lagos"), None, Some("Lagos"), Some("Accra")],
        )]);
        let issues = vec![missing_issue("city", &[1])];
        let config = CleaningConfig::builder()
            .missing_strategy(MissingStrategy::Mean)
            .build()
            .unwrap();

        let records =
            MissingValueHandler::remediate(&mut frame, &issues, &config, &CoercionLeftovers::default())
                .unwrap();

        assert_eq!(frame.columns[0].cells[1], Some(Value::Text("Lagos".to_string())));
        assert!(records[0].note.as_deref().unwrap().contains("mode"));
    }

    #[test]
    fn test_drop_row() {
        let mut frame = WorkingFrame::new(vec![
            column("a", ColumnType::Text, &[Some("x"), None, Some("z")]),
            column("b", ColumnType::Integer, &[Some("1"), Some("2"), Some("3")]),
        ]);
        let issues = vec![missing_issue("a", &[1])];
        let config = CleaningConfig::builder()
            .missing_strategy_for("a", MissingStrategy::DropRow)
            .build()
            .unwrap();

        let records =
            MissingValueHandler::remediate(&mut frame, &issues, &config, &CoercionLeftovers::default())
                .unwrap();

        assert_eq!(records[0].rows_affected, 1);
        assert_eq!(frame.height(), 2);
        assert_eq!(frame.origins, vec![0, 2]);
    }

    #[test]
    fn test_constant_fill() {
        let mut frame = WorkingFrame::new(vec![column(
            "n",
            ColumnType::Integer,
            &[Some("1"), None, None],
        )]);
        let issues = vec![missing_issue("n", &[1, 2])];
        let config = CleaningConfig::builder()
            .missing_strategy(MissingStrategy::Constant("0".to_string()))
            .build()
            .unwrap();

        let records =
            MissingValueHandler::remediate(&mut frame, &issues, &config, &CoercionLeftovers::default())
                .unwrap();

        assert_eq!(records[0].rows_affected, 2);
        assert_eq!(records[0].strategy, "constant(0)");
        assert_eq!(frame.columns[0].cells[2], Some(Value::Integer(0)));
    }

    #[test]
    fn test_flag_only_leaves_cells() {
        let mut frame = WorkingFrame::new(vec![column("n", ColumnType::Integer, &[Some("1"), None])]);
        let issues = vec![missing_issue("n", &[1])];
        let config = CleaningConfig::builder()
            .missing_strategy(MissingStrategy::FlagOnly)
            .build()
            .unwrap();

        let records =
            MissingValueHandler::remediate(&mut frame, &issues, &config, &CoercionLeftovers::default())
                .unwrap();

        assert_eq!(records[0].rows_affected, 1);
        assert!(records[0].resolves.is_empty());
        assert_eq!(frame.columns[0].missing_count(), 1);
    }

    #[test]
    fn test_all_missing_column_is_unresolved() {
        let mut frame = WorkingFrame::new(vec![column("n", ColumnType::Integer, &[None, None])]);
        let issues = vec![missing_issue("n", &[0, 1])];

        let records = MissingValueHandler::remediate(
            &mut frame,
            &issues,
            &CleaningConfig::default(),
            &CoercionLeftovers::default(),
        )
        .unwrap();

        assert_eq!(records[0].rows_affected, 0);
        assert!(records[0].resolves.is_empty());
        assert!(records[0].note.is_some());
    }
}
