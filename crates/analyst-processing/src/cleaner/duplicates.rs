//! Duplicate row resolution.

use super::summarize_frame;
use crate::config::{CleaningConfig, DuplicateStrategy};
use crate::error::Result;
use crate::frame::{RawColumn, WorkingFrame};
use crate::profiler::statistics::{duplicate_groups, key_frame};
use crate::types::{IssueKind, QualityIssue, RuleKind, TransformationRecord};
use tracing::{debug, info};

/// Removes (or only counts) rows flagged as duplicates.
pub struct DuplicateResolver;

impl DuplicateResolver {
    /// Resolve the first duplicate-row issue, if any.
    ///
    /// Only rows listed in the issue that are still present are considered.
    /// They are regrouped on their input text with the identifier column left
    /// out, the same key the profiler groups on, so cells that only become
    /// equal after type coercion (`1` and `1.0`) stay in separate groups.
    pub(crate) fn resolve<'a>(
        frame: &mut WorkingFrame,
        raw: impl IntoIterator<Item = &'a RawColumn>,
        issues: &[QualityIssue],
        config: &CleaningConfig,
    ) -> Result<Option<TransformationRecord>> {
        let Some(index) = issues.iter().position(|i| i.kind == IssueKind::DuplicateRow) else {
            return Ok(None);
        };
        let issue = &issues[index];

        let origins: Vec<usize> = issue
            .affected_rows
            .iter()
            .copied()
            .filter(|&origin| frame.position_of(origin).is_some())
            .collect();
        let key_columns = raw
            .into_iter()
            .filter(|c| !config.profile.is_identifier(&c.name))
            .map(|c| c.cells.as_slice());
        let groups: Vec<Vec<usize>> = duplicate_groups(&key_frame(key_columns, &origins)?)?
            .into_iter()
            .map(|group| {
                group
                    .into_iter()
                    .filter_map(|pos| frame.position_of(origins[pos]))
                    .collect()
            })
            .collect();

        let redundant: usize = groups.iter().map(|g: &Vec<usize>| g.len() - 1).sum();
        let before = summarize_frame(frame)?;
        let strategy = config.duplicate_strategy;

        let mut remove = vec![false; frame.height()];
        for group in &groups {
            let doomed = match strategy {
                DuplicateStrategy::KeepFirst => &group[1..],
                DuplicateStrategy::Drop => &group[..],
                DuplicateStrategy::FlagOnly => &group[..0],
            };
            for &row in doomed {
                remove[row] = true;
            }
        }
        let removed = remove.iter().filter(|&&r| r).count();

        if removed > 0 {
            let keep: Vec<bool> = remove.iter().map(|r| !r).collect();
            frame.retain_rows(&keep);
            info!("Removed {} duplicate rows ({})", removed, strategy.name());
        } else {
            debug!("Duplicate rows left in place ({})", strategy.name());
        }

        let rows_affected = match strategy {
            DuplicateStrategy::FlagOnly => redundant,
            _ => removed,
        };

        let mut record = TransformationRecord::new(RuleKind::DuplicateResolution, strategy.name(), None)
            .with_rows(rows_affected)
            .with_summaries(before, summarize_frame(frame)?);
        if strategy == DuplicateStrategy::FlagOnly {
            record = record.with_note(format!(
                "{} duplicate row(s) in {} group(s) left in place",
                redundant,
                groups.len()
            ));
        } else {
            record = record.with_resolves(vec![index]);
        }
        Ok(Some(record))
    }
}
