//! Forward fill along a date ordering.
//!
//! Rows are visited in the order of the first date column. Gaps take the most
//! recent observed value before them; gaps before the first observation take
//! the first observed value after them.

use crate::frame::{WorkingColumn, WorkingFrame};
use crate::types::ColumnType;
use polars::prelude::*;

pub struct ForwardFillImputer;

impl ForwardFillImputer {
    /// Row visiting order for a forward fill.
    ///
    /// Stable sort on the first date column. A row whose date is missing
    /// inherits the date of the row before it so it stays next to its
    /// neighbours. Without a date column the current row order is kept.
    pub fn ordering(frame: &WorkingFrame) -> PolarsResult<IdxCa> {
        let Some(dates) = frame
            .columns
            .iter()
            .find(|c| c.column_type == ColumnType::Date)
        else {
            return Ok(IdxCa::from_vec(
                "order".into(),
                (0..frame.height() as IdxSize).collect(),
            ));
        };

        let keys = dates
            .to_series()?
            .fill_null(FillNullStrategy::Forward(None))?;
        Ok(keys.arg_sort(SortOptions::default().with_maintain_order(true)))
    }

    /// Fill missing cells of `column` visiting rows in `order`.
    /// Returns the number of cells filled.
    pub fn fill(column: &mut WorkingColumn, order: &IdxCa) -> PolarsResult<usize> {
        // Row holding the value each visited row should take; null for gaps
        let sources: Vec<Option<IdxSize>> = order
            .into_no_null_iter()
            .map(|row| column.cells[row as usize].is_some().then_some(row))
            .collect();
        let sources = Series::new("source".into(), sources)
            .fill_null(FillNullStrategy::Forward(None))?
            .fill_null(FillNullStrategy::Backward(None))?;

        let mut filled = 0;
        for (row, source) in order.into_no_null_iter().zip(sources.idx()?.into_iter()) {
            let row = row as usize;
            if column.cells[row].is_none()
                && let Some(source) = source
            {
                column.cells[row] = column.cells[source as usize].clone();
                filled += 1;
            }
        }
        Ok(filled)
    }
}
