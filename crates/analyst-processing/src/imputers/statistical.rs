//! Statistical imputation methods.
//!
//! Provides mean, median, mode and constant fills for a single typed column.
//! Fill values are computed on the column's polars arrays.

use crate::frame::{Value, WorkingColumn};
use crate::profiler::statistics::mode_row;
use crate::types::ColumnType;
use polars::prelude::*;

/// Statistical imputation methods for filling missing values.
pub struct StatisticalImputer;

impl StatisticalImputer {
    /// Mean of the observed values, converted back to the column type.
    ///
    /// `None` for non-ordinal columns or columns with no observed values.
    pub fn mean_value(column: &WorkingColumn) -> Option<Value> {
        if !column.column_type.is_ordinal() {
            return None;
        }
        let m = column.numeric_values().mean()?;
        Value::from_f64(column.column_type, m)
    }

    /// Median of the observed values, converted back to the column type.
    pub fn median_value(column: &WorkingColumn) -> Option<Value> {
        if !column.column_type.is_ordinal() {
            return None;
        }
        let m = column.numeric_values().median()?;
        Value::from_f64(column.column_type, m)
    }

    /// Most frequent observed value; ties go to the value seen first.
    pub fn mode_value(column: &WorkingColumn) -> PolarsResult<Option<Value>> {
        let row = mode_row(&column.to_series()?)?;
        Ok(row.and_then(|row| column.cells[row].clone()))
    }

    /// Parse a configured constant as the column type.
    pub fn constant_value(raw: &str, column_type: ColumnType) -> Option<Value> {
        Value::parse(raw, column_type)
    }

    /// Fill every missing cell with `value`. Returns the number of cells filled.
    pub fn fill(column: &mut WorkingColumn, value: &Value) -> usize {
        let mut filled = 0;
        for cell in column.cells.iter_mut().filter(|c| c.is_none()) {
            *cell = Some(value.clone());
            filled += 1;
        }
        filled
    }
}
