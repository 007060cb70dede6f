//! Exploratory analysis over a profiled dataset.
//!
//! These are read-only views used to brief an analyst: a dataset overview,
//! descriptive statistics, correlations, grouped aggregates, value counts,
//! period trends and an outlier report. Every function reads cells the same
//! way the profiler does, so sentinel tokens count as missing everywhere.

mod aggregate;
mod describe;

pub use aggregate::{
    Aggregation, GroupValue, PeriodValue, TrendDirection, TrendPeriod, TrendReport,
    group_aggregate, trend,
};
pub use describe::{
    CorrelationMatrix, IqrSummary, NumericSummary, OutlierReport, correlation_matrix, describe,
    outlier_report,
};

use crate::config::ProfileConfig;
use crate::error::{AnalystError, Result};
use crate::frame::WorkingColumn;
use crate::profiler::DataProfiler;
use crate::profiler::statistics::{key_frame, text_counts};
use crate::types::ColumnType;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Missing cells in one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingSummary {
    pub column: String,
    pub missing: usize,
    pub percentage: f64,
}

/// Shape, missing values and duplicate count of a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetOverview {
    pub rows: usize,
    pub columns: usize,
    pub column_types: Vec<(String, ColumnType)>,
    /// Only columns with at least one missing cell.
    pub missing: Vec<MissingSummary>,
    /// Rows identical to an earlier row.
    pub duplicate_rows: usize,
}

/// One entry of a frequency table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

pub fn overview(df: &DataFrame, config: &ProfileConfig) -> DatasetOverview {
    let (rows, columns) = df.shape();
    let analyses = DataProfiler::analyze_columns(df, config);

    let missing = analyses
        .iter()
        .filter(|a| a.profile.null_count > 0)
        .map(|a| MissingSummary {
            column: a.profile.name.clone(),
            missing: a.profile.null_count,
            percentage: a.profile.null_percentage(rows),
        })
        .collect();

    let all_rows: Vec<usize> = (0..rows).collect();
    let distinct = key_frame(analyses.iter().map(|a| a.raw.cells.as_slice()), &all_rows)
        .and_then(|keys| keys.unique_stable(None, UniqueKeepStrategy::First, None));
    let duplicate_rows = match distinct {
        Ok(distinct) if columns > 0 => rows - distinct.height(),
        Ok(_) => 0,
        Err(e) => {
            warn!("Duplicate count skipped: {}", e);
            0
        }
    };

    DatasetOverview {
        rows,
        columns,
        column_types: analyses
            .iter()
            .map(|a| (a.profile.name.clone(), a.inferred_type()))
            .collect(),
        missing,
        duplicate_rows,
    }
}

/// The `limit` most frequent values of a column, most frequent first. Equal
/// counts keep the order in which the values first appear.
pub fn value_counts(
    df: &DataFrame,
    column: &str,
    limit: usize,
    config: &ProfileConfig,
) -> Result<Vec<ValueCount>> {
    let analysis = DataProfiler::analyze_columns(df, config)
        .into_iter()
        .find(|a| a.profile.name == column)
        .ok_or_else(|| AnalystError::ColumnNotFound(column.to_string()))?;

    Ok(text_counts(&analysis.raw.to_series())?
        .into_iter()
        .take(limit)
        .map(|(value, count)| ValueCount { value, count })
        .collect())
}

/// Read a column as `column_type`, failing when it does not exist.
fn typed_column(
    df: &DataFrame,
    name: &str,
    column_type: ColumnType,
    config: &ProfileConfig,
) -> Result<WorkingColumn> {
    let analysis = DataProfiler::analyze_columns(df, config)
        .into_iter()
        .find(|a| a.profile.name == name)
        .ok_or_else(|| AnalystError::ColumnNotFound(name.to_string()))?;
    Ok(WorkingColumn::parse(&analysis.raw, column_type).0)
}

/// Columns inferred as integer or float, read as floats.
fn numeric_columns(df: &DataFrame, config: &ProfileConfig) -> Vec<WorkingColumn> {
    DataProfiler::analyze_columns(df, config)
        .iter()
        .filter(|a| a.inferred_type().is_numeric() && !config.is_identifier(&a.profile.name))
        .map(|a| WorkingColumn::parse(&a.raw, ColumnType::Float).0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_overview() {
        let df = df![
            "region" => ["north", "south", "north", "north"],
            "sales" => ["10", "NA", "10", "12"],
        ]
        .unwrap();

        let report = overview(&df, &ProfileConfig::default());

        assert_eq!(report.rows, 4);
        assert_eq!(report.columns, 2);
        assert_eq!(report.duplicate_rows, 1);
        assert_eq!(
            report.missing,
            vec![MissingSummary {
                column: "sales".to_string(),
                missing: 1,
                percentage: 25.0
            }]
        );
    }

    #[test]
    fn test_value_counts_ties_keep_first_appearance() {
        let df = df!["c" => ["b", "a", "a", "b", "c", "NA"]].unwrap();

        let counts = value_counts(&df, "c", 2, &ProfileConfig::default()).unwrap();

        assert_eq!(
            counts,
            vec![
                ValueCount { value: "b".to_string(), count: 2 },
                ValueCount { value: "a".to_string(), count: 2 },
            ]
        );
    }

    #[test]
    fn test_value_counts_unknown_column() {
        let df = df!["c" => ["a"]].unwrap();
        let err = value_counts(&df, "nope", 5, &ProfileConfig::default()).unwrap_err();
        assert_eq!(err.error_code(), "COLUMN_NOT_FOUND");
    }
}
