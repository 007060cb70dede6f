//! Descriptive statistics, correlations and outlier reports.

use super::{numeric_columns, typed_column};
use crate::config::ProfileConfig;
use crate::error::{AnalystError, Result};
use crate::profiler::statistics::{iqr_bounds, observed_count, pearson, quartiles, std_dev};
use crate::types::ColumnType;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Absolute z-score above which a value counts as an outlier.
const Z_SCORE_THRESHOLD: f64 = 3.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericSummary {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; `None` with fewer than two values.
    pub std: Option<f64>,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// Summary statistics for every numeric column with at least one value.
pub fn describe(df: &DataFrame, config: &ProfileConfig) -> Vec<NumericSummary> {
    numeric_columns(df, config)
        .into_iter()
        .filter_map(|column| {
            let values = column.numeric_values();
            let (min, max) = values.min_max()?;
            let (q1, median, q3) = quartiles(&values)?;
            Some(NumericSummary {
                count: observed_count(&values),
                mean: values.mean()?,
                std: std_dev(&values),
                min,
                q1,
                median,
                q3,
                max,
                column: column.name,
            })
        })
        .collect()
}

/// Pearson correlations between numeric columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    /// `values[i][j]` is `None` when fewer than two rows have both values or
    /// either column is constant over those rows.
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        self.values[i][j]
    }
}

/// Correlation matrix over numeric columns, using the rows where both
/// columns of a pair have a value.
pub fn correlation_matrix(df: &DataFrame, config: &ProfileConfig) -> CorrelationMatrix {
    let columns = numeric_columns(df, config);
    let arrays: Vec<Float64Chunked> = columns.iter().map(|c| c.numeric_values()).collect();

    let values = arrays
        .iter()
        .map(|a| arrays.iter().map(|b| pearson(a, b)).collect())
        .collect();

    CorrelationMatrix {
        columns: columns.into_iter().map(|c| c.name).collect(),
        values,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IqrSummary {
    pub q1: f64,
    pub q3: f64,
    pub lower: f64,
    pub upper: f64,
    pub outliers: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierReport {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    pub std: Option<f64>,
    pub min: f64,
    pub max: f64,
    /// Values with |z| > 3; zero when the deviation is undefined or zero.
    pub zscore_outliers: usize,
    /// `None` with fewer than four values.
    pub iqr: Option<IqrSummary>,
}

/// Z-score and IQR outlier counts for one numeric column.
///
/// # Errors
///
/// [`AnalystError::ColumnNotFound`] for an unknown column and
/// [`AnalystError::DataShape`] when the column holds no numeric values.
pub fn outlier_report(df: &DataFrame, column: &str, config: &ProfileConfig) -> Result<OutlierReport> {
    let values = typed_column(df, column, ColumnType::Float, config)?.numeric_values();

    let (Some(m), Some((min, max))) = (values.mean(), values.min_max()) else {
        return Err(AnalystError::DataShape(format!(
            "column '{}' has no numeric values",
            column
        )));
    };
    let std = std_dev(&values);

    let zscore_outliers = match std {
        Some(s) if s > 0.0 => values
            .into_iter()
            .flatten()
            .filter(|v| ((v - m) / s).abs() > Z_SCORE_THRESHOLD)
            .count(),
        _ => 0,
    };

    let iqr = iqr_bounds(&values)
        .zip(quartiles(&values))
        .map(|((lower, upper), (q1, _, q3))| IqrSummary {
            q1,
            q3,
            lower,
            upper,
            outliers: values
                .into_iter()
                .flatten()
                .filter(|v| *v < lower || *v > upper)
                .count(),
        });

    Ok(OutlierReport {
        column: column.to_string(),
        count: observed_count(&values),
        mean: m,
        std,
        min,
        max,
        zscore_outliers,
        iqr,
    })
}
