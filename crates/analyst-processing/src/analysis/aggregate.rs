//! Grouped aggregates and period trends.

use super::typed_column;
use crate::config::ProfileConfig;
use crate::error::{AnalystError, Result};
use crate::frame::Value;
use crate::profiler::statistics::std_dev;
use crate::types::ColumnType;
use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const GROUP: &str = "group";
const VALUE: &str = "value";
const RESULT: &str = "result";
const SUM: &str = "sum";
const MEAN: &str = "mean";
const COUNT: &str = "count";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    Sum,
    Mean,
    Count,
}

impl Aggregation {
    fn expr(&self) -> Expr {
        let value = col(VALUE);
        match self {
            Self::Sum => value.sum(),
            Self::Mean => value.mean(),
            Self::Count => value.count(),
        }
    }
}

impl FromStr for Aggregation {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sum" => Ok(Self::Sum),
            "mean" | "avg" => Ok(Self::Mean),
            "count" => Ok(Self::Count),
            other => Err(format!("unknown aggregation '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupValue {
    pub group: String,
    pub value: f64,
}

/// Aggregate `value_column` per distinct value of `group_column`, largest
/// result first. Rows with a missing group are skipped; groups with equal
/// results keep their first-appearance order.
pub fn group_aggregate(
    df: &DataFrame,
    group_column: &str,
    value_column: &str,
    aggregation: Aggregation,
    config: &ProfileConfig,
) -> Result<Vec<GroupValue>> {
    let groups = typed_column(df, group_column, ColumnType::Text, config)?;
    let values = typed_column(df, value_column, ColumnType::Float, config)?;

    let frame = DataFrame::new(vec![
        groups.to_series()?.with_name(GROUP.into()).into_column(),
        values.numeric_values().with_name(VALUE.into()).into_column(),
    ])?;

    // An all-missing group has no mean; it sorts last and reads as NaN
    let table = frame
        .lazy()
        .filter(col(GROUP).is_not_null())
        .group_by_stable([col(GROUP)])
        .agg([aggregation.expr().cast(DataType::Float64).alias(RESULT)])
        .sort(
            [RESULT],
            SortMultipleOptions::default()
                .with_order_descending(true)
                .with_nulls_last(true)
                .with_maintain_order(true),
        )
        .collect()?;

    let groups = table.column(GROUP)?.str()?;
    let results = table.column(RESULT)?.f64()?;
    Ok(groups
        .into_iter()
        .zip(results.into_iter())
        .filter_map(|(group, value)| {
            Some(GroupValue {
                group: group?.to_string(),
                value: value.unwrap_or(f64::NAN),
            })
        })
        .collect())
}

// =============================================================================
// Trends
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TrendPeriod {
    Daily,
    #[default]
    Monthly,
    Quarterly,
    Yearly,
}

impl TrendPeriod {
    /// Sortable period label: `2024-03-15`, `2024-03`, `2024Q1` or `2024`.
    fn label(&self, date: NaiveDate) -> String {
        match self {
            Self::Daily => date.format("%Y-%m-%d").to_string(),
            Self::Monthly => date.format("%Y-%m").to_string(),
            Self::Quarterly => format!("{}Q{}", date.year(), date.month0() / 3 + 1),
            Self::Yearly => date.year().to_string(),
        }
    }
}

impl fmt::Display for TrendPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Daily => "daily",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Yearly => "yearly",
        })
    }
}

impl FromStr for TrendPeriod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "d" | "day" | "daily" => Ok(Self::Daily),
            "m" | "month" | "monthly" => Ok(Self::Monthly),
            "q" | "quarter" | "quarterly" => Ok(Self::Quarterly),
            "y" | "year" | "yearly" => Ok(Self::Yearly),
            other => Err(format!("unknown trend period '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    StrongUp,
    ModerateUp,
    Flat,
    ModerateDown,
    StrongDown,
}

impl TrendDirection {
    /// Classify overall growth in percent: beyond 10% is strong, beyond 2% is
    /// moderate.
    pub fn from_growth(growth: f64) -> Self {
        if growth > 10.0 {
            Self::StrongUp
        } else if growth > 2.0 {
            Self::ModerateUp
        } else if growth < -10.0 {
            Self::StrongDown
        } else if growth < -2.0 {
            Self::ModerateDown
        } else {
            Self::Flat
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodValue {
    pub period: String,
    pub sum: f64,
    pub mean: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendReport {
    pub period: TrendPeriod,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    /// Chronological.
    pub periods: Vec<PeriodValue>,
    pub total: f64,
    pub mean_per_period: f64,
    pub std_per_period: Option<f64>,
    /// Growth in percent from the first to the last period total. Needs at
    /// least three periods and a non-zero first total.
    pub overall_growth: Option<f64>,
    pub direction: Option<TrendDirection>,
    /// Share of rows that had both a date and a value.
    pub completeness: f64,
}

impl TrendReport {
    /// Period with the largest total; the earliest one on ties.
    pub fn peak(&self) -> Option<&PeriodValue> {
        self.periods
            .iter()
            .reduce(|best, p| if p.sum > best.sum { p } else { best })
    }

    /// Period with the smallest total; the earliest one on ties.
    pub fn trough(&self) -> Option<&PeriodValue> {
        self.periods
            .iter()
            .reduce(|best, p| if p.sum < best.sum { p } else { best })
    }
}

/// Sum, mean and count of `value_column` per period of `date_column`.
///
/// # Errors
///
/// [`AnalystError::ColumnNotFound`] for unknown columns and
/// [`AnalystError::DataShape`] when no row has both a date and a value.
pub fn trend(
    df: &DataFrame,
    date_column: &str,
    value_column: &str,
    period: TrendPeriod,
    config: &ProfileConfig,
) -> Result<TrendReport> {
    let dates = typed_column(df, date_column, ColumnType::Date, config)?;
    let values = typed_column(df, value_column, ColumnType::Float, config)?;

    let pairs: Vec<(NaiveDate, f64)> = dates
        .cells
        .iter()
        .zip(&values.cells)
        .filter_map(|(date, value)| match (date, value.as_ref().and_then(Value::as_f64)) {
            (Some(Value::Date(d)), Some(v)) => Some((*d, v)),
            _ => None,
        })
        .collect();

    let (Some(first_date), Some(last_date)) = (
        pairs.iter().map(|(d, _)| *d).min(),
        pairs.iter().map(|(d, _)| *d).max(),
    ) else {
        return Err(AnalystError::DataShape(format!(
            "no rows with both a date in '{}' and a value in '{}'",
            date_column, value_column
        )));
    };

    let labels: Vec<String> = pairs.iter().map(|(date, _)| period.label(*date)).collect();
    let amounts: Vec<f64> = pairs.iter().map(|(_, value)| *value).collect();
    let table = DataFrame::new(vec![
        Column::new(GROUP.into(), labels),
        Column::new(VALUE.into(), amounts),
    ])?
    .lazy()
    .group_by([col(GROUP)])
    .agg([
        col(VALUE).sum().alias(SUM),
        col(VALUE).mean().alias(MEAN),
        col(VALUE).count().cast(DataType::Float64).alias(COUNT),
    ])
    .sort([GROUP], SortMultipleOptions::default())
    .collect()?;

    let periods: Vec<PeriodValue> = table
        .column(GROUP)?
        .str()?
        .into_iter()
        .zip(table.column(SUM)?.f64()?)
        .zip(table.column(MEAN)?.f64()?)
        .zip(table.column(COUNT)?.f64()?)
        .filter_map(|(((label, sum), mean), count)| {
            Some(PeriodValue {
                period: label?.to_string(),
                sum: sum.unwrap_or(0.0),
                mean: mean.unwrap_or(0.0),
                count: count.unwrap_or(0.0) as usize,
            })
        })
        .collect();

    let totals = Float64Chunked::from_iter_values(SUM.into(), periods.iter().map(|p| p.sum));
    let overall_growth = match (totals.first(), totals.last()) {
        (Some(first), Some(last)) if totals.len() >= 3 && first != 0.0 => {
            Some((last - first) / first.abs() * 100.0)
        }
        _ => None,
    };

    Ok(TrendReport {
        period,
        first_date,
        last_date,
        total: totals.sum().unwrap_or(0.0),
        mean_per_period: totals.mean().unwrap_or(0.0),
        std_per_period: std_dev(&totals),
        overall_growth,
        direction: overall_growth.map(TrendDirection::from_growth),
        completeness: pairs.len() as f64 / df.height() as f64,
        periods,
    })
}
