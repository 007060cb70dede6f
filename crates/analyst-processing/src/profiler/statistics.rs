//! Order statistics shared by outlier detection, imputation and analysis.
//!
//! Numeric helpers take a `Float64Chunked` of ordinals in row order; nulls are
//! skipped. Frequencies and duplicate groups run through polars group-bys.

use polars::prelude::*;

/// IQR fence multiplier.
pub const IQR_MULTIPLIER: f64 = 1.5;

/// Fewest observed values needed before quartiles mean anything.
pub const MIN_OUTLIER_SAMPLE: usize = 4;

const VALUE: &str = "value";
const COUNT: &str = "count";
const FIRST_ROW: &str = "first_row";
const ROWS: &str = "rows";

pub fn observed_count(values: &Float64Chunked) -> usize {
    values.len() - values.null_count()
}

/// Quantile with linear interpolation between closest ranks.
pub fn quantile(values: &Float64Chunked, q: f64) -> Option<f64> {
    values.quantile(q, QuantileMethod::Linear).ok().flatten()
}

/// First quartile, median and third quartile.
pub fn quartiles(values: &Float64Chunked) -> Option<(f64, f64, f64)> {
    Some((
        quantile(values, 0.25)?,
        quantile(values, 0.5)?,
        quantile(values, 0.75)?,
    ))
}

/// Sample standard deviation (n - 1 denominator).
pub fn std_dev(values: &Float64Chunked) -> Option<f64> {
    values.std(1)
}

/// Lower and upper IQR fences, or `None` with fewer than
/// [`MIN_OUTLIER_SAMPLE`] values.
pub fn iqr_bounds(values: &Float64Chunked) -> Option<(f64, f64)> {
    if observed_count(values) < MIN_OUTLIER_SAMPLE {
        return None;
    }
    let q1 = quantile(values, 0.25)?;
    let q3 = quantile(values, 0.75)?;
    let iqr = q3 - q1;
    Some((q1 - IQR_MULTIPLIER * iqr, q3 + IQR_MULTIPLIER * iqr))
}

/// Pearson correlation over the rows where both arrays have a value.
///
/// `None` with fewer than two such rows or when either side is constant.
pub fn pearson(xs: &Float64Chunked, ys: &Float64Chunked) -> Option<f64> {
    cov::pearson_corr(xs, ys).filter(|r| r.is_finite())
}

/// Distinct non-null values of `series` with their counts, most frequent
/// first. Equal counts keep first-appearance order.
///
/// Columns: `value`, `first_row` (row of the first appearance) and `count`.
pub fn frequency_table(series: &Series) -> PolarsResult<DataFrame> {
    let values = series.clone().with_name(VALUE.into());
    DataFrame::new(vec![values.into_column()])?
        .lazy()
        .with_row_index(FIRST_ROW, None)
        .filter(col(VALUE).is_not_null())
        .group_by_stable([col(VALUE)])
        .agg([col(FIRST_ROW).first(), len().alias(COUNT)])
        .sort(
            [COUNT],
            SortMultipleOptions::default()
                .with_order_descending(true)
                .with_maintain_order(true),
        )
        .collect()
}

/// Row of the first appearance of the most frequent value. Ties go to the
/// value seen first.
pub fn mode_row(series: &Series) -> PolarsResult<Option<usize>> {
    let table = frequency_table(series)?;
    Ok(table
        .column(FIRST_ROW)?
        .idx()?
        .get(0)
        .map(|row| row as usize))
}

/// `(value, count)` pairs of a text series, most frequent first.
pub fn text_counts(series: &Series) -> PolarsResult<Vec<(String, usize)>> {
    let table = frequency_table(series)?;
    let values = table.column(VALUE)?.cast(&DataType::String)?;
    let counts = table.column(COUNT)?.idx()?;
    Ok(values
        .str()?
        .into_iter()
        .zip(counts.into_iter())
        .filter_map(|(value, count)| Some((value?.to_string(), count? as usize)))
        .collect())
}

/// Group rows with equal values across every column of `keys`. Only groups
/// with two or more rows are returned, ordered by their first row; rows
/// within a group keep input order. Missing cells compare equal.
pub fn duplicate_groups(keys: &DataFrame) -> PolarsResult<Vec<Vec<usize>>> {
    if keys.width() == 0 || keys.height() == 0 {
        return Ok(Vec::new());
    }

    let by: Vec<Expr> = keys
        .get_column_names()
        .into_iter()
        .map(|name| col(name.clone()))
        .collect();
    let grouped = keys
        .clone()
        .lazy()
        .with_row_index(ROWS, None)
        .group_by_stable(by)
        .agg([col(ROWS)])
        .collect()?;

    let mut groups = Vec::new();
    for members in grouped.column(ROWS)?.list()?.into_iter().flatten() {
        if members.len() > 1 {
            groups.push(
                members
                    .idx()?
                    .into_no_null_iter()
                    .map(|row| row as usize)
                    .collect(),
            );
        }
    }
    Ok(groups)
}

/// Text key frame over `columns` restricted to `rows`, for
/// [`duplicate_groups`]. Key columns are renamed `k0`, `k1`, ... so column
/// names never clash with the row index.
pub fn key_frame<'a, I>(columns: I, rows: &[usize]) -> PolarsResult<DataFrame>
where
    I: IntoIterator<Item = &'a [Option<String>]>,
{
    let columns = columns
        .into_iter()
        .enumerate()
        .map(|(i, cells)| {
            let values: Vec<Option<&str>> = rows.iter().map(|&row| cells[row].as_deref()).collect();
            Series::new(format!("k{}", i).into(), values).into_column()
        })
        .collect();
    DataFrame::new(columns)
}
