//! Cell-level view of a polars `DataFrame`.
//!
//! The profiler and the cleaner parse cells themselves: every column is read
//! as text, missing tokens are normalised to `None`, and typed columns are
//! built by parsing that text. Statistics run on polars arrays built from
//! these cells. A [`WorkingFrame`] also remembers which input row each of its
//! rows came from, so issue row positions stay meaningful after rows are
//! removed.

use crate::config::ProfileConfig;
use crate::types::ColumnType;
use crate::utils::{
    date_to_days, days_to_date, format_number, parse_boolean_string, parse_date_string,
    parse_integer_string, parse_numeric_string, round_half_away,
};
use chrono::NaiveDate;
use polars::prelude::*;
use std::cmp::Ordering;

/// A single parsed cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Date(NaiveDate),
    Boolean(bool),
    Text(String),
}

impl Value {
    /// Numeric view of the value. Dates are day ordinals.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            Self::Date(d) => Some(date_to_days(*d) as f64),
            Self::Boolean(_) | Self::Text(_) => None,
        }
    }

    /// Canonical text form, used for sampling, keys and display.
    pub fn render(&self) -> String {
        match self {
            Self::Integer(v) => v.to_string(),
            Self::Float(v) => format_number(*v),
            Self::Date(d) => d.format("%Y-%m-%d").to_string(),
            Self::Boolean(b) => b.to_string(),
            Self::Text(s) => s.clone(),
        }
    }

    /// Build a value of `column_type` from a numeric ordinal. Integer columns
    /// round half away from zero; date columns round to the nearest day.
    pub fn from_f64(column_type: ColumnType, value: f64) -> Option<Self> {
        match column_type {
            ColumnType::Integer => Some(Self::Integer(round_half_away(value))),
            ColumnType::Float => Some(Self::Float(value)),
            ColumnType::Date => days_to_date(round_half_away(value)).map(Self::Date),
            _ => None,
        }
    }

    /// Parse a raw (non-missing) cell as `column_type`.
    pub fn parse(raw: &str, column_type: ColumnType) -> Option<Self> {
        match column_type {
            ColumnType::Integer => parse_integer_string(raw).map(Self::Integer),
            ColumnType::Float => parse_numeric_string(raw).map(Self::Float),
            ColumnType::Date => parse_date_string(raw).map(Self::Date),
            ColumnType::Boolean => parse_boolean_string(raw).map(Self::Boolean),
            ColumnType::Categorical | ColumnType::Text => Some(Self::Text(raw.to_string())),
        }
    }

    /// Total order within a single column type. Values of different kinds
    /// compare by their rendered text.
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => a.cmp(b),
            (Self::Float(a), Self::Float(b)) => a.total_cmp(b),
            (Self::Date(a), Self::Date(b)) => a.cmp(b),
            (Self::Boolean(a), Self::Boolean(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (a, b) => a.render().cmp(&b.render()),
        }
    }
}

// =============================================================================
// Raw Columns
// =============================================================================

/// A column read as text, with missing cells normalised to `None`.
#[derive(Debug, Clone)]
pub struct RawColumn {
    pub name: String,
    pub storage_dtype: String,
    pub cells: Vec<Option<String>>,
}

impl RawColumn {
    /// Non-missing cells with their row positions.
    pub fn observed(&self) -> impl Iterator<Item = (usize, &str)> {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(row, cell)| cell.as_deref().map(|v| (row, v)))
    }

    pub fn missing_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_none()).count()
    }

    /// Text series of the cells, missing cells as nulls.
    pub fn to_series(&self) -> Series {
        Series::new(self.name.as_str().into(), &self.cells)
    }
}

/// Read every column of `df` as text.
///
/// Never fails: columns polars cannot cast to text are read value by value.
pub fn read_raw_columns(df: &DataFrame, config: &ProfileConfig) -> Vec<RawColumn> {
    df.get_columns()
        .iter()
        .map(|column| {
            let series = column.as_materialized_series();
            RawColumn {
                name: series.name().to_string(),
                storage_dtype: series.dtype().to_string(),
                cells: read_series_cells(series, config),
            }
        })
        .collect()
}

fn read_series_cells(series: &Series, config: &ProfileConfig) -> Vec<Option<String>> {
    let normalise = |raw: &str| -> Option<String> {
        if config.is_missing(raw) {
            None
        } else {
            Some(raw.to_string())
        }
    };

    if let Ok(text) = series.cast(&DataType::String)
        && let Ok(chunked) = text.str()
    {
        return chunked
            .into_iter()
            .map(|cell| cell.and_then(normalise))
            .collect();
    }

    (0..series.len())
        .map(|i| match series.get(i) {
            Ok(value) if !value.is_null() => normalise(&value.to_string()),
            _ => None,
        })
        .collect()
}

// =============================================================================
// Working Frame
// =============================================================================

/// A typed column under transformation.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkingColumn {
    pub name: String,
    pub column_type: ColumnType,
    pub cells: Vec<Option<Value>>,
}

impl WorkingColumn {
    /// Parse raw cells as `column_type`. Returns the column and the row
    /// positions whose cells failed to parse (and are now missing).
    pub fn parse(raw: &RawColumn, column_type: ColumnType) -> (Self, Vec<usize>) {
        let mut failed = Vec::new();
        let cells = raw
            .cells
            .iter()
            .enumerate()
            .map(|(row, cell)| {
                let text = cell.as_deref()?;
                let parsed = Value::parse(text, column_type);
                if parsed.is_none() {
                    failed.push(row);
                }
                parsed
            })
            .collect();

        (
            Self {
                name: raw.name.clone(),
                column_type,
                cells,
            },
            failed,
        )
    }

    pub fn missing_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_none()).count()
    }

    pub fn observed(&self) -> impl Iterator<Item = &Value> {
        self.cells.iter().flatten()
    }

    /// Numeric views of the cells in row order; dates are day ordinals and
    /// missing or non-numeric cells are null.
    pub fn numeric_values(&self) -> Float64Chunked {
        Float64Chunked::from_iter_options(
            self.name.as_str().into(),
            self.cells.iter().map(|c| c.as_ref().and_then(Value::as_f64)),
        )
    }

    pub fn distinct_count(&self) -> usize {
        self.to_series()
            .and_then(|s| s.drop_nulls().n_unique())
            .unwrap_or(0)
    }

    /// Typed polars series of the cells.
    pub fn to_series(&self) -> PolarsResult<Series> {
        let name: PlSmallStr = self.name.as_str().into();
        match self.column_type {
            ColumnType::Integer => {
                let values: Vec<Option<i64>> = self
                    .cells
                    .iter()
                    .map(|c| match c {
                        Some(Value::Integer(v)) => Some(*v),
                        _ => None,
                    })
                    .collect();
                Ok(Series::new(name, values))
            }
            ColumnType::Float => {
                let values: Vec<Option<f64>> = self
                    .cells
                    .iter()
                    .map(|c| c.as_ref().and_then(Value::as_f64))
                    .collect();
                Ok(Series::new(name, values))
            }
            ColumnType::Date => {
                let values: Vec<Option<i32>> = self
                    .cells
                    .iter()
                    .map(|c| match c {
                        Some(Value::Date(d)) => i32::try_from(date_to_days(*d)).ok(),
                        _ => None,
                    })
                    .collect();
                Series::new(name, values).cast(&DataType::Date)
            }
            ColumnType::Boolean => {
                let values: Vec<Option<bool>> = self
                    .cells
                    .iter()
                    .map(|c| match c {
                        Some(Value::Boolean(b)) => Some(*b),
                        _ => None,
                    })
                    .collect();
                Ok(Series::new(name, values))
            }
            ColumnType::Categorical | ColumnType::Text => {
                let values: Vec<Option<String>> = self
                    .cells
                    .iter()
                    .map(|c| c.as_ref().map(Value::render))
                    .collect();
                Ok(Series::new(name, values))
            }
        }
    }
}

/// Typed columns plus the input row each row came from.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkingFrame {
    pub columns: Vec<WorkingColumn>,
    /// Input row position of every current row.
    pub origins: Vec<usize>,
}

impl WorkingFrame {
    pub fn new(columns: Vec<WorkingColumn>) -> Self {
        let height = columns.first().map_or(0, |c| c.cells.len());
        Self {
            columns,
            origins: (0..height).collect(),
        }
    }

    pub fn height(&self) -> usize {
        self.origins.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Current position of an input row, if the row is still present.
    pub fn position_of(&self, origin: usize) -> Option<usize> {
        self.origins.binary_search(&origin).ok()
    }

    /// Keep only the rows whose mask entry is `true`.
    pub fn retain_rows(&mut self, keep: &[bool]) {
        for column in &mut self.columns {
            let mut flags = keep.iter();
            column
                .cells
                .retain(|_| flags.next().copied().unwrap_or(true));
        }
        let mut flags = keep.iter();
        self.origins
            .retain(|_| flags.next().copied().unwrap_or(true));
    }

    /// Total missing cells across all columns.
    pub fn missing_cells(&self) -> usize {
        self.columns.iter().map(WorkingColumn::missing_count).sum()
    }

    /// Number of distinct rows.
    pub fn distinct_rows(&self) -> PolarsResult<usize> {
        if self.columns.is_empty() {
            return Ok(0);
        }
        Ok(self
            .to_dataframe()?
            .unique_stable(None, UniqueKeepStrategy::First, None)?
            .height())
    }

    pub fn into_dataframe(self) -> PolarsResult<DataFrame> {
        self.to_dataframe()
    }

    fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let columns = self
            .columns
            .iter()
            .map(|c| c.to_series().map(Column::from))
            .collect::<PolarsResult<Vec<_>>>()?;
        DataFrame::new(columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(name: &str, cells: &[Option<&str>]) -> RawColumn {
        RawColumn {
            name: name.to_string(),
            storage_dtype: "str".to_string(),
            cells: cells.iter().map(|c| c.map(str::to_string)).collect(),
        }
    }

    #[test]
    fn test_read_raw_columns_normalises_missing() {
        let df = df![
            "age" => ["25", "NA", "", "30"],
            "score" => [Some(1.5), None, Some(2.0), Some(3.25)],
        ]
        .unwrap();

        let columns = read_raw_columns(&df, &ProfileConfig::default());

        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0].name, "age");
        assert_eq!(
            columns[0].cells,
            vec![Some("25".to_string()), None, None, Some("30".to_string())]
        );
        assert_eq!(columns[1].missing_count(), 1);
        assert_eq!(columns[1].cells[3].as_deref(), Some("3.25"));
    }

    #[test]
    fn test_parse_reports_failures() {
        let column = raw("n", &[Some("1"), Some("x"), None, Some("4")]);
        let (parsed, failed) = WorkingColumn::parse(&column, ColumnType::Integer);

        assert_eq!(failed, vec![1]);
        assert_eq!(parsed.cells[0], Some(Value::Integer(1)));
        assert_eq!(parsed.cells[1], None);
        assert_eq!(parsed.missing_count(), 2);
    }

    #[test]
    fn test_retain_rows_tracks_origins() {
        let (a, _) = WorkingColumn::parse(&raw("a", &[Some("1"), Some("2"), Some("3")]), ColumnType::Integer);
        let mut frame = WorkingFrame::new(vec![a]);

        frame.retain_rows(&[true, false, true]);

        assert_eq!(frame.height(), 2);
        assert_eq!(frame.origins, vec![0, 2]);
        assert_eq!(frame.position_of(2), Some(1));
        assert_eq!(frame.position_of(1), None);
    }

    #[test]
    fn test_into_dataframe_types() {
        let (ints, _) = WorkingColumn::parse(&raw("i", &[Some("1"), None]), ColumnType::Integer);
        let (dates, _) = WorkingColumn::parse(
            &raw("d", &[Some("2024-01-02"), Some("2024-01-03")]),
            ColumnType::Date,
        );
        let (flags, _) = WorkingColumn::parse(&raw("b", &[Some("yes"), Some("no")]), ColumnType::Boolean);
        let (text, _) = WorkingColumn::parse(&raw("t", &[Some("x"), None]), ColumnType::Text);

        let df = WorkingFrame::new(vec![ints, dates, flags, text])
            .into_dataframe()
            .unwrap();

        assert_eq!(df.column("i").unwrap().dtype(), &DataType::Int64);
        assert_eq!(df.column("d").unwrap().dtype(), &DataType::Date);
        assert_eq!(df.column("b").unwrap().dtype(), &DataType::Boolean);
        assert_eq!(df.column("t").unwrap().dtype(), &DataType::String);
        assert_eq!(df.column("i").unwrap().null_count(), 1);
    }

    #[test]
    fn test_numeric_values_and_distinct_counts() {
        let (ints, _) = WorkingColumn::parse(
            &raw("n", &[Some("3"), None, Some("3"), Some("7")]),
            ColumnType::Integer,
        );
        let values = ints.numeric_values();
        assert_eq!(values.len(), 4);
        assert_eq!(values.null_count(), 1);
        assert_eq!(values.get(3), Some(7.0));
        assert_eq!(ints.distinct_count(), 2);

        let (text, _) = WorkingColumn::parse(&raw("t", &[Some("a"), Some("b"), Some("a"), None]), ColumnType::Text);
        let frame = WorkingFrame::new(vec![ints, text]);
        // rows 0 and 2 are equal
        assert_eq!(frame.distinct_rows().unwrap(), 3);
    }

    #[test]
    fn test_value_from_f64() {
        assert_eq!(
            Value::from_f64(ColumnType::Integer, 28.5),
            Some(Value::Integer(29))
        );
        assert_eq!(
            Value::from_f64(ColumnType::Integer, -28.5),
            Some(Value::Integer(-29))
        );
        assert_eq!(Value::from_f64(ColumnType::Text, 1.0), None);
        assert_eq!(
            Value::from_f64(ColumnType::Date, 1.0),
            NaiveDate::from_ymd_opt(1970, 1, 2).map(Value::Date)
        );
    }
}
