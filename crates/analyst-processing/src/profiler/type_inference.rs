//! Type inference logic for column analysis.

use crate::config::ProfileConfig;
use crate::frame::RawColumn;
use crate::types::ColumnType;
use crate::utils::{is_boolean_string, parse_date_string, parse_integer_string, parse_numeric_string};
use rand::prelude::*;
use std::collections::HashSet;

const SAMPLE_SEED: u64 = 42;

/// Observed values inspected for inference. Columns larger than the sample
/// size are sampled with a fixed seed, so the result is reproducible.
pub(crate) fn inference_sample<'a>(raw: &'a RawColumn, sample_size: usize) -> Vec<&'a str> {
    let observed: Vec<&str> = raw.observed().map(|(_, v)| v).collect();
    if observed.len() <= sample_size {
        return observed;
    }

    let mut rng = StdRng::seed_from_u64(SAMPLE_SEED);
    let mut indices: Vec<usize> = (0..observed.len())
        .collect::<Vec<_>>()
        .choose_multiple(&mut rng, sample_size)
        .copied()
        .collect();
    indices.sort_unstable();
    indices.into_iter().map(|i| observed[i]).collect()
}

/// Infer the semantic type of a column.
///
/// Precedence: integer, float, date, boolean, categorical, text. A column
/// with no observed values is text.
pub(crate) fn infer_column_type(
    raw: &RawColumn,
    unique_count: usize,
    config: &ProfileConfig,
) -> ColumnType {
    let sample = inference_sample(raw, config.inference_sample_size);
    if sample.is_empty() {
        return ColumnType::Text;
    }

    if sample.iter().all(|v| parse_integer_string(v).is_some()) {
        return ColumnType::Integer;
    }

    if sample.iter().all(|v| parse_numeric_string(v).is_some()) {
        return ColumnType::Float;
    }

    if sample.iter().all(|v| parse_date_string(v).is_some()) {
        return ColumnType::Date;
    }

    if is_boolean_sample(&sample) {
        return ColumnType::Boolean;
    }

    let row_count = raw.cells.len();
    if row_count > 0 && (unique_count as f64 / row_count as f64) < config.categorical_threshold {
        return ColumnType::Categorical;
    }

    ColumnType::Text
}

/// All values boolean-like with at most two distinct spellings.
fn is_boolean_sample(sample: &[&str]) -> bool {
    let mut spellings = HashSet::new();
    for value in sample {
        if !is_boolean_string(value) {
            return false;
        }
        spellings.insert(value.trim().to_ascii_lowercase());
        if spellings.len() > 2 {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(values: &[Option<&str>]) -> RawColumn {
        RawColumn {
            name: "col".to_string(),
            storage_dtype: "str".to_string(),
            cells: values.iter().map(|v| v.map(str::to_string)).collect(),
        }
    }

    fn infer(values: &[Option<&str>]) -> ColumnType {
        let column = raw(values);
        let unique = column.to_series().drop_nulls().n_unique().unwrap();
        infer_column_type(&column, unique, &ProfileConfig::default())
    }

    // ==================== infer_column_type tests ====================

    #[test]
    fn test_integer_column() {
        assert_eq!(
            infer(&[Some("25"), Some("30"), None, Some("200"), Some("28")]),
            ColumnType::Integer
        );
    }

    #[test]
    fn test_float_column() {
        assert_eq!(infer(&[Some("1.5"), Some("2"), Some("$3.75")]), ColumnType::Float);
    }

    #[test]
    fn test_date_column() {
        assert_eq!(
            infer(&[Some("2024-01-01"), Some("2024-02-15"), Some("2024/03/01")]),
            ColumnType::Date
        );
    }

    #[test]
    fn test_boolean_column() {
        assert_eq!(infer(&[Some("yes"), Some("no"), Some("Yes")]), ColumnType::Boolean);
        // Three spellings is not a boolean column
        assert_ne!(
            infer(&[Some("yes"), Some("no"), Some("true"), Some("yes")]),
            ColumnType::Boolean
        );
    }

    #[test]
    fn test_zero_one_is_integer() {
        assert_eq!(infer(&[Some("0"), Some("1"), Some("1")]), ColumnType::Integer);
    }

    #[test]
    fn test_categorical_vs_text() {
        assert_eq!(
            infer(&[Some("A"), Some("B"), Some("A"), Some("A"), Some("B")]),
            ColumnType::Categorical
        );
        assert_eq!(
            infer(&[Some("alpha"), Some("beta"), Some("gamma")]),
            ColumnType::Text
        );
    }

    #[test]
    fn test_all_missing_is_text() {
        assert_eq!(infer(&[None, None]), ColumnType::Text);
    }

    #[test]
    fn test_mixed_numeric_and_text_is_not_numeric() {
        assert_eq!(
            infer(&[Some("1"), Some("2"), Some("three"), Some("4"), Some("5"), Some("6")]),
            ColumnType::Text
        );
    }

    // ==================== inference_sample tests ====================

    #[test]
    fn test_inference_sample_is_deterministic() {
        let values: Vec<String> = (0..50).map(|i| i.to_string()).collect();
        let column = RawColumn {
            name: "n".to_string(),
            storage_dtype: "str".to_string(),
            cells: values.into_iter().map(Some).collect(),
        };

        let first = inference_sample(&column, 10);
        let second = inference_sample(&column, 10);

        assert_eq!(first.len(), 10);
        assert_eq!(first, second);
    }
}
