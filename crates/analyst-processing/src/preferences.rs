//! Preference file loading.
//!
//! A preference file is a plain `KEY=value` list, one entry per line:
//!
//! ```text
//! # dataset
//! DATASET_FILENAME=sales.csv
//! DATA_DIR=data
//!
//! # cleaning
//! MISSING_STRATEGY=median
//! MISSING_STRATEGY[region]=constant(unknown)
//! OUTLIER_STRATEGY=clip
//! EXPECTED_TYPE[order_date]=date
//! ```
//!
//! Bracketed keys scope a setting to one column. Keys this crate has no use
//! for are skipped with a warning.

use crate::config::CleaningConfig;
use crate::error::{AnalystError, Result, ResultExt};
use crate::utils::parse_boolean_string;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Locations searched by [`Preferences::discover`], in order.
pub const PREFERENCE_PATHS: [&str; 2] = ["knowledge/user_preference.txt", "user_preference.txt"];

const DEFAULT_DATA_DIR: &str = "data";

static LINE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([A-Z_]+)(?:\[([^\]]+)\])?\s*=\s*(.*?)\s*$")
        .expect("Invalid regex: preference line")
});

/// Settings read from a preference file.
#[derive(Debug, Clone, PartialEq)]
pub struct Preferences {
    pub dataset_filename: Option<String>,
    pub data_dir: PathBuf,
    pub config: CleaningConfig,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            dataset_filename: None,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            config: CleaningConfig::default(),
        }
    }
}

impl Preferences {
    /// Parse preference text.
    ///
    /// # Errors
    ///
    /// [`AnalystError::Preferences`] for a malformed line or a value that
    /// does not parse, [`AnalystError::Configuration`] when the resulting
    /// configuration fails validation.
    pub fn parse(text: &str) -> Result<Self> {
        let mut dataset_filename = None;
        let mut data_dir = PathBuf::from(DEFAULT_DATA_DIR);
        let mut builder = CleaningConfig::builder();

        for (index, raw_line) in text.lines().enumerate() {
            let line_no = index + 1;
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some(caps) = LINE_PATTERN.captures(line) else {
                return Err(AnalystError::Preferences {
                    line: line_no,
                    reason: format!("expected KEY=value, found '{}'", line),
                });
            };
            let key = &caps[1];
            let column = caps.get(2).map(|m| m.as_str().trim());
            let value = unquote(&caps[3]);
            let fail = |reason: String| AnalystError::Preferences { line: line_no, reason };

            builder = match (key, column) {
                ("DATASET_FILENAME", None) => {
                    dataset_filename = Some(value.to_string());
                    builder
                }
                ("DATA_DIR", None) => {
                    data_dir = PathBuf::from(value);
                    builder
                }
                ("MISSING_STRATEGY", None) => builder.missing_strategy(value.parse().map_err(fail)?),
                ("MISSING_STRATEGY", Some(column)) => {
                    builder.missing_strategy_for(column, value.parse().map_err(fail)?)
                }
                ("OUTLIER_STRATEGY", None) => builder.outlier_strategy(value.parse().map_err(fail)?),
                ("DUPLICATE_STRATEGY", None) => {
                    builder.duplicate_strategy(value.parse().map_err(fail)?)
                }
                ("TYPE_COERCION", None) => {
                    let enable = parse_boolean_string(value)
                        .ok_or_else(|| fail(format!("expected a boolean, found '{}'", value)))?;
                    builder.type_coercion(enable)
                }
                ("SENTINEL_TOKENS", None) => builder.sentinel_tokens(
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|t| !t.is_empty()),
                ),
                ("IDENTIFIER_COLUMN", None) => builder.identifier_column(value),
                ("EXPECTED_TYPE", Some(column)) => {
                    builder.expected_type(column, value.parse().map_err(fail)?)
                }
                ("CATEGORICAL_THRESHOLD", None) => {
                    let threshold = value
                        .parse::<f64>()
                        .map_err(|_| fail(format!("expected a number, found '{}'", value)))?;
                    builder.categorical_threshold(threshold)
                }
                ("EXPECTED_TYPE", None) => {
                    return Err(fail("EXPECTED_TYPE needs a column, e.g. EXPECTED_TYPE[age]".into()));
                }
                (key, Some(column)) if is_known(key) => {
                    return Err(fail(format!("{} cannot be scoped to column '{}'", key, column)));
                }
                (key, _) => {
                    warn!("Ignoring unsupported preference '{}' on line {}", key, line_no);
                    builder
                }
            };
        }

        Ok(Self {
            dataset_filename,
            data_dir,
            config: builder.build()?,
        })
    }

    /// Read and parse a preference file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(AnalystError::from)
            .context(format!("Failed to read preferences from {}", path.display()))?;
        debug!("Loaded preferences from {}", path.display());
        Self::parse(&text)
    }

    /// Load the first preference file found under `base`, if any.
    pub fn discover(base: impl AsRef<Path>) -> Result<Option<Self>> {
        let base = base.as_ref();
        for candidate in PREFERENCE_PATHS {
            let path = base.join(candidate);
            if path.is_file() {
                return Self::load(&path).map(Some);
            }
        }
        Ok(None)
    }

    /// `DATA_DIR/DATASET_FILENAME`, when a dataset was named.
    pub fn dataset_path(&self) -> Option<PathBuf> {
        self.dataset_filename
            .as_ref()
            .map(|name| self.data_dir.join(name))
    }
}

fn is_known(key: &str) -> bool {
    matches!(
        key,
        "DATASET_FILENAME"
            | "DATA_DIR"
            | "OUTLIER_STRATEGY"
            | "DUPLICATE_STRATEGY"
            | "TYPE_COERCION"
            | "SENTINEL_TOKENS"
            | "IDENTIFIER_COLUMN"
            | "CATEGORICAL_THRESHOLD"
    )
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DuplicateStrategy, MissingStrategy, OutlierStrategy};
    use crate::types::ColumnType;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"
# Analyst preferences
DATASET_FILENAME="sales.csv"
DATA_DIR=inputs
ANALYSIS_YEAR=2024

MISSING_STRATEGY=median
MISSING_STRATEGY[region] = constant(unknown)
OUTLIER_STRATEGY=flag_only
DUPLICATE_STRATEGY=drop
TYPE_COERCION=no
SENTINEL_TOKENS=NA, -, ??
IDENTIFIER_COLUMN=order_id
EXPECTED_TYPE[order_date]=date
CATEGORICAL_THRESHOLD=0.25
"#;

    #[test]
    fn test_parse_full_file() {
        let prefs = Preferences::parse(SAMPLE).unwrap();
        let config = &prefs.config;

        assert_eq!(prefs.dataset_path(), Some(PathBuf::from("inputs/sales.csv")));
        assert_eq!(config.missing_strategy.default, Some(MissingStrategy::Median));
        assert_eq!(
            config.missing_strategy.overrides.get("region"),
            Some(&MissingStrategy::Constant("unknown".into()))
        );
        assert_eq!(config.outlier_strategy, OutlierStrategy::FlagOnly);
        assert_eq!(config.duplicate_strategy, DuplicateStrategy::Drop);
        assert!(!config.type_coercion);
        assert_eq!(config.profile.sentinel_tokens, vec!["NA", "-", "??"]);
        assert_eq!(config.profile.identifier_column.as_deref(), Some("order_id"));
        assert_eq!(
            config.profile.expected_types.get("order_date"),
            Some(&ColumnType::Date)
        );
        assert_eq!(config.profile.categorical_threshold, 0.25);
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let prefs = Preferences::parse("# nothing here\n\n").unwrap();
        assert_eq!(prefs, Preferences::default());
        assert_eq!(prefs.dataset_path(), None);
    }

    #[test]
    fn test_malformed_line_reports_line_number() {
        let err = Preferences::parse("DATA_DIR=data\nthis is not a preference\n").unwrap_err();
        match err {
            AnalystError::Preferences { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_bad_values_are_errors() {
        for text in [
            "OUTLIER_STRATEGY=winsorize",
            "TYPE_COERCION=maybe",
            "CATEGORICAL_THRESHOLD=lots",
            "EXPECTED_TYPE=date",
            "OUTLIER_STRATEGY[age]=clip",
        ] {
            let err = Preferences::parse(text).unwrap_err();
            assert!(err.is_configuration(), "{text} should fail: {err}");
            assert_eq!(err.error_code(), "PREFERENCES_ERROR");
        }
    }

    #[test]
    fn test_invalid_config_is_configuration_error() {
        let err = Preferences::parse("CATEGORICAL_THRESHOLD=1.5").unwrap_err();
        assert_eq!(err.error_code(), "CONFIGURATION_ERROR");
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("\"a b\""), "a b");
        assert_eq!(unquote("'x'"), "x");
        assert_eq!(unquote("\"open"), "\"open");
    }

    #[test]
    fn test_discover_prefers_knowledge_dir() {
        let base = std::env::temp_dir().join(format!("analyst-prefs-{}", std::process::id()));
        std::fs::create_dir_all(base.join("knowledge")).unwrap();
        std::fs::write(base.join("user_preference.txt"), "DATASET_FILENAME=root.csv\n").unwrap();
        std::fs::write(
            base.join("knowledge/user_preference.txt"),
            "DATASET_FILENAME=knowledge.csv\n",
        )
        .unwrap();

        let prefs = Preferences::discover(&base).unwrap().unwrap();
        std::fs::remove_dir_all(&base).unwrap();

        assert_eq!(prefs.dataset_filename.as_deref(), Some("knowledge.csv"));
    }
}
