//! Configuration types for profiling and cleaning.
//!
//! Configuration is always passed explicitly. [`CleaningConfig::builder()`]
//! provides a fluent API; every configuration can also be deserialized from
//! JSON or assembled from a preference file (see [`crate::preferences`]).

use crate::types::ColumnType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Tokens treated as missing when found (trimmed, case-insensitive) in a cell.
pub const DEFAULT_SENTINEL_TOKENS: [&str; 9] =
    ["NA", "N/A", "-", "null", "none", "nan", "missing", "#N/A", "?"];

/// Strategy for remediating missing cells in a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingStrategy {
    /// Fill with the mean of observed values (numeric and date columns)
    Mean,
    /// Fill with the median of observed values (numeric and date columns)
    Median,
    /// Fill with the most frequent value; ties go to the first seen
    Mode,
    /// Remove rows where the column is missing
    DropRow,
    /// Fill with a fixed value, parsed into the column's type
    Constant(String),
    /// Carry the previous observation forward in temporal order
    ForwardFill,
    /// Leave the cells missing and only record them
    FlagOnly,
}

impl MissingStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Median => "median",
            Self::Mode => "mode",
            Self::DropRow => "drop_row",
            Self::Constant(_) => "constant",
            Self::ForwardFill => "forward_fill",
            Self::FlagOnly => "flag_only",
        }
    }

    /// Default strategy for a column with no configured strategy.
    pub fn default_for(column_type: ColumnType) -> Self {
        match column_type {
            ColumnType::Integer | ColumnType::Float => Self::Median,
            ColumnType::Categorical => Self::Mode,
            ColumnType::Date => Self::ForwardFill,
            ColumnType::Boolean | ColumnType::Text => Self::DropRow,
        }
    }
}

impl fmt::Display for MissingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(value) => write!(f, "constant({})", value),
            other => f.write_str(other.name()),
        }
    }
}

impl FromStr for MissingStrategy {
    type Err = String;

    /// Accepts the snake_case names plus `constant(VALUE)` or `constant:VALUE`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let lower = trimmed.to_ascii_lowercase();

        if lower.starts_with("constant") {
            let rest = trimmed["constant".len()..].trim();
            let value = if let Some(inner) = rest.strip_prefix('(') {
                inner.strip_suffix(')').map(str::trim)
            } else {
                rest.strip_prefix(':').map(str::trim)
            };
            return match value {
                Some(v) if !v.is_empty() => Ok(Self::Constant(v.to_string())),
                _ => Err(format!("constant strategy needs a value: '{}'", trimmed)),
            };
        }

        match lower.as_str() {
            "mean" => Ok(Self::Mean),
            "median" => Ok(Self::Median),
            "mode" => Ok(Self::Mode),
            "drop_row" | "drop" => Ok(Self::DropRow),
            "forward_fill" | "ffill" => Ok(Self::ForwardFill),
            "flag_only" | "flag" => Ok(Self::FlagOnly),
            other => Err(format!("unknown missing-value strategy '{}'", other)),
        }
    }
}

/// Strategy for handling flagged outliers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutlierStrategy {
    /// Rewrite outliers to the nearest IQR bound
    #[default]
    Clip,
    /// Remove rows containing outliers
    DropRow,
    /// Keep outliers as-is and only record them
    FlagOnly,
}

impl OutlierStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Clip => "clip",
            Self::DropRow => "drop_row",
            Self::FlagOnly => "flag_only",
        }
    }
}

impl FromStr for OutlierStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "clip" | "cap" => Ok(Self::Clip),
            "drop_row" | "drop" | "remove" => Ok(Self::DropRow),
            "flag_only" | "flag" | "keep" => Ok(Self::FlagOnly),
            other => Err(format!("unknown outlier strategy '{}'", other)),
        }
    }
}

/// Strategy for resolving duplicate rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateStrategy {
    /// Remove every row that belongs to a duplicate group
    Drop,
    /// Keep the first row of each group and remove the rest
    #[default]
    KeepFirst,
    /// Keep all rows and only record the redundant ones
    FlagOnly,
}

impl DuplicateStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Drop => "drop",
            Self::KeepFirst => "keep_first",
            Self::FlagOnly => "flag_only",
        }
    }
}

impl FromStr for DuplicateStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "drop" | "drop_all" => Ok(Self::Drop),
            "keep_first" | "first" => Ok(Self::KeepFirst),
            "flag_only" | "flag" | "keep" => Ok(Self::FlagOnly),
            other => Err(format!("unknown duplicate strategy '{}'", other)),
        }
    }
}

/// Settings that control how the profiler reads a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    /// Cell values treated as missing, compared trimmed and case-insensitively.
    pub sentinel_tokens: Vec<String>,

    /// A column is categorical when `unique / rows` is below this ratio.
    /// Default: 0.5
    pub categorical_threshold: f64,

    /// Column excluded from duplicate comparison and outlier detection.
    pub identifier_column: Option<String>,

    /// Declared column types; a disagreement with inference is a type mismatch.
    pub expected_types: BTreeMap<String, ColumnType>,

    /// Maximum number of values inspected for type inference per column.
    /// Larger columns are sampled with a fixed seed.
    /// Default: 1000
    pub inference_sample_size: usize,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            sentinel_tokens: DEFAULT_SENTINEL_TOKENS
                .iter()
                .map(|t| t.to_string())
                .collect(),
            categorical_threshold: 0.5,
            identifier_column: None,
            expected_types: BTreeMap::new(),
            inference_sample_size: 1000,
        }
    }
}

impl ProfileConfig {
    /// Whether a raw cell counts as missing: empty, whitespace or a sentinel.
    pub fn is_missing(&self, raw: &str) -> bool {
        let trimmed = raw.trim();
        trimmed.is_empty()
            || self
                .sentinel_tokens
                .iter()
                .any(|token| token.trim().eq_ignore_ascii_case(trimmed))
    }

    pub fn is_identifier(&self, column: &str) -> bool {
        self.identifier_column.as_deref() == Some(column)
    }

    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.sentinel_tokens.is_empty() {
            return Err(ConfigValidationError::EmptySentinels);
        }

        if !(self.categorical_threshold > 0.0 && self.categorical_threshold <= 1.0) {
            return Err(ConfigValidationError::InvalidThreshold {
                field: "categorical_threshold".to_string(),
                value: self.categorical_threshold,
            });
        }

        if self.inference_sample_size == 0 {
            return Err(ConfigValidationError::InvalidSampleSize(
                self.inference_sample_size,
            ));
        }

        Ok(())
    }

    /// Check that every column this configuration names exists.
    pub fn validate_against(&self, columns: &[&str]) -> Result<(), ConfigValidationError> {
        if let Some(id) = &self.identifier_column
            && !columns.contains(&id.as_str())
        {
            return Err(ConfigValidationError::UnknownColumn {
                field: "identifier_column".to_string(),
                column: id.clone(),
            });
        }

        for name in self.expected_types.keys() {
            if !columns.contains(&name.as_str()) {
                return Err(ConfigValidationError::UnknownColumn {
                    field: "expected_types".to_string(),
                    column: name.clone(),
                });
            }
        }

        Ok(())
    }
}

/// Global default plus per-column overrides for missing-value remediation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MissingStrategyConfig {
    /// Applied to every column without an override. `None` selects a default
    /// from the column type.
    pub default: Option<MissingStrategy>,
    pub overrides: BTreeMap<String, MissingStrategy>,
}

impl MissingStrategyConfig {
    /// Resolve the strategy for a column: override, then global default,
    /// then the default for the column type.
    pub fn resolve(&self, column: &str, column_type: ColumnType) -> MissingStrategy {
        self.overrides
            .get(column)
            .or(self.default.as_ref())
            .cloned()
            .unwrap_or_else(|| MissingStrategy::default_for(column_type))
    }
}

/// Configuration for the cleaning engine.
///
/// Use [`CleaningConfig::builder()`] to create a new configuration.
///
/// # Example
///
/// ```rust,ignore
/// use analyst_processing::config::{CleaningConfig, DuplicateStrategy, MissingStrategy};
///
/// let config = CleaningConfig::builder()
///     .missing_strategy_for("age", MissingStrategy::Median)
///     .duplicate_strategy(DuplicateStrategy::KeepFirst)
///     .identifier_column("id")
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    /// Profiler settings; the cleaner reads cells the same way.
    pub profile: ProfileConfig,

    pub missing_strategy: MissingStrategyConfig,

    /// Default: Clip
    pub outlier_strategy: OutlierStrategy,

    /// Default: KeepFirst
    pub duplicate_strategy: DuplicateStrategy,

    /// Convert columns with a type mismatch to their target type.
    /// Default: true
    pub type_coercion: bool,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            profile: ProfileConfig::default(),
            missing_strategy: MissingStrategyConfig::default(),
            outlier_strategy: OutlierStrategy::default(),
            duplicate_strategy: DuplicateStrategy::default(),
            type_coercion: true,
        }
    }
}

impl CleaningConfig {
    /// Create a new configuration builder.
    pub fn builder() -> CleaningConfigBuilder {
        CleaningConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        self.profile.validate()?;

        let constants = self
            .missing_strategy
            .default
            .iter()
            .chain(self.missing_strategy.overrides.values());
        for strategy in constants {
            if let MissingStrategy::Constant(value) = strategy
                && self.profile.is_missing(value)
            {
                return Err(ConfigValidationError::MissingConstant(value.clone()));
            }
        }

        Ok(())
    }

    /// Check that every column this configuration names exists.
    pub fn validate_against(&self, columns: &[&str]) -> Result<(), ConfigValidationError> {
        self.profile.validate_against(columns)?;

        for name in self.missing_strategy.overrides.keys() {
            if !columns.contains(&name.as_str()) {
                return Err(ConfigValidationError::UnknownColumn {
                    field: "missing_strategy".to_string(),
                    column: name.clone(),
                });
            }
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid threshold for '{field}': {value} (must be in (0.0, 1.0])")]
    InvalidThreshold { field: String, value: f64 },

    #[error("Invalid inference sample size: {0} (must be at least 1)")]
    InvalidSampleSize(usize),

    #[error("At least one sentinel token is required")]
    EmptySentinels,

    #[error("Constant fill value '{0}' would itself be read as missing")]
    MissingConstant(String),

    #[error("'{field}' refers to column '{column}', which is not in the dataset")]
    UnknownColumn { field: String, column: String },
}

/// Builder for [`CleaningConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct CleaningConfigBuilder {
    sentinel_tokens: Option<Vec<String>>,
    categorical_threshold: Option<f64>,
    identifier_column: Option<String>,
    expected_types: BTreeMap<String, ColumnType>,
    inference_sample_size: Option<usize>,
    missing_default: Option<MissingStrategy>,
    missing_overrides: BTreeMap<String, MissingStrategy>,
    outlier_strategy: Option<OutlierStrategy>,
    duplicate_strategy: Option<DuplicateStrategy>,
    type_coercion: Option<bool>,
}

impl CleaningConfigBuilder {
    /// Replace the sentinel tokens read as missing.
    pub fn sentinel_tokens<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sentinel_tokens = Some(tokens.into_iter().map(Into::into).collect());
        self
    }

    /// Set the unique-to-rows ratio under which a column is categorical.
    pub fn categorical_threshold(mut self, threshold: f64) -> Self {
        self.categorical_threshold = Some(threshold);
        self
    }

    /// Designate a column that identifies rows.
    ///
    /// It is ignored when comparing rows for duplicates and is never checked
    /// for outliers.
    pub fn identifier_column(mut self, column: impl Into<String>) -> Self {
        self.identifier_column = Some(column.into());
        self
    }

    /// Declare the expected type of a column.
    pub fn expected_type(mut self, column: impl Into<String>, column_type: ColumnType) -> Self {
        self.expected_types.insert(column.into(), column_type);
        self
    }

    pub fn inference_sample_size(mut self, size: usize) -> Self {
        self.inference_sample_size = Some(size);
        self
    }

    /// Set the global missing-value strategy.
    pub fn missing_strategy(mut self, strategy: MissingStrategy) -> Self {
        self.missing_default = Some(strategy);
        self
    }

    /// Override the missing-value strategy for a single column.
    pub fn missing_strategy_for(
        mut self,
        column: impl Into<String>,
        strategy: MissingStrategy,
    ) -> Self {
        self.missing_overrides.insert(column.into(), strategy);
        self
    }

    pub fn outlier_strategy(mut self, strategy: OutlierStrategy) -> Self {
        self.outlier_strategy = Some(strategy);
        self
    }

    pub fn duplicate_strategy(mut self, strategy: DuplicateStrategy) -> Self {
        self.duplicate_strategy = Some(strategy);
        self
    }

    /// Enable or disable type coercion of mismatched columns.
    pub fn type_coercion(mut self, enable: bool) -> Self {
        self.type_coercion = Some(enable);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `CleaningConfig` or an error if validation fails.
    pub fn build(self) -> Result<CleaningConfig, ConfigValidationError> {
        let defaults = ProfileConfig::default();
        let config = CleaningConfig {
            profile: ProfileConfig {
                sentinel_tokens: self.sentinel_tokens.unwrap_or(defaults.sentinel_tokens),
                categorical_threshold: self
                    .categorical_threshold
                    .unwrap_or(defaults.categorical_threshold),
                identifier_column: self.identifier_column,
                expected_types: self.expected_types,
                inference_sample_size: self
                    .inference_sample_size
                    .unwrap_or(defaults.inference_sample_size),
            },
            missing_strategy: MissingStrategyConfig {
                default: self.missing_default,
                overrides: self.missing_overrides,
            },
            outlier_strategy: self.outlier_strategy.unwrap_or_default(),
            duplicate_strategy: self.duplicate_strategy.unwrap_or_default(),
            type_coercion: self.type_coercion.unwrap_or(true),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CleaningConfig::default();
        assert_eq!(config.outlier_strategy, OutlierStrategy::Clip);
        assert_eq!(config.duplicate_strategy, DuplicateStrategy::KeepFirst);
        assert_eq!(config.profile.categorical_threshold, 0.5);
        assert_eq!(config.profile.inference_sample_size, 1000);
        assert!(config.type_coercion);
        assert!(config.missing_strategy.default.is_none());
    }

    #[test]
    fn test_is_missing() {
        let config = ProfileConfig::default();
        assert!(config.is_missing(""));
        assert!(config.is_missing("   "));
        assert!(config.is_missing("NA"));
        assert!(config.is_missing(" n/a "));
        assert!(config.is_missing("NULL"));
        assert!(config.is_missing("#n/a"));
        assert!(config.is_missing("?"));
        assert!(!config.is_missing("0"));
        assert!(!config.is_missing("Nairobi"));
    }

    #[test]
    fn test_builder_custom_values() {
        let config = CleaningConfig::builder()
            .missing_strategy(MissingStrategy::Mode)
            .missing_strategy_for("age", MissingStrategy::Mean)
            .outlier_strategy(OutlierStrategy::DropRow)
            .duplicate_strategy(DuplicateStrategy::Drop)
            .identifier_column("id")
            .expected_type("age", ColumnType::Integer)
            .type_coercion(false)
            .build()
            .unwrap();

        assert_eq!(config.outlier_strategy, OutlierStrategy::DropRow);
        assert_eq!(config.duplicate_strategy, DuplicateStrategy::Drop);
        assert_eq!(config.profile.identifier_column.as_deref(), Some("id"));
        assert!(!config.type_coercion);
        assert_eq!(
            config.missing_strategy.resolve("age", ColumnType::Integer),
            MissingStrategy::Mean
        );
        assert_eq!(
            config.missing_strategy.resolve("city", ColumnType::Text),
            MissingStrategy::Mode
        );
    }

    #[test]
    fn test_resolve_falls_back_to_type_default() {
        let config = MissingStrategyConfig::default();
        assert_eq!(config.resolve("x", ColumnType::Float), MissingStrategy::Median);
        assert_eq!(config.resolve("x", ColumnType::Categorical), MissingStrategy::Mode);
        assert_eq!(config.resolve("x", ColumnType::Date), MissingStrategy::ForwardFill);
        assert_eq!(config.resolve("x", ColumnType::Text), MissingStrategy::DropRow);
    }

    #[test]
    fn test_validation_invalid_threshold() {
        let result = CleaningConfig::builder().categorical_threshold(1.5).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidThreshold { .. }
        ));
    }

    #[test]
    fn test_validation_sample_size_and_sentinels() {
        assert_eq!(
            CleaningConfig::builder().inference_sample_size(0).build().unwrap_err(),
            ConfigValidationError::InvalidSampleSize(0)
        );
        assert_eq!(
            CleaningConfig::builder()
                .sentinel_tokens(Vec::<String>::new())
                .build()
                .unwrap_err(),
            ConfigValidationError::EmptySentinels
        );
    }

    #[test]
    fn test_validation_rejects_missing_constant() {
        let result = CleaningConfig::builder()
            .missing_strategy(MissingStrategy::Constant("N/A".to_string()))
            .build();
        assert_eq!(
            result.unwrap_err(),
            ConfigValidationError::MissingConstant("N/A".to_string())
        );
    }

    #[test]
    fn test_validate_against_unknown_columns() {
        let config = CleaningConfig::builder()
            .missing_strategy_for("salary", MissingStrategy::Median)
            .build()
            .unwrap();
        let err = config.validate_against(&["age", "city"]).unwrap_err();
        assert!(matches!(
            err,
            ConfigValidationError::UnknownColumn { ref column, .. } if column == "salary"
        ));

        let config = CleaningConfig::builder().identifier_column("id").build().unwrap();
        assert!(config.validate_against(&["age"]).is_err());
        assert!(config.validate_against(&["id", "age"]).is_ok());
    }

    #[test]
    fn test_missing_strategy_from_str() {
        assert_eq!("median".parse::<MissingStrategy>(), Ok(MissingStrategy::Median));
        assert_eq!("DROP_ROW".parse::<MissingStrategy>(), Ok(MissingStrategy::DropRow));
        assert_eq!(
            "constant(Unknown)".parse::<MissingStrategy>(),
            Ok(MissingStrategy::Constant("Unknown".to_string()))
        );
        assert_eq!(
            "constant:0".parse::<MissingStrategy>(),
            Ok(MissingStrategy::Constant("0".to_string()))
        );
        assert!("constant".parse::<MissingStrategy>().is_err());
        assert!("interpolate".parse::<MissingStrategy>().is_err());
    }

    #[test]
    fn test_strategy_display() {
        assert_eq!(MissingStrategy::ForwardFill.to_string(), "forward_fill");
        assert_eq!(
            MissingStrategy::Constant("0".to_string()).to_string(),
            "constant(0)"
        );
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "profile": {
                "identifier_column": "id",
                "expected_types": { "age": "integer" }
            },
            "missing_strategy": {
                "default": "mode",
                "overrides": { "age": "median", "city": { "constant": "Unknown" } }
            },
            "outlier_strategy": "flag_only",
            "duplicate_strategy": "drop",
            "type_coercion": false
        }"#;

        let config: CleaningConfig = serde_json::from_str(json).expect("Should deserialize");

        assert_eq!(config.profile.identifier_column.as_deref(), Some("id"));
        assert_eq!(config.profile.sentinel_tokens.len(), DEFAULT_SENTINEL_TOKENS.len());
        assert_eq!(
            config.profile.expected_types.get("age"),
            Some(&ColumnType::Integer)
        );
        assert_eq!(config.missing_strategy.default, Some(MissingStrategy::Mode));
        assert_eq!(
            config.missing_strategy.overrides.get("city"),
            Some(&MissingStrategy::Constant("Unknown".to_string()))
        );
        assert_eq!(config.outlier_strategy, OutlierStrategy::FlagOnly);
        assert_eq!(config.duplicate_strategy, DuplicateStrategy::Drop);
        assert!(!config.type_coercion);
    }
}
