//! Data Profiling and Cleaning Library
//!
//! A deterministic data-quality engine for tabular datasets, built on Polars.
//!
//! # Overview
//!
//! - **Profiling**: semantic type inference, missing-value counts, IQR
//!   outliers, type mismatches and duplicate rows, reported as a schema map
//!   plus an ordered list of quality issues
//! - **Cleaning**: type coercion, duplicate resolution, missing-value
//!   remediation and outlier handling, each change logged as a
//!   transformation record that points back at the issues it resolves
//! - **Analysis**: overview, descriptive statistics, correlations, grouped
//!   aggregates, value counts, trends and outlier reports
//! - **Reporting**: schema maps and transformation logs as JSON or markdown
//!
//! Profiling never fails. Cleaning fails only on an unusable configuration or
//! a dataset without rows or columns.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use analyst_processing::{io, CleaningConfig, MissingStrategy, Pipeline};
//!
//! let df = io::load_csv("data/sales.csv")?;
//!
//! let config = CleaningConfig::builder()
//!     .missing_strategy_for("region", MissingStrategy::Constant("unknown".into()))
//!     .build()?;
//!
//! let result = Pipeline::builder().config(config).build()?.run(df)?;
//!
//! println!(
//!     "{} issues found, {} remaining",
//!     result.summary.issues_found, result.summary.issues_remaining
//! );
//! ```
//!
//! The two engine stages can also be called on their own:
//!
//! ```rust,ignore
//! use analyst_processing::{clean, profile, CleaningConfig};
//!
//! let config = CleaningConfig::default();
//! let before = profile(&df, &config.profile);
//! let outcome = clean(df, &before.issues, &config)?;
//! ```
//!
//! # Configuration
//!
//! [`CleaningConfig`] is built in code, deserialized from JSON, or read from
//! a `user_preference.txt` file through [`Preferences`].

pub mod analysis;
pub mod cleaner;
pub mod config;
pub mod error;
pub mod frame;
pub mod imputers;
pub mod io;
pub mod pipeline;
pub mod preferences;
pub mod profiler;
pub mod quality;
pub mod reporting;
pub mod types;
pub mod utils;

use polars::prelude::DataFrame;

// Re-exports for convenient access
pub use cleaner::{DataCleaner, clean};
pub use config::{
    CleaningConfig, CleaningConfigBuilder, ConfigValidationError, DuplicateStrategy,
    MissingStrategy, MissingStrategyConfig, OutlierStrategy, ProfileConfig,
};
pub use error::{AnalystError, Result, ResultExt};
pub use imputers::{ForwardFillImputer, StatisticalImputer};
pub use pipeline::{Pipeline, PipelineBuilder};
pub use preferences::Preferences;
pub use profiler::DataProfiler;
pub use quality::DataQualityAnalyzer;
pub use reporting::{ComprehensiveReport, ReportGenerator, SchemaMap};
pub use types::{
    CleaningOutcome, CleaningSummary, ColumnProfile, ColumnType, DatasetProfile, IssueDetail,
    IssueKind, PipelineResult, QualityIssue, RuleKind, Severity, TransformationRecord,
    ValueSummary,
};

/// Profile a dataset. See [`DataProfiler::profile`].
pub fn profile(df: &DataFrame, config: &ProfileConfig) -> DatasetProfile {
    DataProfiler::profile(df, config)
}
