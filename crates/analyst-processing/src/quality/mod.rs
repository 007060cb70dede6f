//! Data quality analysis module.
//!
//! This module identifies data quality issues such as missing values,
//! outliers, type mismatches and duplicate rows.

mod analyzer;

pub use analyzer::DataQualityAnalyzer;
