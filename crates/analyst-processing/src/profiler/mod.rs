//! Data profiling module for dataset analysis.
//!
//! This module turns a raw dataset into a schema map:
//! - Missing-token normalisation
//! - Type inference for columns
//! - Per-column counts, samples and numeric ranges
//!
//! Issue detection lives in [`crate::quality`]; [`DataProfiler::profile`]
//! runs both and returns the combined [`DatasetProfile`].

pub mod statistics;
mod type_inference;

use crate::config::ProfileConfig;
use crate::frame::{RawColumn, WorkingColumn, read_raw_columns};
use crate::quality::DataQualityAnalyzer;
use crate::types::{ColumnProfile, ColumnType, DatasetProfile};
use polars::prelude::*;
use tracing::{debug, info};

pub(crate) use type_inference::infer_column_type;

const MAX_SAMPLE_VALUES: usize = 5;

/// Everything known about one column after profiling.
#[derive(Debug, Clone)]
pub(crate) struct ColumnAnalysis {
    pub raw: RawColumn,
    pub profile: ColumnProfile,
    /// Declared type if one was configured, otherwise the inferred type.
    pub target_type: ColumnType,
    pub declared_type: Option<ColumnType>,
}

impl ColumnAnalysis {
    pub fn inferred_type(&self) -> ColumnType {
        self.profile.inferred_type
    }

    /// Parse the raw cells as the target type.
    pub fn parse_target(&self) -> (WorkingColumn, Vec<usize>) {
        WorkingColumn::parse(&self.raw, self.target_type)
    }
}

/// Data profiler for analyzing dataset structure and quality.
pub struct DataProfiler;

impl DataProfiler {
    /// Profile an entire dataset.
    ///
    /// Pure and deterministic. A dataset with no rows or no columns yields a
    /// profile with no columns and no issues.
    pub fn profile(df: &DataFrame, config: &ProfileConfig) -> DatasetProfile {
        let (row_count, column_count) = df.shape();
        if row_count == 0 || column_count == 0 {
            debug!("Empty dataset ({}x{}), nothing to profile", row_count, column_count);
            return DatasetProfile {
                row_count,
                column_count,
                columns: Vec::new(),
                issues: Vec::new(),
            };
        }

        let analyses = Self::analyze_columns(df, config);
        let issues = DataQualityAnalyzer::identify_issues(&analyses, row_count, config);

        info!(
            "Profiled {} rows x {} columns, {} issues",
            row_count,
            column_count,
            issues.len()
        );

        DatasetProfile {
            row_count,
            column_count,
            columns: analyses.into_iter().map(|a| a.profile).collect(),
            issues,
        }
    }

    pub(crate) fn analyze_columns(df: &DataFrame, config: &ProfileConfig) -> Vec<ColumnAnalysis> {
        read_raw_columns(df, config)
            .into_iter()
            .map(|raw| Self::analyze_column(raw, config))
            .collect()
    }

    fn analyze_column(raw: RawColumn, config: &ProfileConfig) -> ColumnAnalysis {
        let observed = raw.to_series().drop_nulls();
        let unique_count = observed.n_unique().unwrap_or(0);
        let sample_values: Vec<String> = observed
            .unique_stable()
            .ok()
            .and_then(|unique| {
                let head = unique.head(Some(MAX_SAMPLE_VALUES));
                let text = head.str().ok()?;
                Some(text.into_iter().flatten().map(str::to_string).collect())
            })
            .unwrap_or_default();

        let inferred_type = infer_column_type(&raw, unique_count, config);
        let declared_type = config.expected_types.get(&raw.name).copied();

        let numeric_range = if inferred_type.is_numeric() {
            let (typed, _) = WorkingColumn::parse(&raw, inferred_type);
            typed.numeric_values().min_max()
        } else {
            None
        };

        debug!(
            "Column '{}': {} ({} missing, {} unique)",
            raw.name,
            inferred_type,
            raw.missing_count(),
            unique_count
        );

        let profile = ColumnProfile {
            name: raw.name.clone(),
            storage_dtype: raw.storage_dtype.clone(),
            inferred_type,
            null_count: raw.missing_count(),
            unique_count,
            sample_values,
            numeric_range,
        };

        ColumnAnalysis {
            raw,
            profile,
            target_type: declared_type.unwrap_or(inferred_type),
            declared_type,
        }
    }
}
