//! Main pipeline struct and its builder.

use crate::cleaner::DataCleaner;
use crate::config::{CleaningConfig, ConfigValidationError};
use crate::error::Result;
use crate::profiler::DataProfiler;
use crate::types::{CleaningSummary, DatasetProfile, PipelineResult};
use polars::prelude::*;
use std::time::Instant;
use tracing::{debug, error, info};

/// Profile, clean and re-profile a dataset.
///
/// Use [`Pipeline::builder()`] to create a pipeline with a custom configuration.
///
/// # Example
///
/// ```rust,ignore
/// use analyst_processing::{CleaningConfig, OutlierStrategy, Pipeline};
///
/// let result = Pipeline::builder()
///     .config(
///         CleaningConfig::builder()
///             .outlier_strategy(OutlierStrategy::Clip)
///             .build()?,
///     )
///     .build()?
///     .run(dataframe)?;
///
/// for record in &result.records {
///     println!("{} on {:?}: {} rows", record.rule, record.column, record.rows_affected);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: CleaningConfig,
}

static_assertions::assert_impl_all!(Pipeline: Send, Sync);

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn config(&self) -> &CleaningConfig {
        &self.config
    }

    /// Profile a dataset without cleaning it.
    pub fn profile(&self, df: &DataFrame) -> DatasetProfile {
        DataProfiler::profile(df, &self.config.profile)
    }

    /// Run the full pipeline.
    ///
    /// # Errors
    ///
    /// Returns the cleaning engine's errors: a configuration that does not
    /// fit the dataset, or a dataset with no rows or columns.
    pub fn run(&self, df: DataFrame) -> Result<PipelineResult> {
        match self.run_internal(df) {
            Ok(result) => Ok(result),
            Err(e) => {
                error!("Pipeline error: {}", e);
                Err(e)
            }
        }
    }

    fn run_internal(&self, df: DataFrame) -> Result<PipelineResult> {
        let start_time = Instant::now();
        let (rows_before, columns_before) = df.shape();

        // Step 1: Profile
        info!("Step 1: Profiling dataset...");
        let profile_before = self.profile(&df);
        for issue in &profile_before.issues {
            debug!(
                "  {} {:?}: {} ({} rows)",
                issue.kind,
                issue.column,
                issue.severity,
                issue.affected_rows.len()
            );
        }

        // Step 2: Clean
        info!("Step 2: Cleaning {} issues...", profile_before.issues.len());
        let outcome = DataCleaner::clean(df, &profile_before.issues, &self.config)?;

        // Step 3: Re-profile
        info!("Step 3: Profiling cleaned dataset...");
        let profile_after = self.profile(&outcome.dataset);

        let (rows_after, columns_after) = outcome.dataset.shape();
        let summary = CleaningSummary {
            duration_ms: start_time.elapsed().as_millis() as u64,
            rows_before,
            rows_after,
            columns_before,
            columns_after,
            issues_found: profile_before.issues.len(),
            issues_remaining: profile_after.issues.len(),
            records_applied: outcome.records.len(),
            completeness_before: profile_before.completeness(),
            completeness_after: profile_after.completeness(),
        };

        info!(
            "Pipeline finished in {}ms: {} -> {} rows, {} issues remaining",
            summary.duration_ms, rows_before, rows_after, summary.issues_remaining
        );

        Ok(PipelineResult {
            profile_before,
            records: outcome.records,
            dataset: outcome.dataset,
            profile_after,
            summary,
        })
    }
}

/// Builder for [`Pipeline`].
#[derive(Debug, Default)]
pub struct PipelineBuilder {
    config: Option<CleaningConfig>,
}

static_assertions::assert_impl_all!(PipelineBuilder: Send);

impl PipelineBuilder {
    /// Set the cleaning configuration.
    pub fn config(mut self, config: CleaningConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Build the pipeline.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> std::result::Result<Pipeline, ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        Ok(Pipeline { config })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutlierStrategy;

    #[test]
    fn test_pipeline_builder_default() {
        let pipeline = Pipeline::builder().build().unwrap();
        assert!(pipeline.config().type_coercion);
        assert_eq!(pipeline.config().outlier_strategy, OutlierStrategy::Clip);
    }

    #[test]
    fn test_pipeline_builder_rejects_invalid_config() {
        let mut config = CleaningConfig::default();
        config.profile.inference_sample_size = 0;

        let result = Pipeline::builder().config(config).build();
        assert!(matches!(result, Err(ConfigValidationError::InvalidSampleSize(0))));
    }

    #[test]
    fn test_run_summary() {
        let df = df![
            "age" => ["25", "30", "NA", "200", "28"],
            "city" => ["Lagos", "Accra", "Lagos", "Lagos", "Accra"],
        ]
        .unwrap();

        let result = Pipeline::builder().build().unwrap().run(df).unwrap();

        assert_eq!(result.summary.rows_before, 5);
        assert_eq!(result.summary.rows_after, 5);
        assert_eq!(result.summary.issues_found, 2);
        assert_eq!(result.summary.records_applied, 2);
        assert_eq!(result.summary.completeness_after, 1.0);
        assert!(result.summary.completeness_delta() > 0.0);
        assert_eq!(result.profile_after.column("age").unwrap().null_count, 0);
    }

    #[test]
    fn test_run_empty_dataset_fails() {
        let err = Pipeline::builder()
            .build()
            .unwrap()
            .run(DataFrame::empty())
            .unwrap_err();
        assert!(err.is_data_shape());
    }
}
