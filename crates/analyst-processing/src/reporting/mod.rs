//! Report generation module.
//!
//! Renders profiles and transformation logs as JSON and markdown strings.
//! Nothing here touches the filesystem; callers decide where reports go.
//!
//! # Example
//!
//! ```rust,ignore
//! use analyst_processing::reporting::ReportGenerator;
//!
//! let result = pipeline.run(df)?;
//! println!("{}", ReportGenerator::schema_markdown(&result.profile_before, "sales.csv"));
//! println!(
//!     "{}",
//!     ReportGenerator::transformation_log_markdown(&result.records, &result.profile_before.issues)
//! );
//! ```

mod generator;

pub use generator::{ComprehensiveReport, ReportGenerator, SchemaMap};
