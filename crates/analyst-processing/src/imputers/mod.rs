//! Imputation module for handling missing values.
//!
//! This module provides the fill strategies used by missing-value
//! remediation:
//! - Statistical imputation (mean, median, mode, constant)
//! - Forward fill along a date ordering

mod forward_fill;
mod statistical;

pub use forward_fill::ForwardFillImputer;
pub use statistical::StatisticalImputer;
