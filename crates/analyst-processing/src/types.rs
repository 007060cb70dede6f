use chrono::{DateTime, Utc};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Schema Types
// ============================================================================

/// Semantic type inferred for a column from its values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Integer,
    Float,
    Categorical,
    Date,
    Boolean,
    Text,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Categorical => "categorical",
            Self::Date => "date",
            Self::Boolean => "boolean",
            Self::Text => "text",
        }
    }

    /// Integer or float.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer | Self::Float)
    }

    /// Types with a meaningful numeric ordering (dates count as day ordinals).
    pub fn is_ordinal(&self) -> bool {
        matches!(self, Self::Integer | Self::Float | Self::Date)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "integer" | "int" => Ok(Self::Integer),
            "float" | "double" | "numeric" => Ok(Self::Float),
            "categorical" | "category" => Ok(Self::Categorical),
            "date" | "datetime" => Ok(Self::Date),
            "boolean" | "bool" => Ok(Self::Boolean),
            "text" | "string" => Ok(Self::Text),
            other => Err(format!("unknown column type '{}'", other)),
        }
    }
}

/// Schema entry for a single column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub name: String,
    /// Physical dtype of the column as it was stored in the input frame.
    pub storage_dtype: String,
    pub inferred_type: ColumnType,
    pub null_count: usize,
    pub unique_count: usize,
    /// Up to five distinct non-missing values, in row order.
    pub sample_values: Vec<String>,
    /// Observed minimum and maximum for integer and float columns.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numeric_range: Option<(f64, f64)>,
}

impl ColumnProfile {
    pub fn null_percentage(&self, row_count: usize) -> f64 {
        if row_count == 0 {
            0.0
        } else {
            self.null_count as f64 / row_count as f64 * 100.0
        }
    }
}

/// Full profiling output: the schema map plus the detected issues.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetProfile {
    pub row_count: usize,
    pub column_count: usize,
    /// Column profiles in dataset column order.
    pub columns: Vec<ColumnProfile>,
    pub issues: Vec<QualityIssue>,
}

impl DatasetProfile {
    /// Look up a column profile by name.
    pub fn column(&self, name: &str) -> Option<&ColumnProfile> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn issues_of(&self, kind: IssueKind) -> impl Iterator<Item = &QualityIssue> {
        self.issues.iter().filter(move |i| i.kind == kind)
    }

    /// Share of non-missing cells, 0.0 for an empty dataset.
    pub fn completeness(&self) -> f64 {
        let total = self.row_count * self.column_count;
        if total == 0 {
            return 0.0;
        }
        let missing: usize = self.columns.iter().map(|c| c.null_count).sum();
        total.saturating_sub(missing) as f64 / total as f64
    }
}

// ============================================================================
// Quality Issues
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    MissingValue,
    Outlier,
    TypeMismatch,
    DuplicateRow,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingValue => "missing_value",
            Self::Outlier => "outlier",
            Self::TypeMismatch => "type_mismatch",
            Self::DuplicateRow => "duplicate_row",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Grade a fraction of affected rows: above 30% is high, 5% to 30% is
    /// medium, anything below is low.
    pub fn from_fraction(fraction: f64) -> Self {
        if fraction > 0.30 {
            Self::High
        } else if fraction >= 0.05 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind-specific data the cleaner needs to act on an issue.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IssueDetail {
    /// IQR fences used to flag the values. Date bounds are day ordinals.
    OutlierBounds { lower: f64, upper: f64 },
    /// `target` is the declared type when one was configured, otherwise the
    /// inferred type.
    TypeMismatch {
        inferred: ColumnType,
        target: ColumnType,
    },
}

/// A detected data-quality problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityIssue {
    /// `None` for dataset-wide issues (duplicate rows).
    pub column: Option<String>,
    pub kind: IssueKind,
    /// Zero-based row positions in the profiled dataset.
    pub affected_rows: BTreeSet<usize>,
    pub severity: Severity,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<IssueDetail>,
}

// ============================================================================
// Transformation Log
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    TypeCoercion,
    DuplicateResolution,
    MissingValueRemediation,
    OutlierRemediation,
}

impl RuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TypeCoercion => "type_coercion",
            Self::DuplicateResolution => "duplicate_resolution",
            Self::MissingValueRemediation => "missing_value_remediation",
            Self::OutlierRemediation => "outlier_remediation",
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary of a column (or of the whole dataset) at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValueSummary {
    pub rows: usize,
    pub missing: usize,
    pub distinct: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,
}

/// One applied cleaning rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformationRecord {
    pub rule: RuleKind,
    pub strategy: String,
    /// `None` for dataset-wide rules.
    pub column: Option<String>,
    pub rows_affected: usize,
    pub before: ValueSummary,
    pub after: ValueSummary,
    pub timestamp: DateTime<Utc>,
    /// Indices into the issue list the cleaner was given.
    pub resolves: Vec<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl TransformationRecord {
    /// Create a record stamped with the current time.
    pub fn new(rule: RuleKind, strategy: impl Into<String>, column: Option<&str>) -> Self {
        Self {
            rule,
            strategy: strategy.into(),
            column: column.map(str::to_string),
            rows_affected: 0,
            before: ValueSummary::default(),
            after: ValueSummary::default(),
            timestamp: Utc::now(),
            resolves: Vec::new(),
            note: None,
        }
    }

    pub fn with_rows(mut self, rows_affected: usize) -> Self {
        self.rows_affected = rows_affected;
        self
    }

    pub fn with_summaries(mut self, before: ValueSummary, after: ValueSummary) -> Self {
        self.before = before;
        self.after = after;
        self
    }

    pub fn with_resolves(mut self, resolves: Vec<usize>) -> Self {
        self.resolves = resolves;
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Compare two records ignoring their timestamps.
    pub fn same_effect(&self, other: &Self) -> bool {
        self.rule == other.rule
            && self.strategy == other.strategy
            && self.column == other.column
            && self.rows_affected == other.rows_affected
            && self.before == other.before
            && self.after == other.after
            && self.resolves == other.resolves
            && self.note == other.note
    }
}

/// Cleaned dataset plus the ordered log of what was done to it.
#[derive(Debug, Clone)]
pub struct CleaningOutcome {
    pub dataset: DataFrame,
    pub records: Vec<TransformationRecord>,
}

impl CleaningOutcome {
    pub fn records_for<'a>(
        &'a self,
        column: &'a str,
    ) -> impl Iterator<Item = &'a TransformationRecord> + 'a {
        self.records
            .iter()
            .filter(move |r| r.column.as_deref() == Some(column))
    }
}

// ============================================================================
// Pipeline Summary
// ============================================================================

/// Before/after numbers for one end-to-end pipeline run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleaningSummary {
    /// Total execution time in milliseconds.
    pub duration_ms: u64,
    pub rows_before: usize,
    pub rows_after: usize,
    pub columns_before: usize,
    pub columns_after: usize,
    pub issues_found: usize,
    pub issues_remaining: usize,
    pub records_applied: usize,
    /// Share of non-missing cells, 0.0 - 1.0.
    pub completeness_before: f64,
    pub completeness_after: f64,
}

impl CleaningSummary {
    pub fn rows_removed(&self) -> usize {
        self.rows_before.saturating_sub(self.rows_after)
    }

    pub fn completeness_delta(&self) -> f64 {
        self.completeness_after - self.completeness_before
    }
}

/// Everything one pipeline run produced.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// Profile of the input; record `resolves` indices point into its issues.
    pub profile_before: DatasetProfile,
    pub records: Vec<TransformationRecord>,
    pub dataset: DataFrame,
    /// Profile of the cleaned dataset.
    pub profile_after: DatasetProfile,
    pub summary: CleaningSummary,
}
