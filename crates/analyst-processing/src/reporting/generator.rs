use crate::error::Result;
use crate::types::{
    CleaningSummary, DatasetProfile, PipelineResult, QualityIssue, TransformationRecord,
};
use crate::utils::format_number;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

// ============================================================================
// Report Types
// ============================================================================

/// Schema map of a dataset, as written to `schema_map.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaMap {
    pub dataset_name: String,
    pub generated_at: String,
    #[serde(flatten)]
    pub profile: DatasetProfile,
}

/// Everything a pipeline run produced, in one serializable value.
///
/// Used for the `--json` CLI output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComprehensiveReport {
    pub generated_at: String,
    pub input_file: String,
    pub summary: CleaningSummary,
    pub profile_before: DatasetProfile,
    pub records: Vec<TransformationRecord>,
    pub profile_after: DatasetProfile,
}

pub struct ReportGenerator;

impl ReportGenerator {
    /// Build the combined report for a pipeline run.
    pub fn build_comprehensive_report(input_file: &str, result: &PipelineResult) -> ComprehensiveReport {
        ComprehensiveReport {
            generated_at: Local::now().to_rfc3339(),
            input_file: input_file.to_string(),
            summary: result.summary.clone(),
            profile_before: result.profile_before.clone(),
            records: result.records.clone(),
            profile_after: result.profile_after.clone(),
        }
    }

    /// Schema map as pretty-printed JSON.
    pub fn schema_json(profile: &DatasetProfile, dataset_name: &str) -> Result<String> {
        let schema = SchemaMap {
            dataset_name: dataset_name.to_string(),
            generated_at: Local::now().to_rfc3339(),
            profile: profile.clone(),
        };
        Ok(serde_json::to_string_pretty(&schema)?)
    }

    /// Schema map as markdown: shape, one section per column, then issues.
    pub fn schema_markdown(profile: &DatasetProfile, dataset_name: &str) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# Schema Map - {}\n", dataset_name);
        let _ = writeln!(
            out,
            "**Generated:** {}\n",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        let _ = writeln!(
            out,
            "**Shape:** {} rows x {} columns\n",
            profile.row_count, profile.column_count
        );
        let _ = writeln!(
            out,
            "**Completeness:** {:.1}%\n",
            profile.completeness() * 100.0
        );

        out.push_str("## Column Details\n\n");
        for column in &profile.columns {
            let _ = writeln!(out, "### {}", column.name);
            let _ = writeln!(
                out,
                "- **Type:** {} (stored as {})",
                column.inferred_type, column.storage_dtype
            );
            let _ = writeln!(out, "- **Unique Values:** {}", column.unique_count);
            let _ = writeln!(
                out,
                "- **Missing Values:** {} ({:.1}%)",
                column.null_count,
                column.null_percentage(profile.row_count)
            );
            if let Some((min, max)) = column.numeric_range {
                let _ = writeln!(
                    out,
                    "- **Range:** {} to {}",
                    format_number(min),
                    format_number(max)
                );
            }
            if !column.sample_values.is_empty() {
                let _ = writeln!(out, "- **Samples:** {}", column.sample_values.join(", "));
            }
            out.push('\n');
        }

        out.push_str("## Quality Issues\n\n");
        if profile.issues.is_empty() {
            out.push_str("No issues detected.\n");
        } else {
            out.push_str("| # | Kind | Column | Severity | Rows | Description |\n");
            out.push_str("|---|------|--------|----------|------|-------------|\n");
            for (index, issue) in profile.issues.iter().enumerate() {
                let _ = writeln!(
                    out,
                    "| {} | {} | {} | {} | {} | {} |",
                    index,
                    issue.kind,
                    issue.column.as_deref().unwrap_or("(all)"),
                    issue.severity,
                    issue.affected_rows.len(),
                    issue.description
                );
            }
        }

        out
    }

    /// Transformation log as markdown, one bullet per record in order.
    pub fn transformation_log_markdown(
        records: &[TransformationRecord],
        issues: &[QualityIssue],
    ) -> String {
        let mut out = String::from("# Transformation Log\n\n");

        if records.is_empty() {
            out.push_str("No transformations applied.\n");
            return out;
        }

        for record in records {
            let _ = write!(
                out,
                "- **{}:** {} `{}` on {}: {} row(s) affected",
                record.timestamp.format("%H:%M:%S"),
                record.rule,
                record.strategy,
                record.column.as_deref().unwrap_or("all rows"),
                record.rows_affected
            );
            if record.before.rows != record.after.rows {
                let _ = write!(out, ", rows {} -> {}", record.before.rows, record.after.rows);
            }
            if record.before.missing != record.after.missing {
                let _ = write!(
                    out,
                    ", missing {} -> {}",
                    record.before.missing, record.after.missing
                );
            }
            let resolved: Vec<&str> = record
                .resolves
                .iter()
                .filter_map(|&i| issues.get(i))
                .map(|issue| issue.kind.as_str())
                .collect();
            if !resolved.is_empty() {
                let _ = write!(out, " (resolves {})", resolved.join(", "));
            }
            if let Some(note) = &record.note {
                let _ = write!(out, ". {}", note);
            }
            out.push('\n');
        }

        out
    }
}
