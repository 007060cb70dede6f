//! CLI entry point for the profiling and cleaning pipeline.

use analyst_processing::analysis::{self, Aggregation, TrendPeriod};
use analyst_processing::{
    CleaningConfig, DataProfiler, DuplicateStrategy, MissingStrategy, OutlierStrategy, Pipeline,
    PipelineResult, Preferences, ReportGenerator, io,
};
use anyhow::{Result, anyhow};
use clap::{Parser, ValueEnum};
use dotenv::dotenv;
use polars::prelude::DataFrame;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// CLI-compatible missing-value strategy enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliMissingStrategy {
    /// Fill with the mean of observed values
    Mean,
    /// Fill with the median of observed values
    Median,
    /// Fill with the most frequent value
    Mode,
    /// Remove rows with a missing cell in the column
    DropRow,
    /// Fill with the value given by --fill-value
    Constant,
    /// Carry the previous observation forward in date order
    ForwardFill,
    /// Only record missing cells
    FlagOnly,
}

/// CLI-compatible outlier strategy enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliOutlierStrategy {
    /// Rewrite outliers to the nearest IQR bound
    Clip,
    /// Remove rows containing outliers
    DropRow,
    /// Keep outliers as-is
    FlagOnly,
}

impl From<CliOutlierStrategy> for OutlierStrategy {
    fn from(cli: CliOutlierStrategy) -> Self {
        match cli {
            CliOutlierStrategy::Clip => OutlierStrategy::Clip,
            CliOutlierStrategy::DropRow => OutlierStrategy::DropRow,
            CliOutlierStrategy::FlagOnly => OutlierStrategy::FlagOnly,
        }
    }
}

/// CLI-compatible duplicate strategy enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliDuplicateStrategy {
    /// Remove every row of a duplicate group
    Drop,
    /// Keep the first row of each group
    KeepFirst,
    /// Keep all rows
    FlagOnly,
}

impl From<CliDuplicateStrategy> for DuplicateStrategy {
    fn from(cli: CliDuplicateStrategy) -> Self {
        match cli {
            CliDuplicateStrategy::Drop => DuplicateStrategy::Drop,
            CliDuplicateStrategy::KeepFirst => DuplicateStrategy::KeepFirst,
            CliDuplicateStrategy::FlagOnly => DuplicateStrategy::FlagOnly,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Deterministic data-quality profiling and cleaning",
    long_about = "Profiles a CSV dataset, cleans it and logs every change.\n\n\
                  Settings are read from user_preference.txt (searched in ./knowledge\n\
                  then ./) unless --preferences is given; flags override the file.\n\n\
                  EXAMPLES:\n  \
                  # Profile and clean the dataset named in the preference file\n  \
                  analyst-processing\n\n  \
                  # Preview issues only\n  \
                  analyst-processing -i data/sales.csv --dry-run\n\n  \
                  # Cleaned CSV to stdout\n  \
                  analyst-processing -i data/sales.csv --emit-csv > clean.csv"
)]
struct Args {
    /// Path to the CSV file to process
    ///
    /// Defaults to DATA_DIR/DATASET_FILENAME from the preference file
    #[arg(short, long)]
    input: Option<String>,

    /// Preference file to read instead of searching for user_preference.txt
    #[arg(short, long)]
    preferences: Option<PathBuf>,

    /// Missing-value strategy for every column
    #[arg(long, value_enum)]
    missing_strategy: Option<CliMissingStrategy>,

    /// Fill value for --missing-strategy constant
    #[arg(long)]
    fill_value: Option<String>,

    /// Strategy for handling outliers
    #[arg(long, value_enum)]
    outlier_strategy: Option<CliOutlierStrategy>,

    /// Strategy for resolving duplicate rows
    #[arg(long, value_enum)]
    duplicate_strategy: Option<CliDuplicateStrategy>,

    /// Column that identifies rows (ignored for duplicates and outliers)
    #[arg(long)]
    identifier: Option<String>,

    /// Disable type coercion of mismatched columns
    #[arg(long)]
    no_type_coercion: bool,

    /// Show the profile and detected issues without cleaning
    #[arg(long)]
    dry_run: bool,

    /// Output JSON to stdout instead of a human-readable summary
    ///
    /// Disables all progress logs; only outputs the final JSON report.
    #[arg(long)]
    json: bool,

    /// Print the cleaned dataset as CSV to stdout
    #[arg(long)]
    emit_csv: bool,

    /// Print descriptive statistics and correlations of the cleaned dataset
    #[arg(long)]
    stats: bool,

    /// Aggregate --value by this column of the cleaned dataset
    #[arg(long, requires = "value")]
    group_by: Option<String>,

    /// Aggregate --value per period of this date column
    #[arg(long, requires = "value")]
    trend: Option<String>,

    /// Numeric column for --group-by and --trend
    #[arg(long)]
    value: Option<String>,

    /// Aggregation for --group-by (sum, mean, count)
    #[arg(long, default_value = "sum")]
    agg: String,

    /// Period for --trend (daily, monthly, quarterly, yearly)
    #[arg(long, default_value = "monthly")]
    period: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show warnings and errors)
    #[arg(short, long)]
    quiet: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    // stderr keeps --emit-csv output clean
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    dotenv().ok();

    let preferences = match &args.preferences {
        Some(path) => Preferences::load(path)?,
        None => Preferences::discover(".")?.unwrap_or_default(),
    };

    let input = match (&args.input, preferences.dataset_path()) {
        (Some(input), _) => PathBuf::from(input),
        (None, Some(path)) => path,
        (None, None) => {
            return Err(anyhow!(
                "No input file: pass --input or set DATASET_FILENAME in user_preference.txt"
            ));
        }
    };

    let config = apply_overrides(preferences.config, &args)?;

    info!("Loading dataset from: {}", input.display());
    let data = io::load_csv(&input)?;

    if args.dry_run {
        run_dry_run(&input, &data, &config);
        return Ok(());
    }

    let pipeline = Pipeline::builder().config(config).build()?;
    let result = match pipeline.run(data) {
        Ok(result) => result,
        Err(e) => {
            error!("Pipeline failed: {}", e);
            return Err(anyhow!("Pipeline failed: {}", e));
        }
    };

    handle_pipeline_output(result, &input, pipeline.config(), &args)
}

/// Layer CLI flags over the preference file's configuration.
fn apply_overrides(mut config: CleaningConfig, args: &Args) -> Result<CleaningConfig> {
    if let Some(strategy) = args.missing_strategy {
        config.missing_strategy.default = Some(missing_strategy(strategy, &args.fill_value)?);
    }
    if let Some(strategy) = args.outlier_strategy {
        config.outlier_strategy = strategy.into();
    }
    if let Some(strategy) = args.duplicate_strategy {
        config.duplicate_strategy = strategy.into();
    }
    if let Some(column) = &args.identifier {
        config.profile.identifier_column = Some(column.clone());
    }
    if args.no_type_coercion {
        config.type_coercion = false;
    }
    Ok(config)
}

fn missing_strategy(cli: CliMissingStrategy, fill_value: &Option<String>) -> Result<MissingStrategy> {
    Ok(match cli {
        CliMissingStrategy::Mean => MissingStrategy::Mean,
        CliMissingStrategy::Median => MissingStrategy::Median,
        CliMissingStrategy::Mode => MissingStrategy::Mode,
        CliMissingStrategy::DropRow => MissingStrategy::DropRow,
        CliMissingStrategy::ForwardFill => MissingStrategy::ForwardFill,
        CliMissingStrategy::FlagOnly => MissingStrategy::FlagOnly,
        CliMissingStrategy::Constant => match fill_value {
            Some(value) => MissingStrategy::Constant(value.clone()),
            None => return Err(anyhow!("--missing-strategy constant needs --fill-value")),
        },
    })
}

/// Run dry-run mode - show the profile without cleaning
///
/// Note: This function uses `println!` intentionally for user-facing CLI output.
fn run_dry_run(input: &Path, data: &DataFrame, config: &CleaningConfig) {
    println!("\n{}", "=".repeat(80));
    println!("DRY RUN - Profile and detected issues");
    println!("{}\n", "=".repeat(80));

    println!("DATASET OVERVIEW");
    println!("{}", "-".repeat(40));
    println!("  File: {}", input.display());
    println!("  Rows: {}", data.height());
    println!("  Columns: {}", data.width());
    println!();

    let profile = DataProfiler::profile(data, &config.profile);

    println!("COLUMN PROFILES");
    println!("{}", "-".repeat(40));
    println!(
        "{:<20} {:<12} {:<10} {:<10}",
        "Column", "Type", "Missing %", "Unique"
    );
    println!("{}", "-".repeat(56));
    for col in &profile.columns {
        println!(
            "{:<20} {:<12} {:<10.1} {:<10}",
            truncate_str(&col.name, 19),
            col.inferred_type,
            col.null_percentage(profile.row_count),
            col.unique_count
        );
    }
    println!();

    println!("DATA QUALITY ISSUES");
    println!("{}", "-".repeat(40));
    if profile.issues.is_empty() {
        println!("  No data quality issues detected");
    } else {
        for issue in &profile.issues {
            println!(
                "  - [{}] {}: {}",
                issue.severity,
                issue.column.as_deref().unwrap_or("(all)"),
                issue.description
            );
        }
    }
    println!();

    println!("PLANNED STRATEGIES");
    println!("{}", "-".repeat(40));
    for col in &profile.columns {
        if col.null_count > 0 {
            println!(
                "  missing values in {}: {}",
                col.name,
                config.missing_strategy.resolve(&col.name, col.inferred_type)
            );
        }
    }
    println!("  outliers: {}", config.outlier_strategy.name());
    println!("  duplicates: {}", config.duplicate_strategy.name());
    println!(
        "  type coercion: {}",
        if config.type_coercion { "on" } else { "off" }
    );
    println!();

    println!("{}", "=".repeat(80));
    println!("To clean the dataset, run without --dry-run");
    println!("{}", "=".repeat(80));
}

/// Handle pipeline output based on CLI flags.
///
/// - Default: human-readable summary and transformation log
/// - `--json`: the full report as JSON
/// - `--emit-csv`: the cleaned dataset as CSV
fn handle_pipeline_output(
    mut result: PipelineResult,
    input: &Path,
    config: &CleaningConfig,
    args: &Args,
) -> Result<()> {
    if args.json {
        let report =
            ReportGenerator::build_comprehensive_report(&input.display().to_string(), &result);
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if args.emit_csv {
        io::write_csv(&mut result.dataset, std::io::stdout().lock())?;
        return Ok(());
    }

    print_human_readable_summary(&result, input);

    if args.stats {
        print_stats(&result.dataset, config);
    }
    if let Some(group) = &args.group_by {
        print_group_aggregate(&result.dataset, group, args, config)?;
    }
    if let Some(date) = &args.trend {
        print_trend(&result.dataset, date, args, config)?;
    }

    Ok(())
}

/// Print a human-readable summary of the cleaning run.
fn print_human_readable_summary(result: &PipelineResult, input: &Path) {
    let summary = &result.summary;

    println!();
    println!("{}", "=".repeat(80));
    println!("CLEANING COMPLETE");
    println!("{}", "=".repeat(80));
    println!();
    println!(
        "Input: {} ({} rows x {} columns)",
        input.display(),
        summary.rows_before,
        summary.columns_before
    );
    println!();
    println!("Summary:");
    println!("  Duration: {}ms", summary.duration_ms);
    println!(
        "  Rows: {} -> {} ({} removed)",
        summary.rows_before,
        summary.rows_after,
        summary.rows_removed()
    );
    println!(
        "  Completeness: {:.1}% -> {:.1}%",
        summary.completeness_before * 100.0,
        summary.completeness_after * 100.0
    );
    println!(
        "  Issues: {} found, {} remaining",
        summary.issues_found, summary.issues_remaining
    );
    println!();
    print!(
        "{}",
        ReportGenerator::transformation_log_markdown(&result.records, &result.profile_before.issues)
    );
    println!();
    println!("Use --json for machine-readable output");
    println!("Use --emit-csv to print the cleaned dataset");
    println!("{}", "=".repeat(80));
}

fn print_stats(df: &DataFrame, config: &CleaningConfig) {
    let summaries = analysis::describe(df, &config.profile);
    if summaries.is_empty() {
        println!("\nNo numeric columns to describe");
        return;
    }

    println!("\nDESCRIPTIVE STATISTICS");
    println!("{}", "-".repeat(40));
    println!(
        "{:<20} {:>8} {:>12} {:>12} {:>12} {:>12} {:>12}",
        "Column", "Count", "Mean", "Std", "Min", "Median", "Max"
    );
    for s in &summaries {
        println!(
            "{:<20} {:>8} {:>12.3} {:>12} {:>12.3} {:>12.3} {:>12.3}",
            truncate_str(&s.column, 19),
            s.count,
            s.mean,
            s.std.map(|v| format!("{:.3}", v)).unwrap_or_else(|| "-".into()),
            s.min,
            s.median,
            s.max
        );
    }

    let matrix = analysis::correlation_matrix(df, &config.profile);
    if matrix.columns.len() < 2 {
        return;
    }
    println!("\nCORRELATIONS");
    println!("{}", "-".repeat(40));
    for (i, a) in matrix.columns.iter().enumerate() {
        for b in &matrix.columns[i + 1..] {
            match matrix.get(a, b) {
                Some(r) => println!("  {} ~ {}: {:.3}", a, b, r),
                None => println!("  {} ~ {}: -", a, b),
            }
        }
    }
}

fn print_group_aggregate(
    df: &DataFrame,
    group: &str,
    args: &Args,
    config: &CleaningConfig,
) -> Result<()> {
    let value = args.value.as_deref().unwrap_or_default();
    let aggregation: Aggregation = args.agg.parse().map_err(|e: String| anyhow!(e))?;
    let rows = analysis::group_aggregate(df, group, value, aggregation, &config.profile)?;

    println!("\n{} OF {} BY {}", args.agg.to_uppercase(), value, group);
    println!("{}", "-".repeat(40));
    for row in rows {
        println!("  {:<24} {:.3}", truncate_str(&row.group, 23), row.value);
    }
    Ok(())
}

fn print_trend(df: &DataFrame, date: &str, args: &Args, config: &CleaningConfig) -> Result<()> {
    let value = args.value.as_deref().unwrap_or_default();
    let period: TrendPeriod = args.period.parse().map_err(|e: String| anyhow!(e))?;
    let report = analysis::trend(df, date, value, period, &config.profile)?;

    println!(
        "\n{} TREND OF {} ({} to {})",
        period.to_string().to_uppercase(),
        value,
        report.first_date,
        report.last_date
    );
    println!("{}", "-".repeat(40));
    for p in &report.periods {
        println!("  {:<12} sum {:>12.3}  mean {:>10.3}  n {}", p.period, p.sum, p.mean, p.count);
    }
    if let Some(growth) = report.overall_growth {
        println!("  Overall growth: {:.1}%", growth);
    }
    if let Some(direction) = report.direction {
        println!("  Direction: {:?}", direction);
    }
    if let (Some(peak), Some(trough)) = (report.peak(), report.trough()) {
        println!("  Peak: {}  Trough: {}", peak.period, trough.period);
    }
    println!("  Completeness: {:.1}%", report.completeness * 100.0);
    Ok(())
}

/// Truncate a string to max length with ellipsis
fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
