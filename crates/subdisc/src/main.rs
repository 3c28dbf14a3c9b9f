//! CLI entry point for subgroup discovery.

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, ValueEnum};
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use subdisc::{
    AttributeType, NumericStrategy, QualityMeasureKind, SearchParameters, SearchStrategy,
    SubgroupDiscovery, SubgroupSet, SubgroupSummary, Table, TargetConcept, TargetType,
    Validation, ValidationMethod, ValidationReport,
};
use tracing::{debug, info};

/// CLI-compatible target type enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliTargetType {
    /// Rows where the target equals --target-value are positives
    SingleNominal,
    /// Numeric target compared on its distribution
    SingleNumeric,
    /// Ordinal target, scored like a numeric one
    SingleOrdinal,
    /// Correlation between --target and --secondary
    DoubleCorrelation,
    /// Regression line of --secondary on --target
    DoubleRegression,
    /// Binary --targets modelled as a Bayesian network
    MultiLabel,
}

/// CLI-compatible search strategy enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliStrategy {
    /// Level-wise search keeping the best --width candidates per level
    Beam,
    /// Always refine the best candidate next
    BestFirst,
    /// Refine candidates in the order they were found
    BreadthFirst,
    /// Refine the most recently found candidate next
    DepthFirst,
}

impl From<CliStrategy> for SearchStrategy {
    fn from(cli: CliStrategy) -> Self {
        match cli {
            CliStrategy::Beam => SearchStrategy::Beam,
            CliStrategy::BestFirst => SearchStrategy::BestFirst,
            CliStrategy::BreadthFirst => SearchStrategy::BreadthFirst,
            CliStrategy::DepthFirst => SearchStrategy::DepthFirst,
        }
    }
}

/// CLI-compatible numeric strategy enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliNumericStrategy {
    /// Try every distinct value as a threshold
    All,
    /// Try equal-frequency bin boundaries
    Bins,
    /// Keep only the best threshold per attribute
    Best,
}

impl From<CliNumericStrategy> for NumericStrategy {
    fn from(cli: CliNumericStrategy) -> Self {
        match cli {
            CliNumericStrategy::All => NumericStrategy::All,
            CliNumericStrategy::Bins => NumericStrategy::Bins,
            CliNumericStrategy::Best => NumericStrategy::Best,
        }
    }
}

/// CLI-compatible validation method enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliValidation {
    /// Score uniformly drawn row sets
    RandomSubsets,
    /// Score random condition lists
    RandomDescriptions,
    /// Permute the target and mine again
    SwapRandomization,
}

impl From<CliValidation> for ValidationMethod {
    fn from(cli: CliValidation) -> Self {
        match cli {
            CliValidation::RandomSubsets => ValidationMethod::RandomSubsets,
            CliValidation::RandomDescriptions => ValidationMethod::RandomDescriptions,
            CliValidation::SwapRandomization => ValidationMethod::SwapRandomization,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Exploratory subgroup discovery",
    long_about = "Searches conjunctions of attribute conditions for subgroups whose target \
                  distribution deviates from the population.\n\n\
                  EXAMPLES:\n  \
                  # Subgroups with a high share of survivors\n  \
                  subdisc -i titanic.csv --target Survived --target-value 1 --depth 2\n\n  \
                  # Numeric target, validated against 100 swap-randomized runs\n  \
                  subdisc -i housing.csv --target-type single-numeric --target price \\\n    \
                  --measure z-score --validate swap-randomization --repetitions 100\n\n  \
                  # Multi-label target over three binary columns\n  \
                  subdisc -i labels.csv --target-type multi-label --targets a,b,c --binary a,b,c"
)]
struct Args {
    /// Path to the CSV file to mine
    #[arg(short, long)]
    input: String,

    /// Kind of target concept
    #[arg(long, value_enum, default_value = "single-nominal")]
    target_type: CliTargetType,

    /// Target column (primary column for double targets)
    #[arg(short, long)]
    target: Option<String>,

    /// Value of the target column that marks positive rows
    #[arg(long)]
    target_value: Option<String>,

    /// Secondary column for correlation and regression targets
    #[arg(long)]
    secondary: Option<String>,

    /// Target columns for multi-label targets
    #[arg(long, value_delimiter = ',')]
    targets: Vec<String>,

    /// Columns to treat as binary (values 0/1, true/false)
    #[arg(long, value_delimiter = ',')]
    binary: Vec<String>,

    /// Numeric columns to treat as ordinal
    #[arg(long, value_delimiter = ',')]
    ordinal: Vec<String>,

    /// Quality measure, e.g. "WRAcc", "z-score", "WEED"
    ///
    /// Falls back to the default measure of the target type when it does
    /// not fit the target
    #[arg(short, long)]
    measure: Option<String>,

    /// Minimum quality for a subgroup to be reported
    #[arg(long, default_value = "0.0")]
    min_quality: f64,

    /// Maximum number of conditions per subgroup
    #[arg(short, long, default_value = "1")]
    depth: usize,

    /// Minimum number of rows a subgroup must cover
    #[arg(long, default_value = "2")]
    min_coverage: usize,

    /// Maximum number of subgroups to keep
    #[arg(long, default_value = "1000")]
    max_subgroups: usize,

    /// Time budget in minutes
    #[arg(long, default_value = "1.0")]
    time: f64,

    /// Search strategy
    #[arg(long, value_enum, default_value = "beam")]
    strategy: CliStrategy,

    /// Beam width, also bounds best-first search
    #[arg(short, long, default_value = "100")]
    width: usize,

    /// How thresholds for numeric attributes are chosen
    #[arg(long, value_enum, default_value = "bins")]
    numeric_strategy: CliNumericStrategy,

    /// Number of bins for the bins numeric strategy
    #[arg(long, default_value = "8")]
    bins: usize,

    /// Networks per side when re-scoring multi-label results (0 disables)
    #[arg(long, default_value = "0")]
    post_process: usize,

    /// Validate the result against a randomized baseline
    #[arg(long, value_enum)]
    validate: Option<CliValidation>,

    /// Number of baseline samples to draw
    #[arg(short, long, default_value = "100")]
    repetitions: usize,

    /// Seed for validation and randomized hill climbing
    #[arg(long)]
    seed: Option<u64>,

    /// Number of subgroups to print
    #[arg(long, default_value = "20")]
    top: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long)]
    quiet: bool,

    /// Output JSON to stdout instead of human-readable summary
    ///
    /// Disables all progress logs; only outputs the final JSON report.
    #[arg(long)]
    json: bool,
}

/// Everything printed with `--json`.
#[derive(Debug, Serialize)]
struct MiningReport {
    input: String,
    rows: usize,
    columns: usize,
    parameters: SearchParameters,
    candidates: usize,
    duration_ms: u128,
    subgroups: Vec<SubgroupSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    validation: Option<ValidationReport>,
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

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    if !Path::new(&args.input).exists() {
        return Err(anyhow!("Input file not found: {}", args.input));
    }

    info!("Loading dataset from: {}", args.input);
    let data = load_csv(&args.input)?;
    info!("Dataset loaded successfully: {:?}", data.shape());

    let mut table = Table::from_dataframe(extract_file_stem(&args.input), &data)?;
    apply_type_overrides(&mut table, &args)?;

    let target = build_target(&table, &args)?;
    let params = build_parameters(target, &args)?;
    debug!("Search parameters: {:?}", params);

    let begin = Instant::now();
    let (mut result, candidates) = {
        let mut discovery = SubgroupDiscovery::new(&params, &table)?;
        discovery.mine(begin)?;
        discovery.post_process()?;
        let candidates = discovery.candidate_count();
        (discovery.into_result(), candidates)
    };
    let duration_ms = begin.elapsed().as_millis();

    let validation = match args.validate {
        Some(method) if !result.is_empty() => {
            let report = Validation::new(&params, &mut table).validate(
                method.into(),
                args.repetitions,
                &mut result,
            )?;
            Some(report)
        }
        Some(_) => {
            info!("No subgroups found, skipping validation");
            None
        }
        None => None,
    };

    let report = MiningReport {
        input: args.input.clone(),
        rows: table.row_count(),
        columns: table.column_count(),
        parameters: params,
        candidates,
        duration_ms,
        subgroups: result.iter().map(|s| s.summary()).collect(),
        validation,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_human_readable_summary(&report, &result, args.top);
    Ok(())
}

/// Convert the columns named by `--binary` and `--ordinal`.
fn apply_type_overrides(table: &mut Table, args: &Args) -> Result<()> {
    for (names, attribute_type) in [
        (&args.binary, AttributeType::Binary),
        (&args.ordinal, AttributeType::Ordinal),
    ] {
        for name in names {
            let index = table.column_index(name)?;
            table
                .set_attribute_type(index, attribute_type)
                .with_context(|| format!("Cannot treat column '{}' as {}", name, attribute_type))?;
        }
    }
    Ok(())
}

fn build_target(table: &Table, args: &Args) -> Result<TargetConcept> {
    let column = |name: &Option<String>, flag: &str| -> Result<usize> {
        let name = name
            .as_deref()
            .ok_or_else(|| anyhow!("--{} is required for {:?} targets", flag, args.target_type))?;
        Ok(table.column_index(name)?)
    };

    let target = match args.target_type {
        CliTargetType::SingleNominal => {
            let value = args
                .target_value
                .clone()
                .ok_or_else(|| anyhow!("--target-value is required for single-nominal targets"))?;
            TargetConcept::SingleNominal {
                target: column(&args.target, "target")?,
                value,
            }
        }
        CliTargetType::SingleNumeric => TargetConcept::SingleNumeric {
            target: column(&args.target, "target")?,
        },
        CliTargetType::SingleOrdinal => TargetConcept::SingleOrdinal {
            target: column(&args.target, "target")?,
        },
        CliTargetType::DoubleCorrelation => TargetConcept::DoubleCorrelation {
            primary: column(&args.target, "target")?,
            secondary: column(&args.secondary, "secondary")?,
        },
        CliTargetType::DoubleRegression => TargetConcept::DoubleRegression {
            primary: column(&args.target, "target")?,
            secondary: column(&args.secondary, "secondary")?,
        },
        CliTargetType::MultiLabel => {
            if args.targets.is_empty() {
                bail!("--targets is required for multi-label targets");
            }
            let targets = args
                .targets
                .iter()
                .map(|name| table.column_index(name))
                .collect::<subdisc::SubdiscResult<Vec<_>>>()?;
            TargetConcept::MultiLabel { targets }
        }
    };

    target.validate(table)?;
    info!("Target: {} {:?}", target.target_type(), target.target_indices());
    Ok(target)
}

fn build_parameters(target: TargetConcept, args: &Args) -> Result<SearchParameters> {
    let target_type = target.target_type();
    let mut builder = SearchParameters::builder(target)
        .quality_measure_minimum(args.min_quality)
        .search_depth(args.depth)
        .minimum_coverage(args.min_coverage)
        .maximum_subgroups(args.max_subgroups)
        .maximum_time_minutes(args.time)
        .strategy(args.strategy.into())
        .strategy_width(args.width)
        .numeric_strategy(args.numeric_strategy.into())
        .nr_bins(args.bins)
        .post_processing_count(args.post_process);

    if let Some(ref name) = args.measure {
        builder = builder.quality_measure(QualityMeasureKind::resolve(name, target_type));
    }
    if let Some(seed) = args.seed {
        builder = builder.random_seed(seed);
    }

    Ok(builder.build()?)
}

/// Load a CSV file with a header row.
fn load_csv(path: &str) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_infer_schema_length(Some(100))
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
        .finish()
        .with_context(|| format!("Failed to read CSV file: {}", path))
}

/// Extract the file stem (name without extension) from a path.
fn extract_file_stem(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("table")
        .to_string()
}

/// Truncate a string to max length with ellipsis
fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Print the result table and validation outcome.
///
/// This is the default output when `--json` is not specified.
fn print_human_readable_summary(report: &MiningReport, result: &SubgroupSet, top: usize) {
    let params = &report.parameters;
    let has_p_values = result.iter().any(|s| s.p_value().is_some());

    println!();
    println!("{}", "=".repeat(80));
    println!("SUBGROUP DISCOVERY COMPLETE");
    println!("{}", "=".repeat(80));
    println!();

    println!(
        "Input:   {} ({} rows x {} columns)",
        report.input, report.rows, report.columns
    );
    println!("Target:  {}", params.target.target_type());
    println!("Measure: {}", params.quality_measure);
    println!(
        "Search:  {:?}, depth {}, min coverage {}",
        params.strategy, params.search_depth, params.minimum_coverage
    );
    println!(
        "Found {} subgroups from {} candidates in {}ms",
        report.subgroups.len(),
        report.candidates,
        report.duration_ms
    );
    println!();

    if report.subgroups.is_empty() {
        println!("No subgroups above the quality minimum.");
    } else {
        print!("{:>4} {:>5} {:>9} {:>12}", "#", "Depth", "Coverage", "Quality");
        if has_p_values {
            print!(" {:>10}", "p-value");
        }
        println!("  Conditions");
        println!("{}", "-".repeat(80));

        for summary in report.subgroups.iter().take(top) {
            print!(
                "{:>4} {:>5} {:>9} {:>12.6}",
                summary.id.map(|id| id.to_string()).unwrap_or_default(),
                summary.depth,
                summary.coverage,
                summary.quality
            );
            if has_p_values {
                print!(" {:>10.4}", summary.p_value.unwrap_or(f64::NAN));
            }
            println!("  {}", truncate_str(&summary.conditions, 60));
        }
        if report.subgroups.len() > top {
            println!("  ... and {} more subgroups", report.subgroups.len() - top);
        }
    }
    println!();

    if let Some(ref validation) = report.validation {
        println!("Validation ({}, {} samples):", validation.method, validation.samples.len());
        println!("  Empirical p-value: {:.4}", validation.empirical_p_value);
        println!("  Regression test (top 1): {:.4}", validation.regression.top1);
        match validation.regression.top10 {
            Some(score) => println!("  Regression test (top 10): {:.4}", score),
            None => println!("  Regression test (top 10): n/a (fewer than 10 subgroups)"),
        }
        println!();
    }

    if report.validation.is_none() && params.target.target_type() != TargetType::MultiLabel {
        println!("Use --validate to test the result against a randomized baseline");
    }
    println!("Use --json for machine-readable output");
    println!("{}", "=".repeat(80));
}
