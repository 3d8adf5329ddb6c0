//! wodrank CLI: rank a workout score, inspect the dataset, harvest data.
//!
//! Commands:
//! - `workouts`: list the registry grouped by category
//! - `percentile`: rank a score and draw the population histogram
//! - `explore`: shape, fill rates and statistics of the raw dataset
//! - `harvest`: scrape athlete profiles from the leaderboard into CSV

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use wodrank_core::data::{parse_clock, DatasetSummary};
use wodrank_core::format::format_with_unit;
use wodrank_core::histogram::{bin_edges, bin_index};
use wodrank_core::report::parse_score;
use wodrank_core::{
    EngineConfig, GenderFilter, PercentileReport, RankingEngine, RawDataset, ReportError,
    ReportResponse, ScoringType, WorkoutRegistry,
};
use wodrank_harvest::{
    harvest, CircuitBreaker, CsvAppender, HarvestConfig, HttpProfileSource, LogProgress,
};

#[derive(Parser)]
#[command(name = "wodrank", about = "Percentile rankings for benchmark workouts")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the known workouts.
    Workouts {
        /// TOML config with extra or replacement workouts.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Rank a score against the population.
    Percentile {
        /// Workout id (e.g. fran, deadlift).
        workout: String,

        /// Score: seconds, reps or pounds. Time workouts also accept m:ss.
        score: String,

        /// Population filter: men, women or everyone.
        #[arg(long, default_value = "everyone")]
        gender: String,

        /// Dataset CSV. Overrides the config file.
        #[arg(long)]
        data: Option<PathBuf>,

        /// TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print the JSON response body instead of a report.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Summarize the raw dataset.
    Explore {
        /// Dataset CSV. Overrides the config file.
        #[arg(long)]
        data: Option<PathBuf>,

        /// TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Scrape athlete profiles from the leaderboard into a CSV file.
    Harvest {
        /// First leaderboard page.
        #[arg(long, default_value_t = 101)]
        start_page: u32,

        /// Last leaderboard page (inclusive).
        #[arg(long, default_value_t = 120)]
        end_page: u32,

        /// Maximum number of profiles to scrape.
        #[arg(long, default_value_t = 1000)]
        max_athletes: usize,

        /// Output CSV. Defaults to scraped_athletes_<year>_<yymmdd>.csv.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pause between profile requests, in milliseconds.
        #[arg(long, default_value_t = 1000)]
        delay_ms: u64,

        /// Open season whose worldwide rank is recorded.
        #[arg(long, default_value_t = 2025)]
        year: i32,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Workouts { config } => run_workouts(config.as_deref()),
        Commands::Percentile {
            workout,
            score,
            gender,
            data,
            config,
            json,
        } => run_percentile(&workout, &score, &gender, data, config.as_deref(), json),
        Commands::Explore { data, config } => run_explore(data, config.as_deref()),
        Commands::Harvest {
            start_page,
            end_page,
            max_athletes,
            output,
            delay_ms,
            year,
        } => run_harvest(start_page, end_page, max_athletes, output, delay_ms, year),
    }
}

fn load_config(path: Option<&Path>, data: Option<PathBuf>) -> Result<EngineConfig> {
    let config = match path {
        Some(p) => EngineConfig::from_file(p)?,
        None => EngineConfig::default(),
    };
    Ok(match data {
        Some(d) => config.with_dataset(d),
        None => config,
    })
}

fn run_workouts(config: Option<&Path>) -> Result<()> {
    let registry = load_config(config, None)?.registry()?;
    print_registry(&registry);
    Ok(())
}

fn print_registry(registry: &WorkoutRegistry) {
    for (category, workouts) in registry.by_category() {
        println!("{category}");
        for w in workouts {
            println!(
                "  {:<10} {:<16} {:<6} {:>10} - {}",
                w.id,
                w.display_name,
                w.scoring_type.as_str(),
                format_with_unit(w.valid_range.min, w.scoring_type, &w.unit),
                format_with_unit(w.valid_range.max, w.scoring_type, &w.unit),
            );
        }
    }
}

/// Score from the command line. Time workouts also accept clock notation.
fn parse_cli_score(text: &str, scoring_type: ScoringType) -> Result<f64, ReportError> {
    if scoring_type == ScoringType::Time && text.contains(':') {
        return parse_clock(text).filter(|s| *s > 0.0).ok_or_else(|| ReportError::InvalidScore {
            reason: format!("'{text}' is not a valid time"),
        });
    }
    parse_score(text)
}

fn run_percentile(
    workout: &str,
    score: &str,
    gender: &str,
    data: Option<PathBuf>,
    config: Option<&Path>,
    json: bool,
) -> Result<()> {
    let engine = RankingEngine::open(&load_config(config, data)?)?;
    let filter = GenderFilter::from_query(gender);

    let result = match engine.registry().get(workout) {
        None => Err(ReportError::UnknownWorkout {
            id: workout.to_string(),
        }),
        Some(def) => parse_cli_score(score, def.scoring_type)
            .and_then(|s| engine.get_percentile_report(workout, s, filter)),
    };

    if json {
        let response = ReportResponse::from_result(&result);
        println!("{}", serde_json::to_string_pretty(&response.body)?);
        if !response.is_success() {
            std::process::exit(1);
        }
        return Ok(());
    }

    match result {
        Ok(report) => {
            print_report(&report, filter);
            Ok(())
        }
        Err(e) => bail!("{} ({e})", e.public_message()),
    }
}

fn print_report(report: &PercentileReport, filter: GenderFilter) {
    let def = &report.config;
    println!("{} ({}, {})", def.display_name, def.scoring_type, def.category);
    println!(
        "  Score:      {}",
        format_with_unit(report.user_score, def.scoring_type, &def.unit)
    );
    println!(
        "  Percentile: {} (population {}, {})",
        report.percentile,
        report.population,
        filter.as_str()
    );
    println!();

    let edges = bin_edges(def.valid_range);
    let user_bin = bin_index(&edges, report.user_score);
    let max = report.chart_data.iter().copied().max().unwrap_or(0);
    for (i, (label, &count)) in report.chart_labels.iter().zip(&report.chart_data).enumerate() {
        let marker = if user_bin == Some(i) { "  <- you" } else { "" };
        println!("  {label:>17} | {:<40} {count}{marker}", bar(count, max, 40));
    }
}

fn bar(count: u64, max: u64, width: usize) -> String {
    if max == 0 {
        return String::new();
    }
    let len = ((count as f64 / max as f64) * width as f64).round() as usize;
    "#".repeat(len.max(usize::from(count > 0)))
}

fn run_explore(data: Option<PathBuf>, config: Option<&Path>) -> Result<()> {
    let config = load_config(config, data)?;
    let dataset = RawDataset::from_path(&config.dataset)
        .with_context(|| format!("failed to load {}", config.dataset.display()))?;
    info!(fingerprint = %dataset.fingerprint(), "dataset loaded");
    let summary = DatasetSummary::from_dataset(&dataset);

    println!("{}: {} rows, {} columns", config.dataset.display(), summary.rows, summary.columns.len());
    println!();
    println!("{:<24} {:>9}  numeric", "column", "non-empty");
    for col in &summary.columns {
        let numeric = if col.numeric.is_some() { "yes" } else { "no" };
        println!("{:<24} {:>9}  {numeric}", col.name, col.non_empty);
    }

    println!();
    println!(
        "{:<24} {:>7} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10} {:>10}",
        "", "count", "mean", "std", "min", "25%", "50%", "75%", "max"
    );
    for (name, s) in summary.numeric_columns() {
        println!(
            "{name:<24} {:>7} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>10.2}",
            s.count, s.mean, s.std, s.min, s.q25, s.median, s.q75, s.max
        );
    }

    println!();
    println!("{}", dataset.headers().join(","));
    for row in &summary.head {
        println!("{}", row.join(","));
    }

    let registry = config.registry()?;
    let matched: Vec<&str> = registry
        .iter()
        .filter(|w| w.column_candidates().any(|c| dataset.column_index(c).is_some()))
        .map(|w| w.id.as_str())
        .collect();
    println!();
    println!("workouts with data: {}", matched.join(", "));
    Ok(())
}

fn run_harvest(
    start_page: u32,
    end_page: u32,
    max_athletes: usize,
    output: Option<PathBuf>,
    delay_ms: u64,
    year: i32,
) -> Result<()> {
    if start_page > end_page {
        bail!("--start-page ({start_page}) must not exceed --end-page ({end_page})");
    }

    let mut config = HarvestConfig::for_year(year);
    config.start_page = start_page;
    config.end_page = end_page;
    config.max_athletes = max_athletes;
    config.delay = Duration::from_millis(delay_ms);
    if let Some(path) = output {
        config.output = path;
    }

    let breaker = Arc::new(CircuitBreaker::default());
    let source = HttpProfileSource::new(config.leaderboard_url_template(), Arc::clone(&breaker))?;
    let writer = CsvAppender::new(&config.output, config.open_year);

    println!(
        "Harvesting pages {start_page}..={end_page} (up to {max_athletes} athletes) into {}",
        config.output.display()
    );
    let summary = harvest(&source, &config, &writer, &LogProgress);

    println!(
        "Pages: {} ok, {} failed. Links: {}. Profiles: {} saved, {} failed.",
        summary.pages_ok, summary.pages_failed, summary.links, summary.succeeded, summary.failed
    );
    if summary.stopped_early {
        eprintln!(
            "Stopped early: source unavailable (cooldown {}s remaining)",
            breaker.remaining_cooldown().as_secs()
        );
        std::process::exit(1);
    }
    Ok(())
}
