//! Harvest orchestrator: leaderboard pages → profile links → CSV rows.

use chrono::NaiveDate;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

use crate::error::HarvestError;
use crate::extract::{extract_profile, extract_profile_links, is_profile_page};
use crate::source::ProfileSource;
use crate::writer::CsvAppender;

pub const DEFAULT_LEADERBOARD_TEMPLATE: &str = "https://games.crossfit.com/leaderboard/open/{year}?view=0&division=1&region=0&scaled=0&sort=0&page={page}";
pub const DEFAULT_BASE_URL: &str = "https://games.crossfit.com";

#[derive(Debug, Clone, PartialEq)]
pub struct HarvestConfig {
    /// Leaderboard URL with `{year}` and `{page}` placeholders.
    pub leaderboard_template: String,
    /// Prefix for relative profile links.
    pub base_url: String,
    pub start_page: u32,
    pub end_page: u32,
    pub max_athletes: usize,
    /// Pause after each profile request.
    pub delay: Duration,
    pub open_year: i32,
    pub output: PathBuf,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self::for_year(2025)
    }
}

impl HarvestConfig {
    /// Defaults for one Open season, output named after it and today's date.
    pub fn for_year(open_year: i32) -> Self {
        Self {
            leaderboard_template: DEFAULT_LEADERBOARD_TEMPLATE.into(),
            base_url: DEFAULT_BASE_URL.into(),
            start_page: 101,
            end_page: 120,
            max_athletes: 1000,
            delay: Duration::from_secs(1),
            open_year,
            output: default_output(open_year, chrono::Local::now().date_naive()),
        }
    }

    /// Leaderboard template with the year filled in; `{page}` is left for the source.
    pub fn leaderboard_url_template(&self) -> String {
        self.leaderboard_template
            .replace("{year}", &self.open_year.to_string())
    }
}

/// `scraped_athletes_<year>_<yymmdd>.csv`
pub fn default_output(open_year: i32, date: NaiveDate) -> PathBuf {
    PathBuf::from(format!(
        "scraped_athletes_{open_year}_{}.csv",
        date.format("%y%m%d")
    ))
}

/// Progress callbacks for a harvest run.
pub trait HarvestProgress: Send {
    fn on_page(&self, page: u32, result: Result<usize, &HarvestError>);

    fn on_profile_start(&self, url: &str, index: usize, total: usize);

    fn on_profile_complete(
        &self,
        url: &str,
        index: usize,
        total: usize,
        result: &Result<(), HarvestError>,
    );

    fn on_complete(&self, summary: &HarvestSummary);
}

/// Reports progress through `tracing`.
pub struct LogProgress;

impl HarvestProgress for LogProgress {
    fn on_page(&self, page: u32, result: Result<usize, &HarvestError>) {
        match result {
            Ok(found) => info!(page, found, "leaderboard page scraped"),
            Err(e) => warn!(page, error = %e, "leaderboard page skipped"),
        }
    }

    fn on_profile_start(&self, url: &str, index: usize, total: usize) {
        info!(url, "[{}/{}] scraping profile", index + 1, total);
    }

    fn on_profile_complete(
        &self,
        url: &str,
        _index: usize,
        _total: usize,
        result: &Result<(), HarvestError>,
    ) {
        if let Err(e) = result {
            warn!(url, error = %e, "profile skipped");
        }
    }

    fn on_complete(&self, summary: &HarvestSummary) {
        info!(
            pages_ok = summary.pages_ok,
            pages_failed = summary.pages_failed,
            links = summary.links,
            succeeded = summary.succeeded,
            failed = summary.failed,
            stopped_early = summary.stopped_early,
            "harvest complete"
        );
    }
}

#[derive(Debug, Default)]
pub struct HarvestSummary {
    pub pages_ok: usize,
    pub pages_failed: usize,
    /// Unique profile links discovered across all pages.
    pub links: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Set when the source became unavailable mid-run.
    pub stopped_early: bool,
    pub errors: Vec<(String, HarvestError)>,
}

impl HarvestSummary {
    pub fn attempted(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// Run a full harvest.
///
/// Page and profile failures are recorded and skipped. The run stops early
/// once the source reports itself unavailable.
pub fn harvest(
    source: &dyn ProfileSource,
    config: &HarvestConfig,
    writer: &CsvAppender,
    progress: &dyn HarvestProgress,
) -> HarvestSummary {
    let mut summary = HarvestSummary::default();
    info!(
        source = source.name(),
        output = %writer.path().display(),
        pages = %format!("{}..={}", config.start_page, config.end_page),
        "harvest started"
    );

    let links = collect_links(source, config, progress, &mut summary);
    summary.links = links.len();

    if !summary.stopped_early {
        let total = links.len().min(config.max_athletes);
        for (i, url) in links.iter().take(total).enumerate() {
            if !source.is_available() {
                summary.stopped_early = true;
                break;
            }
            progress.on_profile_start(url, i, total);
            let result = harvest_profile(source, config, writer, url);
            progress.on_profile_complete(url, i, total, &result);
            match result {
                Ok(()) => summary.succeeded += 1,
                Err(e) => {
                    summary.failed += 1;
                    summary.errors.push((url.clone(), e));
                }
            }
            if i + 1 < total && !config.delay.is_zero() {
                std::thread::sleep(config.delay);
            }
        }
    }

    progress.on_complete(&summary);
    summary
}

fn collect_links(
    source: &dyn ProfileSource,
    config: &HarvestConfig,
    progress: &dyn HarvestProgress,
    summary: &mut HarvestSummary,
) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for page in config.start_page..=config.end_page {
        if !source.is_available() {
            summary.stopped_early = true;
            break;
        }
        let result = source
            .leaderboard_page(page)
            .map(|html| extract_profile_links(&html, &config.base_url));
        match result {
            Ok(found) => {
                summary.pages_ok += 1;
                progress.on_page(page, Ok(found.len()));
                links.extend(found.into_iter().filter(|l| seen.insert(l.clone())));
            }
            Err(e) => {
                summary.pages_failed += 1;
                progress.on_page(page, Err(&e));
                summary.errors.push((format!("page {page}"), e));
            }
        }
    }
    links
}

fn harvest_profile(
    source: &dyn ProfileSource,
    config: &HarvestConfig,
    writer: &CsvAppender,
    url: &str,
) -> Result<(), HarvestError> {
    let html = source.profile_page(url)?;
    if !is_profile_page(&html) {
        return Err(HarvestError::NotAProfile { url: url.to_string() });
    }
    let record = extract_profile(&html, url, config.open_year);
    writer.append(&record)
}
