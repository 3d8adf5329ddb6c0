//! Harvest orchestration against canned pages.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use wodrank_harvest::extract::extract_profile;
use wodrank_harvest::{
    harvest, CsvAppender, HarvestConfig, HarvestError, HarvestProgress, HarvestSummary,
    ProfileSource,
};

fn fixture(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    std::fs::read_to_string(path).unwrap()
}

// ── Mock source ──────────────────────────────────────────────────────

struct MockSource {
    pages: HashMap<u32, String>,
    profiles: HashMap<String, String>,
    /// Source refuses everything after this many requests.
    fail_after: Option<usize>,
    requests: AtomicUsize,
}

impl MockSource {
    fn new() -> Self {
        Self {
            pages: HashMap::new(),
            profiles: HashMap::new(),
            fail_after: None,
            requests: AtomicUsize::new(0),
        }
    }

    fn tick(&self) -> Result<(), HarvestError> {
        let n = self.requests.fetch_add(1, Ordering::SeqCst);
        match self.fail_after {
            Some(limit) if n >= limit => Err(HarvestError::CircuitBreakerTripped),
            _ => Ok(()),
        }
    }
}

impl ProfileSource for MockSource {
    fn name(&self) -> &str {
        "mock"
    }

    fn leaderboard_page(&self, page: u32) -> Result<String, HarvestError> {
        self.tick()?;
        self.pages.get(&page).cloned().ok_or(HarvestError::HttpStatus {
            status: 404,
            url: format!("page {page}"),
        })
    }

    fn profile_page(&self, url: &str) -> Result<String, HarvestError> {
        self.tick()?;
        self.profiles.get(url).cloned().ok_or(HarvestError::HttpStatus {
            status: 404,
            url: url.to_string(),
        })
    }

    fn is_available(&self) -> bool {
        self.fail_after
            .map_or(true, |limit| self.requests.load(Ordering::SeqCst) < limit)
    }
}

#[derive(Default)]
struct RecordingProgress {
    events: Mutex<Vec<String>>,
}

impl HarvestProgress for RecordingProgress {
    fn on_page(&self, page: u32, result: Result<usize, &HarvestError>) {
        let line = match result {
            Ok(n) => format!("page {page}: {n}"),
            Err(_) => format!("page {page}: err"),
        };
        self.events.lock().unwrap().push(line);
    }

    fn on_profile_start(&self, url: &str, index: usize, total: usize) {
        self.events
            .lock()
            .unwrap()
            .push(format!("start {}/{total} {url}", index + 1));
    }

    fn on_profile_complete(
        &self,
        url: &str,
        _index: usize,
        _total: usize,
        result: &Result<(), HarvestError>,
    ) {
        let status = if result.is_ok() { "ok" } else { "err" };
        self.events.lock().unwrap().push(format!("done {url} {status}"));
    }

    fn on_complete(&self, summary: &HarvestSummary) {
        self.events
            .lock()
            .unwrap()
            .push(format!("complete {}/{}", summary.succeeded, summary.attempted()));
    }
}

fn config(output: PathBuf) -> HarvestConfig {
    HarvestConfig {
        start_page: 1,
        end_page: 2,
        delay: Duration::ZERO,
        output,
        ..HarvestConfig::default()
    }
}

const ADA: &str = "https://games.crossfit.com/athlete/1001";
const BO: &str = "https://games.crossfit.com/athlete/1002";
const CY: &str = "https://games.crossfit.com/athlete/1003";

// ── Extraction on fixtures ───────────────────────────────────────────

#[test]
fn profile_fixture_extracts_all_fields() {
    let rec = extract_profile(&fixture("profile.html"), ADA, 2025);
    assert_eq!(rec.name, "Ada Lovelace");
    assert_eq!(rec.country, "United Kingdom");
    assert_eq!(rec.gender, "Women");
    assert_eq!(rec.open_rank, "2104");
    assert_eq!(rec.benchmark("Back Squat"), Some("245"));
    assert_eq!(rec.benchmark("Clean and Jerk"), Some("175"));
    assert_eq!(rec.benchmark("Deadlift"), Some(""));
    assert_eq!(rec.benchmark("Fran"), Some("3:41"));
    assert_eq!(rec.benchmark("Max Pull-ups"), Some("22"));
    assert_eq!(rec.benchmark("Sprint 400m"), Some("1:12"));
    assert_eq!(rec.benchmark("Murph"), Some(""));

    assert_eq!(extract_profile(&fixture("profile.html"), ADA, 2024).open_rank, "3377");
}

// ── Orchestration ────────────────────────────────────────────────────

#[test]
fn harvest_writes_one_row_per_profile() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(dir.path().join("athletes.csv"));

    let mut source = MockSource::new();
    source.pages.insert(1, fixture("leaderboard_page.html"));
    source.profiles.insert(ADA.into(), fixture("profile.html"));
    source.profiles.insert(BO.into(), fixture("profile.html").replace("Ada", "Bo"));
    source.profiles.insert(CY.into(), "<html>maintenance</html>".into());

    let progress = RecordingProgress::default();
    let writer = CsvAppender::new(&cfg.output, cfg.open_year);
    let summary = harvest(&source, &cfg, &writer, &progress);

    assert_eq!(summary.pages_ok, 1);
    assert_eq!(summary.pages_failed, 1);
    assert_eq!(summary.links, 3);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 1);
    assert!(!summary.stopped_early);
    assert!(summary
        .errors
        .iter()
        .any(|(url, e)| url == CY && matches!(e, HarvestError::NotAProfile { .. })));

    let mut rdr = csv::Reader::from_path(&cfg.output).unwrap();
    let rows: Vec<csv::StringRecord> = rdr.records().map(Result::unwrap).collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[0][0], ADA);
    assert_eq!(&rows[0][1], "Ada Lovelace");
    assert_eq!(&rows[1][1], "Bo Lovelace");

    let headers = rdr.headers().unwrap().clone();
    let fran = headers.iter().position(|h| h == "fran").unwrap();
    let sprint = headers.iter().position(|h| h == "sprint400m").unwrap();
    assert_eq!(&rows[0][fran], "3:41");
    assert_eq!(&rows[0][sprint], "1:12");

    let events = progress.events.lock().unwrap();
    assert_eq!(events[0], "page 1: 3");
    assert_eq!(events[1], "page 2: err");
    assert_eq!(events.last().unwrap(), "complete 2/3");
}

#[test]
fn max_athletes_caps_profile_requests() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = HarvestConfig {
        max_athletes: 1,
        ..config(dir.path().join("capped.csv"))
    };

    let mut source = MockSource::new();
    source.pages.insert(1, fixture("leaderboard_page.html"));
    source.profiles.insert(ADA.into(), fixture("profile.html"));

    let writer = CsvAppender::new(&cfg.output, cfg.open_year);
    let summary = harvest(&source, &cfg, &writer, &RecordingProgress::default());
    assert_eq!(summary.links, 3);
    assert_eq!(summary.attempted(), 1);
    assert_eq!(summary.succeeded, 1);
}

#[test]
fn unavailable_source_stops_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(dir.path().join("stopped.csv"));

    let mut source = MockSource::new();
    source.pages.insert(1, fixture("leaderboard_page.html"));
    source.pages.insert(2, fixture("leaderboard_page.html"));
    source.profiles.insert(ADA.into(), fixture("profile.html"));
    source.profiles.insert(BO.into(), fixture("profile.html"));
    // Two page requests plus one profile, then the source shuts off.
    source.fail_after = Some(3);

    let writer = CsvAppender::new(&cfg.output, cfg.open_year);
    let summary = harvest(&source, &cfg, &writer, &RecordingProgress::default());
    assert_eq!(summary.pages_ok, 2);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 0);
    assert!(summary.stopped_early);
    assert_eq!(source.requests.load(Ordering::SeqCst), 3);
}

#[test]
fn appending_to_an_existing_file_keeps_one_header() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(dir.path().join("twice.csv"));

    let mut source = MockSource::new();
    source.pages.insert(1, fixture("leaderboard_page.html"));
    source.profiles.insert(ADA.into(), fixture("profile.html"));

    let writer = CsvAppender::new(&cfg.output, cfg.open_year);
    harvest(&source, &cfg, &writer, &RecordingProgress::default());
    harvest(&source, &cfg, &writer, &RecordingProgress::default());

    let text = std::fs::read_to_string(&cfg.output).unwrap();
    assert_eq!(text.matches("profile_url").count(), 1);
    assert_eq!(text.matches(ADA).count(), 2);
}
