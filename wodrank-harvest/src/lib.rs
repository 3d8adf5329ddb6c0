//! wodrank harvest: builds a population CSV from the public leaderboard.
//!
//! Leaderboard pages are scanned for athlete profile links, each profile is
//! fetched and reduced to identity fields, Open rank and benchmark results,
//! and every athlete is appended to a CSV the ranking engine can load.
//!
//! Page markup is outside our control, so extraction never fails a record;
//! fields that cannot be found are written as `N/A` or left blank.

pub mod circuit_breaker;
pub mod error;
pub mod extract;
pub mod harvest;
pub mod source;
pub mod writer;

pub use circuit_breaker::CircuitBreaker;
pub use error::HarvestError;
pub use extract::{AthleteRecord, BENCHMARKS};
pub use harvest::{harvest, HarvestConfig, HarvestProgress, HarvestSummary, LogProgress};
pub use source::{HttpProfileSource, ProfileSource};
pub use writer::CsvAppender;
