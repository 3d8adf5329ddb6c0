//! wodrank core: workout registry, dataset cleaning, percentile ranking and
//! histograms.
//!
//! - Workout registry with scoring direction and plausible value ranges
//! - Raw CSV dataset, per-workout cleaning with an optional gender pre-filter
//! - Strict percentile rank, flipped for time-scored workouts
//! - Ten-bin histogram over each workout's valid range
//! - Memoizing score store shared across concurrent requests
//! - Report boundary with HTTP-style status and JSON body

pub mod config;
pub mod data;
pub mod engine;
pub mod format;
pub mod histogram;
pub mod percentile;
pub mod registry;
pub mod report;
pub mod store;

pub use config::{ConfigError, EngineConfig};
pub use data::{CleanedScoreSet, CleaningOptions, GenderFilter, RawDataset};
pub use engine::RankingEngine;
pub use registry::{ScoringType, ValidRange, WorkoutDefinition, WorkoutRegistry};
pub use report::{PercentileReport, ReportError, ReportResponse};
