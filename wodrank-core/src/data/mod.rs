//! Population data: raw CSV ingestion, per-workout cleaning, and summaries.

pub mod clean;
pub mod dataset;
pub mod summary;

pub use clean::{coerce_cell, load_cleaned, parse_clock, CleanedScoreSet, CleaningOptions, GenderFilter};
pub use dataset::{DataError, RawDataset};
pub use summary::{ColumnSummary, DatasetSummary, NumericStats};
