//! Append-only CSV output, one row per harvested athlete.
//!
//! The file is reopened per record so a run interrupted at any point leaves
//! every completed athlete on disk.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use crate::error::HarvestError;
use crate::extract::{benchmark_key, AthleteRecord, BENCHMARKS};

/// Fixed column order: identity, Open rank, then one column per benchmark.
pub fn header(open_year: i32) -> Vec<String> {
    let mut cols: Vec<String> = ["profile_url", "name", "country", "gender"]
        .into_iter()
        .map(String::from)
        .collect();
    cols.push(format!("open_{open_year}_rank_worldwide"));
    cols.extend(BENCHMARKS.iter().map(|b| benchmark_key(b)));
    cols
}

#[derive(Debug, Clone)]
pub struct CsvAppender {
    path: PathBuf,
    header: Vec<String>,
}

impl CsvAppender {
    pub fn new(path: impl Into<PathBuf>, open_year: i32) -> Self {
        Self {
            path: path.into(),
            header: header(open_year),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one athlete. The header is written only when the file is new
    /// or empty.
    pub fn append(&self, record: &AthleteRecord) -> Result<(), HarvestError> {
        let io_err = |source| HarvestError::Io {
            path: self.path.clone(),
            source,
        };
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(io_err)?;
        let is_empty = file.metadata().map_err(io_err)?.len() == 0;

        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if is_empty {
            wtr.write_record(&self.header)?;
        }

        let mut row = vec![
            record.profile_url.as_str(),
            record.name.as_str(),
            record.country.as_str(),
            record.gender.as_str(),
            record.open_rank.as_str(),
        ];
        row.extend(
            (0..BENCHMARKS.len()).map(|i| record.benchmarks.get(i).map_or("", String::as_str)),
        );
        wtr.write_record(&row)?;
        wtr.flush().map_err(io_err)?;
        Ok(())
    }
}
