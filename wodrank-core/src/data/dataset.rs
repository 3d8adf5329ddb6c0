//! Raw population dataset as read from CSV.
//!
//! Cells are kept as text. Numeric coercion and range validation happen per
//! workout in [`super::clean`], so one unreadable column never poisons the
//! rest of the table.

use csv::StringRecord;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while reading the raw dataset.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to open dataset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("dataset has no header row")]
    EmptyHeader,
}

/// Header names plus string rows. Read-only after load.
#[derive(Debug, Clone)]
pub struct RawDataset {
    headers: Vec<String>,
    rows: Vec<StringRecord>,
}

impl RawDataset {
    /// Read a CSV file with a header row.
    pub fn from_path(path: &Path) -> Result<Self, DataError> {
        let file = File::open(path).map_err(|source| DataError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file)
    }

    /// Read CSV from any reader. Ragged rows are accepted.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DataError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
        if headers.iter().all(|h| h.is_empty()) {
            return Err(DataError::EmptyHeader);
        }

        let rows = rdr.records().collect::<Result<Vec<_>, _>>()?;
        Ok(Self { headers, rows })
    }

    /// Build a dataset from in-memory rows.
    pub fn from_rows<H, R, C>(headers: H, rows: R) -> Self
    where
        H: IntoIterator,
        H::Item: Into<String>,
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: AsRef<str>,
    {
        let headers = headers.into_iter().map(Into::into).collect();
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().collect::<StringRecord>())
            .collect();
        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Position of the first column with this exact name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn rows(&self) -> impl Iterator<Item = &StringRecord> {
        self.rows.iter()
    }

    /// Deterministic BLAKE3 hash over header and row contents.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for h in &self.headers {
            hasher.update(h.as_bytes());
            hasher.update(&[0x1f]);
        }
        for row in &self.rows {
            hasher.update(&[0x1e]);
            for field in row {
                hasher.update(field.as_bytes());
                hasher.update(&[0x1f]);
            }
        }
        hasher.finalize().to_hex().to_string()
    }
}
