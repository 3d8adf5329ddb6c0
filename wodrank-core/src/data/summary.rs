//! Dataset overview: shape, fill rates, and descriptive statistics for
//! numeric columns.

use serde::Serialize;

use super::dataset::RawDataset;

/// Rows kept in [`DatasetSummary::head`].
pub const HEAD_ROWS: usize = 5;

/// count / mean / std / min / quartiles / max of a numeric column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericStats {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n - 1). NaN for a single value.
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

impl NumericStats {
    /// `None` for an empty slice.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let n = sorted.len();
        let mean = sorted.iter().sum::<f64>() / n as f64;
        let std = if n > 1 {
            let var = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
            var.sqrt()
        } else {
            f64::NAN
        };

        Some(Self {
            count: n,
            mean,
            std,
            min: sorted[0],
            q25: quantile(&sorted, 0.25),
            median: quantile(&sorted, 0.50),
            q75: quantile(&sorted, 0.75),
            max: sorted[n - 1],
        })
    }
}

/// Linear-interpolated quantile of ascending, non-empty data.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let w = pos - lo as f64;
        sorted[lo] * (1.0 - w) + sorted[hi] * w
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub name: String,
    pub non_empty: usize,
    /// Present when every non-empty cell parses as a finite number.
    pub numeric: Option<NumericStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub rows: usize,
    pub columns: Vec<ColumnSummary>,
    pub head: Vec<Vec<String>>,
}

impl DatasetSummary {
    pub fn from_dataset(dataset: &RawDataset) -> Self {
        let columns = dataset
            .headers()
            .iter()
            .enumerate()
            .map(|(idx, name)| summarize_column(dataset, idx, name))
            .collect();

        let head = dataset
            .rows()
            .take(HEAD_ROWS)
            .map(|row| row.iter().map(String::from).collect())
            .collect();

        Self {
            rows: dataset.row_count(),
            columns,
            head,
        }
    }

    pub fn numeric_columns(&self) -> impl Iterator<Item = (&str, &NumericStats)> {
        self.columns
            .iter()
            .filter_map(|c| c.numeric.as_ref().map(|s| (c.name.as_str(), s)))
    }
}

fn summarize_column(dataset: &RawDataset, idx: usize, name: &str) -> ColumnSummary {
    let cells: Vec<&str> = dataset
        .rows()
        .filter_map(|row| row.get(idx))
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .collect();

    let parsed: Option<Vec<f64>> = cells
        .iter()
        .map(|c| c.parse::<f64>().ok().filter(|v| v.is_finite()))
        .collect();

    ColumnSummary {
        name: name.to_string(),
        non_empty: cells.len(),
        numeric: parsed.and_then(|values| NumericStats::from_values(&values)),
    }
}
