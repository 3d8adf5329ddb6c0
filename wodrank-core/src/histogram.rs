//! Fixed-width population histogram over a workout's valid range.
//!
//! Ten bins, eleven linearly spaced edges. Bin `i` is `[edge[i], edge[i+1])`
//! and the last bin also includes `max`. Bins are always ascending; the
//! percentile direction flip never reorders them.

use serde::Serialize;

use crate::data::CleanedScoreSet;
use crate::format::format_value;
use crate::registry::{ScoringType, ValidRange};

pub const HISTOGRAM_BINS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    /// `HISTOGRAM_BINS + 1` ascending boundaries.
    pub edges: Vec<f64>,
    /// `"<lower> - <upper>"` per bin.
    pub labels: Vec<String>,
    pub counts: Vec<u64>,
}

impl Histogram {
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

/// `edge[i] = min + i * (max - min) / 10`, last edge pinned to `max`.
pub fn bin_edges(range: ValidRange) -> Vec<f64> {
    let step = range.width() / HISTOGRAM_BINS as f64;
    let mut edges: Vec<f64> = (0..=HISTOGRAM_BINS)
        .map(|i| range.min + i as f64 * step)
        .collect();
    edges[HISTOGRAM_BINS] = range.max;
    edges
}

/// Bin for `value`, or `None` when it falls outside `[first, last]`.
pub fn bin_index(edges: &[f64], value: f64) -> Option<usize> {
    let (&first, &last) = (edges.first()?, edges.last()?);
    let bins = edges.len().checked_sub(1).filter(|&n| n > 0)?;
    if !(value >= first && value <= last) {
        return None;
    }
    if value == last {
        return Some(bins - 1);
    }
    let upper = edges.partition_point(|&e| e <= value);
    Some((upper - 1).min(bins - 1))
}

/// Count the population into ten bins and label them in display units.
pub fn build_histogram(
    scores: &CleanedScoreSet,
    range: ValidRange,
    scoring_type: ScoringType,
) -> Histogram {
    let edges = bin_edges(range);

    let mut counts = vec![0u64; HISTOGRAM_BINS];
    for &v in scores.values() {
        if let Some(i) = bin_index(&edges, v) {
            counts[i] += 1;
        }
    }

    let labels = edges
        .windows(2)
        .map(|w| {
            format!(
                "{} - {}",
                format_value(w[0], scoring_type),
                format_value(w[1], scoring_type)
            )
        })
        .collect();

    Histogram {
        edges,
        labels,
        counts,
    }
}
