//! Strict percentile rank with direction adjustment.
//!
//! `rank = 100 * |{v : v < score}| / n`. Population values equal to the
//! score never count toward the rank. Time-scored workouts report
//! `100 - rank` so that a fast time lands high.

use crate::data::CleanedScoreSet;
use crate::registry::ScoringType;
use crate::report::ReportError;

/// Reject scores that cannot be a workout result: non-finite or `<= 0`.
pub fn validate_score(score: f64) -> Result<f64, ReportError> {
    if !score.is_finite() {
        return Err(ReportError::InvalidScore {
            reason: format!("{score} is not a finite number"),
        });
    }
    if score <= 0.0 {
        return Err(ReportError::InvalidScore {
            reason: format!("{score} must be greater than zero"),
        });
    }
    Ok(score)
}

/// Percentage of `values` strictly below `score`. Zero for an empty slice.
pub fn strict_rank(values: &[f64], score: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let below = values.iter().filter(|&&v| v < score).count();
    100.0 * below as f64 / values.len() as f64
}

/// Direction-aware percentile of `user_score` within the population.
///
/// Fails with `InvalidScore` before `NoData`: a bad score is rejected even
/// when the population is empty.
pub fn compute_percentile(
    scores: &CleanedScoreSet,
    scoring_type: ScoringType,
    user_score: f64,
) -> Result<f64, ReportError> {
    let user_score = validate_score(user_score)?;
    if scores.is_empty() {
        return Err(ReportError::NoData {
            workout: scores.workout_id().to_string(),
        });
    }

    let rank = strict_rank(scores.values(), user_score);
    Ok(if scoring_type.is_lower_better() {
        100.0 - rank
    } else {
        rank
    })
}

/// Presentation rounding: nearest integer, ties to even.
pub fn round_percentile(percentile: f64) -> u32 {
    percentile.round_ties_even().clamp(0.0, 100.0) as u32
}
