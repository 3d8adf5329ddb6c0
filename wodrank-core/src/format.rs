//! Display formatting for raw score values.

use crate::registry::ScoringType;

/// Render a raw value in its display unit.
///
/// Time: `m:ss`, both parts truncated (125.7 → "2:05").
/// Reps/weight: one decimal place, trailing ".0" kept (225 → "225.0").
pub fn format_value(value: f64, scoring_type: ScoringType) -> String {
    match scoring_type {
        ScoringType::Time => {
            let minutes = (value / 60.0).floor() as u64;
            let seconds = (value % 60.0).floor() as u64;
            format!("{minutes}:{seconds:02}")
        }
        ScoringType::Reps | ScoringType::Weight => format!("{value:.1}"),
    }
}

/// Formatted value followed by the unit, for human-facing output.
pub fn format_with_unit(value: f64, scoring_type: ScoringType, unit: &str) -> String {
    match scoring_type {
        ScoringType::Time => format_value(value, scoring_type),
        ScoringType::Reps | ScoringType::Weight => {
            format!("{} {unit}", format_value(value, scoring_type))
        }
    }
}
