//! Per-workout cleaning: column resolution, population filter, numeric
//! coercion and range validation.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::dataset::RawDataset;
use crate::registry::{ScoringType, WorkoutDefinition};

/// Sub-population selector, applied to rows before cleaning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenderFilter {
    Men,
    Women,
    #[default]
    Everyone,
}

impl GenderFilter {
    pub const ALL: [GenderFilter; 3] = [Self::Men, Self::Women, Self::Everyone];

    /// Lenient request parsing: anything other than `men`/`women` means everyone.
    pub fn from_query(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "men" => Self::Men,
            "women" => Self::Women,
            _ => Self::Everyone,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Men => "men",
            Self::Women => "women",
            Self::Everyone => "everyone",
        }
    }
}

/// Knobs for turning raw cells into validated scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleaningOptions {
    /// Convert `m:ss` / `h:mm:ss` cells to seconds for time-scored workouts.
    pub parse_clock_times: bool,
    pub gender_column: String,
    pub male_label: String,
    pub female_label: String,
}

impl Default for CleaningOptions {
    fn default() -> Self {
        Self {
            parse_clock_times: false,
            gender_column: "gender".into(),
            male_label: "Male".into(),
            female_label: "Female".into(),
        }
    }
}

impl CleaningOptions {
    fn gender_label(&self, filter: GenderFilter) -> Option<&str> {
        match filter {
            GenderFilter::Men => Some(self.male_label.as_str()),
            GenderFilter::Women => Some(self.female_label.as_str()),
            GenderFilter::Everyone => None,
        }
    }
}

/// Validated, range-filtered population scores for one workout.
///
/// Every value is finite and inside the workout's valid range. The set is
/// never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanedScoreSet {
    workout_id: String,
    values: Vec<f64>,
}

impl CleanedScoreSet {
    /// Keep only finite values inside the definition's range.
    pub fn from_values(def: &WorkoutDefinition, values: impl IntoIterator<Item = f64>) -> Self {
        let range = def.valid_range;
        Self {
            workout_id: def.id.clone(),
            values: values
                .into_iter()
                .filter(|v| v.is_finite() && range.contains(*v))
                .collect(),
        }
    }

    pub fn empty(workout_id: impl Into<String>) -> Self {
        Self {
            workout_id: workout_id.into(),
            values: Vec::new(),
        }
    }

    pub fn workout_id(&self) -> &str {
        &self.workout_id
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Derive the cleaned score set for a workout.
///
/// Never fails: a missing dataset, a missing workout column, or a missing
/// gender column under a gendered filter all produce an empty set.
pub fn load_cleaned(
    def: &WorkoutDefinition,
    dataset: Option<&RawDataset>,
    filter: GenderFilter,
    opts: &CleaningOptions,
) -> CleanedScoreSet {
    let Some(dataset) = dataset else {
        return CleanedScoreSet::empty(&def.id);
    };

    let Some((column_name, column)) = resolve_column(def, dataset) else {
        debug!(workout = %def.id, "no matching column in dataset");
        return CleanedScoreSet::empty(&def.id);
    };

    let gender = match opts.gender_label(filter) {
        None => None,
        Some(label) => match dataset.column_index(&opts.gender_column) {
            Some(idx) => Some((idx, label)),
            None => {
                warn!(
                    column = %opts.gender_column,
                    filter = filter.as_str(),
                    "gender column missing; filtered population is empty"
                );
                return CleanedScoreSet::empty(&def.id);
            }
        },
    };

    let raw = dataset
        .rows()
        .filter(|row| match gender {
            None => true,
            Some((idx, label)) => row.get(idx).map(str::trim) == Some(label),
        })
        .filter_map(|row| row.get(column))
        .filter_map(|cell| coerce_cell(cell, def.scoring_type, opts));

    let set = CleanedScoreSet::from_values(def, raw);
    debug!(
        workout = %def.id,
        column = column_name,
        filter = filter.as_str(),
        kept = set.len(),
        "cleaned score set built"
    );
    set
}

/// The workout's column: exact id match first, then aliases in order.
fn resolve_column<'a>(def: &'a WorkoutDefinition, dataset: &RawDataset) -> Option<(&'a str, usize)> {
    def.column_candidates()
        .find_map(|name| dataset.column_index(name).map(|idx| (name, idx)))
}

/// Coerce a raw cell to a finite number, or drop it.
pub fn coerce_cell(cell: &str, scoring_type: ScoringType, opts: &CleaningOptions) -> Option<f64> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }
    if let Ok(v) = cell.parse::<f64>() {
        return v.is_finite().then_some(v);
    }
    if opts.parse_clock_times && scoring_type == ScoringType::Time {
        return parse_clock(cell);
    }
    None
}

/// Parse `m:ss`, `m:ss.f` or `h:mm:ss` into seconds.
///
/// Leading fields are whole numbers; every field after the first must be
/// below 60.
pub fn parse_clock(text: &str) -> Option<f64> {
    let parts: Vec<&str> = text.trim().split(':').collect();
    if !(2..=3).contains(&parts.len()) {
        return None;
    }

    let (last, leading) = parts.split_last()?;
    let seconds: f64 = last.parse().ok()?;
    let signed = last.starts_with(|c: char| c == '+' || c == '-');
    if signed || !(0.0..60.0).contains(&seconds) {
        return None;
    }

    let mut total = 0.0;
    for (i, field) in leading.iter().enumerate() {
        if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let n: u64 = field.parse().ok()?;
        if i > 0 && n >= 60 {
            return None;
        }
        total = total * 60.0 + n as f64;
    }
    Some(total * 60.0 + seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::WorkoutRegistry;

    fn dataset() -> RawDataset {
        RawDataset::from_rows(
            ["name", "gender", "fran", "backsquat"],
            [
                ["a", "Male", "180", "300"],
                ["b", "Female", "240", "200"],
                ["c", "Male", "not a time", "99999"],
                ["d", "Female", "", "225 lb"],
                ["e", "Male", "90", "  315 "],
                ["f", "Male", "600", "nan"],
                ["g", " Female ", "inf", "250"],
            ],
        )
    }

    fn fran() -> WorkoutDefinition {
        WorkoutRegistry::builtin().get("fran").unwrap().clone()
    }

    #[test]
    fn drops_non_numeric_and_out_of_range() {
        let set = load_cleaned(&fran(), Some(&dataset()), GenderFilter::Everyone, &CleaningOptions::default());
        // 90 is below min, "inf" is non-finite, 600 sits on the inclusive max.
        assert_eq!(set.values(), &[180.0, 240.0, 600.0]);
        assert_eq!(set.workout_id(), "fran");
    }

    #[test]
    fn gender_filter_selects_rows_first() {
        let opts = CleaningOptions::default();
        let ds = dataset();
        let men = load_cleaned(&fran(), Some(&ds), GenderFilter::Men, &opts);
        let women = load_cleaned(&fran(), Some(&ds), GenderFilter::Women, &opts);
        assert_eq!(men.values(), &[180.0, 600.0]);
        assert_eq!(women.values(), &[240.0]);
    }

    #[test]
    fn alias_column_used_when_id_missing() {
        let backsq = WorkoutRegistry::builtin().get("backsq").unwrap().clone();
        let set = load_cleaned(&backsq, Some(&dataset()), GenderFilter::Everyone, &CleaningOptions::default());
        // "225 lb" and "nan" are dropped, 99999 is out of range.
        assert_eq!(set.values(), &[300.0, 200.0, 315.0, 250.0]);
    }

    #[test]
    fn id_column_wins_over_alias() {
        let ds = RawDataset::from_rows(["backsquat", "backsq"], [["300", "400"]]);
        let backsq = WorkoutRegistry::builtin().get("backsq").unwrap().clone();
        let set = load_cleaned(&backsq, Some(&ds), GenderFilter::Everyone, &CleaningOptions::default());
        assert_eq!(set.values(), &[400.0]);
    }

    #[test]
    fn missing_column_or_dataset_is_empty() {
        let helen = WorkoutRegistry::builtin().get("helen").unwrap().clone();
        let opts = CleaningOptions::default();
        assert!(load_cleaned(&helen, Some(&dataset()), GenderFilter::Everyone, &opts).is_empty());
        assert!(load_cleaned(&fran(), None, GenderFilter::Everyone, &opts).is_empty());
    }

    #[test]
    fn missing_gender_column_empties_gendered_filters_only() {
        let ds = RawDataset::from_rows(["fran"], [["200"], ["300"]]);
        let opts = CleaningOptions::default();
        assert!(load_cleaned(&fran(), Some(&ds), GenderFilter::Men, &opts).is_empty());
        assert_eq!(load_cleaned(&fran(), Some(&ds), GenderFilter::Everyone, &opts).len(), 2);
    }

    #[test]
    fn clock_times_only_when_enabled() {
        let ds = RawDataset::from_rows(["fran"], [["3:10"], ["2:05.5"], ["250"]]);
        let off = load_cleaned(&fran(), Some(&ds), GenderFilter::Everyone, &CleaningOptions::default());
        assert_eq!(off.values(), &[250.0]);

        let opts = CleaningOptions {
            parse_clock_times: true,
            ..CleaningOptions::default()
        };
        let on = load_cleaned(&fran(), Some(&ds), GenderFilter::Everyone, &opts);
        assert_eq!(on.values(), &[190.0, 125.5, 250.0]);
    }

    #[test]
    fn clock_parsing_rules() {
        assert_eq!(parse_clock("2:05"), Some(125.0));
        assert_eq!(parse_clock("1:02:03"), Some(3723.0));
        assert_eq!(parse_clock("0:59.9"), Some(59.9));
        assert_eq!(parse_clock("2:60"), None);
        assert_eq!(parse_clock("1:60:00"), None);
        assert_eq!(parse_clock("-1:05"), None);
        assert_eq!(parse_clock("2:-5"), None);
        assert_eq!(parse_clock("205"), None);
        assert_eq!(parse_clock("1:2:3:4"), None);
        assert_eq!(parse_clock(":30"), None);
    }

    #[test]
    fn clock_times_ignored_for_weight() {
        let opts = CleaningOptions {
            parse_clock_times: true,
            ..CleaningOptions::default()
        };
        assert_eq!(coerce_cell("3:10", ScoringType::Weight, &opts), None);
        assert_eq!(coerce_cell(" 1e2 ", ScoringType::Weight, &opts), Some(100.0));
    }

    #[test]
    fn gender_filter_parsing_is_lenient() {
        assert_eq!(GenderFilter::from_query("men"), GenderFilter::Men);
        assert_eq!(GenderFilter::from_query("Women"), GenderFilter::Women);
        assert_eq!(GenderFilter::from_query("everyone"), GenderFilter::Everyone);
        assert_eq!(GenderFilter::from_query("robots"), GenderFilter::Everyone);
    }
}
