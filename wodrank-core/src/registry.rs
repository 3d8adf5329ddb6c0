//! Workout registry: the static catalog of benchmark definitions.
//!
//! Each definition carries the scoring direction, display unit, and the
//! inclusive range of plausible raw values. The range doubles as the
//! cleaning filter and the histogram domain.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// How a workout is scored, which decides the "better" direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringType {
    /// Elapsed seconds. Lower is better.
    Time,
    /// Repetitions completed. Higher is better.
    Reps,
    /// Load lifted. Higher is better.
    Weight,
}

impl ScoringType {
    /// Whether a lower raw value represents a better performance.
    pub fn is_lower_better(&self) -> bool {
        matches!(self, Self::Time)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Time => "time",
            Self::Reps => "reps",
            Self::Weight => "weight",
        }
    }
}

impl fmt::Display for ScoringType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive bounds on plausible raw values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidRange {
    pub min: f64,
    pub max: f64,
}

impl ValidRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// `min <= value <= max`. NaN is never contained.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }

    /// Both bounds finite and `min < max`.
    pub fn is_well_formed(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min < self.max
    }
}

/// A single workout definition.
///
/// Serializes to the flat shape the report boundary exposes as `config`:
/// `{id, name, type, unit, min, max, category}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutDefinition {
    pub id: String,
    #[serde(rename = "name")]
    pub display_name: String,
    #[serde(rename = "type")]
    pub scoring_type: ScoringType,
    pub unit: String,
    #[serde(flatten)]
    pub valid_range: ValidRange,
    pub category: String,
    /// Fallback dataset column names, tried in order when no column is named `id`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub column_aliases: Vec<String>,
}

impl WorkoutDefinition {
    /// Candidate dataset column names: the id first, then the aliases.
    pub fn column_candidates(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.id.as_str()).chain(self.column_aliases.iter().map(|a| a.as_str()))
    }

    fn validate(&self) -> Result<(), RegistryError> {
        if self.id.trim().is_empty() {
            return Err(RegistryError::EmptyId);
        }
        if !self.valid_range.is_well_formed() {
            return Err(RegistryError::InvalidRange {
                id: self.id.clone(),
                min: self.valid_range.min,
                max: self.valid_range.max,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum RegistryError {
    #[error("workout definition has an empty id")]
    EmptyId,

    #[error("duplicate workout id '{id}'")]
    DuplicateId { id: String },

    #[error("workout '{id}' has an invalid range [{min}, {max}] (min must be below max)")]
    InvalidRange { id: String, min: f64, max: f64 },
}

/// Ordered, id-indexed collection of workout definitions.
#[derive(Debug, Clone)]
pub struct WorkoutRegistry {
    workouts: Vec<WorkoutDefinition>,
    index: HashMap<String, usize>,
}

impl WorkoutRegistry {
    /// Build a registry, rejecting empty ids, duplicate ids and malformed ranges.
    pub fn new(workouts: Vec<WorkoutDefinition>) -> Result<Self, RegistryError> {
        let mut index = HashMap::with_capacity(workouts.len());
        for (i, def) in workouts.iter().enumerate() {
            def.validate()?;
            if index.insert(def.id.clone(), i).is_some() {
                return Err(RegistryError::DuplicateId { id: def.id.clone() });
            }
        }
        Ok(Self { workouts, index })
    }

    /// The built-in catalog of benchmarks, running tests and lifts.
    pub fn builtin() -> Self {
        use ScoringType::{Reps, Time, Weight};

        let workouts = vec![
            def("fran", "Fran", Time, "s", 100.0, 600.0, "Benchmarks", &[]),
            def("helen", "Helen", Time, "s", 360.0, 900.0, "Benchmarks", &[]),
            def("grace", "Grace", Time, "s", 60.0, 480.0, "Benchmarks", &[]),
            def("filthy50", "Filthy Fifty", Time, "s", 900.0, 2400.0, "Benchmarks", &[]),
            def("fgonebad", "Fight Gone Bad", Reps, "reps", 150.0, 500.0, "Benchmarks", &["fightgonebad"]),
            def("run400", "400m Run", Time, "s", 50.0, 120.0, "Running", &["sprint400m"]),
            def("run5k", "5k Run", Time, "s", 900.0, 2400.0, "Running", &[]),
            def("candj", "Clean & Jerk", Weight, "lbs", 100.0, 400.0, "Strength", &["cleanandjerk"]),
            def("snatch", "Snatch", Weight, "lbs", 80.0, 315.0, "Strength", &[]),
            def("deadlift", "Deadlift", Weight, "lbs", 150.0, 600.0, "Strength", &[]),
            def("backsq", "Back Squat", Weight, "lbs", 120.0, 550.0, "Strength", &["backsquat"]),
        ];

        let index = workouts
            .iter()
            .enumerate()
            .map(|(i, w)| (w.id.clone(), i))
            .collect();
        Self { workouts, index }
    }

    /// Add or replace definitions by id. Replacements keep their original position.
    pub fn with_overrides(
        mut self,
        overrides: impl IntoIterator<Item = WorkoutDefinition>,
    ) -> Result<Self, RegistryError> {
        for def in overrides {
            match self.index.get(&def.id) {
                Some(&i) => self.workouts[i] = def,
                None => {
                    self.index.insert(def.id.clone(), self.workouts.len());
                    self.workouts.push(def);
                }
            }
        }
        Self::new(self.workouts)
    }

    pub fn get(&self, id: &str) -> Option<&WorkoutDefinition> {
        self.index.get(id).map(|&i| &self.workouts[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Definitions in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &WorkoutDefinition> {
        self.workouts.iter()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.workouts.iter().map(|w| w.id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.workouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workouts.is_empty()
    }

    /// Definitions grouped by category, categories in order of first appearance.
    pub fn by_category(&self) -> Vec<(&str, Vec<&WorkoutDefinition>)> {
        let mut groups: Vec<(&str, Vec<&WorkoutDefinition>)> = Vec::new();
        for w in &self.workouts {
            match groups.iter_mut().find(|(cat, _)| *cat == w.category) {
                Some((_, members)) => members.push(w),
                None => groups.push((w.category.as_str(), vec![w])),
            }
        }
        groups
    }
}

impl Default for WorkoutRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[allow(clippy::too_many_arguments)]
fn def(
    id: &str,
    name: &str,
    scoring_type: ScoringType,
    unit: &str,
    min: f64,
    max: f64,
    category: &str,
    aliases: &[&str],
) -> WorkoutDefinition {
    WorkoutDefinition {
        id: id.into(),
        display_name: name.into(),
        scoring_type,
        unit: unit.into(),
        valid_range: ValidRange::new(min, max),
        category: category.into(),
        column_aliases: aliases.iter().map(|a| a.to_string()).collect(),
    }
}
