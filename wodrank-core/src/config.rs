//! Engine configuration loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file at all) yields the
//! built-in registry over `crossfit_data.csv`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::data::CleaningOptions;
use crate::registry::{RegistryError, WorkoutDefinition, WorkoutRegistry};

pub const DEFAULT_DATASET: &str = "crossfit_data.csv";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningSection {
    pub parse_clock_times: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub dataset: PathBuf,
    pub gender_column: String,
    pub male_label: String,
    pub female_label: String,
    pub cleaning: CleaningSection,
    /// Added to the built-in registry, replacing entries with the same id.
    pub workouts: Vec<WorkoutDefinition>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let opts = CleaningOptions::default();
        Self {
            dataset: PathBuf::from(DEFAULT_DATASET),
            gender_column: opts.gender_column,
            male_label: opts.male_label,
            female_label: opts.female_label,
            cleaning: CleaningSection::default(),
            workouts: Vec::new(),
        }
    }
}

impl EngineConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn with_dataset(mut self, dataset: impl Into<PathBuf>) -> Self {
        self.dataset = dataset.into();
        self
    }

    /// Built-in registry with this config's workout overrides applied.
    pub fn registry(&self) -> Result<WorkoutRegistry, ConfigError> {
        Ok(WorkoutRegistry::builtin().with_overrides(self.workouts.iter().cloned())?)
    }

    pub fn cleaning_options(&self) -> CleaningOptions {
        CleaningOptions {
            parse_clock_times: self.cleaning.parse_clock_times,
            gender_column: self.gender_column.clone(),
            male_label: self.male_label.clone(),
            female_label: self.female_label.clone(),
        }
    }
}
