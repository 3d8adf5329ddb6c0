//! Ranking engine: the request-facing entry point.
//!
//! Construction loads the raw dataset once. A dataset that cannot be read is
//! logged and treated as absent; the engine still serves the registry and
//! every workout then reports `NoData`.

use serde_json::Value;
use std::path::Path;
use tracing::{error, info};

use crate::config::{ConfigError, EngineConfig};
use crate::data::{CleaningOptions, GenderFilter, RawDataset};
use crate::histogram::build_histogram;
use crate::percentile::{compute_percentile, round_percentile, validate_score};
use crate::registry::WorkoutRegistry;
use crate::report::{score_from_json, PercentileReport, ReportError, ReportResponse};
use crate::store::ScoreStore;

#[derive(Debug)]
pub struct RankingEngine {
    store: ScoreStore,
}

impl RankingEngine {
    /// Build the registry from `config` and load its dataset.
    ///
    /// Only configuration problems fail here. Dataset problems are absorbed.
    pub fn open(config: &EngineConfig) -> Result<Self, ConfigError> {
        let registry = config.registry()?;
        let dataset = load_dataset(&config.dataset);
        Ok(Self::from_parts(registry, dataset, config.cleaning_options()))
    }

    pub fn from_parts(
        registry: WorkoutRegistry,
        dataset: Option<RawDataset>,
        options: CleaningOptions,
    ) -> Self {
        Self {
            store: ScoreStore::new(registry, dataset, options),
        }
    }

    pub fn registry(&self) -> &WorkoutRegistry {
        self.store.registry()
    }

    pub fn store(&self) -> &ScoreStore {
        &self.store
    }

    /// Rank `user_score` for `workout_id` and bucket the population.
    ///
    /// Checks run in order: unknown workout, invalid score, empty population.
    pub fn get_percentile_report(
        &self,
        workout_id: &str,
        user_score: f64,
        gender: GenderFilter,
    ) -> Result<PercentileReport, ReportError> {
        let def = self
            .registry()
            .get(workout_id)
            .ok_or_else(|| ReportError::UnknownWorkout {
                id: workout_id.to_string(),
            })?;
        let user_score = validate_score(user_score)?;

        let scores = self
            .store
            .cleaned(&def.id, gender)
            .ok_or_else(|| ReportError::UnknownWorkout {
                id: workout_id.to_string(),
            })?;

        let percentile = compute_percentile(&scores, def.scoring_type, user_score).map_err(
            |e| match e {
                ReportError::NoData { .. } => ReportError::NoData {
                    workout: def.display_name.clone(),
                },
                other => other,
            },
        )?;
        let histogram = build_histogram(&scores, def.valid_range, def.scoring_type);

        Ok(PercentileReport {
            user_score,
            percentile: round_percentile(percentile),
            config: def.clone(),
            chart_labels: histogram.labels,
            chart_data: histogram.counts,
            population: scores.len(),
        })
    }

    /// JSON boundary: raw request fields in, status and body out.
    pub fn respond(
        &self,
        workout_id: &str,
        score: Option<&Value>,
        gender: Option<&str>,
    ) -> ReportResponse {
        let gender = gender.map(GenderFilter::from_query).unwrap_or_default();
        let result = if self.registry().contains(workout_id) {
            score_from_json(score)
                .and_then(|s| self.get_percentile_report(workout_id, s, gender))
        } else {
            Err(ReportError::UnknownWorkout {
                id: workout_id.to_string(),
            })
        };
        ReportResponse::from_result(&result)
    }
}

fn load_dataset(path: &Path) -> Option<RawDataset> {
    match RawDataset::from_path(path) {
        Ok(ds) => {
            info!(
                path = %path.display(),
                rows = ds.row_count(),
                columns = ds.headers().len(),
                fingerprint = %ds.fingerprint(),
                "dataset loaded"
            );
            Some(ds)
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "dataset unavailable, serving without data");
            None
        }
    }
}
