//! Memoizing score store.
//!
//! One slot per `(workout id, gender filter)`, created up front from the
//! registry. Each slot is filled at most once, so concurrent first requests
//! for the same key observe the same cleaned set. After that every read is
//! lock-free.

use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tracing::info;

use crate::data::{load_cleaned, CleanedScoreSet, CleaningOptions, GenderFilter, RawDataset};
use crate::registry::{WorkoutDefinition, WorkoutRegistry};

type SlotKey = (String, GenderFilter);

#[derive(Debug)]
pub struct ScoreStore {
    registry: WorkoutRegistry,
    dataset: Option<Arc<RawDataset>>,
    options: CleaningOptions,
    slots: HashMap<SlotKey, OnceLock<Arc<CleanedScoreSet>>>,
}

impl ScoreStore {
    /// `dataset == None` is the "no data" state: every lookup yields an empty set.
    pub fn new(registry: WorkoutRegistry, dataset: Option<RawDataset>, options: CleaningOptions) -> Self {
        let slots = registry
            .iter()
            .flat_map(|w| GenderFilter::ALL.map(|g| ((w.id.clone(), g), OnceLock::new())))
            .collect();

        Self {
            registry,
            dataset: dataset.map(Arc::new),
            options,
            slots,
        }
    }

    pub fn registry(&self) -> &WorkoutRegistry {
        &self.registry
    }

    pub fn has_dataset(&self) -> bool {
        self.dataset.is_some()
    }

    /// Cleaned set for a registered workout. `None` for unknown ids.
    pub fn cleaned(&self, workout_id: &str, filter: GenderFilter) -> Option<Arc<CleanedScoreSet>> {
        let def = self.registry.get(workout_id)?;
        Some(self.cleaned_for(def, filter))
    }

    fn cleaned_for(&self, def: &WorkoutDefinition, filter: GenderFilter) -> Arc<CleanedScoreSet> {
        match self.slots.get(&(def.id.clone(), filter)) {
            Some(slot) => Arc::clone(slot.get_or_init(|| Arc::new(self.build(def, filter)))),
            None => Arc::new(self.build(def, filter)),
        }
    }

    fn build(&self, def: &WorkoutDefinition, filter: GenderFilter) -> CleanedScoreSet {
        load_cleaned(def, self.dataset.as_deref(), filter, &self.options)
    }

    /// Fill every slot now, in parallel.
    pub fn warm_all(&self) {
        self.slots.par_iter().for_each(|((id, filter), slot)| {
            if let Some(def) = self.registry.get(id) {
                slot.get_or_init(|| Arc::new(self.build(def, *filter)));
            }
        });
        info!(
            slots = self.slots.len(),
            populated = self.populated(),
            "score store warmed"
        );
    }

    /// Number of slots computed so far.
    pub fn populated(&self) -> usize {
        self.slots.values().filter(|s| s.get().is_some()).count()
    }
}
