use itertools::Itertools;
use rand::prelude::SliceRandom;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use tracing::debug;

use crate::error::SelectionError;
use crate::model::criteria::FilterCriteria;
use crate::model::entity::Candidate;
use crate::model::flight::{FlightList, FLIGHT_SIZE};

/// Draws tasting flights: four kombuchas, each on a different tea base.
///
/// The selector owns its random source and nothing else, so one instance per
/// request keeps selections independent. Seed it for reproducible draws.
pub struct FlightSelector {
    rng: SmallRng,
}

impl FlightSelector {
    pub fn new(rng: SmallRng) -> FlightSelector {
        FlightSelector { rng }
    }

    pub fn seeded(seed: u64) -> FlightSelector {
        FlightSelector::new(SmallRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> FlightSelector {
        FlightSelector::new(SmallRng::from_entropy())
    }

    /// `candidates` must already be narrowed by every filter in `criteria`;
    /// only the recipe pin is applied here. A pinned kombucha always comes last.
    pub fn select(
        &mut self,
        candidates: &[Candidate],
        criteria: &FilterCriteria,
    ) -> Result<FlightList, SelectionError> {
        let mut pool = candidates
            .iter()
            .filter(|c| c.base_group.is_some())
            .unique_by(|c| c.id)
            .collect_vec();
        pool.shuffle(&mut self.rng);

        let pinned = match criteria.recipe_name.as_deref() {
            Some(name) => {
                // several kombuchas may share a name; any of them will do
                let found = pool
                    .iter()
                    .rev()
                    .find(|c| c.name == name)
                    .copied()
                    .ok_or_else(|| SelectionError::RecipeNotFound(name.to_string()))?;
                Some(found)
            }
            None => None,
        };

        let distinct = pool
            .into_iter()
            .filter(|c| pinned.map_or(true, |p| c.base_group != p.base_group))
            .unique_by(|c| c.base_group)
            .collect_vec();

        let needed = FLIGHT_SIZE - usize::from(pinned.is_some());
        let available = distinct.len();
        if available < needed {
            return Err(SelectionError::InsufficientCandidates { needed, available });
        }

        let ids = distinct
            .into_iter()
            .take(needed)
            .chain(pinned)
            .map(|c| c.id)
            .collect_vec();
        debug!(?ids, pinned = pinned.is_some(), "Drew flight from {available} tea bases");

        FlightList::try_from(ids)
            .map_err(|_| SelectionError::InsufficientCandidates { needed, available })
    }
}
