use std::sync::atomic::{AtomicU64, Ordering};

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use thiserror::Error;
use tracing::{info, warn};

use crate::error::{SelectionError, StoreError};
use crate::model::criteria::FilterCriteria;
use crate::model::flight::Flight;
use crate::selector::FlightSelector;
use crate::store::{CandidateStore, FlightRepository};

pub const DEFAULT_ATTEMPTS: usize = 3;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum FlightError {
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("No flights have been created yet")]
    NoFlights,
}

/// Creates and picks flights on top of a store.
///
/// A duplicate list at save time is treated as a conflict and redrawn, up to
/// `attempts` draws per request. With a seed set, request `n` draws from
/// `seed + n`, so runs are reproducible without repeating the same flight.
pub struct FlightService<S> {
    store: S,
    attempts: usize,
    seed: Option<u64>,
    requests: AtomicU64,
}

impl<S> FlightService<S>
where
    S: CandidateStore + FlightRepository,
{
    pub fn new(store: S) -> FlightService<S> {
        FlightService { store, attempts: DEFAULT_ATTEMPTS, seed: None, requests: AtomicU64::new(0) }
    }

    pub fn with_attempts(mut self, attempts: usize) -> FlightService<S> {
        self.attempts = attempts.max(1);
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> FlightService<S> {
        self.seed = seed;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn rng(&self) -> SmallRng {
        let request = self.requests.fetch_add(1, Ordering::Relaxed);
        match self.seed {
            Some(seed) => SmallRng::seed_from_u64(seed.wrapping_add(request)),
            None => SmallRng::from_entropy(),
        }
    }

    pub fn create_flight(&self, criteria: &FilterCriteria) -> Result<Flight, FlightError> {
        let candidates = self.store.candidates(criteria)?;
        let mut selector = FlightSelector::new(self.rng());

        for attempt in 1..=self.attempts {
            let list = selector.select(&candidates, criteria)?;
            match self.store.save_flight(list) {
                Ok(flight) => {
                    info!(id = flight.id, name = %flight.name, attempt, "Created flight");
                    return Ok(flight);
                }
                Err(StoreError::DuplicateFlightList) => {
                    warn!(attempt, ?list, "Flight list already exists, drawing again");
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(StoreError::DuplicateFlightList.into())
    }

    /// One stored flight, uniformly at random.
    pub fn pick_flight(&self) -> Result<Flight, FlightError> {
        let flights = self.store.flights()?;
        flights.choose(&mut self.rng()).cloned().ok_or(FlightError::NoFlights)
    }
}
