//! Kombucha tasting: catalog filtering, ratings, and randomized tasting flights.
//!
//! A flight is four kombuchas on four different tea bases. [`FlightSelector`]
//! draws them from a filtered candidate pool, optionally pinning one named
//! kombucha into the last slot. [`Api`] wraps the selector, the stores and
//! parameter parsing into request handlers that reply with JSON.

pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod filter;
pub mod memory;
pub mod model;
pub mod params;
pub mod selector;
pub mod service;
pub mod store;
pub mod tally;

pub use api::{Api, ApiError, Reply, StatusCode};
pub use catalog::{Catalog, CatalogError};
pub use config::{Config, ConfigError};
pub use error::{SelectionError, StoreError, ValidationErrors};
pub use memory::MemoryStore;
pub use model::criteria::FilterCriteria;
pub use model::entity::{Candidate, Fizziness, Id, Ingredient, Kombucha, Rating, Score};
pub use model::flight::{Flight, FlightList, FLIGHT_SIZE};
pub use params::Params;
pub use selector::FlightSelector;
pub use service::{FlightError, FlightService};
