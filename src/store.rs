//! Persistence ports.
//!
//! The flight service and the request handlers only talk to these traits.
//! [`crate::memory::MemoryStore`] is the bundled implementation.

use crate::error::StoreError;
use crate::model::criteria::FilterCriteria;
use crate::model::entity::{Candidate, Fizziness, Id, Ingredient, Kombucha, Rating, Score};
use crate::model::flight::{Flight, FlightList};

#[derive(Debug, Clone, PartialEq)]
pub struct NewIngredient {
    pub name: String,
    pub base: bool,
    pub vegan: bool,
    pub caffeine_free: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewKombucha {
    pub name: String,
    pub fizziness: Fizziness,
    pub ingredients: Vec<Id>,
}

/// Partial kombucha update; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KombuchaPatch {
    pub name: Option<String>,
    pub fizziness: Option<Fizziness>,
    pub ingredients: Option<Vec<Id>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewRating {
    pub score: Score,
    pub user_id: Id,
    pub kombucha_id: Id,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RatingPatch {
    pub score: Option<Score>,
    pub user_id: Option<Id>,
    pub kombucha_id: Option<Id>,
}

/// Supplies flight candidates narrowed by every filter except the recipe pin.
pub trait CandidateStore {
    fn candidates(&self, criteria: &FilterCriteria) -> Result<Vec<Candidate>, StoreError>;
}

/// Flights are append-only. Saving assigns the id and name and rejects a list
/// identical to one already stored with [`StoreError::DuplicateFlightList`].
pub trait FlightRepository {
    fn save_flight(&self, list: FlightList) -> Result<Flight, StoreError>;
    fn flights(&self) -> Result<Vec<Flight>, StoreError>;
}

pub trait RatingAggregator {
    fn average_rating(&self, kombucha_id: Id) -> Result<Option<Score>, StoreError>;
}

pub trait KombuchaStore {
    fn add_ingredient(&self, ingredient: NewIngredient) -> Result<Ingredient, StoreError>;
    fn ingredients_of(&self, kombucha: &Kombucha) -> Result<Vec<Ingredient>, StoreError>;
    fn kombuchas(&self, criteria: &FilterCriteria) -> Result<Vec<Kombucha>, StoreError>;
    fn kombucha(&self, id: Id) -> Result<Kombucha, StoreError>;
    fn create_kombucha(&self, kombucha: NewKombucha) -> Result<Kombucha, StoreError>;
    fn update_kombucha(&self, id: Id, patch: KombuchaPatch) -> Result<Kombucha, StoreError>;
}

pub trait RatingStore: RatingAggregator {
    fn ratings(&self) -> Result<Vec<Rating>, StoreError>;
    fn rating(&self, id: Id) -> Result<Rating, StoreError>;
    fn create_rating(&self, rating: NewRating) -> Result<Rating, StoreError>;
    fn update_rating(&self, id: Id, patch: RatingPatch) -> Result<Rating, StoreError>;
}

/// Everything the request handlers need from one backing store.
pub trait TastingStore: KombuchaStore + RatingStore + CandidateStore + FlightRepository {}

impl<T> TastingStore for T where T: KombuchaStore + RatingStore + CandidateStore + FlightRepository {}
