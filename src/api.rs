//! Request handlers for kombuchas, ratings and flights.
//!
//! Each handler takes already-extracted parameters (a string map for query
//! parameters, a JSON value for bodies) and returns a [`Reply`]: a status and
//! a JSON body. Failures render as `{ "errors": { field: [messages] } }` for
//! validation problems and `{ "error": message }` otherwise.

pub use http::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{info, warn};

use crate::error::{StoreError, ValidationErrors};
use crate::model::entity::{Fizziness, Id, Kombucha, Rating, Score};
use crate::params::{criteria_from_params, Params};
use crate::service::{FlightError, FlightService};
use crate::store::{KombuchaPatch, NewKombucha, NewRating, RatingPatch, TastingStore};

#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: StatusCode,
    pub body: Value,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("param is missing or the value is empty: {0}")]
    MissingParam(&'static str),

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Invalid(ValidationErrors),

    #[error("Conflict: {0}")]
    Conflict(ValidationErrors),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingParam(_) | ApiError::MalformedPayload(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn into_reply(self) -> Reply {
        let status = self.status();
        let body = match &self {
            ApiError::Invalid(errors) | ApiError::Conflict(errors) => json!({ "errors": errors }),
            other => json!({ "error": other.to_string() }),
        };
        Reply { status, body }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            StoreError::Invalid(errors) => ApiError::Invalid(errors),
            StoreError::DuplicateFlightList => ApiError::Conflict(ValidationErrors::single("list", err.to_string())),
            StoreError::Poisoned => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<FlightError> for ApiError {
    fn from(err: FlightError) -> Self {
        match err {
            FlightError::Selection(selection) => ApiError::Invalid(ValidationErrors::single("list", selection.to_string())),
            FlightError::Store(store) => store.into(),
            FlightError::NoFlights => ApiError::NotFound(err.to_string()),
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Invalid(errors)
    }
}

#[derive(Deserialize)]
struct KombuchaParams {
    name: Option<String>,
    fizziness_level: Option<String>,
    ingredients: Option<Vec<Id>>,
}

#[derive(Deserialize)]
struct RatingParams {
    score: Option<Score>,
    user_id: Option<Id>,
    kombucha_id: Option<Id>,
}

#[derive(Serialize)]
struct KombuchaView<'a> {
    id: Id,
    name: &'a str,
    fizziness_level: Fizziness,
    ingredients: Vec<String>,
}

#[derive(Serialize)]
struct RatingView<'a> {
    #[serde(flatten)]
    rating: &'a Rating,
    avg_rating: Option<Score>,
}

/// `body[key]`, which must be present and an object.
fn require<T: DeserializeOwned>(body: &Value, key: &'static str) -> Result<T, ApiError> {
    match body.get(key) {
        Some(root @ Value::Object(_)) => {
            serde_json::from_value(root.clone()).map_err(|e| ApiError::MalformedPayload(e.to_string()))
        }
        _ => Err(ApiError::MissingParam(key)),
    }
}

fn fizziness(level: Option<String>, errors: &mut ValidationErrors) -> Option<Fizziness> {
    let level = level?;
    match level.parse() {
        Ok(fizziness) => Some(fizziness),
        Err(_) => {
            errors.add("fizziness_level", "is not included in the list");
            None
        }
    }
}

fn ok<T: Serialize>(value: &T) -> Result<Reply, ApiError> {
    let body = serde_json::to_value(value).map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Reply { status: StatusCode::OK, body })
}

pub struct Api<S> {
    store: S,
    flights: FlightService<S>,
}

impl<S> Api<S>
where
    S: TastingStore + Clone,
{
    pub fn new(store: S, flights: FlightService<S>) -> Api<S> {
        Api { store, flights }
    }

    /// Handlers with default flight settings.
    pub fn with_store(store: S) -> Api<S> {
        let flights = FlightService::new(store.clone());
        Api::new(store, flights)
    }

    fn respond(&self, action: &str, handler: impl FnOnce() -> Result<Reply, ApiError>) -> Reply {
        match handler() {
            Ok(reply) => {
                info!(action, status = reply.status.as_u16(), "Handled request");
                reply
            }
            Err(err) => {
                warn!(action, status = err.status().as_u16(), error = %err, "Request failed");
                err.into_reply()
            }
        }
    }

    fn kombucha_view(&self, kombucha: &Kombucha) -> Result<Value, ApiError> {
        let ingredients = self.store.ingredients_of(kombucha)?.into_iter().map(|i| i.name).collect();
        let view = KombuchaView {
            id: kombucha.id,
            name: &kombucha.name,
            fizziness_level: kombucha.fizziness,
            ingredients,
        };
        serde_json::to_value(view).map_err(|e| ApiError::Internal(e.to_string()))
    }

    fn rating_view(&self, rating: &Rating) -> Result<Value, ApiError> {
        let avg_rating = self.store.average_rating(rating.kombucha_id)?;
        serde_json::to_value(RatingView { rating, avg_rating }).map_err(|e| ApiError::Internal(e.to_string()))
    }

    pub fn kombuchas_index(&self, params: &Params) -> Reply {
        self.respond("kombuchas#index", || {
            let criteria = criteria_from_params(params)?;
            let views = self
                .store
                .kombuchas(&criteria)?
                .iter()
                .map(|kombucha| self.kombucha_view(kombucha))
                .collect::<Result<Vec<_>, _>>()?;
            ok(&views)
        })
    }

    pub fn kombuchas_show(&self, id: Id) -> Reply {
        self.respond("kombuchas#show", || ok(&self.kombucha_view(&self.store.kombucha(id)?)?))
    }

    pub fn kombuchas_create(&self, body: &Value) -> Reply {
        self.respond("kombuchas#create", || {
            let KombuchaParams { name, fizziness_level, ingredients } = require(body, "kombucha")?;
            let mut errors = ValidationErrors::new();
            let name = name.filter(|n| !n.trim().is_empty());
            if name.is_none() {
                errors.add("name", "can't be blank");
            }
            if fizziness_level.is_none() {
                errors.add("fizziness_level", "is not included in the list");
            }
            let fizziness = fizziness(fizziness_level, &mut errors);
            let (Some(name), Some(fizziness)) = (name, fizziness) else {
                return Err(errors.into());
            };
            let kombucha = self.store.create_kombucha(NewKombucha {
                name,
                fizziness,
                ingredients: ingredients.unwrap_or_default(),
            })?;
            ok(&self.kombucha_view(&kombucha)?)
        })
    }

    pub fn kombuchas_update(&self, id: Id, body: &Value) -> Reply {
        self.respond("kombuchas#update", || {
            let KombuchaParams { name, fizziness_level, ingredients } = require(body, "kombucha")?;
            let mut errors = ValidationErrors::new();
            let fizziness = fizziness(fizziness_level, &mut errors);
            errors.into_result()?;

            let kombucha = self.store.update_kombucha(id, KombuchaPatch { name, fizziness, ingredients })?;
            ok(&self.kombucha_view(&kombucha)?)
        })
    }

    pub fn ratings_index(&self) -> Reply {
        self.respond("ratings#index", || {
            let views = self
                .store
                .ratings()?
                .iter()
                .map(|rating| self.rating_view(rating))
                .collect::<Result<Vec<_>, _>>()?;
            ok(&views)
        })
    }

    pub fn ratings_show(&self, id: Id) -> Reply {
        self.respond("ratings#show", || ok(&self.rating_view(&self.store.rating(id)?)?))
    }

    pub fn ratings_create(&self, body: &Value) -> Reply {
        self.respond("ratings#create", || {
            let RatingParams { score, user_id, kombucha_id } = require(body, "rating")?;
            let (Some(score), Some(user_id), Some(kombucha_id)) = (score, user_id, kombucha_id) else {
                let mut errors = ValidationErrors::new();
                for (field, message, missing) in [
                    ("score", "can't be blank", score.is_none()),
                    ("user", "must exist", user_id.is_none()),
                    ("kombucha", "must exist", kombucha_id.is_none()),
                ] {
                    if missing {
                        errors.add(field, message);
                    }
                }
                return Err(errors.into());
            };
            let rating = self.store.create_rating(NewRating { score, user_id, kombucha_id })?;
            ok(&self.rating_view(&rating)?)
        })
    }

    pub fn ratings_update(&self, id: Id, body: &Value) -> Reply {
        self.respond("ratings#update", || {
            let RatingParams { score, user_id, kombucha_id } = require(body, "rating")?;
            let rating = self.store.update_rating(id, RatingPatch { score, user_id, kombucha_id })?;
            ok(&self.rating_view(&rating)?)
        })
    }

    pub fn flights_create(&self, params: &Params) -> Reply {
        self.respond("flights#create", || {
            let criteria = criteria_from_params(params)?;
            ok(&self.flights.create_flight(&criteria)?)
        })
    }

    pub fn flight_picker(&self) -> Reply {
        self.respond("flights#flight_picker", || ok(&self.flights.pick_flight()?))
    }
}
