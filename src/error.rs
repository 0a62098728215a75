use std::collections::BTreeMap;

use itertools::Itertools;
use serde::Serialize;
use thiserror::Error;

use crate::model::entity::Id;

/// Field-keyed validation messages, rendered as the `errors` object of a reply.
#[derive(Debug, Clone, Default, PartialEq, Error, Serialize)]
#[error("{}", full_messages(.0))]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> ValidationErrors {
        ValidationErrors(BTreeMap::new())
    }

    pub fn single(field: &str, message: impl Into<String>) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

fn full_messages(errors: &BTreeMap<String, Vec<String>>) -> String {
    errors
        .iter()
        .flat_map(|(field, messages)| messages.iter().map(move |m| format!("{field} {m}")))
        .join(", ")
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SelectionError {
    #[error("Not enough kombuchas with distinct tea bases: needed {needed}, found {available}")]
    InsufficientCandidates { needed: usize, available: usize },
    #[error("No kombucha named '{0}' can be pinned into the flight")]
    RecipeNotFound(String),
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Id },
    #[error("Validation failed: {0}")]
    Invalid(ValidationErrors),
    #[error("A flight with the same kombucha list already exists")]
    DuplicateFlightList,
    #[error("Store lock poisoned")]
    Poisoned,
}

impl From<ValidationErrors> for StoreError {
    fn from(errors: ValidationErrors) -> Self {
        StoreError::Invalid(errors)
    }
}
