//! JSON seed data for a store.
//!
//! ```json
//! {
//!   "ingredients": [{ "name": "black tea", "base": true, "vegan": true }],
//!   "kombuchas": [{ "name": "Orange Pop", "fizziness_level": "low", "ingredients": ["black tea"] }],
//!   "ratings": [{ "user_id": 1, "kombucha": "Orange Pop", "score": 4.5 }],
//!   "flights": [["Orange Pop", "Ginger Fizz", "Mint Cloud", "Hibiscus Sun"]]
//! }
//! ```
//!
//! Kombuchas refer to ingredients by name; ratings and flights refer to
//! kombuchas by name. When a kombucha name repeats, later entries win.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::error::StoreError;
use crate::model::entity::{Fizziness, Id, Score};
use crate::model::flight::FlightList;
use crate::store::{NewIngredient, NewKombucha, NewRating, TastingStore};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Kombucha '{kombucha}' uses unknown ingredient '{ingredient}'")]
    UnknownIngredient { kombucha: String, ingredient: String },
    #[error("Unknown kombucha '{0}'")]
    UnknownKombucha(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Deserialize)]
pub struct IngredientEntry {
    pub name: String,
    #[serde(default)]
    pub base: bool,
    #[serde(default)]
    pub vegan: bool,
    #[serde(default)]
    pub caffeine_free: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KombuchaEntry {
    pub name: String,
    pub fizziness_level: Fizziness,
    #[serde(default)]
    pub ingredients: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RatingEntry {
    pub user_id: Id,
    pub kombucha: String,
    pub score: Score,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub ingredients: Vec<IngredientEntry>,
    #[serde(default)]
    pub kombuchas: Vec<KombuchaEntry>,
    #[serde(default)]
    pub ratings: Vec<RatingEntry>,
    #[serde(default)]
    pub flights: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogSummary {
    pub ingredients: usize,
    pub kombuchas: usize,
    pub ratings: usize,
    pub flights: usize,
}

impl Catalog {
    pub fn from_path(path: &Path) -> Result<Catalog, CatalogError> {
        let raw = fs::read_to_string(path).map_err(|source| CatalogError::Io { path: path.to_path_buf(), source })?;
        Catalog::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Catalog, CatalogError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Writes every entry into `store`, stopping at the first rejected one.
    pub fn seed<S: TastingStore>(&self, store: &S) -> Result<CatalogSummary, CatalogError> {
        let mut ingredient_ids = HashMap::new();
        for entry in &self.ingredients {
            let ingredient = store.add_ingredient(NewIngredient {
                name: entry.name.clone(),
                base: entry.base,
                vegan: entry.vegan,
                caffeine_free: entry.caffeine_free,
            })?;
            ingredient_ids.insert(ingredient.name, ingredient.id);
        }

        let mut kombucha_ids = HashMap::new();
        for entry in &self.kombuchas {
            let ingredients = entry
                .ingredients
                .iter()
                .map(|name| {
                    ingredient_ids.get(name).copied().ok_or_else(|| CatalogError::UnknownIngredient {
                        kombucha: entry.name.clone(),
                        ingredient: name.clone(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            let kombucha = store.create_kombucha(NewKombucha {
                name: entry.name.clone(),
                fizziness: entry.fizziness_level,
                ingredients,
            })?;
            kombucha_ids.insert(kombucha.name, kombucha.id);
        }

        let kombucha_id = |name: &String| {
            kombucha_ids.get(name).copied().ok_or_else(|| CatalogError::UnknownKombucha(name.clone()))
        };

        for entry in &self.ratings {
            store.create_rating(NewRating {
                score: entry.score,
                user_id: entry.user_id,
                kombucha_id: kombucha_id(&entry.kombucha)?,
            })?;
        }

        for names in &self.flights {
            let ids = names.iter().map(|name| kombucha_id(name)).collect::<Result<Vec<_>, _>>()?;
            let list = FlightList::try_from(ids).map_err(StoreError::from)?;
            store.save_flight(list)?;
        }

        let summary = CatalogSummary {
            ingredients: self.ingredients.len(),
            kombuchas: self.kombuchas.len(),
            ratings: self.ratings.len(),
            flights: self.flights.len(),
        };
        info!(?summary, "Seeded store from catalog");
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::model::criteria::FilterCriteria;
    use crate::store::{FlightRepository, KombuchaStore, RatingAggregator};

    const CATALOG: &str = r#"{
        "ingredients": [
            { "name": "black tea", "base": true, "vegan": true },
            { "name": "green tea", "base": true, "vegan": true },
            { "name": "ginger", "vegan": true, "caffeine_free": true }
        ],
        "kombuchas": [
            { "name": "Ginger Black", "fizziness_level": "high", "ingredients": ["black tea", "ginger"] },
            { "name": "Plain Green", "fizziness_level": "low", "ingredients": ["green tea"] }
        ],
        "ratings": [
            { "user_id": 1, "kombucha": "Ginger Black", "score": 4.0 },
            { "user_id": 2, "kombucha": "Ginger Black", "score": 3.0 }
        ]
    }"#;

    #[test]
    fn seeds_every_section() {
        let store = MemoryStore::new();
        let summary = Catalog::from_json(CATALOG).unwrap().seed(&store).unwrap();
        assert_eq!(summary, CatalogSummary { ingredients: 3, kombuchas: 2, ratings: 2, flights: 0 });

        let kombuchas = store.kombuchas(&FilterCriteria::default()).unwrap();
        assert_eq!(kombuchas.len(), 2);
        assert_eq!(store.average_rating(kombuchas[0].id).unwrap(), Some(3.5));
        assert!(store.flights().unwrap().is_empty());
    }

    #[test]
    fn unknown_references_are_errors() {
        let store = MemoryStore::new();
        let bad_ingredient = r#"{ "kombuchas": [{ "name": "A", "fizziness_level": "low", "ingredients": ["salt"] }] }"#;
        assert!(matches!(
            Catalog::from_json(bad_ingredient).unwrap().seed(&store),
            Err(CatalogError::UnknownIngredient { .. })
        ));

        let bad_rating = r#"{ "ratings": [{ "user_id": 1, "kombucha": "Ghost", "score": 3 }] }"#;
        assert!(matches!(
            Catalog::from_json(bad_rating).unwrap().seed(&MemoryStore::new()),
            Err(CatalogError::UnknownKombucha(name)) if name == "Ghost"
        ));
    }

    #[test]
    fn invalid_fizziness_fails_to_parse() {
        let raw = r#"{ "kombuchas": [{ "name": "A", "fizziness_level": "fake" }] }"#;
        assert!(matches!(Catalog::from_json(raw), Err(CatalogError::Parse(_))));
    }

    #[test]
    fn preexisting_flights_are_validated() {
        let raw = r#"{
            "kombuchas": [
                { "name": "A", "fizziness_level": "low" },
                { "name": "B", "fizziness_level": "low" }
            ],
            "flights": [["A", "B", "A", "B"]]
        }"#;
        assert!(matches!(
            Catalog::from_json(raw).unwrap().seed(&MemoryStore::new()),
            Err(CatalogError::Store(StoreError::Invalid(_)))
        ));
    }
}
