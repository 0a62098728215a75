use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use itertools::Itertools;
use tracing::debug;

use crate::error::{StoreError, ValidationErrors};
use crate::filter::{filters, matches_all, Recipe};
use crate::model::criteria::FilterCriteria;
use crate::model::entity::{Candidate, Id, Ingredient, Kombucha, Rating, Score};
use crate::model::flight::{Flight, FlightList};
use crate::store::{
    CandidateStore, FlightRepository, KombuchaPatch, KombuchaStore, NewIngredient, NewKombucha,
    NewRating, RatingAggregator, RatingPatch, RatingStore,
};
use crate::tally::RatingBoard;

const SCORE_RANGE: std::ops::RangeInclusive<Score> = 1.0..=5.0;

#[derive(Debug, Default)]
struct Sequences {
    ingredient: Id,
    kombucha: Id,
    rating: Id,
    flight: Id,
}

fn next(counter: &mut Id) -> Id {
    *counter += 1;
    *counter
}

#[derive(Debug, Default)]
struct Tables {
    ingredients: BTreeMap<Id, Ingredient>,
    kombuchas: BTreeMap<Id, Kombucha>,
    ratings: BTreeMap<Id, Rating>,
    flights: BTreeMap<Id, Flight>,
    board: RatingBoard,
    sequences: Sequences,
}

impl Tables {
    fn recipe<'a>(&'a self, kombucha: &'a Kombucha) -> Recipe<'a> {
        Recipe {
            kombucha,
            ingredients: kombucha.ingredients.iter().filter_map(|id| self.ingredients.get(id)).collect(),
            average: self.board.average(kombucha.id),
        }
    }

    fn matching<'a>(&'a self, criteria: &'a FilterCriteria) -> impl Iterator<Item = Recipe<'a>> + 'a {
        let filters = filters(criteria);
        self.kombuchas
            .values()
            .map(move |kombucha| self.recipe(kombucha))
            .filter(move |recipe| matches_all(&filters, recipe))
    }

    fn kombucha(&self, id: Id) -> Result<&Kombucha, StoreError> {
        self.kombuchas.get(&id).ok_or(StoreError::NotFound { entity: "Kombucha", id })
    }

    fn validate_kombucha(&self, kombucha: &Kombucha) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if kombucha.name.trim().is_empty() {
            errors.add("name", "can't be blank");
        }
        for id in kombucha.ingredients.iter().filter(|id| !self.ingredients.contains_key(*id)) {
            errors.add("ingredients", format!("contains unknown ingredient {id}"));
        }
        errors.into_result()
    }

    fn validate_rating(&self, rating: &Rating) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if !SCORE_RANGE.contains(&rating.score) {
            errors.add("score", "is not included in the list");
        }
        if !self.kombuchas.contains_key(&rating.kombucha_id) {
            errors.add("kombucha", "must exist");
        }
        let taken = self.ratings.values().any(|other| {
            other.id != rating.id
                && other.user_id == rating.user_id
                && other.kombucha_id == rating.kombucha_id
        });
        if taken {
            errors.add("user_id", "has already been taken");
        }
        errors.into_result()
    }
}

/// Thread-safe in-memory [`crate::store::TastingStore`]. Clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl CandidateStore for MemoryStore {
    fn candidates(&self, criteria: &FilterCriteria) -> Result<Vec<Candidate>, StoreError> {
        let tables = self.lock()?;
        let candidates = tables.matching(criteria).map(|recipe| recipe.candidate()).collect();
        Ok(candidates)
    }
}

impl FlightRepository for MemoryStore {
    fn save_flight(&self, list: FlightList) -> Result<Flight, StoreError> {
        let mut tables = self.lock()?;
        if tables.flights.values().any(|flight| flight.list == list) {
            return Err(StoreError::DuplicateFlightList);
        }
        let id = next(&mut tables.sequences.flight);
        let flight = Flight::new(id, list);
        tables.flights.insert(id, flight.clone());
        debug!(id, name = %flight.name, "Saved flight");
        Ok(flight)
    }

    fn flights(&self) -> Result<Vec<Flight>, StoreError> {
        Ok(self.lock()?.flights.values().cloned().collect())
    }
}

impl RatingAggregator for MemoryStore {
    fn average_rating(&self, kombucha_id: Id) -> Result<Option<Score>, StoreError> {
        Ok(self.lock()?.board.average(kombucha_id))
    }
}

impl KombuchaStore for MemoryStore {
    fn add_ingredient(&self, ingredient: NewIngredient) -> Result<Ingredient, StoreError> {
        let mut tables = self.lock()?;
        let mut errors = ValidationErrors::new();
        if ingredient.name.trim().is_empty() {
            errors.add("name", "can't be blank");
        }
        if tables.ingredients.values().any(|i| i.name == ingredient.name) {
            errors.add("name", "has already been taken");
        }
        errors.into_result()?;

        let NewIngredient { name, base, vegan, caffeine_free } = ingredient;
        let id = next(&mut tables.sequences.ingredient);
        let ingredient = Ingredient { id, name, base, vegan, caffeine_free };
        tables.ingredients.insert(id, ingredient.clone());
        Ok(ingredient)
    }

    fn ingredients_of(&self, kombucha: &Kombucha) -> Result<Vec<Ingredient>, StoreError> {
        let tables = self.lock()?;
        let ingredients = kombucha
            .ingredients
            .iter()
            .filter_map(|id| tables.ingredients.get(id).cloned())
            .collect();
        Ok(ingredients)
    }

    fn kombuchas(&self, criteria: &FilterCriteria) -> Result<Vec<Kombucha>, StoreError> {
        let tables = self.lock()?;
        let kombuchas = tables.matching(criteria).map(|recipe| recipe.kombucha.clone()).collect();
        Ok(kombuchas)
    }

    fn kombucha(&self, id: Id) -> Result<Kombucha, StoreError> {
        self.lock()?.kombucha(id).cloned()
    }

    fn create_kombucha(&self, kombucha: NewKombucha) -> Result<Kombucha, StoreError> {
        let mut tables = self.lock()?;
        let NewKombucha { name, fizziness, ingredients } = kombucha;
        let mut kombucha = Kombucha {
            id: 0,
            name,
            fizziness,
            ingredients: ingredients.into_iter().unique().collect(),
        };
        tables.validate_kombucha(&kombucha)?;

        kombucha.id = next(&mut tables.sequences.kombucha);
        tables.kombuchas.insert(kombucha.id, kombucha.clone());
        Ok(kombucha)
    }

    fn update_kombucha(&self, id: Id, patch: KombuchaPatch) -> Result<Kombucha, StoreError> {
        let mut tables = self.lock()?;
        let mut kombucha = tables.kombucha(id)?.clone();
        let KombuchaPatch { name, fizziness, ingredients } = patch;
        if let Some(name) = name {
            kombucha.name = name;
        }
        if let Some(fizziness) = fizziness {
            kombucha.fizziness = fizziness;
        }
        if let Some(ingredients) = ingredients {
            kombucha.ingredients = ingredients.into_iter().unique().collect();
        }
        tables.validate_kombucha(&kombucha)?;

        tables.kombuchas.insert(id, kombucha.clone());
        Ok(kombucha)
    }
}

impl RatingStore for MemoryStore {
    fn ratings(&self) -> Result<Vec<Rating>, StoreError> {
        Ok(self.lock()?.ratings.values().cloned().collect())
    }

    fn rating(&self, id: Id) -> Result<Rating, StoreError> {
        self.lock()?
            .ratings
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound { entity: "Rating", id })
    }

    fn create_rating(&self, rating: NewRating) -> Result<Rating, StoreError> {
        let mut tables = self.lock()?;
        let NewRating { score, user_id, kombucha_id } = rating;
        let mut rating = Rating { id: 0, score, user_id, kombucha_id };
        tables.validate_rating(&rating)?;

        rating.id = next(&mut tables.sequences.rating);
        tables.board.record(kombucha_id, score);
        tables.ratings.insert(rating.id, rating.clone());
        Ok(rating)
    }

    fn update_rating(&self, id: Id, patch: RatingPatch) -> Result<Rating, StoreError> {
        let mut tables = self.lock()?;
        let previous = tables
            .ratings
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound { entity: "Rating", id })?;
        let RatingPatch { score, user_id, kombucha_id } = patch;
        let rating = Rating {
            id,
            score: score.unwrap_or(previous.score),
            user_id: user_id.unwrap_or(previous.user_id),
            kombucha_id: kombucha_id.unwrap_or(previous.kombucha_id),
        };
        tables.validate_rating(&rating)?;

        tables.board.retract(previous.kombucha_id, previous.score);
        tables.board.record(rating.kombucha_id, rating.score);
        tables.ratings.insert(id, rating.clone());
        Ok(rating)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::entity::Fizziness;

    fn ingredient(store: &MemoryStore, name: &str, base: bool) -> Id {
        store
            .add_ingredient(NewIngredient { name: name.to_string(), base, vegan: true, caffeine_free: !base })
            .unwrap()
            .id
    }

    fn kombucha(store: &MemoryStore, name: &str, ingredients: Vec<Id>) -> Id {
        store
            .create_kombucha(NewKombucha { name: name.to_string(), fizziness: Fizziness::Low, ingredients })
            .unwrap()
            .id
    }

    #[test]
    fn ids_are_sequential_per_table() {
        let store = MemoryStore::new();
        let black = ingredient(&store, "black tea", true);
        let green = ingredient(&store, "green tea", true);
        assert_eq!((black, green), (1, 2));
        assert_eq!(kombucha(&store, "first", vec![black]), 1);
    }

    #[test]
    fn kombucha_validation() {
        let store = MemoryStore::new();
        let err = store
            .create_kombucha(NewKombucha { name: " ".to_string(), fizziness: Fizziness::High, ingredients: vec![99] })
            .unwrap_err();
        match err {
            StoreError::Invalid(errors) => {
                assert!(errors.get("name").is_some());
                assert!(errors.get("ingredients").is_some());
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        assert!(store.kombuchas(&FilterCriteria::default()).unwrap().is_empty());
    }

    #[test]
    fn kombucha_update_is_partial() {
        let store = MemoryStore::new();
        let id = kombucha(&store, "Orange Pop", vec![]);
        let updated = store
            .update_kombucha(id, KombuchaPatch { name: Some("new name".to_string()), ..Default::default() })
            .unwrap();
        assert_eq!(updated.name, "new name");
        assert_eq!(updated.fizziness, Fizziness::Low);
        assert!(matches!(
            store.update_kombucha(42, KombuchaPatch::default()),
            Err(StoreError::NotFound { entity: "Kombucha", id: 42 })
        ));
    }

    #[test]
    fn ratings_keep_running_average() {
        let store = MemoryStore::new();
        let id = kombucha(&store, "Orange Pop", vec![]);

        let first = store.create_rating(NewRating { score: 4.5, user_id: 1, kombucha_id: id }).unwrap();
        store.create_rating(NewRating { score: 2.5, user_id: 2, kombucha_id: id }).unwrap();
        assert_eq!(store.average_rating(id).unwrap(), Some(3.5));

        store.update_rating(first.id, RatingPatch { score: Some(1.5), ..Default::default() }).unwrap();
        assert_eq!(store.average_rating(id).unwrap(), Some(2.0));
    }

    #[test]
    fn rating_validation() {
        let store = MemoryStore::new();
        let id = kombucha(&store, "Orange Pop", vec![]);
        store.create_rating(NewRating { score: 3.0, user_id: 1, kombucha_id: id }).unwrap();

        let cases = [
            (NewRating { score: -3.5, user_id: 2, kombucha_id: id }, "score"),
            (NewRating { score: 6.0, user_id: 2, kombucha_id: id }, "score"),
            (NewRating { score: 3.0, user_id: 2, kombucha_id: 77 }, "kombucha"),
            (NewRating { score: 3.0, user_id: 1, kombucha_id: id }, "user_id"),
        ];
        for (rating, field) in cases {
            match store.create_rating(rating) {
                Err(StoreError::Invalid(errors)) => assert!(errors.get(field).is_some(), "{field}"),
                other => panic!("expected {field} error, got {other:?}"),
            }
        }
        assert_eq!(store.ratings().unwrap().len(), 1);
    }

    #[test]
    fn rejected_rating_update_leaves_average_alone() {
        let store = MemoryStore::new();
        let id = kombucha(&store, "Orange Pop", vec![]);
        let rating = store.create_rating(NewRating { score: 3.5, user_id: 1, kombucha_id: id }).unwrap();

        let result = store.update_rating(rating.id, RatingPatch { score: Some(-3.5), ..Default::default() });
        assert!(matches!(result, Err(StoreError::Invalid(_))));
        assert_eq!(store.average_rating(id).unwrap(), Some(3.5));
    }

    #[test]
    fn duplicate_flight_lists_are_rejected() {
        let store = MemoryStore::new();
        let list = FlightList::try_from(vec![1, 2, 3, 4]).unwrap();

        let flight = store.save_flight(list).unwrap();
        assert_eq!(flight.name, "flight_1");
        assert_eq!(store.save_flight(list), Err(StoreError::DuplicateFlightList));

        let other = FlightList::try_from(vec![4, 3, 2, 1]).unwrap();
        assert_eq!(store.save_flight(other).unwrap().name, "flight_2");
        assert_eq!(store.flights().unwrap().len(), 2);
    }

    #[test]
    fn candidates_carry_their_tea_base() {
        let store = MemoryStore::new();
        let black = ingredient(&store, "black tea", true);
        let lemon = ingredient(&store, "lemon", false);
        let with_base = kombucha(&store, "Lemon Black", vec![black, lemon]);
        let without = kombucha(&store, "Just Lemon", vec![lemon]);

        let candidates = store.candidates(&FilterCriteria::default()).unwrap();
        assert_eq!(
            candidates,
            vec![
                Candidate::new(with_base, "Lemon Black", Some(black)),
                Candidate::new(without, "Just Lemon", None),
            ]
        );
    }

    #[test]
    fn filters_apply_to_listing() {
        let store = MemoryStore::new();
        let black = ingredient(&store, "black tea", true);
        let mint = ingredient(&store, "mint", false);
        let minty = kombucha(&store, "Minty", vec![black, mint]);
        let plain = kombucha(&store, "Plain", vec![black]);
        store.create_rating(NewRating { score: 4.0, user_id: 1, kombucha_id: plain }).unwrap();

        let names = |criteria: FilterCriteria| {
            store.kombuchas(&criteria).unwrap().into_iter().map(|k| k.id).collect_vec()
        };
        assert_eq!(names(FilterCriteria { ingredient_name: Some("mint".into()), ..Default::default() }), vec![minty]);
        assert_eq!(names(FilterCriteria { excluded_ingredient_name: Some("mint".into()), ..Default::default() }), vec![plain]);
        assert_eq!(names(FilterCriteria { min_rating: Some(3.0), ..Default::default() }), vec![plain]);
        assert_eq!(names(FilterCriteria { fizziness: Some(Fizziness::High), ..Default::default() }), Vec::<Id>::new());
    }
}
