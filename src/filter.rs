use itertools::Itertools;

use crate::model::criteria::FilterCriteria;
use crate::model::entity::{Candidate, Fizziness, Id, Ingredient, Kombucha, Score};

/// A kombucha joined with its ingredients and current average rating.
#[derive(Debug, Clone)]
pub struct Recipe<'a> {
    pub kombucha: &'a Kombucha,
    pub ingredients: Vec<&'a Ingredient>,
    pub average: Option<Score>,
}

impl<'a> Recipe<'a> {
    pub fn is_vegan(&self) -> bool {
        !self.ingredients.is_empty() && self.ingredients.iter().all(|i| i.vegan)
    }

    pub fn is_caffeine_free(&self) -> bool {
        !self.ingredients.is_empty() && self.ingredients.iter().all(|i| i.caffeine_free)
    }

    pub fn has_ingredient(&self, name: &str) -> bool {
        self.ingredients.iter().any(|i| i.name == name)
    }

    /// The tea base, when exactly one ingredient is marked as base.
    pub fn base_group(&self) -> Option<Id> {
        self.ingredients
            .iter()
            .filter(|i| i.base)
            .exactly_one()
            .ok()
            .map(|i| i.id)
    }

    pub fn candidate(&self) -> Candidate {
        Candidate::new(self.kombucha.id, self.kombucha.name.clone(), self.base_group())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter<'a> {
    Fizziness(Fizziness),
    Vegan(bool),
    CaffeineFree(bool),
    Includes(&'a str),
    Excludes(&'a str),
    RatedAbove(Score),
}

impl<'a> Filter<'a> {
    pub fn matches(&self, recipe: &Recipe) -> bool {
        match self {
            Filter::Fizziness(level) => recipe.kombucha.fizziness == *level,
            Filter::Vegan(vegan) => recipe.is_vegan() == *vegan,
            Filter::CaffeineFree(caffeine_free) => recipe.is_caffeine_free() == *caffeine_free,
            Filter::Includes(name) => recipe.has_ingredient(name),
            Filter::Excludes(name) => !recipe.has_ingredient(name),
            // unrated kombuchas never clear a threshold
            Filter::RatedAbove(threshold) => recipe.average.is_some_and(|avg| avg > *threshold),
        }
    }
}

/// Every predicate the criteria switch on. The recipe pin is not a filter.
pub fn filters(criteria: &FilterCriteria) -> Vec<Filter<'_>> {
    let FilterCriteria {
        fizziness,
        vegan,
        caffeine_free,
        ingredient_name,
        excluded_ingredient_name,
        min_rating,
        recipe_name: _,
    } = criteria;

    fizziness.map(Filter::Fizziness).into_iter()
        .chain(vegan.map(Filter::Vegan))
        .chain(caffeine_free.map(Filter::CaffeineFree))
        .chain(ingredient_name.as_deref().map(Filter::Includes))
        .chain(excluded_ingredient_name.as_deref().map(Filter::Excludes))
        .chain(min_rating.map(Filter::RatedAbove))
        .collect()
}

pub fn matches_all(filters: &[Filter], recipe: &Recipe) -> bool {
    filters.iter().all(|filter| filter.matches(recipe))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ingredient(id: Id, name: &str, base: bool, vegan: bool, caffeine_free: bool) -> Ingredient {
        Ingredient { id, name: name.to_string(), base, vegan, caffeine_free }
    }

    fn kombucha(id: Id, fizziness: Fizziness) -> Kombucha {
        Kombucha { id, name: format!("sample kombucha {id}"), fizziness, ingredients: vec![] }
    }

    #[test]
    fn criteria_map_to_one_filter_per_set_field() {
        let criteria = FilterCriteria {
            fizziness: Some(Fizziness::High),
            min_rating: Some(3.0),
            recipe_name: Some("Orange Pop".to_string()),
            ..Default::default()
        };
        assert_eq!(filters(&criteria), vec![Filter::Fizziness(Fizziness::High), Filter::RatedAbove(3.0)]);
        assert!(filters(&FilterCriteria::default()).is_empty());
    }

    #[test]
    fn dietary_flags_require_every_ingredient() {
        let green = ingredient(1, "green tea", true, true, false);
        let ginger = ingredient(2, "ginger", false, true, true);
        let honey = ingredient(3, "honey", false, false, true);
        let k = kombucha(1, Fizziness::Low);

        let vegan = Recipe { kombucha: &k, ingredients: vec![&green, &ginger], average: None };
        assert!(Filter::Vegan(true).matches(&vegan));
        assert!(Filter::CaffeineFree(false).matches(&vegan));

        let with_honey = Recipe { kombucha: &k, ingredients: vec![&green, &honey], average: None };
        assert!(Filter::Vegan(false).matches(&with_honey));

        let empty = Recipe { kombucha: &k, ingredients: vec![], average: None };
        assert!(!Filter::Vegan(true).matches(&empty));
    }

    #[test]
    fn ingredient_inclusion_and_exclusion() {
        let green = ingredient(1, "green tea", true, true, false);
        let mint = ingredient(2, "mint", false, true, true);
        let k = kombucha(1, Fizziness::Medium);
        let recipe = Recipe { kombucha: &k, ingredients: vec![&green, &mint], average: None };

        assert!(Filter::Includes("mint").matches(&recipe));
        assert!(!Filter::Includes("basil").matches(&recipe));
        assert!(Filter::Excludes("basil").matches(&recipe));
        assert!(!Filter::Excludes("mint").matches(&recipe));
    }

    #[test]
    fn rating_threshold_is_strict() {
        let k = kombucha(1, Fizziness::High);
        let rated = |average| Recipe { kombucha: &k, ingredients: vec![], average };

        assert!(Filter::RatedAbove(3.0).matches(&rated(Some(3.5))));
        assert!(!Filter::RatedAbove(3.5).matches(&rated(Some(3.5))));
        assert!(!Filter::RatedAbove(0.0).matches(&rated(None)));
    }

    #[test]
    fn base_group_needs_exactly_one_base() {
        let black = ingredient(1, "black tea", true, true, false);
        let green = ingredient(2, "green tea", true, true, false);
        let lemon = ingredient(3, "lemon", false, true, true);
        let k = kombucha(5, Fizziness::Low);

        let single = Recipe { kombucha: &k, ingredients: vec![&black, &lemon], average: None };
        assert_eq!(single.candidate(), Candidate::new(5, "sample kombucha 5", Some(1)));

        let double = Recipe { kombucha: &k, ingredients: vec![&black, &green], average: None };
        assert_eq!(double.base_group(), None);

        let none = Recipe { kombucha: &k, ingredients: vec![&lemon], average: None };
        assert_eq!(none.base_group(), None);
    }
}
