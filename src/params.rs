//! Query-string style parameters into typed criteria.
//!
//! Blank values count as absent. Each predicate may be spelled more than one
//! way (`avg_rating` for `min_rating`, `ingredient` for `ingredient_name`, ...);
//! the first non-blank spelling wins.

use std::collections::HashMap;
use std::str::FromStr;

use crate::error::ValidationErrors;
use crate::model::criteria::FilterCriteria;
use crate::model::entity::Fizziness;

pub type Params = HashMap<String, String>;

const FIZZINESS: &[&str] = &["fizziness", "fizziness_level"];
const VEGAN: &[&str] = &["vegan"];
const CAFFEINE_FREE: &[&str] = &["caffeine_free"];
const INGREDIENT: &[&str] = &["ingredient_name", "ingredient"];
const EXCLUDED_INGREDIENT: &[&str] = &["excluded_ingredient_name", "excluded_ingredient"];
const MIN_RATING: &[&str] = &["min_rating", "avg_rating"];
const RECIPE: &[&str] = &["recipe_name"];

fn lookup<'a>(params: &'a Params, keys: &[&'static str]) -> Option<(&'static str, &'a str)> {
    keys.iter().find_map(|key| {
        params
            .get(*key)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
            .map(|value| (*key, value))
    })
}

fn text(params: &Params, keys: &[&'static str]) -> Option<String> {
    lookup(params, keys).map(|(_, value)| value.to_string())
}

fn parsed<T: FromStr>(
    params: &Params,
    keys: &[&'static str],
    message: &str,
    errors: &mut ValidationErrors,
) -> Option<T> {
    let (key, value) = lookup(params, keys)?;
    match value.parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            errors.add(key, message);
            None
        }
    }
}

/// `inf`, `NaN` and overflowing literals parse as `f64` but are not valid thresholds.
fn threshold(params: &Params, errors: &mut ValidationErrors) -> Option<f64> {
    let (key, value) = lookup(params, MIN_RATING)?;
    match value.parse::<f64>() {
        Ok(rating) if rating.is_finite() => Some(rating),
        _ => {
            errors.add(key, "is not a number");
            None
        }
    }
}

pub fn criteria_from_params(params: &Params) -> Result<FilterCriteria, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let criteria = FilterCriteria {
        fizziness: parsed::<Fizziness>(params, FIZZINESS, "is not included in the list", &mut errors),
        vegan: parsed(params, VEGAN, "must be true or false", &mut errors),
        caffeine_free: parsed(params, CAFFEINE_FREE, "must be true or false", &mut errors),
        ingredient_name: text(params, INGREDIENT),
        excluded_ingredient_name: text(params, EXCLUDED_INGREDIENT),
        min_rating: threshold(params, &mut errors),
        recipe_name: text(params, RECIPE),
    };
    errors.into_result()?;
    Ok(criteria)
}
