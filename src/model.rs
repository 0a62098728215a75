pub mod entity {
    use std::{fmt, str::FromStr};

    use serde::{Deserialize, Serialize};
    use thiserror::Error;

    pub type Id = u32;
    pub type Score = f64;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum Fizziness {
        High,
        Medium,
        Low,
    }

    #[derive(Debug, Clone, Error, PartialEq)]
    #[error("'{0}' is not a fizziness level")]
    pub struct UnknownFizziness(pub String);

    impl FromStr for Fizziness {
        type Err = UnknownFizziness;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            match s {
                "high" => Ok(Fizziness::High),
                "medium" => Ok(Fizziness::Medium),
                "low" => Ok(Fizziness::Low),
                other => Err(UnknownFizziness(other.to_string())),
            }
        }
    }

    impl fmt::Display for Fizziness {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            let level = match self {
                Fizziness::High => "high",
                Fizziness::Medium => "medium",
                Fizziness::Low => "low",
            };
            f.write_str(level)
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    pub struct Ingredient {
        pub id: Id,
        pub name: String,
        /// Marks the tea base of a recipe.
        pub base: bool,
        pub vegan: bool,
        pub caffeine_free: bool,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub struct Kombucha {
        pub id: Id,
        pub name: String,
        pub fizziness: Fizziness,
        pub ingredients: Vec<Id>,
    }

    #[derive(Debug, Clone, PartialEq, Serialize)]
    pub struct Rating {
        pub id: Id,
        pub score: Score,
        pub user_id: Id,
        pub kombucha_id: Id,
    }

    /// A kombucha reduced to what flight selection looks at.
    ///
    /// `base_group` is the id of the single tea-base ingredient. Kombuchas with
    /// no base, or with more than one, carry `None` and are never selected.
    #[derive(Debug, Clone, PartialEq)]
    pub struct Candidate {
        pub id: Id,
        pub name: String,
        pub base_group: Option<Id>,
    }

    impl Candidate {
        pub fn new(id: Id, name: impl Into<String>, base_group: Option<Id>) -> Candidate {
            Candidate { id, name: name.into(), base_group }
        }
    }
}


pub mod flight {
    use itertools::Itertools;
    use serde::{Deserialize, Serialize};

    use super::entity::Id;
    use crate::error::ValidationErrors;

    pub const FLIGHT_SIZE: usize = 4;

    /// Four pairwise distinct kombucha ids, in tasting order.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(try_from = "Vec<Id>")]
    pub struct FlightList([Id; FLIGHT_SIZE]);

    impl FlightList {
        pub fn ids(&self) -> &[Id; FLIGHT_SIZE] {
            &self.0
        }

        pub fn contains(&self, id: Id) -> bool {
            self.0.contains(&id)
        }
    }

    impl TryFrom<Vec<Id>> for FlightList {
        type Error = ValidationErrors;

        fn try_from(ids: Vec<Id>) -> Result<Self, Self::Error> {
            let mut errors = ValidationErrors::new();
            if ids.len() != FLIGHT_SIZE {
                errors.add("list", format!("Kombucha Flight list size is not equal to {FLIGHT_SIZE}"));
            }
            if !ids.iter().all_unique() {
                errors.add("list", "Kombucha Flight List ids are not unique");
            }
            errors.into_result()?;
            let list = ids
                .try_into()
                .map_err(|_| ValidationErrors::single("list", "Kombucha Flight list is malformed"))?;
            Ok(FlightList(list))
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize)]
    pub struct Flight {
        pub id: Id,
        pub name: String,
        pub list: FlightList,
    }

    impl Flight {
        /// Names follow the repository sequence: `flight_<id>`.
        pub fn new(id: Id, list: FlightList) -> Flight {
            Flight { id, name: format!("flight_{id}"), list }
        }
    }
}

pub mod criteria {
    use super::entity::{Fizziness, Score};

    /// Optional predicates narrowing the kombucha pool. Every field is independent.
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct FilterCriteria {
        pub fizziness: Option<Fizziness>,
        pub vegan: Option<bool>,
        pub caffeine_free: Option<bool>,
        pub ingredient_name: Option<String>,
        pub excluded_ingredient_name: Option<String>,
        /// Average rating must be strictly greater than this.
        pub min_rating: Option<Score>,
        /// Name of a kombucha that must appear in a generated flight.
        pub recipe_name: Option<String>,
    }

    impl FilterCriteria {
        pub fn pinned(recipe_name: impl Into<String>) -> FilterCriteria {
            FilterCriteria { recipe_name: Some(recipe_name.into()), ..Default::default() }
        }
    }
}
