use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use thiserror::Error;
use tracing::{info, warn};

use crate::service::DEFAULT_ATTEMPTS;

pub const CATALOG_VAR: &str = "KOMBUCHA_CATALOG";
pub const ATTEMPTS_VAR: &str = "KOMBUCHA_FLIGHT_ATTEMPTS";
pub const SEED_VAR: &str = "KOMBUCHA_SEED";

#[derive(Debug, Clone, Error, PartialEq)]
#[error("Invalid {key} value '{value}': {reason}")]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub catalog: PathBuf,
    pub flight_attempts: usize,
    pub seed: Option<u64>,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let flight_attempts: usize = try_load(&lookup, ATTEMPTS_VAR, &DEFAULT_ATTEMPTS.to_string())?;
        if flight_attempts == 0 {
            return Err(ConfigError {
                key: ATTEMPTS_VAR,
                value: flight_attempts.to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            catalog: try_load(&lookup, CATALOG_VAR, "catalog.json")?,
            flight_attempts,
            seed: try_load_optional(&lookup, SEED_VAR)?,
        })
    }
}

fn parse<T: FromStr>(key: &'static str, value: String) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    value.parse().map_err(|e: T::Err| {
        warn!("Invalid {key} value: {e}");
        ConfigError { key, value, reason: e.to_string() }
    })
}

fn try_load<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: &str,
) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let value = lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    parse(key, value)
}

fn try_load_optional<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T::Err: Display,
{
    lookup(key).map(|value| parse(key, value)).transpose()
}
