//! Runtime configuration read from the environment.

use std::env;
use std::str::FromStr;

use log::warn;

pub const DEFAULT_CALORIES_PER_MINUTE: u32 = 8;
pub const DEFAULT_REST_EXTENSION_SECS: u32 = 15;

pub const DEFAULT_EXERCISE_API_BASE_URL: &str = "https://exercisedb.p.rapidapi.com";
pub const DEFAULT_EXERCISE_API_HOST: &str = "exercisedb.p.rapidapi.com";
pub const DEFAULT_EXERCISE_FETCH_LIMIT: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub calories_per_minute: u32,
    /// Seconds added by a single "extend rest" action in the front ends.
    pub rest_extension_secs: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            calories_per_minute: DEFAULT_CALORIES_PER_MINUTE,
            rest_extension_secs: DEFAULT_REST_EXTENSION_SECS,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            calories_per_minute: env_parse("FITKAGE_CALORIES_PER_MINUTE")
                .unwrap_or(defaults.calories_per_minute),
            rest_extension_secs: env_parse("FITKAGE_REST_EXTENSION_SECS")
                .unwrap_or(defaults.rest_extension_secs),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExerciseApiConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub api_host: String,
    pub fetch_limit: u32,
}

impl Default for ExerciseApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_EXERCISE_API_BASE_URL.to_string(),
            api_key: None,
            api_host: DEFAULT_EXERCISE_API_HOST.to_string(),
            fetch_limit: DEFAULT_EXERCISE_FETCH_LIMIT,
        }
    }
}

impl ExerciseApiConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: env::var("EXERCISE_API_BASE_URL").unwrap_or(defaults.base_url),
            api_key: env::var("EXERCISE_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            api_host: env::var("EXERCISE_API_HOST").unwrap_or(defaults.api_host),
            fetch_limit: env_parse("EXERCISE_API_FETCH_LIMIT").unwrap_or(defaults.fetch_limit),
        }
    }
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    let raw = env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring invalid value for {}: {:?}", name, raw);
            None
        }
    }
}
