//! Exercise lookup over the local cache, refreshed from a remote source.

mod api;

pub use api::{ExerciseApiClient, ExerciseSource};

use std::sync::Arc;

use anyhow::Result;
use log::{debug, error, info, warn};

use crate::db::ExerciseCatalog;
use crate::models::Exercise;

/// Entries returned for an empty search.
pub const BROWSE_LIMIT: u32 = 20;
pub const SEARCH_LIMIT: u32 = 50;

/// Terms an exercise may mention to count as training `body_part`.
pub fn body_part_terms(body_part: &str) -> Vec<String> {
    let key = body_part.trim().to_lowercase();
    let terms: &[&str] = match key.as_str() {
        "chest" => &["chest", "pectorals", "upper chest", "lower chest", "pecs"],
        "arms" => &["biceps", "triceps", "forearms", "arm", "bicep", "tricep"],
        "shoulders" => &["shoulders", "delts", "deltoid", "shoulder"],
        "back" => &[
            "back",
            "lats",
            "rhomboids",
            "traps",
            "upper back",
            "lower back",
            "latissimus",
            "trapezius",
        ],
        "legs" => &[
            "quads",
            "hamstrings",
            "glutes",
            "calves",
            "thighs",
            "quadriceps",
            "hamstring",
            "calf",
        ],
        "thighs" => &["quads", "hamstrings", "thighs", "quadriceps", "hamstring"],
        "calves" => &["calves", "calf"],
        "glutes" => &["glutes", "glute"],
        "abs" => &["abs", "abdominals", "core", "abdominal", "abdomen"],
        "obliques" => &["obliques", "oblique"],
        "cardio" => &["cardio", "cardiovascular"],
        "hiit" => &["hiit", "high intensity interval training"],
        "full body" => &["full body", "full-body", "full body workout"],
        "yoga" => &["yoga"],
        "pilates" => &["pilates"],
        "stretching" => &["stretching", "stretch", "flexibility"],
        "balance" => &["balance", "balancing"],
        "neck" => &["neck", "traps", "trapezius"],
        "endurance" => &["endurance", "stamina"],
        _ => return vec![key],
    };
    terms.iter().map(|t| t.to_string()).collect()
}

/// Case-insensitive substring match of any term against body part, target or
/// name.
pub fn matches_body_part(exercise: &Exercise, terms: &[String]) -> bool {
    let fields = [
        exercise.body_part.to_lowercase(),
        exercise.target.as_deref().unwrap_or_default().to_lowercase(),
        exercise.name.to_lowercase(),
    ];
    terms
        .iter()
        .filter(|term| !term.is_empty())
        .any(|term| fields.iter().any(|field| field.contains(term.as_str())))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Number of exercises written to the cache.
    Updated(usize),
    /// The source answered with an empty list; the cache was left alone.
    NoResults,
    /// The source failed or none is configured.
    Unavailable(String),
}

pub struct ExerciseCatalogService {
    catalog: Arc<dyn ExerciseCatalog>,
    source: Option<Arc<dyn ExerciseSource>>,
}

impl ExerciseCatalogService {
    pub fn new(catalog: Arc<dyn ExerciseCatalog>, source: Option<Arc<dyn ExerciseSource>>) -> Self {
        Self { catalog, source }
    }

    /// Pulls the remote list into the cache. Never fails; cached entries are
    /// kept on any problem.
    pub async fn refresh(&self) -> RefreshOutcome {
        let Some(source) = &self.source else {
            warn!("No exercise source configured, keeping cached exercises");
            return RefreshOutcome::Unavailable("no exercise source configured".to_string());
        };

        let exercises = match source.fetch_exercises().await {
            Ok(exercises) => exercises,
            Err(e) => {
                error!("Exercise refresh failed: {:#}", e);
                return RefreshOutcome::Unavailable(e.to_string());
            }
        };
        if exercises.is_empty() {
            warn!("Exercise source returned no exercises, keeping cached items");
            return RefreshOutcome::NoResults;
        }

        match self.catalog.upsert_exercises(&exercises).await {
            Ok(count) => {
                info!("Cached {} exercises", count);
                RefreshOutcome::Updated(count)
            }
            Err(e) => {
                error!("Failed to cache exercises: {:#}", e);
                RefreshOutcome::Unavailable(e.to_string())
            }
        }
    }

    /// Empty query browses the first entries; otherwise substring search.
    pub async fn search(&self, query: &str) -> Result<Vec<Exercise>> {
        let query = query.trim();
        if query.is_empty() {
            return self.catalog.first_exercises(BROWSE_LIMIT).await;
        }
        self.catalog.search_exercises(query, SEARCH_LIMIT).await
    }

    pub async fn by_body_part(&self, body_part: &str) -> Result<Vec<Exercise>> {
        let terms = body_part_terms(body_part);
        let exercises = self.catalog.all_exercises().await?;
        let matched: Vec<Exercise> = exercises
            .into_iter()
            .filter(|exercise| matches_body_part(exercise, &terms))
            .collect();
        debug!(
            "{} exercises match body part '{}' via {:?}",
            matched.len(),
            body_part,
            terms
        );
        Ok(matched)
    }

    pub async fn body_parts(&self) -> Result<Vec<String>> {
        self.catalog.body_parts().await
    }

    pub async fn exercise(&self, exercise_id: &str) -> Result<Option<Exercise>> {
        self.catalog.exercise(exercise_id).await
    }

    pub async fn exercise_count(&self) -> Result<u64> {
        self.catalog.exercise_count().await
    }
}
