//! HTTP client for the ExerciseDB API.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;

use crate::config::ExerciseApiConfig;
use crate::models::Exercise;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Where catalog refreshes come from.
#[async_trait]
pub trait ExerciseSource: Send + Sync {
    async fn fetch_exercises(&self) -> Result<Vec<Exercise>>;
}

pub struct ExerciseApiClient {
    client: Client,
    config: ExerciseApiConfig,
}

impl ExerciseApiClient {
    pub fn new(config: ExerciseApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client, config })
    }

    fn exercises_url(&self) -> String {
        format!("{}/exercises", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ExerciseSource for ExerciseApiClient {
    async fn fetch_exercises(&self) -> Result<Vec<Exercise>> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("EXERCISE_API_KEY is not set"))?;

        let url = self.exercises_url();
        debug!("Requesting exercises from {}", url);
        let response = self
            .client
            .get(&url)
            .query(&[("limit", self.config.fetch_limit)])
            .header("X-RapidAPI-Key", api_key)
            .header("X-RapidAPI-Host", &self.config.api_host)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow::anyhow!("Exercise API returned {}", status));
        }

        let exercises = response
            .json::<Vec<Exercise>>()
            .await
            .context("Failed to decode exercise list")?;
        debug!("Exercise API returned {} exercises", exercises.len());
        Ok(exercises)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_ignores_trailing_slash() {
        let client = ExerciseApiClient::new(ExerciseApiConfig {
            base_url: "https://example.test/".into(),
            ..ExerciseApiConfig::default()
        })
        .unwrap();
        assert_eq!(client.exercises_url(), "https://example.test/exercises");
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        let client = ExerciseApiClient::new(ExerciseApiConfig::default()).unwrap();
        let err = client.fetch_exercises().await.unwrap_err();
        assert!(err.to_string().contains("EXERCISE_API_KEY"));
    }
}
