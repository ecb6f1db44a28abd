use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::ApiError;
use crate::source::WeatherDataSource;
use crate::types::{DailyForecast, HourlyForecast, Location, Observations, SearchResult};

/// Weather service API client
#[derive(Debug, Clone)]
pub struct MeteoClient {
    base_url: Url,
    client: Arc<Client>,
}

impl MeteoClient {
    /// Create a new client for the given API base URL.
    pub fn new(base_url: &str, user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .context("Failed to create HTTP client")?;

        // Url::join treats a base without a trailing slash as a file path
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let base_url = Url::parse(&normalized).context("Invalid API base URL")?;

        Ok(Self {
            base_url,
            client: Arc::new(client),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path)
            .map_err(|e| ApiError::Decode(format!("invalid endpoint url '{}': {}", path, e)))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
            });
        }

        response.json::<T>().await.map_err(ApiError::from_body_error)
    }
}

#[async_trait]
impl WeatherDataSource for MeteoClient {
    async fn search_locations(&self, query: &str) -> Result<Vec<SearchResult>, ApiError> {
        tracing::debug!(query, "Searching locations");

        let mut url = self.endpoint("search")?;
        url.query_pairs_mut().append_pair("query", query);

        let results: Vec<SearchResult> = self.get_json(url).await?;
        tracing::info!("Location search returned {} results", results.len());
        Ok(results)
    }

    async fn location(&self, id: &str) -> Result<Location, ApiError> {
        tracing::debug!(id, "Fetching location record");

        let url = self.endpoint(&format!("locations/{}", id))?;
        let location: Location = self.get_json(url).await?;

        tracing::info!("Resolved location {} ({})", location.name, location.hash);
        Ok(location)
    }

    async fn observations(&self, hash: &str) -> Result<Observations, ApiError> {
        tracing::debug!(hash, "Fetching observations");

        let url = self.endpoint(&format!("observations/{}", hash))?;
        self.get_json(url).await
    }

    async fn daily_forecasts(&self, hash: &str) -> Result<Vec<DailyForecast>, ApiError> {
        tracing::debug!(hash, "Fetching daily forecasts");

        let url = self.endpoint(&format!("forecasts/{}/daily", hash))?;
        self.get_json(url).await
    }

    async fn hourly_forecasts(&self, hash: &str) -> Result<Vec<HourlyForecast>, ApiError> {
        tracing::debug!(hash, "Fetching hourly forecasts");

        let url = self.endpoint(&format!("forecasts/{}/hourly", hash))?;
        self.get_json(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let client = MeteoClient::new(
            "https://api.example.ch/v1",
            "nimbus-test",
            Duration::from_secs(5),
        )
        .unwrap();
        let url = client.endpoint("search").unwrap();
        assert_eq!(url.as_str(), "https://api.example.ch/v1/search");
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let result = MeteoClient::new("not a url", "nimbus-test", Duration::from_secs(5));
        assert!(result.is_err());
    }
}
