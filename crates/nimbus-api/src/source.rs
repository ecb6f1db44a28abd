use async_trait::async_trait;

use crate::error::ApiError;
use crate::types::{DailyForecast, HourlyForecast, Location, Observations, SearchResult};

/// Interface to the weather data service.
///
/// Implemented by [`MeteoClient`](crate::MeteoClient) for the live service;
/// tests substitute in-memory fakes.
#[async_trait]
pub trait WeatherDataSource: Send + Sync {
    /// Search locations matching a free-text query (typically "lat,lon").
    async fn search_locations(&self, query: &str) -> Result<Vec<SearchResult>, ApiError>;

    /// Fetch the full location record for a search result id.
    async fn location(&self, id: &str) -> Result<Location, ApiError>;

    /// Current observations, addressed by location hash.
    async fn observations(&self, hash: &str) -> Result<Observations, ApiError>;

    /// Daily forecasts, addressed by location hash.
    async fn daily_forecasts(&self, hash: &str) -> Result<Vec<DailyForecast>, ApiError>;

    /// Hourly forecasts, addressed by location hash.
    async fn hourly_forecasts(&self, hash: &str) -> Result<Vec<HourlyForecast>, ApiError>;
}
