//! HTTP client for the nimbus weather data service.
//!
//! Exposes the [`WeatherDataSource`] trait consumed by the engine and the
//! [`MeteoClient`] implementation backed by the live API.

pub mod client;
pub mod error;
pub mod source;
pub mod types;

pub use client::MeteoClient;
pub use error::ApiError;
pub use source::WeatherDataSource;
pub use types::*;
