use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A match returned by the location search endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Identifier accepted by the location detail endpoint
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub region: Option<String>,
}

/// Full location record
///
/// Forecast endpoints address a location by its short geocode key
/// (`hash`), not its id. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    /// Short geocode key used by the forecast endpoints
    pub hash: String,
    pub name: String,
    /// Canton code, e.g. "BE"
    pub region: String,
    pub latitude: f64,
    pub longitude: f64,
    /// IANA timezone, e.g. "Europe/Zurich"
    pub timezone: String,
}

/// Current measured conditions at a location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observations {
    /// Icon descriptor, e.g. "partly_cloudy"
    pub symbol: String,
    pub is_night: bool,
    pub temperature: f64,
    pub feels_like: f64,
    /// Relative humidity in percent
    pub humidity: u8,
    /// Wind speed in km/h
    pub wind_speed: f64,
}

/// "Right now" block embedded in the first daily forecast entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NowBlock {
    /// Daypart label, "day" or "night"
    pub daypart: String,
    pub temperature: f64,
    /// Temperature expected later in the current daypart cycle
    pub later_temperature: f64,
}

/// One day of forecast data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub symbol: String,
    pub temperature_max: f64,
    /// Absent on the first entry for partially elapsed days
    #[serde(default)]
    pub temperature_min: Option<f64>,
    /// Precipitation probability in percent
    pub precipitation_probability: u8,
    /// Expected precipitation in mm
    pub precipitation_sum: f64,
    /// Present only on the first entry
    #[serde(default)]
    pub now: Option<NowBlock>,
}

/// One short-interval forecast slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyForecast {
    pub time: DateTime<Utc>,
    pub symbol: String,
    pub temperature: f64,
    /// Precipitation probability in percent
    pub precipitation_probability: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_deserialization() {
        let json = r#"{
            "id": "2661552",
            "hash": "u0m4",
            "name": "Bern",
            "region": "BE",
            "latitude": 46.948,
            "longitude": 7.4474,
            "timezone": "Europe/Zurich"
        }"#;
        let location: Location = serde_json::from_str(json).unwrap();
        assert_eq!(location.hash, "u0m4");
        assert_eq!(location.region, "BE");
    }

    #[test]
    fn test_daily_forecast_without_now_block() {
        let json = r#"{
            "date": "2026-08-08",
            "symbol": "rain",
            "temperature_max": 21.0,
            "temperature_min": 14.5,
            "precipitation_probability": 80,
            "precipitation_sum": 6.2
        }"#;
        let daily: DailyForecast = serde_json::from_str(json).unwrap();
        assert!(daily.now.is_none());
        assert_eq!(daily.temperature_min, Some(14.5));
    }

    #[test]
    fn test_daily_forecast_with_now_block() {
        let json = r#"{
            "date": "2026-08-07",
            "symbol": "sun",
            "temperature_max": 27.0,
            "precipitation_probability": 5,
            "precipitation_sum": 0.0,
            "now": {
                "daypart": "day",
                "temperature": 24.0,
                "later_temperature": 16.0
            }
        }"#;
        let daily: DailyForecast = serde_json::from_str(json).unwrap();
        let now = daily.now.unwrap();
        assert_eq!(now.daypart, "day");
        assert!(daily.temperature_min.is_none());
    }

    #[test]
    fn test_search_result_region_is_optional() {
        let json = r#"{"id": "2661552", "name": "Bern"}"#;
        let result: SearchResult = serde_json::from_str(json).unwrap();
        assert!(result.region.is_none());
    }
}
