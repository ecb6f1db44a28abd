use chrono::{DateTime, NaiveDate, Utc};
use nimbus_api::Location;
use serde::{Deserialize, Serialize};

/// Current conditions snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
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

/// One day in the outlook
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyOutlook {
    pub date: NaiveDate,
    pub symbol: String,
    pub high: f64,
    /// Absent for partially elapsed days
    pub low: Option<f64>,
    pub precipitation_probability: u8,
    pub precipitation_sum: f64,
}

/// One 3-hour forecast slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlySlot {
    pub time: DateTime<Utc>,
    pub symbol: String,
    pub temperature: f64,
    pub precipitation_probability: u8,
}

/// Complete forecast bundle for one location.
///
/// Immutable value, replaced wholesale on every successful fetch. The
/// cache slot is the only owner; readers get clones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    /// Time of successful assembly, not of any individual response
    pub updated_at: DateTime<Utc>,
    pub location: Location,
    pub current: CurrentConditions,
    /// Today's expected maximum
    pub high: f64,
    /// Today's expected minimum (derived, see the fetcher)
    pub low: f64,
    /// Detail record for today
    pub today: DailyOutlook,
    /// Upcoming days, today excluded
    pub daily: Vec<DailyOutlook>,
    /// Short-interval slots at 3-hour spacing
    pub hourly: Vec<HourlySlot>,
}
