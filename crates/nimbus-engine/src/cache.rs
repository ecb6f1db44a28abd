use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;
use std::time::Duration;

use crate::forecast::Forecast;

/// Default age after which a cached forecast counts as stale.
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(60);

/// Most-recently-successful forecast slot.
///
/// Single writer (the engine), many readers. No merge semantics; last
/// write wins. Cleared on fetch failure so an error is never followed by
/// silently re-presented stale data.
#[derive(Debug, Default)]
pub struct ForecastCache {
    slot: Mutex<Option<Forecast>>,
}

impl ForecastCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<Forecast> {
        self.slot.lock().clone()
    }

    pub fn set(&self, forecast: Forecast) {
        *self.slot.lock() = Some(forecast);
    }

    pub fn clear(&self) {
        *self.slot.lock() = None;
    }
}

/// Whether a refresh is warranted for the cached forecast.
///
/// An absent forecast is always stale; otherwise its age must have reached
/// `threshold`.
pub fn is_stale(forecast: Option<&Forecast>, now: DateTime<Utc>, threshold: Duration) -> bool {
    match forecast {
        None => true,
        Some(forecast) => {
            let age = now.signed_duration_since(forecast.updated_at);
            match TimeDelta::from_std(threshold) {
                Ok(threshold) => age >= threshold,
                // A threshold too large for the calendar never elapses
                Err(_) => false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{forecast_at, forecast_for, location_fixture};

    #[test]
    fn test_absent_forecast_is_stale() {
        assert!(is_stale(None, Utc::now(), DEFAULT_STALE_AFTER));
    }

    #[test]
    fn test_fresh_forecast_is_not_stale() {
        let now = Utc::now();
        let forecast = forecast_at(now - TimeDelta::seconds(30));
        assert!(!is_stale(Some(&forecast), now, DEFAULT_STALE_AFTER));
    }

    #[test]
    fn test_age_equal_to_threshold_is_stale() {
        let now = Utc::now();
        let forecast = forecast_at(now - TimeDelta::seconds(60));
        assert!(is_stale(Some(&forecast), now, DEFAULT_STALE_AFTER));
    }

    #[test]
    fn test_old_forecast_is_stale() {
        let now = Utc::now();
        let forecast = forecast_at(now - TimeDelta::minutes(10));
        assert!(is_stale(Some(&forecast), now, DEFAULT_STALE_AFTER));
    }

    #[test]
    fn test_last_write_wins() {
        let cache = ForecastCache::new();
        let first = forecast_for(location_fixture("u0m4", "Bern"));
        let second = forecast_for(location_fixture("u0qj", "Zürich"));

        cache.set(first);
        cache.set(second.clone());

        assert_eq!(cache.get(), Some(second));
    }

    #[test]
    fn test_clear_empties_slot() {
        let cache = ForecastCache::new();
        cache.set(forecast_for(location_fixture("u0m4", "Bern")));
        cache.clear();
        assert!(cache.get().is_none());
    }
}
