use std::sync::Arc;

use chrono::{DateTime, Utc};
use nimbus_api::{
    ApiError, DailyForecast, HourlyForecast, Location, NowBlock, Observations, WeatherDataSource,
};

use crate::error::ErrorKind;
use crate::forecast::{CurrentConditions, DailyOutlook, Forecast, HourlySlot};

/// Spacing the short-term outlook is normalized to.
const SLOT_SPACING_MINUTES: i64 = 3 * 60;

/// Fetches the three forecast parts and assembles them into one bundle.
pub struct ForecastFetcher {
    source: Arc<dyn WeatherDataSource>,
}

impl ForecastFetcher {
    pub fn new(source: Arc<dyn WeatherDataSource>) -> Self {
        Self { source }
    }

    /// Fetch and assemble the full forecast for a location.
    ///
    /// The three requests run concurrently; any failure fails the whole
    /// fetch, but sibling requests run to completion first (never leaked).
    pub async fn fetch(&self, location: &Location) -> Result<Forecast, ErrorKind> {
        let hash = location.hash.as_str();
        let (observations, daily, hourly) = tokio::join!(
            self.source.observations(hash),
            self.source.daily_forecasts(hash),
            self.source.hourly_forecasts(hash),
        );

        let observations = observations.map_err(|e| part_failed(hash, "observations", e))?;
        let daily = daily.map_err(|e| part_failed(hash, "daily", e))?;
        let hourly = hourly.map_err(|e| part_failed(hash, "hourly", e))?;

        assemble(location.clone(), observations, daily, hourly, Utc::now())
    }
}

fn part_failed(hash: &str, part: &str, error: ApiError) -> ErrorKind {
    tracing::warn!(hash, part, %error, "Forecast part failed");
    ErrorKind::from(error)
}

/// Assemble the three responses into a [`Forecast`].
///
/// The first daily entry must carry the embedded now block; without it
/// there is no way to derive today's figures.
fn assemble(
    location: Location,
    observations: Observations,
    daily: Vec<DailyForecast>,
    hourly: Vec<HourlyForecast>,
    now: DateTime<Utc>,
) -> Result<Forecast, ErrorKind> {
    let mut days = daily.into_iter();
    let Some(first) = days.next() else {
        tracing::warn!("Daily forecast list is empty");
        return Err(ErrorKind::Data);
    };
    let Some(now_block) = first.now.as_ref() else {
        tracing::warn!(date = %first.date, "First daily entry lacks the now block");
        return Err(ErrorKind::Data);
    };

    let high = first.temperature_max;
    let low = derive_low(&first, now_block);

    let today = outlook_from(&first);
    let daily: Vec<DailyOutlook> = days.map(|day| outlook_from(&day)).collect();
    let hourly = thin_to_slots(hourly);

    let current = CurrentConditions {
        symbol: observations.symbol,
        is_night: observations.is_night,
        temperature: observations.temperature,
        feels_like: observations.feels_like,
        humidity: observations.humidity,
        wind_speed: observations.wind_speed,
    };

    Ok(Forecast {
        updated_at: now,
        location,
        current,
        high,
        low,
        today,
        daily,
        hourly,
    })
}

/// Today's low: the explicit minimum when present, otherwise derived from
/// the now block. At night the current temperature is the low; during the
/// day the low arrives with the coming night.
fn derive_low(first: &DailyForecast, now_block: &NowBlock) -> f64 {
    if let Some(min) = first.temperature_min {
        return min;
    }
    if now_block.daypart == "night" {
        now_block.temperature
    } else {
        now_block.later_temperature
    }
}

fn outlook_from(day: &DailyForecast) -> DailyOutlook {
    DailyOutlook {
        date: day.date,
        symbol: day.symbol.clone(),
        high: day.temperature_max,
        low: day.temperature_min,
        precipitation_probability: day.precipitation_probability,
        precipitation_sum: day.precipitation_sum,
    }
}

/// Normalize the short-term list to 3-hour spacing.
///
/// Feeds that already use 3-hour steps pass through unchanged; finer
/// feeds keep only entries on the 3-hour grid anchored at the first entry.
fn thin_to_slots(entries: Vec<HourlyForecast>) -> Vec<HourlySlot> {
    let Some(base) = entries.first().map(|e| e.time) else {
        return Vec::new();
    };

    entries
        .into_iter()
        .filter(|entry| {
            let offset = entry.time.signed_duration_since(base);
            offset.num_minutes() % SLOT_SPACING_MINUTES == 0
        })
        .map(|entry| HourlySlot {
            time: entry.time,
            symbol: entry.symbol,
            temperature: entry.temperature,
            precipitation_probability: entry.precipitation_probability,
        })
        .collect()
}
