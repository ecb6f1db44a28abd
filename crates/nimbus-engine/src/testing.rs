//! Test doubles for engine tests.
//!
//! Hand-written fakes: a scripted [`WeatherDataSource`], a scripted
//! device-location provider, and a counting notifier. Shared by the unit
//! tests in this crate and usable by downstream integration tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};

use nimbus_api::{
    ApiError, DailyForecast, HourlyForecast, Location, NowBlock, Observations, SearchResult,
    WeatherDataSource,
};

use crate::device::{DeviceLocation, DeviceLocationError, DeviceLocationProvider};
use crate::forecast::{CurrentConditions, DailyOutlook, Forecast};
use crate::notify::UpdateNotifier;
use crate::state::LoadingState;

/// A minimal location record for fixtures.
pub fn location_fixture(hash: &str, name: &str) -> Location {
    Location {
        id: format!("id-{}", hash),
        hash: hash.to_string(),
        name: name.to_string(),
        region: "BE".to_string(),
        latitude: 46.948,
        longitude: 7.4474,
        timezone: "Europe/Zurich".to_string(),
    }
}

/// A complete forecast for the given location, stamped now.
pub fn forecast_for(location: Location) -> Forecast {
    forecast_with(location, Utc::now(), 22.5)
}

/// A complete forecast for a default location with a chosen timestamp.
pub fn forecast_at(updated_at: DateTime<Utc>) -> Forecast {
    forecast_with(location_fixture("u0m4", "Bern"), updated_at, 22.5)
}

fn forecast_with(location: Location, updated_at: DateTime<Utc>, temperature: f64) -> Forecast {
    let today = DailyOutlook {
        date: updated_at.date_naive(),
        symbol: "sun".to_string(),
        high: temperature + 3.0,
        low: None,
        precipitation_probability: 10,
        precipitation_sum: 0.0,
    };
    Forecast {
        updated_at,
        location,
        current: CurrentConditions {
            symbol: "partly_cloudy".to_string(),
            is_night: false,
            temperature,
            feels_like: temperature + 0.6,
            humidity: 48,
            wind_speed: 11.0,
        },
        high: temperature + 3.0,
        low: temperature - 8.0,
        today,
        daily: Vec::new(),
        hourly: Vec::new(),
    }
}

/// Failure a [`FakeSource`] endpoint can be scripted with.
#[derive(Debug, Clone, Copy)]
pub enum FakeFailure {
    Status(u16),
    Decode,
}

impl FakeFailure {
    fn into_error(self) -> ApiError {
        match self {
            FakeFailure::Status(status) => ApiError::Status { status },
            FakeFailure::Decode => ApiError::Decode("scripted decode failure".to_string()),
        }
    }
}

/// Scripted in-memory [`WeatherDataSource`].
///
/// Serves one location record, counts calls per endpoint, and can be told
/// to delay, fail an endpoint, return no search matches, or omit the now
/// block from the daily feed.
pub struct FakeSource {
    location: Mutex<Location>,
    temperature: Mutex<f64>,
    delay: Mutex<Duration>,
    empty_search: AtomicBool,
    omit_now_block: AtomicBool,
    search_failure: Mutex<Option<FakeFailure>>,
    location_failure: Mutex<Option<FakeFailure>>,
    observation_failure: Mutex<Option<FakeFailure>>,
    daily_failure: Mutex<Option<FakeFailure>>,
    hourly_failure: Mutex<Option<FakeFailure>>,
    search_count: AtomicUsize,
    location_count: AtomicUsize,
    observation_count: AtomicUsize,
    daily_count: AtomicUsize,
    hourly_count: AtomicUsize,
}

impl FakeSource {
    pub fn new(location: Location) -> Arc<Self> {
        Arc::new(Self {
            location: Mutex::new(location),
            temperature: Mutex::new(22.5),
            delay: Mutex::new(Duration::ZERO),
            empty_search: AtomicBool::new(false),
            omit_now_block: AtomicBool::new(false),
            search_failure: Mutex::new(None),
            location_failure: Mutex::new(None),
            observation_failure: Mutex::new(None),
            daily_failure: Mutex::new(None),
            hourly_failure: Mutex::new(None),
            search_count: AtomicUsize::new(0),
            location_count: AtomicUsize::new(0),
            observation_count: AtomicUsize::new(0),
            daily_count: AtomicUsize::new(0),
            hourly_count: AtomicUsize::new(0),
        })
    }

    /// Artificial latency applied to every endpoint.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = delay;
    }

    /// Vary the served temperature so successive fetches differ.
    pub fn set_temperature(&self, temperature: f64) {
        *self.temperature.lock() = temperature;
    }

    pub fn set_empty_search(&self, empty: bool) {
        self.empty_search.store(empty, Ordering::SeqCst);
    }

    pub fn set_omit_now_block(&self, omit: bool) {
        self.omit_now_block.store(omit, Ordering::SeqCst);
    }

    pub fn fail_search(&self, failure: FakeFailure) {
        *self.search_failure.lock() = Some(failure);
    }

    pub fn fail_location(&self, failure: FakeFailure) {
        *self.location_failure.lock() = Some(failure);
    }

    pub fn fail_observations(&self, failure: FakeFailure) {
        *self.observation_failure.lock() = Some(failure);
    }

    pub fn fail_daily(&self, failure: FakeFailure) {
        *self.daily_failure.lock() = Some(failure);
    }

    pub fn fail_hourly(&self, failure: FakeFailure) {
        *self.hourly_failure.lock() = Some(failure);
    }

    pub fn clear_failures(&self) {
        *self.search_failure.lock() = None;
        *self.location_failure.lock() = None;
        *self.observation_failure.lock() = None;
        *self.daily_failure.lock() = None;
        *self.hourly_failure.lock() = None;
    }

    pub fn search_calls(&self) -> usize {
        self.search_count.load(Ordering::SeqCst)
    }

    pub fn location_calls(&self) -> usize {
        self.location_count.load(Ordering::SeqCst)
    }

    pub fn observation_calls(&self) -> usize {
        self.observation_count.load(Ordering::SeqCst)
    }

    pub fn daily_calls(&self) -> usize {
        self.daily_count.load(Ordering::SeqCst)
    }

    pub fn hourly_calls(&self) -> usize {
        self.hourly_count.load(Ordering::SeqCst)
    }

    async fn pause(&self) {
        let delay = *self.delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    fn check(&self, failure: &Mutex<Option<FakeFailure>>) -> Result<(), ApiError> {
        match *failure.lock() {
            Some(f) => Err(f.into_error()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl WeatherDataSource for FakeSource {
    async fn search_locations(&self, _query: &str) -> Result<Vec<SearchResult>, ApiError> {
        self.search_count.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        self.check(&self.search_failure)?;

        if self.empty_search.load(Ordering::SeqCst) {
            return Ok(Vec::new());
        }
        let location = self.location.lock().clone();
        Ok(vec![SearchResult {
            id: location.id,
            name: location.name,
            region: Some(location.region),
        }])
    }

    async fn location(&self, _id: &str) -> Result<Location, ApiError> {
        self.location_count.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        self.check(&self.location_failure)?;
        Ok(self.location.lock().clone())
    }

    async fn observations(&self, _hash: &str) -> Result<Observations, ApiError> {
        self.observation_count.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        self.check(&self.observation_failure)?;
        let temperature = *self.temperature.lock();
        Ok(Observations {
            symbol: "partly_cloudy".to_string(),
            is_night: false,
            temperature,
            feels_like: temperature + 0.6,
            humidity: 48,
            wind_speed: 11.0,
        })
    }

    async fn daily_forecasts(&self, _hash: &str) -> Result<Vec<DailyForecast>, ApiError> {
        self.daily_count.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        self.check(&self.daily_failure)?;

        let temperature = *self.temperature.lock();
        let now = if self.omit_now_block.load(Ordering::SeqCst) {
            None
        } else {
            Some(NowBlock {
                daypart: "day".to_string(),
                temperature,
                later_temperature: temperature - 8.0,
            })
        };
        Ok(vec![
            DailyForecast {
                date: Utc::now().date_naive(),
                symbol: "sun".to_string(),
                temperature_max: temperature + 3.0,
                temperature_min: None,
                precipitation_probability: 10,
                precipitation_sum: 0.0,
                now,
            },
            DailyForecast {
                date: Utc::now().date_naive() + TimeDelta::days(1),
                symbol: "rain".to_string(),
                temperature_max: temperature - 2.0,
                temperature_min: Some(temperature - 9.0),
                precipitation_probability: 70,
                precipitation_sum: 4.5,
                now: None,
            },
        ])
    }

    async fn hourly_forecasts(&self, _hash: &str) -> Result<Vec<HourlyForecast>, ApiError> {
        self.hourly_count.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        self.check(&self.hourly_failure)?;

        let temperature = *self.temperature.lock();
        let base = Utc.with_ymd_and_hms(2026, 8, 7, 12, 0, 0).single().unwrap_or_else(Utc::now);
        Ok((0..4)
            .map(|i| HourlyForecast {
                time: base + TimeDelta::hours(i * 3),
                symbol: "sun".to_string(),
                temperature: temperature - i as f64,
                precipitation_probability: 0,
            })
            .collect())
    }
}

/// Device provider driven by the test.
///
/// Items pushed before a subscription exists are queued and delivered to
/// the next subscriber; afterwards they go to every live subscription.
#[derive(Default)]
pub struct ScriptedProvider {
    queued: Mutex<Vec<Result<DeviceLocation, DeviceLocationError>>>,
    senders: Mutex<Vec<mpsc::Sender<Result<DeviceLocation, DeviceLocationError>>>>,
}

impl ScriptedProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Deliver an item to live subscriptions, or queue it for the next one.
    pub fn push(&self, item: Result<DeviceLocation, DeviceLocationError>) {
        let mut senders = self.senders.lock();
        senders.retain(|tx| !tx.is_closed());
        if senders.is_empty() {
            self.queued.lock().push(item);
            return;
        }
        for tx in senders.iter() {
            let _ = tx.try_send(item.clone());
        }
    }

    /// Close every live subscription.
    pub fn close(&self) {
        self.senders.lock().clear();
    }
}

impl DeviceLocationProvider for ScriptedProvider {
    fn subscribe(&self) -> mpsc::Receiver<Result<DeviceLocation, DeviceLocationError>> {
        let (tx, rx) = mpsc::channel(16);
        for item in self.queued.lock().drain(..) {
            let _ = tx.try_send(item);
        }
        self.senders.lock().push(tx);
        rx
    }
}

/// Notifier that counts invocations.
#[derive(Debug, Default)]
pub struct CountingNotifier {
    count: AtomicUsize,
}

impl CountingNotifier {
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl UpdateNotifier for CountingNotifier {
    fn notify_updated(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

/// Await the next state change with a timeout guard.
///
/// # Panics
///
/// Panics when no change arrives within two seconds or the stream closed,
/// making it suitable for tests.
pub async fn next_state(rx: &mut watch::Receiver<LoadingState>) -> LoadingState {
    tokio::time::timeout(Duration::from_secs(2), rx.changed())
        .await
        .expect("timed out waiting for a state change")
        .expect("state stream closed");
    rx.borrow().clone()
}
