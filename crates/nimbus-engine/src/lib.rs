//! Forecast resolution & refresh engine.
//!
//! Turns the user's location selection (a fixed place, or "follow my
//! device") into a concrete location, fetches the multi-part forecast for
//! it, and exposes one observable stream of loading states. At most one
//! resolution+fetch pipeline runs at a time; new selections and explicit
//! refreshes supersede and cancel in-flight work.

pub mod cache;
pub mod device;
pub mod engine;
pub mod error;
pub mod fetcher;
pub mod forecast;
pub mod geofence;
pub mod notify;
pub mod resolver;
pub mod selection;
pub mod state;
pub mod testing;

pub use cache::{is_stale, ForecastCache, DEFAULT_STALE_AFTER};
pub use device::{
    DeviceLocation, DeviceLocationError, DeviceLocationProvider, UnavailableProvider,
};
pub use engine::{EngineConfig, ForecastEngine};
pub use error::ErrorKind;
pub use fetcher::ForecastFetcher;
pub use forecast::{CurrentConditions, DailyOutlook, Forecast, HourlySlot};
pub use geofence::Geofence;
pub use notify::{NoopNotifier, UpdateNotifier};
pub use resolver::LocationResolver;
pub use selection::{LocationSelection, SelectionStore};
pub use state::LoadingState;
