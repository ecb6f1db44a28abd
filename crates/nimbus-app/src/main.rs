use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use nimbus_api::{MeteoClient, WeatherDataSource};
use nimbus_engine::{
    EngineConfig, ForecastEngine, Geofence, LoadingState, LocationSelection, NoopNotifier,
    SelectionStore, UnavailableProvider,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize core
    nimbus_core::init()?;

    let (config, _validation) = nimbus_core::Config::load_validated()?;

    let client = MeteoClient::new(
        &config.weather.api_base_url,
        &config.weather.user_agent,
        Duration::from_secs(config.weather.request_timeout_secs),
    )?;

    // Explicit wiring: the engine owns no globals. A platform location
    // provider would replace the stub to enable FollowMe selections.
    let selections = SelectionStore::default();
    let engine = ForecastEngine::new(
        EngineConfig {
            geofence: Geofence::new(
                config.region.lat_min,
                config.region.lat_max,
                config.region.lon_min,
                config.region.lon_max,
            ),
            stale_after: Duration::from_secs(config.weather.stale_after_secs),
        },
        Arc::new(client.clone()),
        Arc::new(UnavailableProvider),
        &selections,
        Arc::new(NoopNotifier),
    );

    tracing::info!("Nimbus engine started");

    // Resolve the place named on the command line and watch the state
    // stream until it settles.
    let query = std::env::args().nth(1).unwrap_or_else(|| "Bern".to_string());
    let results = client.search_locations(&query).await?;
    let Some(first) = results.first() else {
        anyhow::bail!("No location found for '{}'", query);
    };
    let location = client.location(&first.id).await?;
    selections.select(LocationSelection::Static(location));

    let mut states = engine.subscribe();
    loop {
        states.changed().await?;
        let state = states.borrow().clone();
        match state {
            LoadingState::Loaded { forecast, .. } => {
                println!(
                    "{} ({}): {:.1}°C, feels like {:.1}°C, high {:.1}°C / low {:.1}°C",
                    forecast.location.name,
                    forecast.location.region,
                    forecast.current.temperature,
                    forecast.current.feels_like,
                    forecast.high,
                    forecast.low,
                );
                break;
            }
            LoadingState::Error { kind, .. } => {
                anyhow::bail!("Forecast failed: {}", kind);
            }
            other => tracing::info!(state = other.label(), "Waiting for forecast"),
        }
    }

    engine.shutdown();
    Ok(())
}
