//! The resolution/refresh state machine.
//!
//! One driver task consumes selection changes and refresh triggers and
//! keeps at most one resolution+fetch pipeline alive. Starting a pipeline
//! cancels the previous one synchronously: the pipeline slot's token is
//! cancelled and its epoch bumped under the slot lock before the new task
//! spawns. Every state emission and cache write re-checks the epoch under
//! the same lock, so a superseded pipeline can neither emit a state nor
//! touch the cache, no matter how late its work completes.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use nimbus_api::{Location, WeatherDataSource};

use crate::cache::{is_stale, ForecastCache, DEFAULT_STALE_AFTER};
use crate::device::{DeviceLocation, DeviceLocationProvider};
use crate::error::ErrorKind;
use crate::fetcher::ForecastFetcher;
use crate::forecast::Forecast;
use crate::geofence::Geofence;
use crate::resolver::LocationResolver;
use crate::notify::UpdateNotifier;
use crate::selection::{LocationSelection, SelectionStore};
use crate::state::LoadingState;

/// Engine tuning knobs.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub geofence: Geofence,
    /// Age after which `refresh_if_necessary` considers the cache stale
    pub stale_after: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            geofence: Geofence::default(),
            stale_after: DEFAULT_STALE_AFTER,
        }
    }
}

/// The forecast resolution and refresh engine.
///
/// Construct once and share; all mutation funnels through the driver task.
/// Dropping the engine stops the driver and cancels in-flight work.
pub struct ForecastEngine {
    shared: Arc<Shared>,
    shutdown: CancellationToken,
}

struct Shared {
    resolver: LocationResolver,
    fetcher: ForecastFetcher,
    device: Arc<dyn DeviceLocationProvider>,
    notifier: Arc<dyn UpdateNotifier>,
    state_tx: watch::Sender<LoadingState>,
    cache: ForecastCache,
    pipeline: Mutex<PipelineSlot>,
    refresh_tx: mpsc::UnboundedSender<()>,
    stale_after: Duration,
}

/// The single in-flight pipeline.
///
/// The epoch identifies the current run; commits from older epochs are
/// discarded. The token propagates cancellation into the run's tasks.
struct PipelineSlot {
    epoch: u64,
    token: CancellationToken,
}

impl Default for PipelineSlot {
    fn default() -> Self {
        Self {
            epoch: 0,
            token: CancellationToken::new(),
        }
    }
}

impl ForecastEngine {
    /// Spawn the engine on the current runtime.
    ///
    /// The current selection is replayed once at startup, so a persisted
    /// selection starts loading without any user action.
    pub fn new(
        config: EngineConfig,
        source: Arc<dyn WeatherDataSource>,
        device: Arc<dyn DeviceLocationProvider>,
        selections: &SelectionStore,
        notifier: Arc<dyn UpdateNotifier>,
    ) -> Self {
        let (state_tx, _) = watch::channel(LoadingState::Idle);
        let (refresh_tx, refresh_rx) = mpsc::unbounded_channel();

        let shared = Arc::new(Shared {
            resolver: LocationResolver::new(source.clone(), config.geofence),
            fetcher: ForecastFetcher::new(source),
            device,
            notifier,
            state_tx,
            cache: ForecastCache::new(),
            pipeline: Mutex::new(PipelineSlot::default()),
            refresh_tx,
            stale_after: config.stale_after,
        });

        let shutdown = CancellationToken::new();
        tokio::spawn(drive(
            shared.clone(),
            selections.watch(),
            refresh_rx,
            shutdown.clone(),
        ));

        Self { shared, shutdown }
    }

    /// Observe the state stream. The latest value is readable immediately;
    /// late subscribers never miss the current state.
    pub fn subscribe(&self) -> watch::Receiver<LoadingState> {
        self.shared.state_tx.subscribe()
    }

    /// The state as of now.
    pub fn current_state(&self) -> LoadingState {
        self.shared.state_tx.borrow().clone()
    }

    /// The most recent successful forecast, if any.
    pub fn cached_forecast(&self) -> Option<Forecast> {
        self.shared.cache.get()
    }

    /// Re-run the pipeline for the current selection, superseding any
    /// in-flight run.
    pub fn force_refresh(&self) {
        tracing::debug!("Explicit refresh requested");
        let _ = self.shared.refresh_tx.send(());
    }

    /// Refresh only when nothing is in flight and the cached forecast has
    /// gone stale (or none exists); otherwise a no-op.
    pub fn refresh_if_necessary(&self) {
        let state = self.current_state();
        if state.is_in_flight() {
            tracing::debug!(state = state.label(), "Refresh skipped, pipeline active");
            return;
        }

        let cached = self.shared.cache.get();
        if !is_stale(cached.as_ref(), Utc::now(), self.shared.stale_after) {
            tracing::debug!("Refresh skipped, cached forecast still fresh");
            return;
        }

        self.force_refresh();
    }

    /// Stop the driver and cancel any active pipeline.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
        self.shared.cancel_active();
    }
}

impl Drop for ForecastEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Driver loop: one consumer for selection changes and refresh triggers.
async fn drive(
    shared: Arc<Shared>,
    mut selections: watch::Receiver<LocationSelection>,
    mut refreshes: mpsc::UnboundedReceiver<()>,
    shutdown: CancellationToken,
) {
    // Replay the current selection once at subscription start
    let initial = selections.borrow_and_update().clone();
    shared.start_pipeline(initial);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            changed = selections.changed() => match changed {
                Ok(()) => {
                    let selection = selections.borrow_and_update().clone();
                    shared.start_pipeline(selection);
                }
                Err(_) => break,
            },
            trigger = refreshes.recv() => match trigger {
                Some(()) => {
                    let selection = selections.borrow().clone();
                    shared.start_pipeline(selection);
                }
                None => break,
            },
        }
    }

    shared.cancel_active();
    tracing::debug!("Engine driver stopped");
}

impl Shared {
    /// Cancel the active pipeline and start a new one for `selection`.
    ///
    /// The old run is cancelled and the epoch bumped before the new task
    /// exists, so their visible effects can never interleave.
    fn start_pipeline(self: &Arc<Self>, selection: LocationSelection) {
        let (epoch, token) = {
            let mut slot = self.pipeline.lock();
            slot.token.cancel();
            slot.epoch += 1;
            slot.token = CancellationToken::new();
            (slot.epoch, slot.token.clone())
        };

        tracing::debug!(epoch, selection = selection.label(), "Starting pipeline");

        let shared = Arc::clone(self);
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::trace!(epoch, "Pipeline cancelled");
                }
                _ = shared.run_pipeline(&selection, epoch) => {}
            }
        });
    }

    fn cancel_active(&self) {
        let mut slot = self.pipeline.lock();
        slot.token.cancel();
        slot.epoch += 1;
    }

    async fn run_pipeline(&self, selection: &LocationSelection, epoch: u64) {
        match selection {
            // No selection: nothing to resolve, nothing to show
            LocationSelection::None => {
                self.emit(epoch, LoadingState::Idle);
            }
            // Resolution is immediate for a fixed place
            LocationSelection::Static(location) => {
                self.fetch_and_commit(selection, location.clone(), epoch)
                    .await;
            }
            LocationSelection::FollowMe => {
                self.follow_device(selection, epoch).await;
            }
        }
    }

    /// FollowMe stage: track the device stream, restarting resolution for
    /// every new fix. A newer fix supersedes the in-flight attempt.
    async fn follow_device(&self, selection: &LocationSelection, epoch: u64) {
        let mut fixes = self.device.subscribe();
        if !self.emit_searching(epoch, selection) {
            return;
        }

        let mut pending: Option<DeviceLocation> = None;
        loop {
            let fix = match pending.take() {
                Some(fix) => fix,
                None => match fixes.recv().await {
                    Some(Ok(fix)) => fix,
                    Some(Err(error)) => {
                        tracing::warn!(%error, "Device location stream reported an error");
                        self.emit(
                            epoch,
                            LoadingState::Error {
                                selection: selection.clone(),
                                kind: ErrorKind::Location,
                            },
                        );
                        continue;
                    }
                    None => {
                        tracing::warn!("Device location stream closed");
                        self.emit_stream_closed(epoch, selection);
                        return;
                    }
                },
            };

            if !self.emit_searching(epoch, selection) {
                return;
            }

            let attempt = self.resolve_and_fetch(selection, fix, epoch);
            tokio::pin!(attempt);

            enum FollowEvent {
                Superseded(DeviceLocation),
                StreamError,
                StreamClosed,
                Done,
            }

            let event = tokio::select! {
                next = fixes.recv() => match next {
                    Some(Ok(newer)) => FollowEvent::Superseded(newer),
                    Some(Err(error)) => {
                        tracing::warn!(%error, "Device location stream reported an error");
                        FollowEvent::StreamError
                    }
                    None => FollowEvent::StreamClosed,
                },
                _ = &mut attempt => FollowEvent::Done,
            };

            match event {
                FollowEvent::Superseded(newer) => {
                    tracing::debug!("Newer device fix supersedes in-flight resolution");
                    pending = Some(newer);
                }
                FollowEvent::StreamError => {
                    self.emit(
                        epoch,
                        LoadingState::Error {
                            selection: selection.clone(),
                            kind: ErrorKind::Location,
                        },
                    );
                }
                FollowEvent::StreamClosed => {
                    // Provider gone; let the in-flight attempt finish
                    attempt.await;
                    return;
                }
                FollowEvent::Done => {}
            }
        }
    }

    async fn resolve_and_fetch(
        &self,
        selection: &LocationSelection,
        fix: DeviceLocation,
        epoch: u64,
    ) {
        match self.resolver.resolve(fix).await {
            Ok(location) => self.fetch_and_commit(selection, location, epoch).await,
            Err(kind) => {
                self.emit(
                    epoch,
                    LoadingState::Error {
                        selection: selection.clone(),
                        kind,
                    },
                );
            }
        }
    }

    /// Fetch stage: transitional state, fetch, commit.
    async fn fetch_and_commit(&self, selection: &LocationSelection, location: Location, epoch: u64) {
        // Stale data for the same place beats a blank loading indicator;
        // a forecast for some other place must not be presented as this one
        let transitional = match self.cache.get() {
            Some(previous) if previous.location.id == location.id => LoadingState::Refreshing {
                selection: selection.clone(),
                previous,
            },
            _ => LoadingState::LoadingForecast {
                selection: selection.clone(),
                location: location.clone(),
            },
        };
        if !self.emit(epoch, transitional) {
            return;
        }

        match self.fetcher.fetch(&location).await {
            Ok(forecast) => {
                if !self.commit_forecast(epoch, forecast.clone()) {
                    return;
                }
                self.notifier.notify_updated();
                tracing::info!(location = %location.name, "Forecast updated");
                self.emit(
                    epoch,
                    LoadingState::Loaded {
                        selection: selection.clone(),
                        forecast,
                    },
                );
            }
            Err(kind) => {
                tracing::warn!(%kind, location = %location.name, "Forecast fetch failed");
                self.clear_cache(epoch);
                self.emit(
                    epoch,
                    LoadingState::Error {
                        selection: selection.clone(),
                        kind,
                    },
                );
            }
        }
    }

    /// The device stream ended. A search that can no longer complete is a
    /// location error; an already-terminal state stays as it is.
    fn emit_stream_closed(&self, epoch: u64, selection: &LocationSelection) {
        if self.state_tx.borrow().is_in_flight() {
            self.emit(
                epoch,
                LoadingState::Error {
                    selection: selection.clone(),
                    kind: ErrorKind::Location,
                },
            );
        }
    }

    /// Transitional state while a device fix is being resolved: keep
    /// showing cached data when there is any.
    fn emit_searching(&self, epoch: u64, selection: &LocationSelection) -> bool {
        let state = match self.cache.get() {
            Some(previous) => LoadingState::Refreshing {
                selection: selection.clone(),
                previous,
            },
            None => LoadingState::FindingLocation {
                selection: selection.clone(),
            },
        };
        self.emit(epoch, state)
    }

    /// Publish a state if this pipeline is still current.
    ///
    /// Consecutive identical values are suppressed. Returns false when the
    /// pipeline has been superseded; callers should stop doing work.
    fn emit(&self, epoch: u64, state: LoadingState) -> bool {
        let slot = self.pipeline.lock();
        if slot.epoch != epoch {
            tracing::trace!(epoch, "Discarding state from superseded pipeline");
            return false;
        }

        self.state_tx.send_if_modified(|current| {
            if *current == state {
                return false;
            }
            tracing::debug!(from = current.label(), to = state.label(), "State change");
            *current = state;
            true
        });
        true
    }

    fn commit_forecast(&self, epoch: u64, forecast: Forecast) -> bool {
        let slot = self.pipeline.lock();
        if slot.epoch != epoch {
            tracing::trace!(epoch, "Discarding forecast from superseded pipeline");
            return false;
        }
        self.cache.set(forecast);
        true
    }

    fn clear_cache(&self, epoch: u64) -> bool {
        let slot = self.pipeline.lock();
        if slot.epoch != epoch {
            return false;
        }
        self.cache.clear();
        true
    }
}
