use thiserror::Error;
use tokio::sync::mpsc;

/// Raw device position. Ephemeral; never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceLocation {
    pub latitude: f64,
    pub longitude: f64,
}

/// Failures reported by the platform location provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceLocationError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("location service unavailable")]
    Unavailable,
}

/// Source of device position updates.
///
/// Each subscription yields a live stream: the first value may take a
/// while (fix acquisition), errors can appear at any point in the
/// sequence, and a closed channel ends the stream.
pub trait DeviceLocationProvider: Send + Sync {
    fn subscribe(&self) -> mpsc::Receiver<Result<DeviceLocation, DeviceLocationError>>;
}

/// Provider for platforms without a location service.
///
/// Every subscription reports the service unavailable once; FollowMe
/// selections surface a location error immediately.
#[derive(Debug, Default)]
pub struct UnavailableProvider;

impl DeviceLocationProvider for UnavailableProvider {
    fn subscribe(&self) -> mpsc::Receiver<Result<DeviceLocation, DeviceLocationError>> {
        let (tx, rx) = mpsc::channel(1);
        let _ = tx.try_send(Err(DeviceLocationError::Unavailable));
        rx
    }
}
