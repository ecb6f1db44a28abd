use nimbus_api::ApiError;
use thiserror::Error;

/// Closed failure taxonomy surfaced through [`LoadingState::Error`].
///
/// Every collaborator failure collapses into one of these four; there is
/// no generic bucket. Unrecognized failures map to `Network`.
///
/// [`LoadingState::Error`]: crate::state::LoadingState::Error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ErrorKind {
    /// The device position could not be obtained
    #[error("device location unavailable")]
    Location,

    /// The coordinates fall outside the supported service region
    #[error("outside the supported service region")]
    OutsideServiceRegion,

    /// Transport-level failure talking to the weather service
    #[error("network failure")]
    Network,

    /// A response arrived but did not have the expected shape
    #[error("malformed weather data")]
    Data,
}

impl ErrorKind {
    /// Whether the UI should offer a retry affordance for this error.
    ///
    /// Retrying cannot help when the region itself is unsupported.
    pub fn is_retryable(self) -> bool {
        !matches!(self, ErrorKind::OutsideServiceRegion)
    }
}

impl From<ApiError> for ErrorKind {
    fn from(error: ApiError) -> Self {
        match error {
            ApiError::Decode(_) => ErrorKind::Data,
            ApiError::Transport(_) | ApiError::Status { .. } => ErrorKind::Network,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_maps_to_data() {
        let kind: ErrorKind = ApiError::Decode("missing field".into()).into();
        assert_eq!(kind, ErrorKind::Data);
    }

    #[test]
    fn test_status_maps_to_network() {
        let kind: ErrorKind = ApiError::Status { status: 502 }.into();
        assert_eq!(kind, ErrorKind::Network);
    }

    #[test]
    fn test_only_region_errors_block_retry() {
        assert!(ErrorKind::Location.is_retryable());
        assert!(ErrorKind::Network.is_retryable());
        assert!(ErrorKind::Data.is_retryable());
        assert!(!ErrorKind::OutsideServiceRegion.is_retryable());
    }
}
