use nimbus_api::Location;

use crate::error::ErrorKind;
use crate::forecast::Forecast;
use crate::selection::LocationSelection;

/// Discrete states observable on the engine's output stream.
///
/// Every non-`Idle` state carries the selection that produced it, so
/// consumers never have to guess what the engine is resolving. Matched
/// exhaustively at every consumption site.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LoadingState {
    /// No selection, nothing to show
    #[default]
    Idle,

    /// Resolving the device position for a FollowMe selection
    FindingLocation { selection: LocationSelection },

    /// Fetching a forecast with no cached one to show meanwhile
    LoadingForecast {
        selection: LocationSelection,
        location: Location,
    },

    /// Fetching while the previous forecast is still presentable
    Refreshing {
        selection: LocationSelection,
        previous: Forecast,
    },

    /// Terminal success
    Loaded {
        selection: LocationSelection,
        forecast: Forecast,
    },

    /// Terminal failure; the selection is kept so the UI knows what was
    /// being attempted
    Error {
        selection: LocationSelection,
        kind: ErrorKind,
    },
}

impl LoadingState {
    /// The selection that produced this state, if any.
    pub fn selection(&self) -> Option<&LocationSelection> {
        match self {
            LoadingState::Idle => None,
            LoadingState::FindingLocation { selection }
            | LoadingState::LoadingForecast { selection, .. }
            | LoadingState::Refreshing { selection, .. }
            | LoadingState::Loaded { selection, .. }
            | LoadingState::Error { selection, .. } => Some(selection),
        }
    }

    /// True while a pipeline is doing work on behalf of this state.
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            LoadingState::FindingLocation { .. }
                | LoadingState::LoadingForecast { .. }
                | LoadingState::Refreshing { .. }
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            LoadingState::Idle => "idle",
            LoadingState::FindingLocation { .. } => "finding_location",
            LoadingState::LoadingForecast { .. } => "loading_forecast",
            LoadingState::Refreshing { .. } => "refreshing",
            LoadingState::Loaded { .. } => "loaded",
            LoadingState::Error { .. } => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_has_no_selection() {
        assert!(LoadingState::Idle.selection().is_none());
        assert!(!LoadingState::Idle.is_in_flight());
    }

    #[test]
    fn test_finding_location_is_in_flight() {
        let state = LoadingState::FindingLocation {
            selection: LocationSelection::FollowMe,
        };
        assert!(state.is_in_flight());
        assert_eq!(state.selection(), Some(&LocationSelection::FollowMe));
    }

    #[test]
    fn test_error_keeps_selection() {
        let state = LoadingState::Error {
            selection: LocationSelection::FollowMe,
            kind: ErrorKind::Network,
        };
        assert!(!state.is_in_flight());
        assert_eq!(state.selection(), Some(&LocationSelection::FollowMe));
        assert_eq!(state.label(), "error");
    }
}
