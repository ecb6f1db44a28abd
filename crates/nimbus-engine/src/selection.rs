use nimbus_api::Location;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// The user's declared intent for which location to track.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum LocationSelection {
    /// No selection made yet
    #[default]
    None,
    /// A fixed, previously resolved location
    Static(Location),
    /// Track the device position continuously
    FollowMe,
}

impl LocationSelection {
    pub fn label(&self) -> &'static str {
        match self {
            LocationSelection::None => "none",
            LocationSelection::Static(_) => "static",
            LocationSelection::FollowMe => "follow_me",
        }
    }
}

/// Holder of the current [`LocationSelection`].
///
/// The engine only reads it and reacts to changes; user-facing code writes
/// through [`select`](Self::select). Persisting the choice across restarts
/// is the caller's concern.
#[derive(Debug)]
pub struct SelectionStore {
    tx: watch::Sender<LocationSelection>,
}

impl SelectionStore {
    pub fn new(initial: LocationSelection) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx }
    }

    /// The selection as of now.
    pub fn current(&self) -> LocationSelection {
        self.tx.borrow().clone()
    }

    /// Replace the selection.
    ///
    /// Observers are woken even when the value compares equal, so
    /// re-selecting the same place re-triggers resolution.
    pub fn select(&self, selection: LocationSelection) {
        tracing::info!(selection = selection.label(), "Selection changed");
        self.tx.send_replace(selection);
    }

    /// Observe the selection; the current value is readable immediately,
    /// subsequent changes wake the receiver.
    pub fn watch(&self) -> watch::Receiver<LocationSelection> {
        self.tx.subscribe()
    }
}

impl Default for SelectionStore {
    fn default() -> Self {
        Self::new(LocationSelection::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_none() {
        let store = SelectionStore::default();
        assert_eq!(store.current(), LocationSelection::None);
    }

    #[tokio::test]
    async fn test_watch_sees_changes() {
        let store = SelectionStore::default();
        let mut rx = store.watch();

        store.select(LocationSelection::FollowMe);

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), LocationSelection::FollowMe);
    }

    #[tokio::test]
    async fn test_reselecting_same_value_wakes_observers() {
        let store = SelectionStore::new(LocationSelection::FollowMe);
        let mut rx = store.watch();

        store.select(LocationSelection::FollowMe);

        // send_replace marks the value as changed even when equal
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), LocationSelection::FollowMe);
    }
}
