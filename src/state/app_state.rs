//! Published library state with change notifications.
//!
//! This module provides the central `AppState` container. It holds the
//! currently published snapshot, the derived library status, the song
//! selection and the search query, and broadcasts every change.

use std::sync::Arc;

use {
    parking_lot::RwLock,
    tokio::sync::broadcast::{Receiver, Sender, channel},
    tracing::debug,
};

use crate::{
    library::{LibrarySnapshot, TaggedRecord, sync::SyncReport},
    state::selection::Selection,
};

/// What the library screens should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LibraryStatus {
    /// No snapshot has been published yet.
    #[default]
    Loading,
    /// A snapshot is published but has no songs.
    Empty,
    /// A snapshot with songs is published.
    Ready,
    /// Storage access was denied.
    NoAccess,
}

impl LibraryStatus {
    /// Status for a freshly published snapshot.
    #[must_use]
    pub fn for_snapshot(snapshot: &LibrarySnapshot) -> Self {
        if snapshot.is_empty() {
            Self::Empty
        } else {
            Self::Ready
        }
    }
}

/// Application state change events.
#[derive(Debug, Clone)]
pub enum AppStateEvent {
    /// A new snapshot replaced the previous one.
    SnapshotPublished(Arc<LibrarySnapshot>),
    /// The library status changed.
    StatusChanged(LibraryStatus),
    /// The selection or selection mode changed.
    SelectionChanged(Selection),
    /// The search query changed.
    SearchQueryChanged(Option<String>),
    /// A sync cycle completed.
    SyncFinished(SyncReport),
    /// A sync cycle failed; carries a user-facing message.
    SyncFailed(String),
}

/// Central state container with thread-safe access.
///
/// Readers always see one complete snapshot: publishing swaps the whole
/// `Arc` under the write lock.
#[derive(Debug, Clone)]
pub struct AppState {
    snapshot: Arc<RwLock<Arc<LibrarySnapshot>>>,
    status: Arc<RwLock<LibraryStatus>>,
    selection: Arc<RwLock<Selection>>,
    search_query: Arc<RwLock<Option<String>>>,
    state_tx: Sender<AppStateEvent>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    /// Creates a new application state with an empty snapshot.
    pub fn new() -> Self {
        let (state_tx, _) = channel(16);

        Self {
            snapshot: Arc::new(RwLock::new(Arc::new(LibrarySnapshot::empty()))),
            status: Arc::new(RwLock::new(LibraryStatus::Loading)),
            selection: Arc::new(RwLock::new(Selection::default())),
            search_query: Arc::new(RwLock::new(None)),
            state_tx,
        }
    }

    /// Publishes a snapshot and notifies subscribers.
    ///
    /// Selected paths that are no longer songs in the new snapshot are
    /// dropped from the selection.
    ///
    /// # Arguments
    ///
    /// * `snapshot` - The snapshot to publish.
    pub fn publish_snapshot(&self, snapshot: Arc<LibrarySnapshot>) {
        *self.snapshot.write() = Arc::clone(&snapshot);
        debug!(songs = snapshot.songs().len(), "Published library snapshot");

        let pruned = {
            let mut selection = self.selection.write();
            let before = selection.len();
            selection.retain(|path| snapshot.contains_song(path));
            (selection.len() != before).then(|| selection.clone())
        };

        let _ = self
            .state_tx
            .send(AppStateEvent::SnapshotPublished(Arc::clone(&snapshot)));
        if let Some(selection) = pruned {
            let _ = self
                .state_tx
                .send(AppStateEvent::SelectionChanged(selection));
        }
        self.set_status(LibraryStatus::for_snapshot(&snapshot));
    }

    /// Marks the library as unreachable, keeping the last snapshot.
    pub fn mark_no_access(&self) {
        self.set_status(LibraryStatus::NoAccess);
    }

    /// Re-derives the status from the published snapshot.
    ///
    /// Used when a sync cycle succeeds without publishing, e.g. after access
    /// was restored to an unchanged library.
    pub fn refresh_status(&self) {
        let status = LibraryStatus::for_snapshot(&self.get_snapshot());
        self.set_status(status);
    }

    /// Reports a completed sync cycle.
    pub fn report_sync_finished(&self, report: SyncReport) {
        let _ = self.state_tx.send(AppStateEvent::SyncFinished(report));
    }

    /// Reports a failed sync cycle.
    pub fn report_sync_failed(&self, message: String) {
        let _ = self.state_tx.send(AppStateEvent::SyncFailed(message));
    }

    fn set_status(&self, status: LibraryStatus) {
        let changed = {
            let mut current = self.status.write();
            let changed = *current != status;
            *current = status;
            changed
        };
        if changed {
            let _ = self.state_tx.send(AppStateEvent::StatusChanged(status));
        }
    }

    /// Subscribes to application state changes.
    ///
    /// # Returns
    ///
    /// A broadcast receiver for state change events.
    pub fn subscribe(&self) -> Receiver<AppStateEvent> {
        self.state_tx.subscribe()
    }

    /// Gets the published snapshot.
    pub fn get_snapshot(&self) -> Arc<LibrarySnapshot> {
        Arc::clone(&self.snapshot.read())
    }

    /// Gets the current library status.
    pub fn get_status(&self) -> LibraryStatus {
        *self.status.read()
    }

    /// Gets a copy of the current selection.
    pub fn get_selection(&self) -> Selection {
        self.selection.read().clone()
    }

    /// Toggles a single song.
    pub fn toggle_selected(&self, path: &str) {
        self.update_selection(|selection| selection.toggle(path));
    }

    /// Toggles every song at or below the folder at `path`.
    pub fn toggle_folder_selected(&self, path: &str) {
        let paths = self.get_snapshot().folder_song_paths(path);
        self.update_selection(|selection| selection.toggle_all(&paths));
    }

    /// Replaces the selection.
    pub fn set_selected(&self, paths: Vec<String>) {
        self.update_selection(|selection| selection.set(paths));
    }

    /// Clears the selection; `keep_mode` leaves selection mode on.
    pub fn clear_selected(&self, keep_mode: bool) {
        self.update_selection(|selection| selection.clear(keep_mode));
    }

    /// Enters or leaves selection mode.
    pub fn set_selection_mode(&self, in_selection_mode: bool) {
        self.update_selection(|selection| selection.set_mode(in_selection_mode));
    }

    fn update_selection(&self, update: impl FnOnce(&mut Selection)) {
        let selection = {
            let mut selection = self.selection.write();
            update(&mut selection);
            selection.clone()
        };
        let _ = self
            .state_tx
            .send(AppStateEvent::SelectionChanged(selection));
    }

    /// Updates the search query and notifies subscribers.
    pub fn update_search_query(&self, query: Option<String>) {
        *self.search_query.write() = query.clone();
        let _ = self
            .state_tx
            .send(AppStateEvent::SearchQueryChanged(query));
    }

    /// Songs matching the current search query in the published snapshot.
    pub fn search_results(&self) -> Vec<Arc<TaggedRecord>> {
        match self.search_query.read().as_deref() {
            Some(query) => self.get_snapshot().search(query),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{
        library::{LibrarySnapshot, test_support::titled},
        state::app_state::{AppState, AppStateEvent, LibraryStatus},
    };

    fn snapshot(paths: &[&str]) -> Arc<LibrarySnapshot> {
        let records = paths
            .iter()
            .map(|path| (*titled(path, path)).clone())
            .collect();
        Arc::new(LibrarySnapshot::build(&[], records))
    }

    #[test]
    fn test_app_state_creation() {
        let state = AppState::new();
        assert_eq!(state.get_status(), LibraryStatus::Loading);
        assert!(state.get_snapshot().is_empty());
        assert!(state.get_selection().is_empty());
        assert!(state.search_results().is_empty());
    }

    #[test]
    fn test_publish_sets_status() {
        let state = AppState::new();

        state.publish_snapshot(snapshot(&[]));
        assert_eq!(state.get_status(), LibraryStatus::Empty);

        state.publish_snapshot(snapshot(&["Music/a.mp3"]));
        assert_eq!(state.get_status(), LibraryStatus::Ready);

        state.mark_no_access();
        assert_eq!(state.get_status(), LibraryStatus::NoAccess);
        assert_eq!(state.get_snapshot().songs().len(), 1);

        state.refresh_status();
        assert_eq!(state.get_status(), LibraryStatus::Ready);
    }

    #[test]
    fn test_publish_prunes_selection() {
        let state = AppState::new();
        state.publish_snapshot(snapshot(&["Music/a.mp3", "Music/b.mp3"]));
        state.set_selected(vec!["Music/a.mp3".to_string(), "Music/b.mp3".to_string()]);

        state.publish_snapshot(snapshot(&["Music/a.mp3"]));
        assert_eq!(state.get_selection().paths(), vec!["Music/a.mp3"]);
    }

    #[test]
    fn test_toggle_folder_selected() {
        let state = AppState::new();
        state.publish_snapshot(snapshot(&["Music/A/1.mp3", "Music/A/2.mp3", "Music/B/3.mp3"]));

        state.toggle_folder_selected("Music/A");
        assert_eq!(
            state.get_selection().paths(),
            vec!["Music/A/1.mp3", "Music/A/2.mp3"]
        );

        state.toggle_selected("Music/A/1.mp3");
        state.toggle_folder_selected("Music/A");
        assert_eq!(
            state.get_selection().paths(),
            vec!["Music/A/1.mp3", "Music/A/2.mp3"]
        );

        state.toggle_folder_selected("Music/A");
        assert!(state.get_selection().is_empty());
    }

    #[test]
    fn test_search_results_follow_query() {
        let state = AppState::new();
        state.publish_snapshot(snapshot(&["Music/Blue.mp3", "Music/Red.mp3"]));

        state.update_search_query(Some("blue".to_string()));
        assert_eq!(state.search_results().len(), 1);

        state.update_search_query(None);
        assert!(state.search_results().is_empty());
    }

    #[tokio::test]
    async fn test_publish_notifies_subscribers() {
        let state = AppState::new();
        let mut receiver = state.subscribe();

        state.publish_snapshot(snapshot(&["Music/a.mp3"]));

        assert!(matches!(
            receiver.recv().await.unwrap(),
            AppStateEvent::SnapshotPublished(_)
        ));
        assert!(matches!(
            receiver.recv().await.unwrap(),
            AppStateEvent::StatusChanged(LibraryStatus::Ready)
        ));
    }
}
