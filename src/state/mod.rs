//! Centralized library state with change notifications.
//!
//! This module holds the published snapshot and the user's selection, and
//! broadcasts every change to subscribers.

pub mod app_state;
pub mod selection;

pub use {
    app_state::{AppState, AppStateEvent, LibraryStatus},
    selection::Selection,
};
