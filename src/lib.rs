//! Sonata - folder-based music library
//!
//! Builds a hierarchical folder view over a device's audio files. Tags are
//! cached in SQLite and kept current by incremental sync cycles, and each
//! cycle publishes an immutable snapshot with per-folder aggregates, a path
//! index and a flattened song list.

pub mod audio;
pub mod config;
pub mod error;
pub mod library;
pub mod state;

// Re-export key types for convenience
pub use {
    audio::metadata::{LoftyTagExtractor, MetadataError},
    config::{SettingsManager, UserSettings},
    error::{LibraryError, SyncError},
    library::{
        FilesystemMediaIndex, LibrarySnapshot, RecordDatabase, SyncCoordinator, SyncEngine,
        TaggedRecord, TreeNode,
    },
    state::{AppState, AppStateEvent, LibraryStatus, Selection},
};
