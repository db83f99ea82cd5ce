//! Interfaces to the collaborators the catalogue core depends on.
//!
//! The core never talks to the platform directly: the media index, the tag
//! reader, the persistent record cache and the preference store are all
//! handed in behind these traits.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;

use crate::{
    audio::metadata::MetadataError,
    config::settings::SettingsError,
    error::domain::{LibraryError, SyncError},
    library::models::{ExtractedTags, MediaFile, TaggedRecord},
};

/// Lists the audio files currently present on the device.
#[async_trait]
pub trait MediaIndexSource: Send + Sync {
    /// Lists audio files below the given volume-relative roots.
    ///
    /// An empty filter list means "everything the index knows about".
    ///
    /// # Errors
    ///
    /// Returns `SyncError::AccessDenied` when storage cannot be read at all.
    async fn list_audio_files(&self, root_filters: &[String]) -> Result<Vec<MediaFile>, SyncError>;
}

/// Reads tags and audio properties from one file.
///
/// Extraction is blocking file I/O and is run off the async executor.
pub trait TagExtractor: Send + Sync {
    /// Extracts tags for `file`.
    ///
    /// # Errors
    ///
    /// Returns `MetadataError` when the file is unreadable or corrupt.
    fn extract_tags(&self, file: &MediaFile) -> Result<ExtractedTags, MetadataError>;
}

/// Persistent store of fully tagged records keyed by path.
#[async_trait]
pub trait RecordCache: Send + Sync {
    /// Every cached record.
    async fn get_all(&self) -> Result<Vec<TaggedRecord>, LibraryError>;

    /// Inserts or replaces records by path.
    async fn upsert_all(&self, records: &[TaggedRecord]) -> Result<(), LibraryError>;

    /// Removes the records with the given paths.
    async fn delete_by_paths(&self, paths: &[String]) -> Result<(), LibraryError>;

    /// Path to last-modified time of every cached record.
    async fn get_paths_with_mod_times(&self) -> Result<HashMap<String, i64>, LibraryError>;

    /// Number of cached records.
    async fn count(&self) -> Result<i64, LibraryError>;
}

/// User-configured library source folders.
pub trait PreferenceStore: Send + Sync {
    /// The declared roots, as absolute paths.
    fn get_declared_roots(&self) -> BTreeSet<String>;

    /// Replaces the declared roots.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if the new value cannot be persisted.
    fn set_declared_roots(&self, roots: BTreeSet<String>) -> Result<(), SettingsError>;
}
