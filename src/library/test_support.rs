//! In-memory collaborators and record builders shared by unit tests.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet},
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use {async_trait::async_trait, parking_lot::RwLock};

use crate::{
    audio::metadata::MetadataError,
    config::settings::SettingsError,
    error::domain::{LibraryError, SyncError},
    library::{
        models::{ExtractedTags, MediaFile, TaggedRecord},
        paths::is_within,
        sources::{MediaIndexSource, PreferenceStore, RecordCache, TagExtractor},
    },
};

/// A record at `path` with the given duration and album id.
pub fn record(path: &str, duration_ms: i64, album_id: i64) -> Arc<TaggedRecord> {
    let (folder, file_name) = match path.rfind('/') {
        Some(split) => (&path[..=split], &path[split + 1..]),
        None => ("", path),
    };

    Arc::new(TaggedRecord {
        album_id,
        title: file_name.to_string(),
        duration_ms,
        path: path.to_string(),
        folder: folder.to_string(),
        file_name: file_name.to_string(),
        ..TaggedRecord::default()
    })
}

/// A record at `path` with the given title.
pub fn titled(path: &str, title: &str) -> Arc<TaggedRecord> {
    let mut record = (*record(path, 1_000, 0)).clone();
    record.title = title.to_string();
    Arc::new(record)
}

/// A media index entry.
pub fn media_file(id: i64, folder: &str, name: &str, modified: i64) -> MediaFile {
    MediaFile {
        id,
        album_id: id * 10,
        relative_path: folder.to_string(),
        file_name: name.to_string(),
        date_modified_ms: modified,
        size_bytes: 1_024,
    }
}

/// Media index returning a settable file list.
#[derive(Default)]
pub struct StaticMediaIndex {
    files: RwLock<BTreeMap<String, MediaFile>>,
    denied: AtomicBool,
}

impl StaticMediaIndex {
    pub fn new(files: Vec<MediaFile>) -> Self {
        let index = Self::default();
        for file in files {
            index.replace(file);
        }
        index
    }

    /// Inserts or replaces the entry for the file's path.
    pub fn replace(&self, file: MediaFile) {
        self.files.write().insert(file.path(), file);
    }

    pub fn remove(&self, path: &str) {
        self.files.write().remove(path);
    }

    pub fn clear(&self) {
        self.files.write().clear();
    }

    pub fn deny_access(&self) {
        self.denied.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl MediaIndexSource for StaticMediaIndex {
    async fn list_audio_files(&self, root_filters: &[String]) -> Result<Vec<MediaFile>, SyncError> {
        if self.denied.load(Ordering::SeqCst) {
            return Err(SyncError::AccessDenied {
                reason: "storage permission revoked".to_string(),
            });
        }

        Ok(self
            .files
            .read()
            .iter()
            .filter(|(path, _)| {
                root_filters.is_empty() || root_filters.iter().any(|root| is_within(path, root))
            })
            .map(|(_, file)| file.clone())
            .collect())
    }
}

/// Extractor deriving tags from the file name.
///
/// Files whose name contains `corrupt`, or whose path was passed to
/// [`FakeExtractor::fail_on`], fail to extract.
#[derive(Default)]
pub struct FakeExtractor {
    pub calls: AtomicUsize,
    failing: RwLock<HashSet<String>>,
}

impl FakeExtractor {
    pub fn fail_on(&self, path: &str) {
        self.failing.write().insert(path.to_string());
    }
}

impl TagExtractor for FakeExtractor {
    fn extract_tags(&self, file: &MediaFile) -> Result<ExtractedTags, MetadataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if file.file_name.contains("corrupt") || self.failing.read().contains(&file.path()) {
            return Err(MetadataError::UnsupportedFormat);
        }

        Ok(ExtractedTags {
            title: file.file_name.clone(),
            artists: vec!["Artist".to_string()],
            duration_ms: 1_000,
            ..ExtractedTags::default()
        })
    }
}

/// Record cache kept in a map.
#[derive(Default)]
pub struct MemoryCache {
    records: RwLock<HashMap<String, TaggedRecord>>,
}

impl MemoryCache {
    pub fn contains(&self, path: &str) -> bool {
        self.records.read().contains_key(path)
    }
}

#[async_trait]
impl RecordCache for MemoryCache {
    async fn get_all(&self) -> Result<Vec<TaggedRecord>, LibraryError> {
        let mut records: Vec<TaggedRecord> = self.records.read().values().cloned().collect();
        records.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(records)
    }

    async fn upsert_all(&self, records: &[TaggedRecord]) -> Result<(), LibraryError> {
        let mut map = self.records.write();
        for record in records {
            map.insert(record.path.clone(), record.clone());
        }
        Ok(())
    }

    async fn delete_by_paths(&self, paths: &[String]) -> Result<(), LibraryError> {
        let mut map = self.records.write();
        for path in paths {
            map.remove(path);
        }
        Ok(())
    }

    async fn get_paths_with_mod_times(&self) -> Result<HashMap<String, i64>, LibraryError> {
        Ok(self
            .records
            .read()
            .iter()
            .map(|(path, record)| (path.clone(), record.date_modified_ms))
            .collect())
    }

    async fn count(&self) -> Result<i64, LibraryError> {
        Ok(i64::try_from(self.records.read().len()).unwrap_or(i64::MAX))
    }
}

/// Preference store kept in memory.
#[derive(Default)]
pub struct MemoryPreferences {
    roots: RwLock<BTreeSet<String>>,
}

impl PreferenceStore for MemoryPreferences {
    fn get_declared_roots(&self) -> BTreeSet<String> {
        self.roots.read().clone()
    }

    fn set_declared_roots(&self, roots: BTreeSet<String>) -> Result<(), SettingsError> {
        *self.roots.write() = roots;
        Ok(())
    }
}
