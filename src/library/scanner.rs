//! File system media index.
//!
//! This module walks the declared library roots on the mounted storage
//! volumes and reports every supported audio file as a volume-relative
//! `MediaFile`. It stands in for a platform media index on desktop systems.

use std::{
    fs::{Metadata, ReadDir, read_dir},
    io::ErrorKind,
    path::{Path, PathBuf},
    time::UNIX_EPOCH,
};

use {
    async_trait::async_trait,
    tokio::task::spawn_blocking,
    tracing::{debug, warn},
    xxhash_rust::xxh3::xxh3_64,
};

use crate::{
    error::domain::SyncError,
    library::{models::MediaFile, sources::MediaIndexSource},
};

/// Supported audio file extensions.
const SUPPORTED_AUDIO_EXTENSIONS: &[&str] = &[
    "flac", "mp3", "m4a", "aac", "opus", "ogg", "wav", "aiff", "aif", "mpc",
];

/// Media index backed by a recursive directory walk.
#[derive(Debug, Clone)]
pub struct FilesystemMediaIndex {
    volumes: Vec<PathBuf>,
}

impl FilesystemMediaIndex {
    /// Creates an index over the given storage volumes.
    ///
    /// Volume-relative roots are resolved against the volumes in order.
    pub fn new<I, P>(volumes: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            volumes: volumes.into_iter().map(Into::into).collect(),
        }
    }

    fn scan(&self, roots: &[String]) -> Result<Vec<MediaFile>, SyncError> {
        let mut files = Vec::new();

        for root in roots {
            let Some((volume, dir)) = locate(&self.volumes, root) else {
                warn!(root = %root, "Library root not found on any volume, skipping");
                continue;
            };

            match read_dir(&dir) {
                Ok(entries) => collect_entries(volume, entries, &mut files),
                Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                    return Err(SyncError::AccessDenied {
                        reason: format!("{}: {e}", dir.display()),
                    });
                }
                Err(e) => {
                    return Err(SyncError::MediaIndex {
                        reason: format!("{}: {e}", dir.display()),
                    });
                }
            }
        }

        debug!(count = files.len(), "Collected audio files");
        Ok(files)
    }
}

#[async_trait]
impl MediaIndexSource for FilesystemMediaIndex {
    async fn list_audio_files(&self, root_filters: &[String]) -> Result<Vec<MediaFile>, SyncError> {
        if root_filters.is_empty() {
            debug!("No library roots configured, nothing to index");
            return Ok(Vec::new());
        }

        let index = self.clone();
        let roots = root_filters.to_vec();
        spawn_blocking(move || index.scan(&roots))
            .await
            .map_err(|e| SyncError::TaskFailed {
                reason: e.to_string(),
            })?
    }
}

/// Finds the first volume holding the volume-relative path `relative`.
///
/// # Returns
///
/// The volume and the absolute path, or `None` when no volume has it.
pub fn locate<'a>(volumes: &'a [PathBuf], relative: &str) -> Option<(&'a Path, PathBuf)> {
    volumes.iter().find_map(|volume| {
        let candidate = volume.join(relative);
        candidate.exists().then_some((volume.as_path(), candidate))
    })
}

/// Checks if a path corresponds to a supported audio file.
#[must_use]
pub fn is_supported_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|ext_str| {
            SUPPORTED_AUDIO_EXTENSIONS
                .iter()
                .any(|&ext| ext.eq_ignore_ascii_case(ext_str))
        })
}

/// Stable id for a volume-relative path.
#[must_use]
pub fn stable_id(relative: &str) -> i64 {
    // Shifted so the id is always non-negative.
    i64::try_from(xxh3_64(relative.as_bytes()) >> 1).unwrap_or_default()
}

fn collect_entries(volume: &Path, entries: ReadDir, files: &mut Vec<MediaFile>) {
    for entry in entries.flatten() {
        let path = entry.path();
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if hidden {
            continue;
        }

        if path.is_dir() {
            match read_dir(&path) {
                Ok(children) => collect_entries(volume, children, files),
                Err(e) => warn!("Failed to read directory {}: {}", path.display(), e),
            }
        } else if is_supported_audio_file(&path) {
            match entry.metadata() {
                Ok(metadata) => {
                    if let Some(file) = media_file(volume, &path, &metadata) {
                        files.push(file);
                    }
                }
                Err(e) => warn!("Failed to stat {}: {}", path.display(), e),
            }
        }
    }
}

fn media_file(volume: &Path, path: &Path, metadata: &Metadata) -> Option<MediaFile> {
    let relative = path.strip_prefix(volume).ok()?;
    let mut segments: Vec<String> = relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy().into_owned())
        .collect();
    let file_name = segments.pop()?;

    let relative_path = if segments.is_empty() {
        String::new()
    } else {
        format!("{}/", segments.join("/"))
    };

    let date_modified_ms = metadata
        .modified()
        .ok()
        .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
        .and_then(|elapsed| i64::try_from(elapsed.as_millis()).ok())
        .unwrap_or_default();

    Some(MediaFile {
        id: stable_id(&format!("{relative_path}{file_name}")),
        album_id: stable_id(&relative_path),
        relative_path,
        file_name,
        date_modified_ms,
        size_bytes: i64::try_from(metadata.len()).unwrap_or(i64::MAX),
    })
}
