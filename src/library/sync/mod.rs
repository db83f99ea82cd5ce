//! Incremental sync between the media index, the record cache and the snapshot.
//!
//! A sync cycle only re-reads tags for files that are new or modified,
//! purges deleted files from the cache, and then rebuilds the whole snapshot
//! from the cache. The tree is never patched in place; when the resulting
//! record list equals the previous one nothing new is published.

use std::sync::Arc;

use {
    tokio::task::spawn_blocking,
    tokio_util::sync::CancellationToken,
    tracing::{debug, info, warn},
};

use crate::{
    error::domain::SyncError,
    library::{
        models::{MediaFile, TaggedRecord},
        paths::compare_paths,
        snapshot::LibrarySnapshot,
        sources::{MediaIndexSource, RecordCache, TagExtractor},
    },
};

mod config;
mod coordinator;
mod plan;

pub use {
    config::SyncConfig,
    coordinator::SyncCoordinator,
    plan::{SyncPlan, diff},
};

/// Counts describing one finished sync cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Files reported by the media index.
    pub indexed: usize,
    /// Files whose tags were read successfully.
    pub extracted: usize,
    /// Files whose tags could not be read.
    pub failed: usize,
    /// Files whose cached record was reused.
    pub unchanged: usize,
    /// Cached files no longer on the device.
    pub deleted: usize,
}

/// Whether a sync cycle produced a new snapshot.
#[derive(Debug, Clone)]
pub enum SyncOutcome {
    /// The record list is identical to the previous snapshot's.
    Unchanged,
    /// A freshly built snapshot to publish.
    Rebuilt(Arc<LibrarySnapshot>),
}

/// Result of a completed sync cycle.
#[derive(Debug, Clone)]
pub struct SyncResult {
    /// Cycle statistics.
    pub report: SyncReport,
    /// Snapshot to publish, if anything changed.
    pub outcome: SyncOutcome,
}

/// State handed into a sync cycle by the hosting layer.
#[derive(Debug, Clone, Default)]
pub struct SyncContext {
    /// Volume-relative declared roots; empty for a single resolved root.
    pub declared_roots: Vec<String>,
    /// The currently published snapshot, used to detect no-op cycles.
    pub previous: Option<Arc<LibrarySnapshot>>,
}

/// Runs sync cycles against the external collaborators.
pub struct SyncEngine {
    media_index: Arc<dyn MediaIndexSource>,
    extractor: Arc<dyn TagExtractor>,
    cache: Arc<dyn RecordCache>,
    config: SyncConfig,
}

impl SyncEngine {
    /// Creates a new sync engine.
    ///
    /// # Arguments
    ///
    /// * `media_index` - Source of the files currently on the device.
    /// * `extractor` - Tag reader for new and modified files.
    /// * `cache` - Persistent record cache.
    /// * `config` - Sync configuration.
    pub fn new(
        media_index: Arc<dyn MediaIndexSource>,
        extractor: Arc<dyn TagExtractor>,
        cache: Arc<dyn RecordCache>,
        config: SyncConfig,
    ) -> Self {
        Self {
            media_index,
            extractor,
            cache,
            config,
        }
    }

    /// Gets the current configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Builds a snapshot straight from the record cache.
    ///
    /// Used at startup to show the last known library before the first sync.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Cache` if the cache cannot be read.
    pub async fn load_cached(&self, declared_roots: &[String]) -> Result<Arc<LibrarySnapshot>, SyncError> {
        let records = self.cache.get_all().await?;
        debug!(count = records.len(), "Loaded cached records");
        Ok(Arc::new(LibrarySnapshot::build(declared_roots, records)))
    }

    /// Runs one sync cycle.
    ///
    /// # Arguments
    ///
    /// * `context` - Declared roots and the currently published snapshot.
    /// * `cancel` - Abandons the cycle before anything is published.
    ///
    /// # Returns
    ///
    /// A `SyncResult` telling whether a new snapshot has to be published.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::AccessDenied` if storage cannot be read,
    /// `SyncError::Cancelled` if `cancel` fired, and `SyncError::Cache` on
    /// cache failures. Unreadable files are not errors.
    pub async fn sync(
        &self,
        context: &SyncContext,
        cancel: &CancellationToken,
    ) -> Result<SyncResult, SyncError> {
        let files = self
            .media_index
            .list_audio_files(&context.declared_roots)
            .await?;
        if files.is_empty() {
            info!("Media index returned no audio files, library is empty");
        }
        ensure_not_cancelled(cancel)?;

        let cached = self.cache.get_paths_with_mod_times().await?;
        let plan = diff(&files, &cached);
        debug!(
            indexed = files.len(),
            cached = cached.len(),
            new_or_changed = plan.new_or_changed.len(),
            unchanged = plan.unchanged.len(),
            deleted = plan.deleted.len(),
            "Computed sync plan"
        );

        let (records, failed) = self.extract(&plan.new_or_changed, cancel).await?;
        ensure_not_cancelled(cancel)?;

        // A modified file that can no longer be read must not keep its stale tags.
        let mut purge = plan.deleted.clone();
        purge.extend(failed.iter().filter(|path| cached.contains_key(*path)).cloned());

        if !records.is_empty() {
            self.cache.upsert_all(&records).await?;
        }
        if !purge.is_empty() {
            self.cache.delete_by_paths(&purge).await?;
        }

        let report = SyncReport {
            indexed: files.len(),
            extracted: records.len(),
            failed: failed.len(),
            unchanged: plan.unchanged.len(),
            deleted: plan.deleted.len(),
        };

        let mut all = self.cache.get_all().await?;
        all.sort_by(|a, b| compare_paths(&a.path, &b.path));
        ensure_not_cancelled(cancel)?;

        if let Some(previous) = &context.previous
            && previous.is_built_from(&context.declared_roots, &all)
        {
            debug!("Record list unchanged, skipping rebuild");
            return Ok(SyncResult {
                report,
                outcome: SyncOutcome::Unchanged,
            });
        }

        let snapshot = Arc::new(LibrarySnapshot::build(&context.declared_roots, all));
        info!(
            songs = snapshot.songs().len(),
            extracted = report.extracted,
            failed = report.failed,
            deleted = report.deleted,
            "Sync finished with a new snapshot"
        );

        Ok(SyncResult {
            report,
            outcome: SyncOutcome::Rebuilt(snapshot),
        })
    }

    /// Reads tags for `files` in blocking batches.
    ///
    /// Returns the records that could be built and the paths that failed.
    async fn extract(
        &self,
        files: &[MediaFile],
        cancel: &CancellationToken,
    ) -> Result<(Vec<TaggedRecord>, Vec<String>), SyncError> {
        let mut records = Vec::with_capacity(files.len());
        let mut failed = Vec::new();

        for batch in files.chunks(self.config.max_batch_size.max(1)) {
            ensure_not_cancelled(cancel)?;

            let extractor = Arc::clone(&self.extractor);
            let batch = batch.to_vec();
            let results = spawn_blocking(move || {
                batch
                    .into_iter()
                    .map(|file| {
                        let tags = extractor.extract_tags(&file);
                        (file, tags)
                    })
                    .collect::<Vec<_>>()
            })
            .await
            .map_err(|e| SyncError::TaskFailed {
                reason: e.to_string(),
            })?;

            for (file, result) in results {
                match result {
                    Ok(tags) => records.push(TaggedRecord::from_parts(&file, tags)),
                    Err(e) => {
                        warn!(path = %file.path(), error = %e, "Failed to read tags, dropping file from this sync");
                        failed.push(file.path());
                    }
                }
            }
        }

        Ok((records, failed))
    }
}

fn ensure_not_cancelled(cancel: &CancellationToken) -> Result<(), SyncError> {
    if cancel.is_cancelled() {
        debug!("Sync cancelled");
        return Err(SyncError::Cancelled);
    }
    Ok(())
}
