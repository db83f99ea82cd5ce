//! Music catalogue core.
//!
//! This module turns the flat set of tagged audio records into the
//! browsable folder hierarchy: path handling, tree construction, lookup
//! index, list projections, the immutable snapshot, the incremental sync
//! policy, and the SQLite and filesystem collaborators behind it.

pub mod database;
pub mod index;
pub mod models;
pub mod paths;
pub mod projections;
pub mod scanner;
pub mod schema;
pub mod snapshot;
pub mod sources;
pub mod sync;
pub mod tree;

#[cfg(test)]
pub(crate) mod test_support;

pub use {
    database::RecordDatabase,
    index::TreeIndex,
    models::{ExtractedTags, MediaFile, TaggedRecord},
    scanner::FilesystemMediaIndex,
    schema::{CURRENT_SCHEMA_VERSION, SchemaManager, get_database_path},
    snapshot::LibrarySnapshot,
    sources::{MediaIndexSource, PreferenceStore, RecordCache, TagExtractor},
    sync::{SyncConfig, SyncContext, SyncCoordinator, SyncEngine, SyncOutcome, SyncReport},
    tree::{FolderNode, LeafNode, TreeNode},
};
