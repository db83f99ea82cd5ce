//! Immutable catalogue snapshot: records, trees, index and song list together.

use std::sync::Arc;

use tracing::debug;

use crate::library::{
    index::TreeIndex,
    models::TaggedRecord,
    paths::{compare_paths, normalize},
    projections::{flatten_leaves, folder_songs, search},
    tree::{TreeNode, build_forest, build_tree},
};

/// Everything a reader needs to browse the library, built in one go.
///
/// Snapshots are never patched. A sync cycle that changes anything builds a
/// new one, and readers holding the old `Arc` keep a consistent view.
#[derive(Debug, Clone, Default)]
pub struct LibrarySnapshot {
    declared_roots: Vec<String>,
    records: Vec<Arc<TaggedRecord>>,
    roots: Vec<Arc<TreeNode>>,
    index: TreeIndex,
    songs: Vec<Arc<TreeNode>>,
    dropped: usize,
}

impl LibrarySnapshot {
    /// An empty snapshot.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds trees, index and song list from a full record set.
    ///
    /// With no declared roots a single tree is rooted at the records' common
    /// folder; otherwise one tree is built per declared root and records
    /// outside every root are dropped.
    #[must_use]
    pub fn build(declared_roots: &[String], mut records: Vec<TaggedRecord>) -> Self {
        records.sort_by(|a, b| compare_paths(&a.path, &b.path));
        let records: Vec<Arc<TaggedRecord>> = records.into_iter().map(Arc::new).collect();

        let mut declared_roots = declared_roots.to_vec();
        declared_roots.sort_by(|a, b| compare_paths(a, b));

        let (roots, dropped) = if declared_roots.is_empty() {
            if records.is_empty() {
                (Vec::new(), 0)
            } else {
                (vec![Arc::new(build_tree(&records))], 0)
            }
        } else {
            let forest = build_forest(&declared_roots, &records);
            (forest.roots, forest.dropped)
        };

        let index = TreeIndex::build_all(&roots);
        let songs = flatten_leaves(&roots);
        debug!(
            records = records.len(),
            songs = songs.len(),
            nodes = index.len(),
            dropped,
            "Built library snapshot"
        );

        Self {
            declared_roots,
            records,
            roots,
            index,
            songs,
            dropped,
        }
    }

    /// The declared roots this snapshot was partitioned by, sorted.
    #[must_use]
    pub fn declared_roots(&self) -> &[String] {
        &self.declared_roots
    }

    /// All records, sorted by path.
    #[must_use]
    pub fn records(&self) -> &[Arc<TaggedRecord>] {
        &self.records
    }

    /// Top-level trees, one per root.
    #[must_use]
    pub fn roots(&self) -> &[Arc<TreeNode>] {
        &self.roots
    }

    /// Leaf nodes in tree order.
    #[must_use]
    pub fn songs(&self) -> &[Arc<TreeNode>] {
        &self.songs
    }

    /// Number of records left out because they matched no declared root.
    #[must_use]
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Whether the snapshot has no songs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    /// Looks up a folder or file by path.
    ///
    /// Repeated or trailing slashes in `path` are ignored.
    #[must_use]
    pub fn find_node(&self, path: &str) -> Option<&Arc<TreeNode>> {
        self.index
            .find_node(path)
            .or_else(|| self.index.find_node(&normalize(path)))
    }

    /// Songs at or below `path`, empty when the path is unknown.
    #[must_use]
    pub fn folder_songs(&self, path: &str) -> &[Arc<TreeNode>] {
        match self.find_node(path) {
            Some(node) => folder_songs(&self.songs, node),
            None => &[],
        }
    }

    /// Paths of the songs at or below `path`.
    #[must_use]
    pub fn folder_song_paths(&self, path: &str) -> Vec<String> {
        self.folder_songs(path)
            .iter()
            .map(|song| song.path().to_string())
            .collect()
    }

    /// Songs in the tree whose title contains `query`.
    ///
    /// Records dropped while building the tree are never returned.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<Arc<TaggedRecord>> {
        let songs: Vec<Arc<TaggedRecord>> = self
            .songs
            .iter()
            .filter_map(|song| song.record().cloned())
            .collect();
        search(query, &songs)
    }

    /// Whether `records` is the same record list this snapshot was built from.
    ///
    /// `records` must already be sorted with [`compare_paths`].
    #[must_use]
    pub fn has_same_records(&self, records: &[TaggedRecord]) -> bool {
        self.records.len() == records.len()
            && self
                .records
                .iter()
                .zip(records)
                .all(|(current, other)| current.as_ref() == other)
    }

    /// Whether building from `declared_roots` and `records` would reproduce
    /// this snapshot.
    ///
    /// `records` must already be sorted with [`compare_paths`].
    #[must_use]
    pub fn is_built_from(&self, declared_roots: &[String], records: &[TaggedRecord]) -> bool {
        let mut roots = declared_roots.to_vec();
        roots.sort_by(|a, b| compare_paths(a, b));
        self.declared_roots == roots && self.has_same_records(records)
    }

    /// Whether `path` names a song in this snapshot.
    #[must_use]
    pub fn contains_song(&self, path: &str) -> bool {
        self.find_node(path).is_some_and(|node| !node.is_folder())
    }
}
