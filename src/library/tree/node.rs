//! Immutable folder/file tree nodes.

use std::sync::Arc;

use crate::library::{models::TaggedRecord, paths::compare_names};

/// A node of the library tree: either a folder or a single file.
///
/// Nodes are shared behind `Arc` so the same node can be reachable from its
/// parent, the path index and the flattened song list at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeNode {
    /// A directory aggregating its descendant files.
    Folder(FolderNode),
    /// A single audio file.
    Leaf(LeafNode),
}

/// A directory node with aggregates over its descendant leaves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderNode {
    pub(crate) name: String,
    pub(crate) path: String,
    /// Sorted with [`compare_names`].
    pub(crate) children: Vec<Arc<TreeNode>>,
    pub(crate) music_total: u64,
    pub(crate) duration_total: i64,
    pub(crate) representative_album_id: i64,
}

/// A file node carrying its originating record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafNode {
    pub(crate) name: String,
    pub(crate) path: String,
    pub(crate) record: Arc<TaggedRecord>,
}

impl TreeNode {
    /// Single path segment used as the display label.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Folder(folder) => &folder.name,
            Self::Leaf(leaf) => &leaf.name,
        }
    }

    /// Full path of the node; stable across rebuilds for the same file or folder.
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::Folder(folder) => &folder.path,
            Self::Leaf(leaf) => &leaf.path,
        }
    }

    /// Whether this node is a folder.
    #[must_use]
    pub fn is_folder(&self) -> bool {
        matches!(self, Self::Folder(_))
    }

    /// The originating record of a leaf.
    #[must_use]
    pub fn record(&self) -> Option<&Arc<TaggedRecord>> {
        match self {
            Self::Folder(_) => None,
            Self::Leaf(leaf) => Some(&leaf.record),
        }
    }

    /// Children in display order; empty for leaves.
    #[must_use]
    pub fn children(&self) -> &[Arc<TreeNode>] {
        match self {
            Self::Folder(folder) => &folder.children,
            Self::Leaf(_) => &[],
        }
    }

    /// Looks up a direct child by name.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&Arc<TreeNode>> {
        let children = self.children();
        children
            .binary_search_by(|child| compare_names(child.name(), name))
            .ok()
            .and_then(|index| children.get(index))
    }

    /// Number of leaves at or below this node.
    #[must_use]
    pub fn music_total(&self) -> u64 {
        match self {
            Self::Folder(folder) => folder.music_total,
            Self::Leaf(_) => 1,
        }
    }

    /// Summed duration of the leaves at or below this node, in milliseconds.
    #[must_use]
    pub fn duration_total(&self) -> i64 {
        match self {
            Self::Folder(folder) => folder.duration_total,
            Self::Leaf(leaf) => leaf.record.duration_ms.max(0),
        }
    }

    /// Album id used for this node's artwork, 0 when none is known.
    #[must_use]
    pub fn representative_album_id(&self) -> i64 {
        match self {
            Self::Folder(folder) => folder.representative_album_id,
            Self::Leaf(leaf) => leaf.record.album_id,
        }
    }

    /// Empty folder with zero totals.
    #[must_use]
    pub fn empty_folder(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::Folder(FolderNode {
            name: name.into(),
            path: path.into(),
            children: Vec::new(),
            music_total: 0,
            duration_total: 0,
            representative_album_id: 0,
        })
    }
}
