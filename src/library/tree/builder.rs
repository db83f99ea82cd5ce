//! Tree construction from tagged records.
//!
//! Records are inserted into a mutable draft keyed by path segment, then the
//! draft is consumed bottom-up into immutable [`TreeNode`]s: siblings are
//! sorted and the folder aggregates computed in the same post-order pass.

use std::{collections::HashMap, sync::Arc};

use tracing::debug;

use crate::library::{
    models::TaggedRecord,
    paths::{common_prefix, compare_names, is_within, join, relative_to, root_display_name, segments},
    tree::node::{FolderNode, LeafNode, TreeNode},
};

/// Trees built for a set of declared roots.
#[derive(Debug, Clone, Default)]
pub struct Forest {
    /// One tree per declared root that received at least one record.
    pub roots: Vec<Arc<TreeNode>>,
    /// Number of records that matched no declared root.
    pub dropped: usize,
}

/// Children of a folder under construction, in insertion order.
#[derive(Debug, Default)]
struct Draft {
    entries: Vec<(String, DraftNode)>,
    lookup: HashMap<String, usize>,
}

/// A node under construction. Never carries a record and children at once.
#[derive(Debug, Default)]
struct DraftNode {
    record: Option<Arc<TaggedRecord>>,
    children: Draft,
}

impl Draft {
    /// Gets or creates the node for `name`.
    fn slot(&mut self, name: &str) -> &mut DraftNode {
        let index = match self.lookup.get(name) {
            Some(&index) => index,
            None => {
                self.entries.push((name.to_string(), DraftNode::default()));
                let index = self.entries.len() - 1;
                self.lookup.insert(name.to_string(), index);
                index
            }
        };
        &mut self.entries[index].1
    }
}

/// Builds a single tree rooted at the longest common folder of `records`.
///
/// An empty slice yields an empty root folder named after the placeholder.
/// A folder's representative album id is the first non-zero one among its
/// children in sorted order, so permuting `records` yields the same tree.
#[must_use]
pub fn build_tree(records: &[Arc<TaggedRecord>]) -> TreeNode {
    let paths: Vec<&str> = records.iter().map(|record| record.path.as_str()).collect();
    let prefix = common_prefix(&paths);
    build_rooted_tree(&prefix, records)
}

/// Builds a tree rooted at `root` from the records below it.
///
/// Records outside `root` are skipped. When two records share a path the
/// later one wins.
pub fn build_rooted_tree<'a, I>(root: &str, records: I) -> TreeNode
where
    I: IntoIterator<Item = &'a Arc<TaggedRecord>>,
{
    let mut draft = Draft::default();

    for record in records {
        let Some(relative) = relative_to(&record.path, root) else {
            debug!(path = %record.path, root = %root, "Record outside of tree root, skipping");
            continue;
        };
        let parts: Vec<&str> = segments(relative).collect();
        if parts.is_empty() {
            debug!(path = %record.path, "Record has no file name below root, skipping");
            continue;
        }
        insert(&mut draft, &parts, Arc::clone(record));
    }

    let root_path = if root.len() > 1 {
        root.trim_end_matches('/')
    } else {
        root
    };
    TreeNode::Folder(finalize_folder(
        root_display_name(root),
        root_path.to_string(),
        draft,
    ))
}

/// Partitions records by declared root and builds one tree per partition.
///
/// Each record goes to the first root it lies strictly below; records
/// matching no root are counted in [`Forest::dropped`]. Roots that receive no
/// records produce no tree.
#[must_use]
pub fn build_forest(declared_roots: &[String], records: &[Arc<TaggedRecord>]) -> Forest {
    let mut partitions: Vec<Vec<&Arc<TaggedRecord>>> = vec![Vec::new(); declared_roots.len()];
    let mut dropped = 0;

    for record in records {
        let partition = declared_roots
            .iter()
            .position(|root| is_within(&record.path, root))
            .and_then(|index| partitions.get_mut(index));
        match partition {
            Some(partition) => partition.push(record),
            None => {
                dropped += 1;
                debug!(path = %record.path, "Record matches no declared root, dropping");
            }
        }
    }

    let roots = declared_roots
        .iter()
        .zip(partitions)
        .filter(|(_, partition)| !partition.is_empty())
        .map(|(root, partition)| Arc::new(build_rooted_tree(root, partition)))
        .collect();

    Forest { roots, dropped }
}

fn insert(draft: &mut Draft, parts: &[&str], record: Arc<TaggedRecord>) {
    let Some((name, rest)) = parts.split_first() else {
        return;
    };
    let node = draft.slot(name);

    if rest.is_empty() {
        if !node.children.entries.is_empty() {
            debug!(path = %record.path, "File replaces a folder with the same path");
            node.children = Draft::default();
        }
        if let Some(previous) = node.record.replace(record) {
            debug!(path = %previous.path, "Duplicate path, keeping the later record");
        }
    } else {
        if let Some(previous) = node.record.take() {
            debug!(path = %previous.path, "File path reused as a folder, dropping the file");
        }
        insert(&mut node.children, rest, record);
    }
}

fn finalize(name: String, path: String, node: DraftNode) -> TreeNode {
    match node.record {
        Some(record) => TreeNode::Leaf(LeafNode { name, path, record }),
        None => TreeNode::Folder(finalize_folder(name, path, node.children)),
    }
}

fn finalize_folder(name: String, path: String, draft: Draft) -> FolderNode {
    let mut children: Vec<Arc<TreeNode>> = draft
        .entries
        .into_iter()
        .map(|(child_name, child)| {
            let child_path = join(&path, &child_name);
            Arc::new(finalize(child_name, child_path, child))
        })
        .collect();
    children.sort_by(|a, b| compare_names(a.name(), b.name()));

    // Aggregated in display order so the result only depends on the record set.
    let music_total = children.iter().map(|child| child.music_total()).sum();
    let duration_total = children.iter().map(|child| child.duration_total()).sum();
    let representative_album_id = children
        .iter()
        .map(|child| child.representative_album_id())
        .find(|&album_id| album_id != 0)
        .unwrap_or(0);

    FolderNode {
        name,
        path,
        children,
        music_total,
        duration_total,
        representative_album_id,
    }
}
