//! Flat path-to-node lookup over one or more trees.

use std::{collections::HashMap, sync::Arc};

use crate::library::tree::TreeNode;

/// Maps every node's path (folders and leaves) to the node itself.
///
/// Built in one traversal right after the trees it indexes and replaced
/// together with them.
#[derive(Debug, Clone, Default)]
pub struct TreeIndex {
    nodes: HashMap<String, Arc<TreeNode>>,
}

impl TreeIndex {
    /// Indexes a single tree.
    #[must_use]
    pub fn build(root: &Arc<TreeNode>) -> Self {
        Self::build_all(std::slice::from_ref(root))
    }

    /// Indexes several trees into one map.
    #[must_use]
    pub fn build_all(roots: &[Arc<TreeNode>]) -> Self {
        let mut nodes = HashMap::new();
        let mut stack: Vec<&Arc<TreeNode>> = roots.iter().rev().collect();

        while let Some(node) = stack.pop() {
            nodes.insert(node.path().to_string(), Arc::clone(node));
            stack.extend(node.children().iter().rev());
        }

        Self { nodes }
    }

    /// Looks up a node by its path.
    #[must_use]
    pub fn find_node(&self, path: &str) -> Option<&Arc<TreeNode>> {
        self.nodes.get(path)
    }

    /// Number of indexed nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::library::{
        index::TreeIndex,
        test_support::record,
        tree::{TreeNode, build_forest, build_tree},
    };

    fn count_nodes(node: &TreeNode) -> usize {
        1 + node.children().iter().map(|child| count_nodes(child)).sum::<usize>()
    }

    fn assert_every_node_found(index: &TreeIndex, node: &Arc<TreeNode>) {
        let found = index.find_node(node.path()).unwrap();
        assert!(Arc::ptr_eq(found, node), "wrong node for {}", node.path());
        for child in node.children() {
            assert_every_node_found(index, child);
        }
    }

    #[test]
    fn test_find_node_returns_every_node() {
        let records = vec![
            record("Music/A/1.mp3", 1, 0),
            record("Music/A/sub/2.mp3", 1, 0),
            record("Music/B/3.mp3", 1, 0),
        ];
        let root = Arc::new(build_tree(&records));
        let index = TreeIndex::build(&root);

        assert_eq!(index.len(), count_nodes(&root));
        assert_every_node_found(&index, &root);
        assert!(index.find_node("Music/A/sub").unwrap().is_folder());
    }

    #[test]
    fn test_find_node_missing_path() {
        let root = Arc::new(build_tree(&[record("Music/A/1.mp3", 1, 0)]));
        let index = TreeIndex::build(&root);
        assert!(index.find_node("Music/Nope").is_none());
        assert!(index.find_node("").is_none());
    }

    #[test]
    fn test_build_all_indexes_every_root() {
        let records = vec![record("Music/1.mp3", 1, 0), record("Podcasts/2.mp3", 1, 0)];
        let forest = build_forest(&["Music".to_string(), "Podcasts".to_string()], &records);
        let index = TreeIndex::build_all(&forest.roots);

        assert_eq!(index.len(), 4);
        for root in &forest.roots {
            assert_every_node_found(&index, root);
        }
    }

    #[test]
    fn test_empty_index() {
        let index = TreeIndex::build_all(&[]);
        assert!(index.is_empty());
    }
}
