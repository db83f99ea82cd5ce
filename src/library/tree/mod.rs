//! Hierarchical folder/file view of the catalogue.
//!
//! Trees are built once per sync cycle and never mutated afterwards.

mod builder;
mod node;

pub use {
    builder::{Forest, build_forest, build_rooted_tree, build_tree},
    node::{FolderNode, LeafNode, TreeNode},
};
