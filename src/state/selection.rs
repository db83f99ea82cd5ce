//! Path-keyed multi-selection for batch actions on songs.

use std::collections::HashSet;

/// Set of selected song paths plus the selection-mode flag.
///
/// Toggling items never changes the mode; only [`Selection::set_mode`] and
/// [`Selection::clear`] do.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    items: HashSet<String>,
    in_selection_mode: bool,
}

impl Selection {
    /// Adds `path` if absent, removes it otherwise.
    pub fn toggle(&mut self, path: &str) {
        if !self.items.remove(path) {
            self.items.insert(path.to_string());
        }
    }

    /// Removes every path when all are selected, adds them all otherwise.
    pub fn toggle_all<S: AsRef<str>>(&mut self, paths: &[S]) {
        if self.contains_all(paths) {
            for path in paths {
                self.items.remove(path.as_ref());
            }
        } else {
            self.items
                .extend(paths.iter().map(|path| path.as_ref().to_string()));
        }
    }

    /// Replaces the selection with `paths`.
    pub fn set<I, S>(&mut self, paths: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.items = paths.into_iter().map(Into::into).collect();
    }

    /// Empties the selection; `keep_mode` leaves selection mode on.
    pub fn clear(&mut self, keep_mode: bool) {
        self.items.clear();
        self.in_selection_mode = keep_mode;
    }

    pub fn set_mode(&mut self, in_selection_mode: bool) {
        self.in_selection_mode = in_selection_mode;
    }

    #[must_use]
    pub fn in_selection_mode(&self) -> bool {
        self.in_selection_mode
    }

    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.items.contains(path)
    }

    /// Whether every path in `paths` is selected. True for an empty list.
    #[must_use]
    pub fn contains_all<S: AsRef<str>>(&self, paths: &[S]) -> bool {
        paths.iter().all(|path| self.items.contains(path.as_ref()))
    }

    /// Drops selected paths that fail `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.items.retain(|path| keep(path));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Selected paths in sorted order.
    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.items.iter().cloned().collect();
        paths.sort();
        paths
    }
}
