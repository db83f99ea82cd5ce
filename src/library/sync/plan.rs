//! Diffing the media index against the record cache.

use std::collections::{HashMap, HashSet};

use crate::library::models::MediaFile;

/// What a sync cycle has to do, split into three disjoint sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    /// Files missing from the cache or modified since they were cached.
    pub new_or_changed: Vec<MediaFile>,
    /// Paths whose cached record is still current.
    pub unchanged: Vec<String>,
    /// Cached paths no longer present in the media index, sorted.
    pub deleted: Vec<String>,
}

impl SyncPlan {
    /// Whether the cache already matches the media index.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.new_or_changed.is_empty() && self.deleted.is_empty()
    }
}

/// Classifies the current media index entries against the cached mod times.
///
/// When the index reports the same path twice, the first entry is used.
#[must_use]
pub fn diff(current: &[MediaFile], cached: &HashMap<String, i64>) -> SyncPlan {
    let mut plan = SyncPlan::default();
    let mut seen: HashSet<String> = HashSet::with_capacity(current.len());

    for file in current {
        let path = file.path();
        if !seen.insert(path.clone()) {
            continue;
        }
        match cached.get(&path) {
            Some(&modified) if modified == file.date_modified_ms => plan.unchanged.push(path),
            _ => plan.new_or_changed.push(file.clone()),
        }
    }

    plan.deleted = cached
        .keys()
        .filter(|path| !seen.contains(*path))
        .cloned()
        .collect();
    plan.deleted.sort();

    plan
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use crate::library::{
        models::MediaFile,
        sync::plan::diff,
        test_support::media_file,
    };

    fn cached(entries: &[(&str, i64)]) -> HashMap<String, i64> {
        entries
            .iter()
            .map(|(path, modified)| ((*path).to_string(), *modified))
            .collect()
    }

    #[test]
    fn test_diff_classifies_entries() {
        let current = vec![
            media_file(1, "Music/A/", "new.mp3", 100),
            media_file(2, "Music/A/", "same.mp3", 200),
            media_file(3, "Music/B/", "edited.mp3", 301),
        ];
        let cache = cached(&[
            ("Music/A/same.mp3", 200),
            ("Music/B/edited.mp3", 300),
            ("Music/B/gone.mp3", 400),
        ]);

        let plan = diff(&current, &cache);

        let changed: Vec<String> = plan.new_or_changed.iter().map(MediaFile::path).collect();
        assert_eq!(changed, vec!["Music/A/new.mp3", "Music/B/edited.mp3"]);
        assert_eq!(plan.unchanged, vec!["Music/A/same.mp3"]);
        assert_eq!(plan.deleted, vec!["Music/B/gone.mp3"]);
        assert!(!plan.is_noop());
    }

    #[test]
    fn test_diff_is_noop_when_cache_current() {
        let current = vec![media_file(1, "Music/", "a.mp3", 1), media_file(2, "Music/", "b.mp3", 2)];
        let cache = cached(&[("Music/a.mp3", 1), ("Music/b.mp3", 2)]);

        let plan = diff(&current, &cache);
        assert!(plan.is_noop());
        assert_eq!(plan.unchanged.len(), 2);
    }

    #[test]
    fn test_diff_empty_index_deletes_everything() {
        let cache = cached(&[("Music/b.mp3", 2), ("Music/a.mp3", 1)]);
        let plan = diff(&[], &cache);
        assert!(plan.new_or_changed.is_empty());
        assert_eq!(plan.deleted, vec!["Music/a.mp3", "Music/b.mp3"]);
    }

    #[test]
    fn test_diff_empty_cache_marks_everything_new() {
        let current = vec![media_file(1, "Music/", "a.mp3", 1)];
        let plan = diff(&current, &HashMap::new());
        assert_eq!(plan.new_or_changed.len(), 1);
        assert!(plan.unchanged.is_empty());
        assert!(plan.deleted.is_empty());
    }

    #[test]
    fn test_diff_ignores_duplicate_index_entries() {
        let current = vec![media_file(1, "Music/", "a.mp3", 1), media_file(9, "Music/", "a.mp3", 5)];
        let plan = diff(&current, &HashMap::new());
        assert_eq!(plan.new_or_changed.len(), 1);
        assert_eq!(plan.new_or_changed[0].id, 1);
    }
}
