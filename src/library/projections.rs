//! Read-only views derived from the tree for list screens.

use std::{cmp::Ordering, sync::Arc};

use crate::library::{models::TaggedRecord, paths::compare_paths, tree::TreeNode};

/// Collects every leaf in pre-order, i.e. sorted by [`compare_paths`].
#[must_use]
pub fn flatten_leaves(roots: &[Arc<TreeNode>]) -> Vec<Arc<TreeNode>> {
    let mut leaves = Vec::new();
    let mut stack: Vec<&Arc<TreeNode>> = roots.iter().rev().collect();

    while let Some(node) = stack.pop() {
        if node.is_folder() {
            stack.extend(node.children().iter().rev());
        } else {
            leaves.push(Arc::clone(node));
        }
    }

    leaves
}

/// Returns the contiguous run of `songs` that lies at or below `node`.
///
/// `songs` must be the flattened leaf list of the tree `node` belongs to. The
/// first descendant is located by binary search and the run is
/// `music_total` entries long.
#[must_use]
pub fn folder_songs<'a>(songs: &'a [Arc<TreeNode>], node: &TreeNode) -> &'a [Arc<TreeNode>] {
    let start = songs.partition_point(|song| compare_paths(song.path(), node.path()) == Ordering::Less);
    let count = usize::try_from(node.music_total()).unwrap_or(usize::MAX);
    let end = start.saturating_add(count).min(songs.len());
    songs.get(start..end).unwrap_or_default()
}

/// Case-insensitive substring match over record titles.
///
/// A blank query matches nothing.
#[must_use]
pub fn search(query: &str, records: &[Arc<TaggedRecord>]) -> Vec<Arc<TaggedRecord>> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    records
        .iter()
        .filter(|record| record.title.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

/// Formats milliseconds as `mm:ss`, or `hh:mm:ss` from one hour on.
#[must_use]
pub fn format_duration(duration_ms: i64) -> String {
    let seconds = duration_ms.max(0) / 1000;
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours == 0 {
        format!("{minutes:02}:{secs:02}")
    } else {
        format!("{hours:02}:{minutes:02}:{secs:02}")
    }
}

/// Short "count | duration" label shown under folder names.
#[must_use]
pub fn folder_summary(node: &TreeNode) -> String {
    format!(
        "{} | {}",
        node.music_total(),
        format_duration(node.duration_total())
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::library::{
        paths::compare_paths,
        projections::{flatten_leaves, folder_songs, folder_summary, format_duration, search},
        test_support::{record, titled},
        tree::{TreeNode, build_forest, build_tree},
    };

    fn leaf_paths(node: &TreeNode, out: &mut Vec<String>) {
        if node.is_folder() {
            for child in node.children() {
                leaf_paths(child, out);
            }
        } else {
            out.push(node.path().to_string());
        }
    }

    fn library() -> Vec<Arc<TreeNode>> {
        let records = vec![
            record("Music/b/2.mp3", 1, 0),
            record("Music/A/z.mp3", 1, 0),
            record("Music/Ab/x.mp3", 1, 0),
            record("Music/a b.mp3", 1, 0),
            record("Music/A/y.mp3", 1, 0),
            record("Music/A/deep/1.mp3", 1, 0),
        ];
        vec![Arc::new(build_tree(&records))]
    }

    #[test]
    fn test_flatten_matches_preorder_and_path_order() {
        let roots = library();
        let flat: Vec<String> = flatten_leaves(&roots)
            .iter()
            .map(|leaf| leaf.path().to_string())
            .collect();

        let mut preorder = Vec::new();
        leaf_paths(&roots[0], &mut preorder);
        assert_eq!(flat, preorder);

        let mut sorted = flat.clone();
        sorted.sort_by(|a, b| compare_paths(a, b));
        assert_eq!(flat, sorted);

        assert_eq!(
            flat,
            vec![
                "Music/A/deep/1.mp3",
                "Music/A/y.mp3",
                "Music/A/z.mp3",
                "Music/a b.mp3",
                "Music/Ab/x.mp3",
                "Music/b/2.mp3",
            ]
        );
    }

    #[test]
    fn test_folder_songs_is_contiguous_slice() {
        let roots = library();
        let songs = flatten_leaves(&roots);

        let folder = roots[0].child("A").unwrap();
        let paths: Vec<&str> = folder_songs(&songs, folder).iter().map(|song| song.path()).collect();
        assert_eq!(paths, vec!["Music/A/deep/1.mp3", "Music/A/y.mp3", "Music/A/z.mp3"]);

        let everything = folder_songs(&songs, &roots[0]);
        assert_eq!(everything.len(), songs.len());

        let leaf = roots[0].child("a b.mp3").unwrap();
        let single: Vec<&str> = folder_songs(&songs, leaf).iter().map(|song| song.path()).collect();
        assert_eq!(single, vec!["Music/a b.mp3"]);
    }

    #[test]
    fn test_folder_songs_across_multiple_roots() {
        let records = vec![
            record("Music/A/1.mp3", 1, 0),
            record("Music/B/2.mp3", 1, 0),
            record("Podcasts/ep1.mp3", 1, 0),
            record("Podcasts/ep2.mp3", 1, 0),
        ];
        let forest = build_forest(&["Music".to_string(), "Podcasts".to_string()], &records);
        let songs = flatten_leaves(&forest.roots);
        assert_eq!(songs.len(), 4);

        let podcasts = folder_songs(&songs, &forest.roots[1]);
        let paths: Vec<&str> = podcasts.iter().map(|song| song.path()).collect();
        assert_eq!(paths, vec!["Podcasts/ep1.mp3", "Podcasts/ep2.mp3"]);
    }

    #[test]
    fn test_folder_songs_empty_tree() {
        let root = build_tree(&[]);
        assert!(folder_songs(&[], &root).is_empty());
    }

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let records = vec![
            titled("Music/1.mp3", "Blue Monday"),
            titled("Music/2.mp3", "Kind of Blue"),
            titled("Music/3.mp3", "Red"),
        ];

        let found = search("blue", &records);
        let hits: Vec<&str> = found
            .iter()
            .map(|record| record.path.as_str())
            .collect();
        assert_eq!(hits, vec!["Music/1.mp3", "Music/2.mp3"]);

        assert_eq!(search("  RED ", &records).len(), 1);
        assert!(search("green", &records).is_empty());
    }

    #[test]
    fn test_search_empty_query_returns_nothing() {
        let records = vec![titled("Music/1.mp3", "Anything")];
        assert!(search("", &records).is_empty());
        assert!(search("   ", &records).is_empty());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "00:00");
        assert_eq!(format_duration(61_500), "01:01");
        assert_eq!(format_duration(3_599_999), "59:59");
        assert_eq!(format_duration(3_600_000), "01:00:00");
        assert_eq!(format_duration(-5), "00:00");
    }

    #[test]
    fn test_folder_summary() {
        let tree = build_tree(&[record("Music/A/1.mp3", 60_000, 0), record("Music/B/2.mp3", 30_000, 0)]);
        assert_eq!(folder_summary(&tree), "2 | 01:30");
    }
}
