//! Slash-separated path helpers.
//!
//! Record paths are plain strings relative to a storage volume
//! (`Music/Album/01.flac`), so everything here works on `&str` segments
//! rather than `std::path`.

use std::{cmp::Ordering, collections::BTreeSet};

use tracing::warn;

/// Display name used when a root has no meaningful last segment.
pub const ROOT_PLACEHOLDER: &str = "root";

/// Iterates over the non-empty segments of `path`.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

/// Collapses repeated and trailing slashes, keeping a leading one.
#[must_use]
pub fn normalize(path: &str) -> String {
    let joined = segments(path).collect::<Vec<_>>().join("/");
    if path.starts_with('/') {
        format!("/{joined}")
    } else {
        joined
    }
}

/// Joins a child name onto a parent path.
#[must_use]
pub fn join(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else if parent.ends_with('/') {
        format!("{parent}{name}")
    } else {
        format!("{parent}/{name}")
    }
}

/// Returns the longest segment-aligned common prefix of the files' folders.
///
/// Every path is reduced to its parent folder first, so a single path
/// resolves to its own parent and an empty list resolves to `""`. Absolute
/// inputs keep their leading slash.
#[must_use]
pub fn common_prefix<S: AsRef<str>>(paths: &[S]) -> String {
    let Some(first) = paths.first() else {
        return String::new();
    };
    let first = first.as_ref();

    let parent = |path: &str| -> Vec<String> {
        let mut parts: Vec<String> = segments(path).map(str::to_string).collect();
        parts.pop();
        parts
    };

    let mut prefix = parent(first);
    for path in &paths[1..] {
        let other = parent(path.as_ref());
        let shared = prefix
            .iter()
            .zip(other.iter())
            .take_while(|(a, b)| a == b)
            .count();
        prefix.truncate(shared);
        if prefix.is_empty() {
            break;
        }
    }

    let joined = prefix.join("/");
    if first.starts_with('/') {
        format!("/{joined}")
    } else {
        joined
    }
}

/// Display name of a resolved root: its last segment, or the placeholder.
#[must_use]
pub fn root_display_name(prefix: &str) -> String {
    if prefix.is_empty() || prefix.ends_with('/') {
        return ROOT_PLACEHOLDER.to_string();
    }
    segments(prefix)
        .last()
        .unwrap_or(ROOT_PLACEHOLDER)
        .to_string()
}

/// Whether `path` lies strictly below `root` on a segment boundary.
///
/// An empty root contains every non-empty path.
#[must_use]
pub fn is_within(path: &str, root: &str) -> bool {
    relative_to(path, root).is_some_and(|rest| !rest.is_empty())
}

/// Returns `path` with `root` and the joining slash removed.
#[must_use]
pub fn relative_to<'a>(path: &'a str, root: &str) -> Option<&'a str> {
    let root = root.trim_end_matches('/');
    if root.is_empty() {
        return Some(path.trim_start_matches('/'));
    }
    path.strip_prefix(root)?.strip_prefix('/')
}

/// Makes an absolute declared root relative to the first storage volume that
/// contains it.
#[must_use]
pub fn strip_volume_prefix(root: &str, volumes: &[String]) -> Option<String> {
    volumes.iter().find_map(|volume| {
        let volume = volume.trim_end_matches('/');
        let rest = root.strip_prefix(volume)?;
        if rest.is_empty() || rest == "/" {
            return Some(String::new());
        }
        rest.strip_prefix('/')
            .map(|relative| relative.trim_end_matches('/').to_string())
    })
}

/// Turns the user's declared roots into volume-relative partition roots.
///
/// Roots on no known volume are skipped with a warning. Duplicates are
/// removed and a root nested inside another declared root is folded into
/// its ancestor, so every record belongs to at most one partition. The
/// result is sorted with [`compare_paths`].
#[must_use]
pub fn resolve_declared_roots(declared: &BTreeSet<String>, volumes: &[String]) -> Vec<String> {
    let mut relative: Vec<String> = declared
        .iter()
        .filter_map(|root| {
            let resolved = strip_volume_prefix(root, volumes);
            if resolved.is_none() {
                warn!(root = %root, "Declared root is not on any storage volume, skipping");
            }
            resolved
        })
        .collect();
    relative.sort_by(|a, b| compare_paths(a, b));
    relative.dedup();

    let mut roots: Vec<String> = Vec::with_capacity(relative.len());
    for root in relative {
        if !roots.iter().any(|kept| is_within(&root, kept)) {
            roots.push(root);
        }
    }
    roots
}

/// Orders two sibling names: case-insensitive first, exact bytes on ties.
#[must_use]
pub fn compare_names(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
        .then_with(|| a.cmp(b))
}

/// Orders two paths segment by segment with [`compare_names`].
///
/// This is the order a pre-order walk of a sorted tree visits its leaves
/// in, so a folder's descendants form one contiguous run.
#[must_use]
pub fn compare_paths(a: &str, b: &str) -> Ordering {
    let mut left = segments(a);
    let mut right = segments(b);
    loop {
        match (left.next(), right.next()) {
            (Some(x), Some(y)) => match compare_names(x, y) {
                Ordering::Equal => continue,
                other => return other,
            },
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (None, None) => return Ordering::Equal,
        }
    }
}
