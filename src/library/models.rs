//! Data models for the music catalogue.
//!
//! This module defines the raw file-presence entries reported by the media
//! index, the tag data produced by a tag extractor, and the fully tagged
//! record that everything above the cache consumes.

use serde::{Deserialize, Serialize};

use crate::library::paths::{join, normalize};

/// One audio file's identity, tags, audio properties and file properties.
///
/// Records are never mutated after construction; an edited file is
/// represented by a replacement record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TaggedRecord {
    /// Platform-assigned media id.
    pub media_id: i64,
    /// Id grouping tracks visually (album artwork).
    pub album_id: i64,
    /// Track title.
    pub title: String,
    /// Album name.
    pub album: String,
    /// Album artist.
    pub album_artist: String,
    /// Track artists in tag order.
    pub artists: Vec<String>,
    /// Release date, free-form.
    pub date: String,
    /// Track number, free-form (e.g. "3" or "3/12").
    pub track: String,
    /// Disc number, free-form.
    pub disc: String,
    /// Duration in milliseconds.
    pub duration_ms: i64,
    /// Bitrate in kbps (0 or -1 when unknown).
    pub bitrate_kbps: i32,
    /// Sample rate in Hz (0 or -1 when unknown).
    pub sample_rate_hz: i32,
    /// Number of audio channels (0 or -1 when unknown).
    pub channel_count: i32,
    /// Bits per sample (0 or -1 when unknown).
    pub bits_per_sample: i32,
    /// Slash-separated path relative to the storage volume.
    pub path: String,
    /// Folder part of `path`, with a trailing slash.
    pub folder: String,
    /// File name part of `path`.
    pub file_name: String,
    /// Last modification time, epoch milliseconds.
    pub date_modified_ms: i64,
    /// File size in bytes.
    pub size_bytes: i64,
}

/// A raw file-presence entry reported by the media index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MediaFile {
    /// Platform-assigned media id.
    pub id: i64,
    /// Id grouping tracks visually.
    pub album_id: i64,
    /// Folder relative to the storage volume, e.g. `Music/Album/`.
    pub relative_path: String,
    /// File name, e.g. `01 Intro.flac`.
    pub file_name: String,
    /// Last modification time, epoch milliseconds.
    pub date_modified_ms: i64,
    /// File size in bytes.
    pub size_bytes: i64,
}

impl MediaFile {
    /// Full relative path of the file (`relative_path` + `file_name`),
    /// with repeated slashes collapsed.
    #[must_use]
    pub fn path(&self) -> String {
        normalize(&join(&self.relative_path, &self.file_name))
    }
}

/// Tag and audio-property data read from one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ExtractedTags {
    /// Track title.
    pub title: String,
    /// Album name.
    pub album: String,
    /// Album artist.
    pub album_artist: String,
    /// Track artists in tag order.
    pub artists: Vec<String>,
    /// Release date, free-form.
    pub date: String,
    /// Track number, free-form.
    pub track: String,
    /// Disc number, free-form.
    pub disc: String,
    /// Duration in milliseconds.
    pub duration_ms: i64,
    /// Bitrate in kbps.
    pub bitrate_kbps: i32,
    /// Sample rate in Hz.
    pub sample_rate_hz: i32,
    /// Number of audio channels.
    pub channel_count: i32,
    /// Bits per sample.
    pub bits_per_sample: i32,
}

impl TaggedRecord {
    /// Combines a media index entry with the tags extracted from its file.
    #[must_use]
    pub fn from_parts(file: &MediaFile, tags: ExtractedTags) -> Self {
        let mut folder = normalize(&file.relative_path);
        if !folder.is_empty() && !folder.ends_with('/') {
            folder.push('/');
        }

        Self {
            media_id: file.id,
            album_id: file.album_id,
            title: tags.title,
            album: tags.album,
            album_artist: tags.album_artist,
            artists: tags.artists,
            date: tags.date,
            track: tags.track,
            disc: tags.disc,
            duration_ms: tags.duration_ms.max(0),
            bitrate_kbps: tags.bitrate_kbps,
            sample_rate_hz: tags.sample_rate_hz,
            channel_count: tags.channel_count,
            bits_per_sample: tags.bits_per_sample,
            path: file.path(),
            folder,
            file_name: file.file_name.clone(),
            date_modified_ms: file.date_modified_ms,
            size_bytes: file.size_bytes,
        }
    }

    /// Title to show in lists, falling back to the file name for untagged files.
    #[must_use]
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            &self.file_name
        } else {
            &self.title
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{from_str, to_string};

    use crate::library::models::{ExtractedTags, MediaFile, TaggedRecord};

    fn media_file() -> MediaFile {
        MediaFile {
            id: 7,
            album_id: 3,
            relative_path: "Music/Album/".to_string(),
            file_name: "01.flac".to_string(),
            date_modified_ms: 1_700_000_000_000,
            size_bytes: 1024,
        }
    }

    #[test]
    fn test_media_file_path() {
        assert_eq!(media_file().path(), "Music/Album/01.flac");

        let without_slash = MediaFile {
            relative_path: "Music/Album".to_string(),
            ..media_file()
        };
        assert_eq!(without_slash.path(), "Music/Album/01.flac");

        let doubled = MediaFile {
            relative_path: "Music//Album//".to_string(),
            ..media_file()
        };
        assert_eq!(doubled.path(), "Music/Album/01.flac");
        assert_eq!(
            TaggedRecord::from_parts(&doubled, ExtractedTags::default()).folder,
            "Music/Album/"
        );

        let at_volume_root = MediaFile {
            relative_path: String::new(),
            ..media_file()
        };
        assert_eq!(at_volume_root.path(), "01.flac");
    }

    #[test]
    fn test_record_from_parts() {
        let tags = ExtractedTags {
            title: "Intro".to_string(),
            artists: vec!["A".to_string(), "B".to_string()],
            duration_ms: 61_000,
            ..ExtractedTags::default()
        };

        let record = TaggedRecord::from_parts(&media_file(), tags);
        assert_eq!(record.media_id, 7);
        assert_eq!(record.album_id, 3);
        assert_eq!(record.path, "Music/Album/01.flac");
        assert_eq!(record.folder, "Music/Album/");
        assert_eq!(record.file_name, "01.flac");
        assert_eq!(record.duration_ms, 61_000);
        assert_eq!(record.artists, vec!["A", "B"]);
    }

    #[test]
    fn test_negative_duration_is_clamped() {
        let tags = ExtractedTags {
            duration_ms: -1,
            ..ExtractedTags::default()
        };
        assert_eq!(TaggedRecord::from_parts(&media_file(), tags).duration_ms, 0);
    }

    #[test]
    fn test_record_equality_compares_artists_elementwise() {
        let a = TaggedRecord {
            artists: vec!["A".to_string(), "B".to_string()],
            ..TaggedRecord::default()
        };
        let mut b = a.clone();
        assert_eq!(a, b);

        b.artists = vec!["B".to_string(), "A".to_string()];
        assert_ne!(a, b);
    }

    #[test]
    fn test_display_title_falls_back_to_file_name() {
        let record = TaggedRecord {
            title: "  ".to_string(),
            file_name: "track.mp3".to_string(),
            ..TaggedRecord::default()
        };
        assert_eq!(record.display_title(), "track.mp3");
    }

    #[test]
    fn test_record_serialization() {
        let record = TaggedRecord::from_parts(&media_file(), ExtractedTags::default());
        let serialized = to_string(&record).unwrap();
        let deserialized: TaggedRecord = from_str(&serialized).unwrap();
        assert_eq!(record, deserialized);
    }
}
