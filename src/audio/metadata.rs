//! Audio file tag extraction using the `lofty` crate.
//!
//! This module reads the free-form tag strings (title, album, artists, date,
//! track and disc numbers) and the audio properties (duration, bitrate,
//! sample rate, channels, bit depth) that make up a tagged record.

use std::path::{Path, PathBuf};

use {
    lofty::{
        error::LoftyError,
        prelude::{Accessor, AudioFile, ItemKey, TaggedFileExt},
        probe::Probe,
        tag::Tag,
    },
    thiserror::Error,
};

use crate::library::{
    models::{ExtractedTags, MediaFile},
    scanner::locate,
    sources::TagExtractor,
};

/// Error type for metadata extraction operations.
#[derive(Error, Debug)]
pub enum MetadataError {
    /// Failed to read or parse the audio file.
    #[error("Failed to read audio file: {0}")]
    ReadError(#[from] LoftyError),
    /// The file format is not supported.
    #[error("Unsupported file format")]
    UnsupportedFormat,
    /// The file is not on any storage volume.
    #[error("File not found on any volume: {path}")]
    FileNotFound { path: String },
}

/// Tag extractor reading files from the mounted storage volumes.
#[derive(Debug, Clone)]
pub struct LoftyTagExtractor {
    volumes: Vec<PathBuf>,
}

impl LoftyTagExtractor {
    /// Creates an extractor resolving volume-relative paths against `volumes`.
    pub fn new<I, P>(volumes: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            volumes: volumes.into_iter().map(Into::into).collect(),
        }
    }
}

impl TagExtractor for LoftyTagExtractor {
    fn extract_tags(&self, file: &MediaFile) -> Result<ExtractedTags, MetadataError> {
        let relative = file.path();
        let Some((_, path)) = locate(&self.volumes, &relative) else {
            return Err(MetadataError::FileNotFound { path: relative });
        };
        read_tags(&path)
    }
}

/// Reads tags and audio properties from the file at `path`.
///
/// Missing tags become empty strings; the date falls back to the year, and
/// the artist list falls back to the single artist field.
///
/// # Errors
///
/// Returns `MetadataError` if:
/// - The file cannot be opened or parsed
/// - The file type cannot be determined
pub fn read_tags(path: &Path) -> Result<ExtractedTags, MetadataError> {
    let probe = Probe::open(path)?
        .guess_file_type()
        .map_err(LoftyError::from)?;
    if probe.file_type().is_none() {
        return Err(MetadataError::UnsupportedFormat);
    }

    let tagged_file = probe.read()?;
    let properties = tagged_file.properties();

    let mut tags = ExtractedTags {
        duration_ms: i64::try_from(properties.duration().as_millis()).unwrap_or(i64::MAX),
        bitrate_kbps: to_i32(properties.audio_bitrate()),
        sample_rate_hz: to_i32(properties.sample_rate()),
        channel_count: to_i32(properties.channels().map(u32::from)),
        bits_per_sample: to_i32(properties.bit_depth().map(u32::from)),
        ..ExtractedTags::default()
    };

    if let Some(tag) = tagged_file.primary_tag().or_else(|| tagged_file.first_tag()) {
        fill_from_tag(&mut tags, tag);
    }

    Ok(tags)
}

fn fill_from_tag(tags: &mut ExtractedTags, tag: &Tag) {
    tags.title = tag.title().map(|s| s.to_string()).unwrap_or_default();
    tags.album = tag.album().map(|s| s.to_string()).unwrap_or_default();

    tags.artists = tag
        .get_strings(&ItemKey::TrackArtist)
        .map(str::to_string)
        .collect();
    if tags.artists.is_empty()
        && let Some(artist) = tag.artist()
    {
        tags.artists.push(artist.to_string());
    }

    tags.album_artist = tag
        .get_string(&ItemKey::AlbumArtist)
        .map(str::to_string)
        .or_else(|| tags.artists.first().cloned())
        .unwrap_or_default();

    tags.date = tag
        .get_string(&ItemKey::RecordingDate)
        .or_else(|| tag.get_string(&ItemKey::Year))
        .map(str::to_string)
        .unwrap_or_default();
    tags.track = raw_string(tag, &ItemKey::TrackNumber);
    tags.disc = raw_string(tag, &ItemKey::DiscNumber);
}

fn raw_string(tag: &Tag, key: &ItemKey) -> String {
    tag.get_string(key).map(str::to_string).unwrap_or_default()
}

/// Unknown properties are reported as 0.
fn to_i32(value: Option<u32>) -> i32 {
    value.map_or(0, |v| i32::try_from(v).unwrap_or(i32::MAX))
}

#[cfg(test)]
mod tests {
    use std::fs::write;

    use tempfile::tempdir;

    use crate::{
        audio::metadata::{LoftyTagExtractor, MetadataError, read_tags},
        library::{sources::TagExtractor, test_support::media_file},
    };

    /// One second of silent 8 kHz mono 16-bit PCM.
    fn silent_wav() -> Vec<u8> {
        let data_len: u32 = 16_000;
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
        bytes.extend_from_slice(b"WAVE");
        bytes.extend_from_slice(b"fmt ");
        bytes.extend_from_slice(&16u32.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&8_000u32.to_le_bytes());
        bytes.extend_from_slice(&16_000u32.to_le_bytes());
        bytes.extend_from_slice(&2u16.to_le_bytes());
        bytes.extend_from_slice(&16u16.to_le_bytes());
        bytes.extend_from_slice(b"data");
        bytes.extend_from_slice(&data_len.to_le_bytes());
        bytes.resize(bytes.len() + data_len as usize, 0);
        bytes
    }

    #[test]
    fn test_metadata_error_display() {
        let error = MetadataError::UnsupportedFormat;
        assert_eq!(error.to_string(), "Unsupported file format");

        let not_found_error = MetadataError::FileNotFound {
            path: "Music/gone.wav".to_string(),
        };
        assert_eq!(
            not_found_error.to_string(),
            "File not found on any volume: Music/gone.wav"
        );
    }

    #[test]
    fn test_read_tags_from_untagged_wav() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("silence.wav");
        write(&path, silent_wav()).unwrap();

        let tags = read_tags(&path).unwrap();
        assert_eq!(tags.sample_rate_hz, 8_000);
        assert_eq!(tags.channel_count, 1);
        assert_eq!(tags.bits_per_sample, 16);
        assert!((990..=1_010).contains(&tags.duration_ms));
        assert!(tags.title.is_empty());
        assert!(tags.artists.is_empty());
    }

    #[test]
    fn test_read_tags_rejects_garbage() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fake.mp3");
        write(&path, b"definitely not audio").unwrap();

        assert!(read_tags(&path).is_err());
    }

    #[test]
    fn test_extractor_resolves_against_volumes() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("Music")).unwrap();
        write(dir.path().join("Music/silence.wav"), silent_wav()).unwrap();

        let extractor = LoftyTagExtractor::new([dir.path()]);
        let tags = extractor
            .extract_tags(&media_file(1, "Music/", "silence.wav", 0))
            .unwrap();
        assert_eq!(tags.sample_rate_hz, 8_000);

        let missing = extractor.extract_tags(&media_file(2, "Music/", "gone.wav", 0));
        assert!(
            matches!(missing, Err(MetadataError::FileNotFound { path }) if path == "Music/gone.wav")
        );
    }
}
