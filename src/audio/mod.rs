//! Audio file inspection.
//!
//! Reads tags and audio properties from files on disk with `lofty`.

pub mod metadata;
