//! User preferences and XDG directory handling.
//!
//! This module provides user preference management with XDG Base Directory
//! compliance, and exposes the declared library roots to the sync layer.

pub mod settings;

pub use settings::{SettingsError, SettingsManager, UserSettings, get_cache_dir, get_config_path};
