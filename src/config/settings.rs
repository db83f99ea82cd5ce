//! User preference management with XDG Base Directory compliance.
//!
//! This module provides user settings management with proper XDG directory
//! usage for config and cache files.

use std::{
    collections::BTreeSet,
    env::var,
    fs::{create_dir_all, read_to_string, write},
    io::Error as StdError,
    path::PathBuf,
};

use {
    parking_lot::{RwLock, RwLockReadGuard},
    serde::{Deserialize, Serialize},
    serde_json::{Error as SerdeJsonError, from_str, to_string_pretty},
    thiserror::Error,
    tracing::debug,
};

use crate::library::sources::PreferenceStore;

/// Error type for settings operations.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// Failed to read or write settings file.
    #[error("IO error: {0}")]
    IoError(#[from] StdError),
    /// Failed to serialize or deserialize settings.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] SerdeJsonError),
    /// Invalid settings value.
    #[error("Invalid settings value: {reason}")]
    InvalidValue { reason: String },
}

/// Serializable user settings structure with default values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    /// Declared library roots, as absolute paths.
    pub library_directories: Vec<String>,
    /// Storage volumes whose prefix is stripped from declared roots.
    pub volume_roots: Vec<String>,
    /// Files handed to one blocking tag extraction task.
    pub sync_batch_size: usize,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            library_directories: vec![],
            volume_roots: vec!["/".to_string()],
            sync_batch_size: 50,
        }
    }
}

impl UserSettings {
    fn validate(&self) -> Result<(), SettingsError> {
        if self.library_directories.iter().any(|root| root.trim().is_empty()) {
            return Err(SettingsError::InvalidValue {
                reason: "library directory must not be empty".to_string(),
            });
        }
        if self.volume_roots.iter().any(|root| root.trim().is_empty()) {
            return Err(SettingsError::InvalidValue {
                reason: "volume root must not be empty".to_string(),
            });
        }
        if self.sync_batch_size == 0 {
            return Err(SettingsError::InvalidValue {
                reason: "sync batch size must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Handles loading, saving, and validation of user preferences.
#[derive(Debug)]
pub struct SettingsManager {
    /// Thread-safe user settings storage.
    settings: RwLock<UserSettings>,
    /// Path to the configuration file on disk.
    config_path: PathBuf,
}

impl Clone for SettingsManager {
    fn clone(&self) -> Self {
        Self {
            settings: RwLock::new(self.settings.read().clone()),
            config_path: self.config_path.clone(),
        }
    }
}

impl SettingsManager {
    /// Creates a new settings manager with default config path.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `SettingsManager` or a `SettingsError`.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if settings cannot be loaded from disk.
    pub fn new() -> Result<Self, SettingsError> {
        Self::with_config_path(get_config_path())
    }

    /// Creates a new settings manager with a custom config path (for testing).
    ///
    /// # Arguments
    ///
    /// * `config_path` - Custom path for the settings file
    ///
    /// # Returns
    ///
    /// A `Result` containing the `SettingsManager` or a `SettingsError`.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if settings cannot be loaded from disk.
    pub fn with_config_path(config_path: PathBuf) -> Result<Self, SettingsError> {
        // Ensure config directory exists
        if let Some(parent) = config_path.parent() {
            create_dir_all(parent)?;
        }

        let settings = if config_path.exists() {
            debug!("Loading settings from existing file: {:?}", config_path);
            let contents = read_to_string(&config_path)?;
            from_str(&contents)?
        } else {
            debug!("Creating new default settings file: {:?}", config_path);
            UserSettings::default()
        };

        Ok(SettingsManager {
            settings: RwLock::new(settings),
            config_path,
        })
    }

    /// Gets the current settings.
    ///
    /// # Returns
    ///
    /// A reference to the current `UserSettings`.
    pub fn get_settings(&self) -> RwLockReadGuard<'_, UserSettings> {
        self.settings.read()
    }

    /// Validates the settings, applies them and saves them to disk.
    ///
    /// # Arguments
    ///
    /// * `new_settings` - New settings to apply.
    ///
    /// # Returns
    ///
    /// A `Result` indicating success or failure.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::InvalidValue` for a blank library directory or
    /// volume root, or a zero batch size, and `SettingsError` if settings
    /// cannot be saved to disk. Invalid settings are never applied.
    pub fn update_settings(&self, new_settings: UserSettings) -> Result<(), SettingsError> {
        new_settings.validate()?;

        let mut settings_write = self.settings.write();
        *settings_write = new_settings;
        drop(settings_write);
        self.save_settings()
    }

    /// Saves the current settings to disk.
    ///
    /// # Returns
    ///
    /// A `Result` indicating success or failure.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if settings cannot be saved to disk.
    fn save_settings(&self) -> Result<(), SettingsError> {
        debug!("Saving settings to file: {:?}", self.config_path);
        let contents = to_string_pretty(&*self.settings.read())?;
        write(&self.config_path, contents)?;
        Ok(())
    }
}

impl PreferenceStore for SettingsManager {
    fn get_declared_roots(&self) -> BTreeSet<String> {
        self.settings.read().library_directories.iter().cloned().collect()
    }

    fn set_declared_roots(&self, roots: BTreeSet<String>) -> Result<(), SettingsError> {
        let mut settings = self.settings.read().clone();
        settings.library_directories = roots.into_iter().collect();
        self.update_settings(settings)
    }
}

/// Ensures proper XDG directory usage for config and cache files.
///
/// # Returns
///
/// The path to the configuration file.
#[must_use]
pub fn get_config_path() -> PathBuf {
    let mut config_dir = get_xdg_config_home();
    config_dir.push("sonata");
    config_dir.push("settings.json");
    config_dir
}

/// Gets the cache directory path.
///
/// # Returns
///
/// The path to the cache directory.
#[must_use]
pub fn get_cache_dir() -> PathBuf {
    let mut cache_dir = get_xdg_cache_home();
    cache_dir.push("sonata");
    cache_dir
}

/// Gets the XDG config home directory following XDG Base Directory specification.
///
/// Uses `XDG_CONFIG_HOME` environment variable if set, otherwise defaults to $HOME/.config
fn get_xdg_config_home() -> PathBuf {
    if let Ok(config_home) = var("XDG_CONFIG_HOME")
        && !config_home.is_empty()
    {
        return PathBuf::from(config_home);
    }

    if let Ok(home) = var("HOME") {
        let mut path = PathBuf::from(home);
        path.push(".config");
        return path;
    }

    // Fallback to current directory if HOME is not set (shouldn't happen on Unix)
    PathBuf::from(".")
}

/// Gets the XDG cache home directory following XDG Base Directory specification.
///
/// Uses `XDG_CACHE_HOME` environment variable if set, otherwise defaults to $HOME/.cache
fn get_xdg_cache_home() -> PathBuf {
    if let Ok(cache_home) = var("XDG_CACHE_HOME")
        && !cache_home.is_empty()
    {
        return PathBuf::from(cache_home);
    }

    if let Ok(home) = var("HOME") {
        let mut path = PathBuf::from(home);
        path.push(".cache");
        return path;
    }

    // Fallback to current directory if HOME is not set (shouldn't happen on Unix)
    PathBuf::from(".")
}
