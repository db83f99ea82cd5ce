//! Configuration for sync cycles.

use crate::config::settings::UserSettings;

/// Configuration for sync cycles.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Maximum number of files handed to one blocking extraction task.
    pub max_batch_size: usize,
    /// Storage volumes that declared roots are made relative to.
    pub volume_roots: Vec<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 50,
            volume_roots: vec!["/".to_string()],
        }
    }
}

impl From<&UserSettings> for SyncConfig {
    fn from(settings: &UserSettings) -> Self {
        Self {
            max_batch_size: settings.sync_batch_size.max(1),
            volume_roots: settings.volume_roots.clone(),
        }
    }
}
