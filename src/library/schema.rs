//! Database schema definition and versioning for the record cache.
//!
//! This module defines the SQLite schema backing the persistent record cache
//! and provides schema versioning so stale caches are detected.

use std::{
    fs::create_dir_all,
    path::{Path, PathBuf},
};

use {
    sqlx::{
        SqlitePool,
        sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous},
    },
    thiserror::Error,
    tracing::{debug, info},
};

use crate::config::settings::get_cache_dir;

/// Error type for schema operations.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// Database connection error.
    #[error("Database connection error: {0}")]
    ConnectionError(#[from] sqlx::Error),
    /// Cache directory could not be created.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    /// Schema migration error.
    #[error("Schema migration error: {reason}")]
    MigrationError { reason: String },
}

/// Current schema version.
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Database schema definition.
pub struct SchemaManager {
    pool: SqlitePool,
}

impl SchemaManager {
    /// Creates a new schema manager.
    ///
    /// # Arguments
    ///
    /// * `pool` - The SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Initializes the database schema.
    ///
    /// Creates the tables on a fresh database. A cache written by an older
    /// schema version is dropped and recreated, since every record in it can
    /// be rebuilt by the next sync.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError` if schema initialization fails or the database
    /// was written by a newer version.
    pub async fn initialize_schema(&self) -> Result<(), SchemaError> {
        let version = self.get_current_version().await?;

        if version == CURRENT_SCHEMA_VERSION {
            debug!(version, "Record cache schema is current");
            return Ok(());
        }
        if version > CURRENT_SCHEMA_VERSION {
            return Err(SchemaError::MigrationError {
                reason: format!("database schema version {version} is newer than supported"),
            });
        }

        if version > 0 {
            info!(from = version, to = CURRENT_SCHEMA_VERSION, "Rebuilding outdated record cache");
        }
        self.create_tables().await?;
        Ok(())
    }

    /// Drops any previous tables and creates the current ones.
    async fn create_tables(&self) -> Result<(), SchemaError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DROP TABLE IF EXISTS records")
            .execute(&mut *tx)
            .await?;
        sqlx::query("DROP TABLE IF EXISTS schema_version")
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE schema_version (
                version INTEGER NOT NULL
            )
            "#,
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE records (
                path TEXT PRIMARY KEY NOT NULL,
                media_id INTEGER NOT NULL,
                album_id INTEGER NOT NULL,
                title TEXT NOT NULL,
                album TEXT NOT NULL,
                album_artist TEXT NOT NULL,
                artists TEXT NOT NULL,
                date TEXT NOT NULL,
                track TEXT NOT NULL,
                disc TEXT NOT NULL,
                duration_ms INTEGER NOT NULL,
                bitrate_kbps INTEGER NOT NULL,
                sample_rate_hz INTEGER NOT NULL,
                channel_count INTEGER NOT NULL,
                bits_per_sample INTEGER NOT NULL,
                folder TEXT NOT NULL,
                file_name TEXT NOT NULL,
                date_modified_ms INTEGER NOT NULL,
                size_bytes INTEGER NOT NULL
            )
            "#,
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query("CREATE INDEX idx_records_folder ON records (folder)")
            .execute(&mut *tx)
            .await?;

        sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
            .bind(CURRENT_SCHEMA_VERSION)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Gets the current schema version.
    ///
    /// # Returns
    ///
    /// The current schema version, or 0 if not initialized.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError` if the version table cannot be read.
    pub async fn get_current_version(&self) -> Result<i32, SchemaError> {
        let has_version_table: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'schema_version')",
        )
        .fetch_one(&self.pool)
        .await?;
        if !has_version_table {
            return Ok(0);
        }

        let version: Option<i32> = sqlx::query_scalar("SELECT version FROM schema_version LIMIT 1")
            .fetch_optional(&self.pool)
            .await?;
        Ok(version.unwrap_or(0))
    }
}

/// Gets the default database path under the XDG cache directory.
#[must_use]
pub fn get_database_path() -> PathBuf {
    get_cache_dir().join("library.db")
}

/// Creates a connection pool for the database file at `path`.
///
/// # Errors
///
/// Returns `SchemaError` if the parent directory cannot be created or the
/// database cannot be opened.
pub async fn create_connection_pool(path: &Path) -> Result<SqlitePool, SchemaError> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    debug!("Opening record cache at {:?}", path);

    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal);

    let pool = SqlitePool::connect_with(options).await?;
    Ok(pool)
}

/// Creates a single-connection pool over a private in-memory database.
///
/// # Errors
///
/// Returns `SchemaError` if SQLite cannot be opened.
pub async fn create_memory_pool() -> Result<SqlitePool, SchemaError> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;
    Ok(pool)
}
