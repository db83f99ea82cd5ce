//! Persistent record cache using sqlx with SQLite.
//!
//! This module provides `RecordDatabase`, the SQLite-backed implementation
//! of the record cache used by the sync engine.

use std::{collections::HashMap, path::Path};

use {
    async_trait::async_trait,
    serde_json::{from_str, to_string},
    sqlx::{FromRow, SqlitePool},
    tracing::debug,
};

use crate::{
    error::domain::LibraryError,
    library::{
        models::TaggedRecord,
        schema::{SchemaManager, create_connection_pool, create_memory_pool},
        sources::RecordCache,
    },
};

/// SQLite parameter limit headroom for batched deletes.
const DELETE_CHUNK_SIZE: usize = 500;

/// One row of the `records` table.
#[derive(Debug, FromRow)]
struct RecordRow {
    path: String,
    media_id: i64,
    album_id: i64,
    title: String,
    album: String,
    album_artist: String,
    artists: String,
    date: String,
    track: String,
    disc: String,
    duration_ms: i64,
    bitrate_kbps: i32,
    sample_rate_hz: i32,
    channel_count: i32,
    bits_per_sample: i32,
    folder: String,
    file_name: String,
    date_modified_ms: i64,
    size_bytes: i64,
}

impl TryFrom<RecordRow> for TaggedRecord {
    type Error = LibraryError;

    fn try_from(row: RecordRow) -> Result<Self, Self::Error> {
        let artists: Vec<String> = from_str(&row.artists).map_err(|e| LibraryError::InvalidData {
            reason: format!("artists of {}: {e}", row.path),
        })?;

        Ok(Self {
            media_id: row.media_id,
            album_id: row.album_id,
            title: row.title,
            album: row.album,
            album_artist: row.album_artist,
            artists,
            date: row.date,
            track: row.track,
            disc: row.disc,
            duration_ms: row.duration_ms,
            bitrate_kbps: row.bitrate_kbps,
            sample_rate_hz: row.sample_rate_hz,
            channel_count: row.channel_count,
            bits_per_sample: row.bits_per_sample,
            path: row.path,
            folder: row.folder,
            file_name: row.file_name,
            date_modified_ms: row.date_modified_ms,
            size_bytes: row.size_bytes,
        })
    }
}

/// SQLite-backed record cache.
pub struct RecordDatabase {
    pool: SqlitePool,
}

impl RecordDatabase {
    /// Opens (or creates) the record cache at `path`.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError` if the database cannot be opened or its schema
    /// initialized.
    pub async fn open(path: &Path) -> Result<Self, LibraryError> {
        let pool = create_connection_pool(path).await?;
        Self::with_pool(pool).await
    }

    /// Creates a record cache backed by a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError` if SQLite cannot be initialized.
    pub async fn in_memory() -> Result<Self, LibraryError> {
        let pool = create_memory_pool().await?;
        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self, LibraryError> {
        SchemaManager::new(pool.clone()).initialize_schema().await?;
        Ok(RecordDatabase { pool })
    }

    /// Gets the database connection pool for advanced operations.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl RecordCache for RecordDatabase {
    async fn get_all(&self) -> Result<Vec<TaggedRecord>, LibraryError> {
        let rows: Vec<RecordRow> = sqlx::query_as(
            r#"
            SELECT path, media_id, album_id, title, album, album_artist, artists, date, track, disc,
                   duration_ms, bitrate_kbps, sample_rate_hz, channel_count, bits_per_sample,
                   folder, file_name, date_modified_ms, size_bytes
            FROM records
            ORDER BY path
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TaggedRecord::try_from).collect()
    }

    async fn upsert_all(&self, records: &[TaggedRecord]) -> Result<(), LibraryError> {
        let mut tx = self.pool.begin().await?;

        for record in records {
            let artists = to_string(&record.artists).map_err(|e| LibraryError::InvalidData {
                reason: format!("artists of {}: {e}", record.path),
            })?;

            sqlx::query(
                r#"
                INSERT INTO records (
                    path, media_id, album_id, title, album, album_artist, artists, date, track, disc,
                    duration_ms, bitrate_kbps, sample_rate_hz, channel_count, bits_per_sample,
                    folder, file_name, date_modified_ms, size_bytes
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(path) DO UPDATE SET
                    media_id = excluded.media_id,
                    album_id = excluded.album_id,
                    title = excluded.title,
                    album = excluded.album,
                    album_artist = excluded.album_artist,
                    artists = excluded.artists,
                    date = excluded.date,
                    track = excluded.track,
                    disc = excluded.disc,
                    duration_ms = excluded.duration_ms,
                    bitrate_kbps = excluded.bitrate_kbps,
                    sample_rate_hz = excluded.sample_rate_hz,
                    channel_count = excluded.channel_count,
                    bits_per_sample = excluded.bits_per_sample,
                    folder = excluded.folder,
                    file_name = excluded.file_name,
                    date_modified_ms = excluded.date_modified_ms,
                    size_bytes = excluded.size_bytes
                "#,
            )
            .bind(&record.path)
            .bind(record.media_id)
            .bind(record.album_id)
            .bind(&record.title)
            .bind(&record.album)
            .bind(&record.album_artist)
            .bind(artists)
            .bind(&record.date)
            .bind(&record.track)
            .bind(&record.disc)
            .bind(record.duration_ms)
            .bind(record.bitrate_kbps)
            .bind(record.sample_rate_hz)
            .bind(record.channel_count)
            .bind(record.bits_per_sample)
            .bind(&record.folder)
            .bind(&record.file_name)
            .bind(record.date_modified_ms)
            .bind(record.size_bytes)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        debug!(count = records.len(), "Upserted records");
        Ok(())
    }

    async fn delete_by_paths(&self, paths: &[String]) -> Result<(), LibraryError> {
        let mut tx = self.pool.begin().await?;

        for chunk in paths.chunks(DELETE_CHUNK_SIZE) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let sql = format!("DELETE FROM records WHERE path IN ({placeholders})");
            let mut query = sqlx::query(&sql);
            for path in chunk {
                query = query.bind(path);
            }
            query.execute(&mut *tx).await?;
        }

        tx.commit().await?;
        debug!(count = paths.len(), "Deleted records");
        Ok(())
    }

    async fn get_paths_with_mod_times(&self) -> Result<HashMap<String, i64>, LibraryError> {
        let rows: Vec<(String, i64)> = sqlx::query_as("SELECT path, date_modified_ms FROM records")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().collect())
    }

    async fn count(&self) -> Result<i64, LibraryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM records")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
