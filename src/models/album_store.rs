//! SQLite-backed album catalog.
//!
//! This module provides the `AlbumStore` struct which keeps:
//! - Album snapshots (title, description, ordered image URLs)
//! - The saved comparison queue, in queue order

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use tracing::{debug, info, warn};
use xxhash_rust::xxh3::xxh3_64;

use crate::models::{Album, ComparisonQueue};

/// SQLite-backed storage for albums and the comparison queue.
///
/// The database is stored at `XDG_CONFIG_HOME/albumcmp/catalog.sqlite` by
/// default and uses WAL mode.
pub struct AlbumStore {
    conn: Connection,
}

/// Counts reported by [`AlbumStore::upsert_albums`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertSummary {
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
}

impl AlbumStore {
    /// Opens or creates the database at the default XDG location.
    pub fn open_default() -> Result<Self> {
        let db_path = Self::default_db_path()?;
        Self::open(&db_path)
    }

    /// Returns the default database path based on XDG directories.
    pub fn default_db_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("", "", "albumcmp")
            .context("Failed to determine project directories")?;

        let config_dir = proj_dirs.config_dir();
        std::fs::create_dir_all(config_dir)
            .with_context(|| format!("Failed to create config directory: {:?}", config_dir))?;

        Ok(config_dir.join("catalog.sqlite"))
    }

    /// Opens or creates the database at the specified path.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create database directory: {:?}", parent))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database at {:?}", path))?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
            PRAGMA foreign_keys = ON;
            ",
        )
        .context("Failed to configure SQLite pragmas")?;

        let store = Self { conn };
        store.create_tables()?;

        info!("Opened album catalog at {:?}", path);
        Ok(store)
    }

    fn create_tables(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "
            CREATE TABLE IF NOT EXISTS albums (
                id TEXT PRIMARY KEY NOT NULL,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                image_urls TEXT NOT NULL,
                content_hash TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_albums_title ON albums(title);

            -- Saved comparison queue, one row per queued album
            CREATE TABLE IF NOT EXISTS queue (
                position INTEGER PRIMARY KEY NOT NULL,
                album_id TEXT NOT NULL UNIQUE,
                FOREIGN KEY (album_id) REFERENCES albums(id) ON DELETE CASCADE
            );
            ",
            )
            .context("Failed to create database tables")?;

        debug!("Database tables created/verified");
        Ok(())
    }

    // =========================================================================
    // Albums
    // =========================================================================

    /// Inserts new albums and updates changed ones in a single transaction.
    pub fn upsert_albums(&mut self, albums: &[Album]) -> Result<UpsertSummary> {
        if albums.is_empty() {
            return Ok(UpsertSummary::default());
        }

        let tx = self.conn.transaction()?;
        let summary = Self::upsert_albums_in_tx(&tx, albums)?;
        tx.commit()?;

        debug!(
            inserted = summary.inserted,
            updated = summary.updated,
            unchanged = summary.unchanged,
            "Upserted albums"
        );
        Ok(summary)
    }

    fn upsert_albums_in_tx(tx: &Transaction, albums: &[Album]) -> Result<UpsertSummary> {
        let mut lookup = tx.prepare_cached("SELECT content_hash FROM albums WHERE id = ?1")?;
        let mut upsert = tx.prepare_cached(
            "
            INSERT INTO albums (id, title, description, image_urls, content_hash, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                image_urls = excluded.image_urls,
                content_hash = excluded.content_hash,
                updated_at = excluded.updated_at
            ",
        )?;

        let now = Self::now();
        let mut summary = UpsertSummary::default();
        for album in albums {
            let hash = content_hash(album);
            let existing: Option<String> = lookup
                .query_row(params![album.id], |row| row.get(0))
                .optional()?;

            match existing {
                Some(ref h) if *h == hash => {
                    summary.unchanged += 1;
                    continue;
                }
                Some(_) => summary.updated += 1,
                None => summary.inserted += 1,
            }

            let urls = serde_json::to_string(&album.image_urls)
                .context("Failed to encode image URLs")?;
            upsert.execute(params![album.id, album.title, album.description, urls, hash, now])?;
        }

        Ok(summary)
    }

    pub fn get_album(&self, id: &str) -> Result<Option<Album>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, title, description, image_urls FROM albums WHERE id = ?1",
                params![id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()
            .context("Failed to get album")?;

        row.map(row_to_album).transpose()
    }

    /// All albums, ordered by title.
    pub fn list_albums(&self) -> Result<Vec<Album>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, title, description, image_urls FROM albums ORDER BY title, id")?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to list albums")?;

        rows.into_iter().map(row_to_album).collect()
    }

    /// Deletes an album; it also leaves the saved queue.
    pub fn delete_album(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM albums WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    pub fn count_albums(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM albums", [], |row| row.get(0))?;
        Ok(count)
    }

    // =========================================================================
    // Comparison queue
    // =========================================================================

    /// Replaces the saved queue with `queue`.
    pub fn save_queue(&mut self, queue: &ComparisonQueue) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM queue", [])?;
        {
            let mut stmt = tx.prepare_cached("INSERT INTO queue (position, album_id) VALUES (?1, ?2)")?;
            for (position, id) in queue.ids().enumerate() {
                stmt.execute(params![position as i64, id])
                    .with_context(|| format!("Failed to queue album {}", id))?;
            }
        }
        tx.commit()?;

        debug!(albums = queue.len(), "Saved comparison queue");
        Ok(())
    }

    /// Loads the saved queue. Ids whose album is gone are skipped.
    pub fn load_queue(&self) -> Result<ComparisonQueue> {
        let mut stmt = self
            .conn
            .prepare("SELECT album_id FROM queue ORDER BY position")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to load queue")?;

        let mut queue = ComparisonQueue::new();
        for id in ids {
            match self.get_album(&id)? {
                Some(album) => {
                    queue.add(album);
                }
                None => warn!(%id, "Queued album no longer in catalog"),
            }
        }
        Ok(queue)
    }

    /// Current Unix timestamp in seconds.
    pub fn now() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    }
}

/// Hash of everything an album displays, as 16 hex digits.
pub fn content_hash(album: &Album) -> String {
    let mut data = Vec::with_capacity(256);
    data.extend_from_slice(album.title.as_bytes());
    data.push(0);
    data.extend_from_slice(album.description.as_bytes());
    for url in &album.image_urls {
        data.push(0);
        data.extend_from_slice(url.as_bytes());
    }
    format!("{:016x}", xxh3_64(&data))
}

fn row_to_album((id, title, description, urls): (String, String, String, String)) -> Result<Album> {
    let image_urls: Vec<String> = serde_json::from_str(&urls)
        .with_context(|| format!("Corrupt image list for album {}", id))?;
    Ok(Album {
        id,
        title,
        image_urls,
        description,
    })
}
