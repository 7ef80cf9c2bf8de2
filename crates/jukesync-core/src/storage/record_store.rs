//! SQLite-backed record store for the four local collections.
//!
//! Tables: `library` (cross-event), `available_pool`, `playlist_add_requests`
//! (both event-scoped), and `active_playlist` (server cache). A `play_queue`
//! view joins the active playlist to the library for playback ordering.
//!
//! Multi-row status updates are issued as a single transaction: either every
//! row in the submitted id set transitions, or none do. Writes report the
//! affected-row count so callers can distinguish zero-row updates.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use crate::error::StoreError;
use crate::model::{
    ActivePlaylistEntry, AvailablePoolEntry, ClientRequestId, LibrarySong, LibrarySongId,
    PlayQueueTrack, PlaylistAddRequest, RequestStatus, SyncStatus,
};

use super::{data_dir, migrations};

// === Helper Functions ===

/// Format sync status for database storage
fn format_sync_status(status: SyncStatus) -> &'static str {
    match status {
        SyncStatus::Synced => "synced",
        SyncStatus::NeedsAddSync => "needs_add_sync",
        SyncStatus::NeedsDeleteSync => "needs_delete_sync",
    }
}

/// Parse sync status from database string
fn parse_sync_status(status_str: &str) -> SyncStatus {
    match status_str {
        "synced" => SyncStatus::Synced,
        "needs_delete_sync" => SyncStatus::NeedsDeleteSync,
        _ => SyncStatus::NeedsAddSync,
    }
}

/// Format request status for database storage
fn format_request_status(status: RequestStatus) -> &'static str {
    match status {
        RequestStatus::NeedsSync => "needs_sync",
        RequestStatus::Synced => "synced",
    }
}

/// Parse request status from database string
fn parse_request_status(status_str: &str) -> RequestStatus {
    match status_str {
        "synced" => RequestStatus::Synced,
        _ => RequestStatus::NeedsSync,
    }
}

/// Parse datetime from RFC3339 string with fallback to the epoch
fn parse_datetime_fallback(dt_str: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(dt_str)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| DateTime::<Utc>::UNIX_EPOCH)
}

fn row_to_library_song(row: &rusqlite::Row) -> Result<LibrarySong, rusqlite::Error> {
    let status_str: String = row.get(6)?;
    Ok(LibrarySong {
        id: row.get(0)?,
        title: row.get(1)?,
        artist: row.get(2)?,
        album: row.get(3)?,
        file_path: row.get(4)?,
        duration_secs: row.get(5)?,
        sync_status: parse_sync_status(&status_str),
    })
}

fn row_to_playlist_entry(row: &rusqlite::Row) -> Result<ActivePlaylistEntry, rusqlite::Error> {
    let time_str: String = row.get(5)?;
    Ok(ActivePlaylistEntry {
        playlist_id: row.get(0)?,
        library_id: row.get(1)?,
        up_votes: row.get(2)?,
        down_votes: row.get(3)?,
        priority: row.get(4)?,
        time_added: parse_datetime_fallback(&time_str),
        adder_id: row.get(6)?,
    })
}

/// SQLite database holding the local library and event-scoped collections.
pub struct RecordStore {
    conn: Connection,
}

impl RecordStore {
    /// Open the store at `~/.config/jukesync/jukesync.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, StoreError> {
        let path = data_dir()
            .map_err(|e| StoreError::MigrationFailed(e.to_string()))?
            .join("jukesync.db");
        Self::open_at(&path)
    }

    /// Open the store at a specific path (for testing).
    pub fn open_at(path: &std::path::Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|source| StoreError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    /// Open an in-memory store (for tests).
    pub fn open_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS library (
                id            INTEGER PRIMARY KEY AUTOINCREMENT,
                title         TEXT NOT NULL,
                artist        TEXT NOT NULL,
                album         TEXT NOT NULL,
                file_path     TEXT NOT NULL,
                duration_secs INTEGER NOT NULL,
                sync_status   TEXT NOT NULL DEFAULT 'needs_add_sync'
            );

            CREATE TABLE IF NOT EXISTS available_pool (
                library_id  INTEGER PRIMARY KEY,
                sync_status TEXT NOT NULL DEFAULT 'needs_add_sync'
            );

            CREATE TABLE IF NOT EXISTS playlist_add_requests (
                request_id INTEGER PRIMARY KEY AUTOINCREMENT,
                library_id INTEGER NOT NULL,
                status     TEXT NOT NULL DEFAULT 'needs_sync'
            );

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS active_playlist (
                playlist_id INTEGER PRIMARY KEY,
                library_id  INTEGER NOT NULL,
                up_votes    INTEGER NOT NULL DEFAULT 0,
                down_votes  INTEGER NOT NULL DEFAULT 0,
                priority    INTEGER NOT NULL,
                time_added  TEXT NOT NULL,
                adder_id    INTEGER NOT NULL
            );

            CREATE VIEW IF NOT EXISTS play_queue AS
                SELECT active_playlist.playlist_id,
                       library.id AS library_id,
                       library.title,
                       library.artist,
                       library.file_path
                FROM active_playlist
                JOIN library ON active_playlist.library_id = library.id
                ORDER BY active_playlist.priority;",
        )?;

        migrations::migrate(&self.conn)
            .map_err(|e| StoreError::MigrationFailed(e.to_string()))?;

        Ok(())
    }

    // === Library ===

    /// Insert a newly imported song with status `needs_add_sync`, returning
    /// the assigned id.
    pub fn add_library_song(
        &self,
        title: &str,
        artist: &str,
        album: &str,
        file_path: &str,
        duration_secs: i64,
    ) -> Result<LibrarySongId, StoreError> {
        self.conn.execute(
            "INSERT INTO library (title, artist, album, file_path, duration_secs, sync_status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                title,
                artist,
                album,
                file_path,
                duration_secs,
                format_sync_status(SyncStatus::NeedsAddSync),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn library_song(
        &self,
        id: LibrarySongId,
    ) -> Result<Option<LibrarySong>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, artist, album, file_path, duration_secs, sync_status
             FROM library WHERE id = ?1",
        )?;
        let result = stmt.query_row(params![id], row_to_library_song);
        match result {
            Ok(song) => Ok(Some(song)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn list_library(&self) -> Result<Vec<LibrarySong>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, artist, album, file_path, duration_secs, sync_status
             FROM library ORDER BY id",
        )?;
        let rows = stmt.query_map([], row_to_library_song)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// All library rows whose status is not `synced`.
    pub fn unsynced_library_songs(&self) -> Result<Vec<LibrarySong>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, artist, album, file_path, duration_secs, sync_status
             FROM library WHERE sync_status != ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(
            params![format_sync_status(SyncStatus::Synced)],
            row_to_library_song,
        )?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Set the sync status of a batch of library rows atomically.
    ///
    /// Returns the number of rows affected; a count lower than the id set
    /// means some ids matched no row (not an error).
    pub fn set_library_sync_status(
        &self,
        ids: &[LibrarySongId],
        status: SyncStatus,
    ) -> Result<usize, StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        let mut affected = 0;
        {
            let mut stmt =
                tx.prepare("UPDATE library SET sync_status = ?1 WHERE id = ?2")?;
            for id in ids {
                affected += stmt.execute(params![format_sync_status(status), id])?;
            }
        }
        tx.commit()?;
        Ok(affected)
    }

    /// Delete every library row. The server is not informed.
    pub fn clear_library(&self) -> Result<usize, StoreError> {
        Ok(self.conn.execute("DELETE FROM library", [])?)
    }

    // === Available pool ===

    /// Offer library songs to the current event. Re-offering an id already
    /// in the pool leaves its row untouched.
    pub fn add_pool_entries(&self, library_ids: &[LibrarySongId]) -> Result<usize, StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO available_pool (library_id, sync_status)
                 VALUES (?1, ?2)",
            )?;
            for id in library_ids {
                inserted +=
                    stmt.execute(params![id, format_sync_status(SyncStatus::NeedsAddSync)])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    pub fn list_pool(&self) -> Result<Vec<AvailablePoolEntry>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT library_id, sync_status FROM available_pool ORDER BY library_id")?;
        let rows = stmt.query_map([], |row| {
            let status_str: String = row.get(1)?;
            Ok(AvailablePoolEntry {
                library_id: row.get(0)?,
                sync_status: parse_sync_status(&status_str),
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// All pool rows whose status is not `synced`.
    pub fn unsynced_pool_entries(&self) -> Result<Vec<AvailablePoolEntry>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT library_id, sync_status FROM available_pool
             WHERE sync_status != ?1 ORDER BY library_id",
        )?;
        let rows = stmt.query_map(params![format_sync_status(SyncStatus::Synced)], |row| {
            let status_str: String = row.get(1)?;
            Ok(AvailablePoolEntry {
                library_id: row.get(0)?,
                sync_status: parse_sync_status(&status_str),
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Set the sync status of a batch of pool rows atomically.
    pub fn set_pool_sync_status(
        &self,
        library_ids: &[LibrarySongId],
        status: SyncStatus,
    ) -> Result<usize, StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        let mut affected = 0;
        {
            let mut stmt =
                tx.prepare("UPDATE available_pool SET sync_status = ?1 WHERE library_id = ?2")?;
            for id in library_ids {
                affected += stmt.execute(params![format_sync_status(status), id])?;
            }
        }
        tx.commit()?;
        Ok(affected)
    }

    // === Playlist add requests ===

    /// Queue add requests for the shared playlist, one per library id,
    /// returning the generated client request ids in input order.
    pub fn enqueue_playlist_adds(
        &self,
        library_ids: &[LibrarySongId],
    ) -> Result<Vec<ClientRequestId>, StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        let mut request_ids = Vec::with_capacity(library_ids.len());
        {
            let mut stmt = tx.prepare(
                "INSERT INTO playlist_add_requests (library_id, status) VALUES (?1, ?2)",
            )?;
            for id in library_ids {
                stmt.execute(params![id, format_request_status(RequestStatus::NeedsSync)])?;
                request_ids.push(tx.last_insert_rowid());
            }
        }
        tx.commit()?;
        Ok(request_ids)
    }

    pub fn playlist_requests_with_status(
        &self,
        status: RequestStatus,
    ) -> Result<Vec<PlaylistAddRequest>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT request_id, library_id, status FROM playlist_add_requests
             WHERE status = ?1 ORDER BY request_id",
        )?;
        let rows = stmt.query_map(params![format_request_status(status)], |row| {
            let status_str: String = row.get(2)?;
            Ok(PlaylistAddRequest {
                request_id: row.get(0)?,
                library_id: row.get(1)?,
                status: parse_request_status(&status_str),
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Set the status of a batch of add requests atomically.
    pub fn set_request_status(
        &self,
        request_ids: &[ClientRequestId],
        status: RequestStatus,
    ) -> Result<usize, StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        let mut affected = 0;
        {
            let mut stmt = tx
                .prepare("UPDATE playlist_add_requests SET status = ?1 WHERE request_id = ?2")?;
            for id in request_ids {
                affected += stmt.execute(params![format_request_status(status), id])?;
            }
        }
        tx.commit()?;
        Ok(affected)
    }

    // === Active playlist cache ===

    /// Destructively replace the playlist cache with the server's ordering.
    /// Clear and bulk insert run in one transaction.
    pub fn replace_active_playlist(
        &self,
        entries: &[ActivePlaylistEntry],
    ) -> Result<(), StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM active_playlist", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO active_playlist
                 (playlist_id, library_id, up_votes, down_votes, priority, time_added, adder_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for entry in entries {
                stmt.execute(params![
                    entry.playlist_id,
                    entry.library_id,
                    entry.up_votes,
                    entry.down_votes,
                    entry.priority,
                    entry.time_added.to_rfc3339(),
                    entry.adder_id,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// The cached playlist in server-given order.
    pub fn active_playlist(&self) -> Result<Vec<ActivePlaylistEntry>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT playlist_id, library_id, up_votes, down_votes, priority, time_added, adder_id
             FROM active_playlist ORDER BY priority",
        )?;
        let rows = stmt.query_map([], row_to_playlist_entry)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    // === Play queue view ===

    /// Peek at the next playable track without consuming it.
    pub fn next_in_queue(&self) -> Result<Option<PlayQueueTrack>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT playlist_id, library_id, title, artist, file_path
             FROM play_queue LIMIT 1",
        )?;
        let result = stmt.query_row([], |row| {
            Ok(PlayQueueTrack {
                playlist_id: row.get(0)?,
                library_id: row.get(1)?,
                title: row.get(2)?,
                artist: row.get(3)?,
                file_path: row.get(4)?,
            })
        });
        match result {
            Ok(track) => Ok(Some(track)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Take the next playable track, removing it from the local cache.
    pub fn take_next_in_queue(&self) -> Result<Option<PlayQueueTrack>, StoreError> {
        let next = self.next_in_queue()?;
        if let Some(ref track) = next {
            self.conn.execute(
                "DELETE FROM active_playlist WHERE playlist_id = ?1",
                params![track.playlist_id],
            )?;
        }
        Ok(next)
    }

    // === KV store ===

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Remove a value from the kv store.
    pub fn kv_delete(&self, key: &str) -> Result<(), StoreError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    // === Event teardown ===

    /// Purge all event-scoped state: available pool, playlist add requests,
    /// and the active-playlist cache, regardless of sync status. The library
    /// is untouched. Runs in one transaction.
    pub fn clear_event_state(&self) -> Result<(), StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM available_pool", [])?;
        tx.execute("DELETE FROM playlist_add_requests", [])?;
        tx.execute("DELETE FROM active_playlist", [])?;
        tx.commit()?;
        Ok(())
    }
}
