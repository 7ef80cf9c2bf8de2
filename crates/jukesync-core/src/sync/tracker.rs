//! Scan and status-transition logic over the record store.
//!
//! Scans are finite and one-shot: callers re-invoke to recheck. Rows in
//! `needs_delete_sync` are recognized by every scan but produce no action;
//! delete propagation is intentionally unimplemented, and the branch exists
//! so the state neither crashes a scan nor gets silently reclassified.

use tracing::{debug, warn};

use crate::error::StoreError;
use crate::model::{
    ClientRequestId, LibrarySong, LibrarySongId, PlaylistAddRequest, RequestStatus, SyncStatus,
};
use crate::storage::RecordStore;

/// Library songs that still need an add pushed to the server.
pub fn pending_library_adds(store: &RecordStore) -> Result<Vec<LibrarySong>, StoreError> {
    let mut pending = Vec::new();
    for song in store.unsynced_library_songs()? {
        match song.sync_status {
            SyncStatus::NeedsAddSync => pending.push(song),
            SyncStatus::NeedsDeleteSync => {
                // Recognized, no action: delete sync is not implemented.
                debug!(id = song.id, "skipping library row pending delete sync");
            }
            SyncStatus::Synced => {}
        }
    }
    Ok(pending)
}

/// Pool entries that still need an add pushed to the server.
pub fn pending_pool_adds(store: &RecordStore) -> Result<Vec<LibrarySongId>, StoreError> {
    let mut pending = Vec::new();
    for entry in store.unsynced_pool_entries()? {
        match entry.sync_status {
            SyncStatus::NeedsAddSync => pending.push(entry.library_id),
            SyncStatus::NeedsDeleteSync => {
                debug!(
                    library_id = entry.library_id,
                    "skipping pool row pending delete sync"
                );
            }
            SyncStatus::Synced => {}
        }
    }
    Ok(pending)
}

/// Playlist add requests not yet acknowledged by the server.
pub fn pending_playlist_adds(store: &RecordStore) -> Result<Vec<PlaylistAddRequest>, StoreError> {
    store.playlist_requests_with_status(RequestStatus::NeedsSync)
}

/// Transition the given library rows to `synced`.
///
/// Idempotent: marking an already-synced id is a no-op on its row, and the
/// whole batch either commits or leaves every row unchanged.
pub fn mark_library_synced(
    store: &RecordStore,
    ids: &[LibrarySongId],
) -> Result<usize, StoreError> {
    store.set_library_sync_status(ids, SyncStatus::Synced)
}

/// Record that a library add batch failed.
///
/// The rows keep their `needs_add_sync` status so the next scan retries
/// them; nothing is written.
pub fn mark_library_failed(_store: &RecordStore, ids: &[LibrarySongId], reason: &str) {
    warn!(?ids, reason, "library add batch failed; rows stay pending");
}

/// Transition the given pool rows to `synced`. Idempotent.
pub fn mark_pool_synced(store: &RecordStore, ids: &[LibrarySongId]) -> Result<usize, StoreError> {
    store.set_pool_sync_status(ids, SyncStatus::Synced)
}

/// Record that a pool add batch failed. The rows keep `needs_add_sync`;
/// nothing is written.
pub fn mark_pool_failed(_store: &RecordStore, ids: &[LibrarySongId], reason: &str) {
    warn!(?ids, reason, "pool add batch failed; rows stay pending");
}

/// Record that a playlist add batch failed. The requests keep
/// `needs_sync`; nothing is written.
pub fn mark_requests_failed(_store: &RecordStore, request_ids: &[ClientRequestId], reason: &str) {
    warn!(
        ?request_ids,
        reason, "playlist add batch failed; requests stay pending"
    );
}

/// Transition the given add requests to `synced`. Idempotent.
pub fn mark_requests_synced(
    store: &RecordStore,
    request_ids: &[ClientRequestId],
) -> Result<usize, StoreError> {
    store.set_request_status(request_ids, RequestStatus::Synced)
}
