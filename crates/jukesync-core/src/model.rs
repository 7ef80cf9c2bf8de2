//! Record types for the local cache.
//!
//! Three collections carry per-record sync state: the music library (lives
//! across events), the available pool, and the playlist add queue (both
//! event-scoped). The active playlist is a read-through cache of server
//! state and carries no sync flags of its own.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Row id of a song in the local library table.
pub type LibrarySongId = i64;
/// Server-assigned id of an entry in the active playlist.
pub type PlaylistEntryId = i64;
/// Client-generated id correlating a playlist add request with its ack.
pub type ClientRequestId = i64;
/// Server-assigned id of a hosted event.
pub type EventId = i64;

/// Sync state of a library or available-pool row.
///
/// `NeedsDeleteSync` is recognized everywhere but acted on nowhere --
/// delete propagation to the server is not implemented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Synced,
    NeedsAddSync,
    NeedsDeleteSync,
}

/// Sync state of a playlist add request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    NeedsSync,
    Synced,
}

/// A song imported into the local library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibrarySong {
    pub id: LibrarySongId,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub file_path: String,
    pub duration_secs: i64,
    pub sync_status: SyncStatus,
}

/// A library song offered to the current event for voting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailablePoolEntry {
    pub library_id: LibrarySongId,
    pub sync_status: SyncStatus,
}

/// Durable client intent to add a song to the shared playlist.
///
/// The `request_id` is generated locally and round-trips through the server
/// unchanged, so an ack can be matched back to exactly this request. The
/// record is never updated in place; only its status transitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistAddRequest {
    pub request_id: ClientRequestId,
    pub library_id: LibrarySongId,
    pub status: RequestStatus,
}

/// One row of the server-authoritative playlist cache.
///
/// Entries have no identity across refreshes: every successful fetch
/// replaces the whole set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivePlaylistEntry {
    pub playlist_id: PlaylistEntryId,
    pub library_id: LibrarySongId,
    pub up_votes: i64,
    pub down_votes: i64,
    pub priority: i64,
    pub time_added: DateTime<Utc>,
    pub adder_id: i64,
}

/// A playable row from the play-queue view (active playlist joined with
/// the library for file paths).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayQueueTrack {
    pub playlist_id: PlaylistEntryId,
    pub library_id: LibrarySongId,
    pub title: String,
    pub artist: String,
    pub file_path: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_status_serde_uses_snake_case() {
        let s = serde_json::to_string(&SyncStatus::NeedsAddSync).unwrap();
        assert_eq!(s, "\"needs_add_sync\"");
        let back: SyncStatus = serde_json::from_str(&s).unwrap();
        assert_eq!(back, SyncStatus::NeedsAddSync);
    }

    #[test]
    fn request_status_roundtrip() {
        let s = serde_json::to_string(&RequestStatus::NeedsSync).unwrap();
        let back: RequestStatus = serde_json::from_str(&s).unwrap();
        assert_eq!(back, RequestStatus::NeedsSync);
    }
}
