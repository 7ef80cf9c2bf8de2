//! Typed completion notifications raised by the server gateway.
//!
//! Every issued network call produces exactly one notification: a success
//! carrying the ids the caller should mark synced, or a failure carrying a
//! reason and touching no local state. The coordinator is the only
//! in-process consumer; the embedding application drains whatever the
//! coordinator surfaces.

use serde::{Deserialize, Serialize};

use crate::model::{ActivePlaylistEntry, ClientRequestId, EventId, LibrarySongId};

/// A completion or failure event for one network operation.
///
/// Event-scoped variants carry the [`EventId`] the request was issued for,
/// so a reply that outlives its event is recognized and discarded instead
/// of being applied to a later event's state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Notification {
    /// Authentication succeeded; a session ticket is now held.
    ConnectionEstablished { user_id: i64 },
    ConnectionFailed {
        reason: String,
    },
    EventCreated {
        event_id: EventId,
    },
    EventCreationFailed {
        reason: String,
    },
    EventEnded,
    EventEndingFailed {
        reason: String,
    },
    /// The server acknowledged these library songs.
    LibrarySongsSynced {
        ids: Vec<LibrarySongId>,
    },
    LibrarySyncFailed {
        ids: Vec<LibrarySongId>,
        reason: String,
    },
    AvailableSongsSynced {
        event_id: EventId,
        ids: Vec<LibrarySongId>,
    },
    AvailableSyncFailed {
        event_id: EventId,
        ids: Vec<LibrarySongId>,
        reason: String,
    },
    /// A playlist-add batch was acknowledged. The request ids come from the
    /// correlation entry recorded at send time, never from the reply body.
    PlaylistAddsSynced {
        event_id: EventId,
        request_ids: Vec<ClientRequestId>,
    },
    PlaylistAddFailed {
        event_id: EventId,
        request_ids: Vec<ClientRequestId>,
        reason: String,
    },
    /// A full active-playlist fetch succeeded; the local cache should be
    /// destructively replaced with these entries.
    PlaylistFetched {
        event_id: EventId,
        entries: Vec<ActivePlaylistEntry>,
    },
    PlaylistFetchFailed {
        event_id: EventId,
        reason: String,
    },
}

impl Notification {
    /// Event id this notification is scoped to, if any. Library and
    /// session-level notifications apply regardless of the active event.
    pub fn event_scope(&self) -> Option<EventId> {
        match self {
            Notification::AvailableSongsSynced { event_id, .. }
            | Notification::AvailableSyncFailed { event_id, .. }
            | Notification::PlaylistAddsSynced { event_id, .. }
            | Notification::PlaylistAddFailed { event_id, .. }
            | Notification::PlaylistFetched { event_id, .. }
            | Notification::PlaylistFetchFailed { event_id, .. } => Some(*event_id),
            _ => None,
        }
    }
}
