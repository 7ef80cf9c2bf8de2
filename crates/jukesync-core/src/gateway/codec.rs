//! Pure request/response serialization for the server wire format.
//!
//! Building a payload never touches the store or the network; a failure
//! here abandons the operation before anything is sent. Parsing is strict:
//! a response missing an expected field is a protocol mismatch and takes
//! the same failure path as a transport error.

use chrono::DateTime;
use serde::Serialize;
use serde_json::Value;

use crate::error::GatewayError;
use crate::model::{ActivePlaylistEntry, EventId, LibrarySong, LibrarySongId, PlaylistAddRequest};

#[derive(Serialize)]
struct LibrarySongWire<'a> {
    id: i64,
    title: &'a str,
    artist: &'a str,
    album: &'a str,
    duration: i64,
}

#[derive(Serialize)]
struct PlaylistAddWire {
    client_request_id: i64,
    lib_song_id: i64,
}

#[derive(Serialize)]
struct CreateEventWire<'a> {
    name: &'a str,
    password: &'a str,
}

/// Payload for a library add: the song's metadata plus its local id, which
/// the server echoes back in the ack.
pub fn library_song_payload(song: &LibrarySong) -> Result<Value, GatewayError> {
    Ok(serde_json::to_value(LibrarySongWire {
        id: song.id,
        title: &song.title,
        artist: &song.artist,
        album: &song.album,
        duration: song.duration_secs,
    })?)
}

/// Payload for an available-pool add: a bare array of library ids.
pub fn available_songs_payload(ids: &[LibrarySongId]) -> Result<Value, GatewayError> {
    Ok(serde_json::to_value(ids)?)
}

/// Payload for a playlist add batch. Each element carries the client
/// request id, which must round-trip unchanged.
pub fn playlist_adds_payload(requests: &[PlaylistAddRequest]) -> Result<Value, GatewayError> {
    let wire: Vec<PlaylistAddWire> = requests
        .iter()
        .map(|r| PlaylistAddWire {
            client_request_id: r.request_id,
            lib_song_id: r.library_id,
        })
        .collect();
    Ok(serde_json::to_value(wire)?)
}

pub fn create_event_payload(name: &str, password: &str) -> Result<Value, GatewayError> {
    Ok(serde_json::to_value(CreateEventWire { name, password })?)
}

/// Event id from a create-event reply.
pub fn parse_event_id(body: &Value) -> Result<EventId, GatewayError> {
    body["event_id"]
        .as_i64()
        .ok_or_else(|| GatewayError::Protocol("reply missing event_id".into()))
}

/// Library ids echoed back by a library or available-pool add reply.
pub fn parse_library_ids(body: &Value) -> Result<Vec<LibrarySongId>, GatewayError> {
    let items = body
        .as_array()
        .ok_or_else(|| GatewayError::Protocol("reply is not an id array".into()))?;
    items
        .iter()
        .map(|v| {
            v.as_i64()
                .ok_or_else(|| GatewayError::Protocol(format!("non-integer id in reply: {v}")))
        })
        .collect()
}

/// Decode a full active-playlist reply.
///
/// Priority is the server-given position: element 0 plays first. Entries
/// carry no identity across fetches.
pub fn parse_playlist(body: &Value) -> Result<Vec<ActivePlaylistEntry>, GatewayError> {
    let items = body
        .as_array()
        .ok_or_else(|| GatewayError::Protocol("playlist reply is not an array".into()))?;

    items
        .iter()
        .enumerate()
        .map(|(position, item)| parse_playlist_entry(item, position as i64))
        .collect()
}

fn parse_playlist_entry(item: &Value, priority: i64) -> Result<ActivePlaylistEntry, GatewayError> {
    let field = |name: &str| -> Result<i64, GatewayError> {
        item[name]
            .as_i64()
            .ok_or_else(|| GatewayError::Protocol(format!("playlist entry missing {name}")))
    };

    let time_str = item["time_added"]
        .as_str()
        .ok_or_else(|| GatewayError::Protocol("playlist entry missing time_added".into()))?;
    let time_added = DateTime::parse_from_rfc3339(time_str)
        .map_err(|e| GatewayError::Protocol(format!("bad time_added: {e}")))?
        .to_utc();

    Ok(ActivePlaylistEntry {
        playlist_id: field("id")?,
        library_id: field("lib_song_id")?,
        up_votes: field("up_votes")?,
        down_votes: field("down_votes")?,
        priority,
        time_added,
        adder_id: field("adder_id")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SyncStatus;
    use serde_json::json;

    fn song() -> LibrarySong {
        LibrarySong {
            id: 3,
            title: "A".into(),
            artist: "B".into(),
            album: "C".into(),
            file_path: "/music/a.mp3".into(),
            duration_secs: 180,
            sync_status: SyncStatus::NeedsAddSync,
        }
    }

    #[test]
    fn library_payload_carries_id_and_duration() {
        let payload = library_song_payload(&song()).unwrap();
        assert_eq!(payload["id"], 3);
        assert_eq!(payload["duration"], 180);
        // The local file path never goes over the wire.
        assert!(payload.get("file_path").is_none());
    }

    #[test]
    fn playlist_add_payload_round_trips_request_ids() {
        let requests = vec![
            PlaylistAddRequest {
                request_id: 101,
                library_id: 5,
                status: crate::model::RequestStatus::NeedsSync,
            },
            PlaylistAddRequest {
                request_id: 102,
                library_id: 7,
                status: crate::model::RequestStatus::NeedsSync,
            },
        ];
        let payload = playlist_adds_payload(&requests).unwrap();
        assert_eq!(payload[0]["client_request_id"], 101);
        assert_eq!(payload[1]["lib_song_id"], 7);
    }

    #[test]
    fn parse_playlist_assigns_priority_from_position() {
        let body = json!([
            {"id": 30, "lib_song_id": 3, "up_votes": 4, "down_votes": 0,
             "time_added": "2024-06-01T12:00:00Z", "adder_id": 9},
            {"id": 10, "lib_song_id": 1, "up_votes": 1, "down_votes": 2,
             "time_added": "2024-06-01T12:01:00Z", "adder_id": 8},
        ]);
        let entries = parse_playlist(&body).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].playlist_id, 30);
        assert_eq!(entries[0].priority, 0);
        assert_eq!(entries[1].priority, 1);
        assert_eq!(entries[1].down_votes, 2);
    }

    #[test]
    fn parse_playlist_rejects_missing_fields() {
        let body = json!([{"id": 30, "lib_song_id": 3}]);
        let err = parse_playlist(&body).unwrap_err();
        assert!(matches!(err, GatewayError::Protocol(_)));
    }

    #[test]
    fn parse_event_id_rejects_malformed_reply() {
        assert!(parse_event_id(&json!({"event_id": 42})).is_ok());
        assert!(parse_event_id(&json!({"id": 42})).is_err());
    }

    #[test]
    fn parse_library_ids_rejects_non_integers() {
        assert_eq!(parse_library_ids(&json!([1, 2, 3])).unwrap(), vec![1, 2, 3]);
        assert!(parse_library_ids(&json!(["a"])).is_err());
        assert!(parse_library_ids(&json!({"ids": []})).is_err());
    }
}
