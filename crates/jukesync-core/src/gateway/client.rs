//! Async server gateway.
//!
//! Every operation returns to the caller immediately; the request runs on
//! a spawned task and its outcome arrives later as a [`Notification`] on
//! the channel handed out at construction. An operation reports whether it
//! actually dispatched: `false` means no request was sent and no
//! notification will arrive (missing ticket, empty input), so callers can
//! keep an accurate count of outstanding acknowledgments.
//!
//! Playlist adds are correlated through a token recorded in a pending
//! table at send time; the ack notification carries exactly the request
//! ids stored under its token, never ids parsed out of the reply.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use crate::error::GatewayError;
use crate::events::Notification;
use crate::model::{ClientRequestId, EventId, LibrarySong, LibrarySongId, PlaylistAddRequest};
use crate::storage::ServerConfig;

use super::codec;
use super::session::Session;
use super::{API_VERSION_HEADER, TICKET_HEADER, USER_ID_HEADER};

/// A playlist-add batch in flight: the event it belongs to and the client
/// request ids its ack should mark synced.
struct PendingAdd {
    event_id: EventId,
    request_ids: Vec<ClientRequestId>,
}

/// Gateway to the jukesync server.
pub struct ServerGateway {
    http: reqwest::Client,
    base_url: String,
    api_version: String,
    session: Arc<Mutex<Session>>,
    pending_adds: Arc<Mutex<HashMap<Uuid, PendingAdd>>>,
    notify: mpsc::UnboundedSender<Notification>,
}

impl ServerGateway {
    /// Build a gateway from server configuration, returning it together
    /// with the receiving end of its notification channel.
    ///
    /// # Errors
    /// Returns an error if the base URL is invalid or the HTTP client
    /// cannot be constructed.
    pub fn new(
        config: &ServerConfig,
    ) -> Result<(Self, mpsc::UnboundedReceiver<Notification>), GatewayError> {
        url::Url::parse(&config.base_url)?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        let (tx, rx) = mpsc::unbounded_channel();

        Ok((
            Self {
                http,
                base_url: config.base_url.trim_end_matches('/').to_string(),
                api_version: config.api_version.clone(),
                session: Arc::new(Mutex::new(Session::new())),
                pending_adds: Arc::new(Mutex::new(HashMap::new())),
                notify: tx,
            },
            rx,
        ))
    }

    /// Shared handle to the session state.
    pub fn session(&self) -> Arc<Mutex<Session>> {
        Arc::clone(&self.session)
    }

    /// Number of playlist-add batches awaiting acknowledgment.
    pub fn pending_playlist_add_count(&self) -> usize {
        self.pending_adds.lock().unwrap().len()
    }

    /// Forget the hosted event in the session.
    pub fn clear_event(&self) {
        self.session.lock().unwrap().clear_event();
    }

    fn send(&self, note: Notification) {
        let _ = self.notify.send(note);
    }

    /// Ticket and user id, or `None` when no valid ticket is held.
    fn authenticated(&self) -> Option<(String, i64)> {
        let session = self.session.lock().unwrap();
        match (session.ticket(), session.user_id()) {
            (Some(ticket), Some(user_id)) if session.has_valid_ticket() => {
                Some((ticket.to_string(), user_id))
            }
            _ => None,
        }
    }

    /// Ticket and event id, or `None` when either is missing.
    fn hosting(&self) -> Option<(String, EventId)> {
        let session = self.session.lock().unwrap();
        match (session.ticket(), session.event_id()) {
            (Some(ticket), Some(event_id)) => Some((ticket.to_string(), event_id)),
            _ => None,
        }
    }

    /// Exchange username/password for a session ticket.
    ///
    /// On success the ticket and user id are stored in the session and a
    /// `ConnectionEstablished` notification is raised.
    pub fn authenticate(&self, username: &str, password: &str) -> bool {
        let http = self.http.clone();
        let url = format!("{}/auth", self.base_url);
        let api_version = self.api_version.clone();
        let form = [
            ("username", username.to_string()),
            ("password", password.to_string()),
        ];
        let session = Arc::clone(&self.session);
        let notify = self.notify.clone();

        tokio::spawn(async move {
            let result = async {
                let resp = http
                    .post(&url)
                    .header(API_VERSION_HEADER, &api_version)
                    .form(&form)
                    .send()
                    .await?
                    .error_for_status()?;
                let ticket = header_string(&resp, TICKET_HEADER)?;
                let user_id = header_string(&resp, USER_ID_HEADER)?
                    .parse::<i64>()
                    .map_err(|_| {
                        GatewayError::Protocol(format!("non-numeric {USER_ID_HEADER}"))
                    })?;
                Ok::<_, GatewayError>((ticket, user_id))
            }
            .await;

            let note = match result {
                Ok((ticket, user_id)) => {
                    session.lock().unwrap().store_ticket(ticket, user_id);
                    Notification::ConnectionEstablished { user_id }
                }
                Err(e) => Notification::ConnectionFailed {
                    reason: e.to_string(),
                },
            };
            let _ = notify.send(note);
        });
        true
    }

    /// Create an event on the server. No-op without a valid ticket.
    pub fn create_event(&self, name: &str, password: &str) -> bool {
        let Some((ticket, _)) = self.authenticated() else {
            debug!("create_event skipped: no session ticket");
            return false;
        };
        let payload = match codec::create_event_payload(name, password) {
            Ok(p) => p,
            Err(e) => {
                self.send(Notification::EventCreationFailed {
                    reason: e.to_string(),
                });
                return true;
            }
        };

        let http = self.http.clone();
        let url = format!("{}/events", self.base_url);
        let session = Arc::clone(&self.session);
        let notify = self.notify.clone();

        tokio::spawn(async move {
            let result = async {
                let body = put_json(&http, &url, &ticket, &payload).await?;
                codec::parse_event_id(&body)
            }
            .await;

            let note = match result {
                Ok(event_id) => {
                    session.lock().unwrap().store_event(event_id);
                    Notification::EventCreated { event_id }
                }
                Err(e) => Notification::EventCreationFailed {
                    reason: e.to_string(),
                },
            };
            let _ = notify.send(note);
        });
        true
    }

    /// End the hosted event. Exempt from the valid-ticket no-op rule: the
    /// request is sent with whatever ticket is held.
    pub fn end_event(&self) -> bool {
        let (ticket, event_id) = {
            let session = self.session.lock().unwrap();
            match session.event_id() {
                Some(event_id) => (
                    session.ticket().unwrap_or_default().to_string(),
                    event_id,
                ),
                None => {
                    debug!("end_event skipped: no hosted event");
                    return false;
                }
            }
        };

        let http = self.http.clone();
        let url = format!("{}/events/{}", self.base_url, event_id);
        let notify = self.notify.clone();

        tokio::spawn(async move {
            let result = http
                .delete(&url)
                .header(TICKET_HEADER, &ticket)
                .send()
                .await
                .and_then(|resp| resp.error_for_status());

            let note = match result {
                Ok(_) => Notification::EventEnded,
                Err(e) => Notification::EventEndingFailed {
                    reason: e.to_string(),
                },
            };
            let _ = notify.send(note);
        });
        true
    }

    /// Push one library song to the server. No-op without a valid ticket.
    pub fn add_library_song(&self, song: &LibrarySong) -> bool {
        let Some((ticket, user_id)) = self.authenticated() else {
            debug!(id = song.id, "library add skipped: no session ticket");
            return false;
        };
        let ids = vec![song.id];
        let payload = match codec::library_song_payload(song) {
            Ok(p) => p,
            Err(e) => {
                self.send(Notification::LibrarySyncFailed {
                    ids,
                    reason: e.to_string(),
                });
                return true;
            }
        };

        let http = self.http.clone();
        let url = format!("{}/users/{}/library/songs", self.base_url, user_id);
        let notify = self.notify.clone();

        tokio::spawn(async move {
            let result = async {
                let body = put_json(&http, &url, &ticket, &payload).await?;
                codec::parse_library_ids(&body)
            }
            .await;

            let note = match result {
                Ok(acked) => Notification::LibrarySongsSynced { ids: acked },
                Err(e) => Notification::LibrarySyncFailed {
                    ids,
                    reason: e.to_string(),
                },
            };
            let _ = notify.send(note);
        });
        true
    }

    /// Offer library songs to the hosted event's available pool. No-op
    /// without a valid ticket, a hosted event, or a non-empty id set.
    pub fn add_available_songs(&self, ids: &[LibrarySongId]) -> bool {
        if ids.is_empty() {
            return false;
        }
        let Some((ticket, event_id)) = self.hosting() else {
            debug!("available add skipped: not hosting");
            return false;
        };
        let sent_ids = ids.to_vec();
        let payload = match codec::available_songs_payload(ids) {
            Ok(p) => p,
            Err(e) => {
                self.send(Notification::AvailableSyncFailed {
                    event_id,
                    ids: sent_ids,
                    reason: e.to_string(),
                });
                return true;
            }
        };

        let http = self.http.clone();
        let url = format!("{}/events/{}/available_music", self.base_url, event_id);
        let notify = self.notify.clone();

        tokio::spawn(async move {
            let result = async {
                let body = put_json(&http, &url, &ticket, &payload).await?;
                codec::parse_library_ids(&body)
            }
            .await;

            let note = match result {
                Ok(acked) => Notification::AvailableSongsSynced {
                    event_id,
                    ids: acked,
                },
                Err(e) => Notification::AvailableSyncFailed {
                    event_id,
                    ids: sent_ids,
                    reason: e.to_string(),
                },
            };
            let _ = notify.send(note);
        });
        true
    }

    /// Submit a playlist-add batch, correlated by a fresh token.
    ///
    /// Returns the token when a notification will arrive, `None` when the
    /// call was a no-op. Multiple batches may be in flight; each ack marks
    /// only the ids recorded under its own token.
    pub fn add_playlist_songs(&self, requests: &[PlaylistAddRequest]) -> Option<Uuid> {
        if requests.is_empty() {
            return None;
        }
        let Some((ticket, event_id)) = self.hosting() else {
            debug!("playlist add skipped: not hosting");
            return None;
        };

        let token = Uuid::new_v4();
        let request_ids: Vec<ClientRequestId> = requests.iter().map(|r| r.request_id).collect();
        self.pending_adds.lock().unwrap().insert(
            token,
            PendingAdd {
                event_id,
                request_ids: request_ids.clone(),
            },
        );

        let payload = match codec::playlist_adds_payload(requests) {
            Ok(p) => p,
            Err(e) => {
                self.pending_adds.lock().unwrap().remove(&token);
                self.send(Notification::PlaylistAddFailed {
                    event_id,
                    request_ids,
                    reason: e.to_string(),
                });
                return Some(token);
            }
        };

        let http = self.http.clone();
        let url = format!(
            "{}/events/{}/active_playlist/songs",
            self.base_url, event_id
        );
        let pending = Arc::clone(&self.pending_adds);
        let notify = self.notify.clone();

        tokio::spawn(async move {
            let result = put_json(&http, &url, &ticket, &payload).await;

            let Some(entry) = pending.lock().unwrap().remove(&token) else {
                debug!(%token, "playlist add completed without a pending entry");
                return;
            };
            let note = match result {
                Ok(_) => Notification::PlaylistAddsSynced {
                    event_id: entry.event_id,
                    request_ids: entry.request_ids,
                },
                Err(e) => Notification::PlaylistAddFailed {
                    event_id: entry.event_id,
                    request_ids: entry.request_ids,
                    reason: e.to_string(),
                },
            };
            let _ = notify.send(note);
        });
        Some(token)
    }

    /// Fetch the full active playlist. No-op without a valid ticket and a
    /// hosted event.
    pub fn fetch_active_playlist(&self) -> bool {
        let Some((ticket, event_id)) = self.hosting() else {
            debug!("playlist fetch skipped: not hosting");
            return false;
        };

        let http = self.http.clone();
        let url = format!("{}/events/{}/active_playlist", self.base_url, event_id);
        let notify = self.notify.clone();

        tokio::spawn(async move {
            let result = async {
                let resp = http
                    .get(&url)
                    .header(TICKET_HEADER, &ticket)
                    .send()
                    .await?
                    .error_for_status()?;
                let body: Value = resp.json().await?;
                codec::parse_playlist(&body)
            }
            .await;

            let note = match result {
                Ok(entries) => Notification::PlaylistFetched { event_id, entries },
                Err(e) => Notification::PlaylistFetchFailed {
                    event_id,
                    reason: e.to_string(),
                },
            };
            let _ = notify.send(note);
        });
        true
    }
}

/// PUT a JSON payload with the ticket header and decode the JSON reply.
/// Non-success statuses and undecodable bodies both fail as transport
/// errors.
async fn put_json(
    http: &reqwest::Client,
    url: &str,
    ticket: &str,
    payload: &Value,
) -> Result<Value, GatewayError> {
    let resp = http
        .put(url)
        .header(TICKET_HEADER, ticket)
        .json(payload)
        .send()
        .await?
        .error_for_status()?;
    if resp.content_length() == Some(0) {
        return Ok(Value::Null);
    }
    Ok(resp.json().await?)
}

fn header_string(resp: &reqwest::Response, name: &str) -> Result<String, GatewayError> {
    resp.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .ok_or_else(|| GatewayError::Protocol(format!("reply missing {name} header")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RequestStatus;
    use crate::model::SyncStatus;

    fn test_config(base_url: String) -> ServerConfig {
        ServerConfig {
            base_url,
            request_timeout_secs: 5,
            api_version: "0.2".into(),
        }
    }

    fn gateway_for(
        server: &mockito::ServerGuard,
    ) -> (ServerGateway, mpsc::UnboundedReceiver<Notification>) {
        ServerGateway::new(&test_config(server.url())).unwrap()
    }

    fn login(gateway: &ServerGateway, user_id: i64) {
        gateway
            .session()
            .lock()
            .unwrap()
            .store_ticket("tick".into(), user_id);
    }

    fn song(id: i64) -> LibrarySong {
        LibrarySong {
            id,
            title: "A".into(),
            artist: "B".into(),
            album: "C".into(),
            file_path: "/a.mp3".into(),
            duration_secs: 180,
            sync_status: SyncStatus::NeedsAddSync,
        }
    }

    fn request(request_id: i64, library_id: i64) -> PlaylistAddRequest {
        PlaylistAddRequest {
            request_id,
            library_id,
            status: RequestStatus::NeedsSync,
        }
    }

    #[tokio::test]
    async fn authenticate_success_stores_ticket_and_user_id() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("POST", "/auth")
            .match_header(API_VERSION_HEADER, "0.2")
            .with_status(200)
            .with_header(TICKET_HEADER, "ticket-hash")
            .with_header(USER_ID_HEADER, "42")
            .create_async()
            .await;

        let (gateway, mut rx) = gateway_for(&server);
        assert!(gateway.authenticate("alice", "secret"));

        match rx.recv().await.unwrap() {
            Notification::ConnectionEstablished { user_id } => assert_eq!(user_id, 42),
            other => panic!("unexpected notification: {other:?}"),
        }
        m.assert_async().await;

        let session = gateway.session();
        let session = session.lock().unwrap();
        assert!(session.has_valid_ticket());
        assert_eq!(session.ticket(), Some("ticket-hash"));
        assert_eq!(session.user_id(), Some(42));
    }

    #[tokio::test]
    async fn authenticate_reply_without_headers_fails() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/auth")
            .with_status(200)
            .create_async()
            .await;

        let (gateway, mut rx) = gateway_for(&server);
        gateway.authenticate("alice", "secret");

        assert!(matches!(
            rx.recv().await.unwrap(),
            Notification::ConnectionFailed { .. }
        ));
        assert!(!gateway.session().lock().unwrap().has_valid_ticket());
    }

    #[tokio::test]
    async fn operations_without_ticket_do_not_dispatch() {
        let server = mockito::Server::new_async().await;
        let (gateway, mut rx) = gateway_for(&server);

        assert!(!gateway.add_library_song(&song(1)));
        assert!(!gateway.add_available_songs(&[1]));
        assert!(gateway.add_playlist_songs(&[request(1, 1)]).is_none());
        assert!(!gateway.fetch_active_playlist());
        assert!(!gateway.create_event("party", "pw"));
        assert!(!gateway.end_event());

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn library_add_marks_acked_ids() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("PUT", "/users/42/library/songs")
            .match_header(TICKET_HEADER, "tick")
            .with_status(200)
            .with_body("[3]")
            .create_async()
            .await;

        let (gateway, mut rx) = gateway_for(&server);
        login(&gateway, 42);
        assert!(gateway.add_library_song(&song(3)));

        match rx.recv().await.unwrap() {
            Notification::LibrarySongsSynced { ids } => assert_eq!(ids, vec![3]),
            other => panic!("unexpected notification: {other:?}"),
        }
        m.assert_async().await;
    }

    #[tokio::test]
    async fn library_add_server_error_reports_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("PUT", "/users/42/library/songs")
            .with_status(500)
            .create_async()
            .await;

        let (gateway, mut rx) = gateway_for(&server);
        login(&gateway, 42);
        gateway.add_library_song(&song(3));

        match rx.recv().await.unwrap() {
            Notification::LibrarySyncFailed { ids, .. } => assert_eq!(ids, vec![3]),
            other => panic!("unexpected notification: {other:?}"),
        }
    }

    #[tokio::test]
    async fn create_event_stores_event_in_session() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("PUT", "/events")
            .with_status(200)
            .with_body("{\"event_id\": 9}")
            .create_async()
            .await;

        let (gateway, mut rx) = gateway_for(&server);
        login(&gateway, 42);
        gateway.create_event("party", "pw");

        match rx.recv().await.unwrap() {
            Notification::EventCreated { event_id } => assert_eq!(event_id, 9),
            other => panic!("unexpected notification: {other:?}"),
        }
        let session = gateway.session();
        let session = session.lock().unwrap();
        assert_eq!(session.event_id(), Some(9));
        assert!(session.is_hosting());
    }

    #[tokio::test]
    async fn available_add_requires_a_hosted_event() {
        let server = mockito::Server::new_async().await;
        let (gateway, mut rx) = gateway_for(&server);
        login(&gateway, 42);

        // Ticket but no event: nothing dispatches.
        assert!(!gateway.add_available_songs(&[1, 2]));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn available_add_failure_carries_the_sent_ids() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("PUT", "/events/9/available_music")
            .with_status(500)
            .create_async()
            .await;

        let (gateway, mut rx) = gateway_for(&server);
        login(&gateway, 42);
        gateway.session().lock().unwrap().store_event(9);
        gateway.add_available_songs(&[5, 7]);

        match rx.recv().await.unwrap() {
            Notification::AvailableSyncFailed { event_id, ids, .. } => {
                assert_eq!(event_id, 9);
                assert_eq!(ids, vec![5, 7]);
            }
            other => panic!("unexpected notification: {other:?}"),
        }
    }

    #[tokio::test]
    async fn concurrent_playlist_adds_keep_their_own_request_ids() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("PUT", "/events/9/active_playlist/songs")
            .with_status(200)
            .expect(2)
            .create_async()
            .await;

        let (gateway, mut rx) = gateway_for(&server);
        login(&gateway, 42);
        gateway.session().lock().unwrap().store_event(9);

        let first = gateway
            .add_playlist_songs(&[request(101, 5), request(102, 7)])
            .unwrap();
        let second = gateway.add_playlist_songs(&[request(103, 8)]).unwrap();
        assert_ne!(first, second);
        assert_eq!(gateway.pending_playlist_add_count(), 2);

        let mut seen = Vec::new();
        for _ in 0..2 {
            match rx.recv().await.unwrap() {
                Notification::PlaylistAddsSynced {
                    event_id,
                    mut request_ids,
                } => {
                    assert_eq!(event_id, 9);
                    request_ids.sort_unstable();
                    seen.push(request_ids);
                }
                other => panic!("unexpected notification: {other:?}"),
            }
        }
        seen.sort();
        assert_eq!(seen, vec![vec![101, 102], vec![103]]);
        assert_eq!(gateway.pending_playlist_add_count(), 0);
    }

    #[tokio::test]
    async fn playlist_add_failure_carries_the_batch_request_ids() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("PUT", "/events/9/active_playlist/songs")
            .with_status(502)
            .create_async()
            .await;

        let (gateway, mut rx) = gateway_for(&server);
        login(&gateway, 42);
        gateway.session().lock().unwrap().store_event(9);
        gateway.add_playlist_songs(&[request(101, 5), request(102, 7)]);

        match rx.recv().await.unwrap() {
            Notification::PlaylistAddFailed { request_ids, .. } => {
                assert_eq!(request_ids, vec![101, 102]);
            }
            other => panic!("unexpected notification: {other:?}"),
        }
        assert_eq!(gateway.pending_playlist_add_count(), 0);
    }

    #[tokio::test]
    async fn fetch_playlist_decodes_entries_in_order() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/events/9/active_playlist")
            .with_status(200)
            .with_body(
                r#"[{"id": 30, "lib_song_id": 3, "up_votes": 4, "down_votes": 0,
                     "time_added": "2024-06-01T12:00:00Z", "adder_id": 9}]"#,
            )
            .create_async()
            .await;

        let (gateway, mut rx) = gateway_for(&server);
        login(&gateway, 42);
        gateway.session().lock().unwrap().store_event(9);
        assert!(gateway.fetch_active_playlist());

        match rx.recv().await.unwrap() {
            Notification::PlaylistFetched { event_id, entries } => {
                assert_eq!(event_id, 9);
                assert_eq!(entries.len(), 1);
                assert_eq!(entries[0].playlist_id, 30);
            }
            other => panic!("unexpected notification: {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_playlist_body_fails_like_transport() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/events/9/active_playlist")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let (gateway, mut rx) = gateway_for(&server);
        login(&gateway, 42);
        gateway.session().lock().unwrap().store_event(9);
        gateway.fetch_active_playlist();

        assert!(matches!(
            rx.recv().await.unwrap(),
            Notification::PlaylistFetchFailed { .. }
        ));
    }

    #[tokio::test]
    async fn end_event_reports_completion() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("DELETE", "/events/9")
            .with_status(200)
            .create_async()
            .await;

        let (gateway, mut rx) = gateway_for(&server);
        login(&gateway, 42);
        gateway.session().lock().unwrap().store_event(9);
        assert!(gateway.end_event());

        assert!(matches!(
            rx.recv().await.unwrap(),
            Notification::EventEnded
        ));
    }
}
