//! Reconciliation coordinator: wires tracker scans to gateway calls and
//! gateway notifications back into store transitions.
//!
//! All store mutation is serialized through this object; gateway tasks
//! only talk back through the notification channel. For each collection at
//! most one sync cycle is in flight: a new scan is not started while a
//! previous batch's acknowledgment is outstanding, so an ack can never be
//! applied to a later generation of the scan.

use std::path::Path;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::{CoreError, GatewayError};
use crate::events::Notification;
use crate::gateway::ServerGateway;
use crate::media::{self, TagReader, TrackTags};
use crate::model::{ClientRequestId, EventId, LibrarySongId, PlaylistEntryId};
use crate::storage::RecordStore;
use crate::sync;

/// Lifecycle of the hosted event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventLifecycle {
    NoEvent,
    EventCreationPending,
    EventActive,
    EventEnding,
}

/// KV key recording the hosted event across process restarts.
const HOSTED_EVENT_KEY: &str = "hosted_event_id";

/// Top-level owner of the sync engine.
pub struct Coordinator {
    store: RecordStore,
    gateway: ServerGateway,
    inbox: mpsc::UnboundedReceiver<Notification>,
    lifecycle: EventLifecycle,
    active_event: Option<EventId>,
    /// Library adds go over the wire one song per request; this counts the
    /// requests of the current cycle still awaiting an answer.
    library_outstanding: usize,
    pool_outstanding: bool,
    playlist_add_outstanding: bool,
    playlist_fetch_outstanding: bool,
    notices: Vec<Notification>,
}

impl Coordinator {
    /// Build the coordinator and run the initial library scan. The scan is
    /// a silent no-op until the gateway holds a session ticket. An event
    /// hosted by an earlier process (recorded in the store) is resumed.
    pub fn new(
        store: RecordStore,
        gateway: ServerGateway,
        inbox: mpsc::UnboundedReceiver<Notification>,
    ) -> Result<Self, CoreError> {
        let mut coordinator = Self {
            store,
            gateway,
            inbox,
            lifecycle: EventLifecycle::NoEvent,
            active_event: None,
            library_outstanding: 0,
            pool_outstanding: false,
            playlist_add_outstanding: false,
            playlist_fetch_outstanding: false,
            notices: Vec::new(),
        };
        if let Some(recorded) = coordinator.store.kv_get(HOSTED_EVENT_KEY)? {
            match recorded.parse::<EventId>() {
                Ok(event_id) => coordinator.resume_event(event_id),
                Err(_) => warn!(%recorded, "ignoring unparsable hosted event id"),
            }
        }
        coordinator.sync_library()?;
        Ok(coordinator)
    }

    /// Resume hosting an event created in an earlier session.
    pub fn resume_event(&mut self, event_id: EventId) {
        self.gateway.session().lock().unwrap().store_event(event_id);
        self.active_event = Some(event_id);
        self.lifecycle = EventLifecycle::EventActive;
    }

    pub fn lifecycle(&self) -> EventLifecycle {
        self.lifecycle
    }

    pub fn active_event(&self) -> Option<EventId> {
        self.active_event
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn gateway(&self) -> &ServerGateway {
        &self.gateway
    }

    /// Notifications applied or surfaced since the last drain.
    pub fn take_notices(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notices)
    }

    // === Local mutations ===

    /// Insert a song into the library and trigger a library sync cycle.
    pub fn add_song_to_library(
        &mut self,
        tags: &TrackTags,
        file_path: &str,
    ) -> Result<LibrarySongId, CoreError> {
        let id = self.store.add_library_song(
            &tags.title,
            &tags.artist,
            &tags.album,
            file_path,
            tags.duration_secs,
        )?;
        self.sync_library()?;
        Ok(id)
    }

    /// Import one media file through the tag reader.
    pub fn import_file(
        &mut self,
        reader: &dyn TagReader,
        path: &Path,
    ) -> Result<LibrarySongId, CoreError> {
        let tags = reader.read_tags(path)?;
        self.add_song_to_library(&tags, &path.to_string_lossy())
    }

    /// Import every supported audio file under a directory. Files whose
    /// tags cannot be read are skipped. Returns the number imported.
    pub fn import_directory(
        &mut self,
        reader: &dyn TagReader,
        dir: &Path,
    ) -> Result<usize, CoreError> {
        let mut imported = 0;
        for path in media::collect_audio_files(dir) {
            match reader.read_tags(&path) {
                Ok(tags) => {
                    self.store.add_library_song(
                        &tags.title,
                        &tags.artist,
                        &tags.album,
                        &path.to_string_lossy(),
                        tags.duration_secs,
                    )?;
                    imported += 1;
                }
                Err(e) => warn!("skipping {}: {e}", path.display()),
            }
        }
        self.sync_library()?;
        Ok(imported)
    }

    /// Offer library songs to the active event's pool and trigger a pool
    /// sync cycle.
    pub fn offer_songs(&mut self, library_ids: &[LibrarySongId]) -> Result<usize, CoreError> {
        self.require_active_event("offer songs")?;
        let added = self.store.add_pool_entries(library_ids)?;
        self.sync_available()?;
        Ok(added)
    }

    /// Queue playlist add requests for the active event, returning the
    /// generated client request ids.
    pub fn queue_playlist_adds(
        &mut self,
        library_ids: &[LibrarySongId],
    ) -> Result<Vec<ClientRequestId>, CoreError> {
        self.require_active_event("queue playlist adds")?;
        let request_ids = self.store.enqueue_playlist_adds(library_ids)?;
        self.sync_playlist_requests()?;
        Ok(request_ids)
    }

    /// Request removal of entries from the shared playlist.
    ///
    /// The service defines no removal semantics yet. This validates the
    /// lifecycle and intentionally performs no removal.
    pub fn remove_playlist_entries(
        &mut self,
        _entries: &[PlaylistEntryId],
    ) -> Result<(), CoreError> {
        self.require_active_event("remove playlist entries")?;
        Ok(())
    }

    // === Event lifecycle ===

    /// Ask the server to create an event. Moves to `EventCreationPending`
    /// until the gateway reports the outcome.
    pub fn create_event(&mut self, name: &str, password: &str) -> Result<(), CoreError> {
        if self.lifecycle != EventLifecycle::NoEvent {
            return Err(CoreError::EventState(format!(
                "cannot create an event while {:?}",
                self.lifecycle
            )));
        }
        if !self.gateway.create_event(name, password) {
            return Err(GatewayError::NotAuthenticated.into());
        }
        self.lifecycle = EventLifecycle::EventCreationPending;
        Ok(())
    }

    /// Ask the server to end the hosted event. Local cleanup runs when the
    /// end is confirmed, or whenever the event is reported ended.
    pub fn end_event(&mut self) -> Result<(), CoreError> {
        if self.lifecycle != EventLifecycle::EventActive {
            return Err(CoreError::EventState(format!(
                "cannot end an event while {:?}",
                self.lifecycle
            )));
        }
        if !self.gateway.end_event() {
            return Err(CoreError::EventState("no hosted event in session".into()));
        }
        self.lifecycle = EventLifecycle::EventEnding;
        Ok(())
    }

    /// Re-run every pending-add scan. The per-collection in-flight guards
    /// still apply, so this is safe to call at any time.
    pub fn resync(&mut self) -> Result<(), CoreError> {
        self.sync_library()?;
        if self.lifecycle == EventLifecycle::EventActive {
            self.sync_available()?;
            self.sync_playlist_requests()?;
        }
        Ok(())
    }

    /// Trigger a full active-playlist refetch.
    pub fn refresh_playlist(&mut self) -> Result<(), CoreError> {
        if self.playlist_fetch_outstanding {
            return Ok(());
        }
        if self.gateway.fetch_active_playlist() {
            self.playlist_fetch_outstanding = true;
        }
        Ok(())
    }

    // === Notification intake ===

    /// Drain and apply every notification already delivered.
    pub fn pump(&mut self) -> Result<usize, CoreError> {
        let mut handled = 0;
        while let Ok(note) = self.inbox.try_recv() {
            self.apply(note)?;
            handled += 1;
        }
        Ok(handled)
    }

    /// Wait for at least one notification, then drain the rest.
    pub async fn wait_and_pump(&mut self) -> Result<usize, CoreError> {
        match self.inbox.recv().await {
            Some(note) => {
                self.apply(note)?;
                Ok(1 + self.pump()?)
            }
            None => Ok(0),
        }
    }

    fn require_active_event(&self, what: &str) -> Result<(), CoreError> {
        if self.lifecycle != EventLifecycle::EventActive {
            return Err(CoreError::EventState(format!(
                "cannot {what} without an active event (state: {:?})",
                self.lifecycle
            )));
        }
        Ok(())
    }

    fn sync_library(&mut self) -> Result<(), CoreError> {
        if self.library_outstanding > 0 {
            return Ok(());
        }
        for song in sync::pending_library_adds(&self.store)? {
            if self.gateway.add_library_song(&song) {
                self.library_outstanding += 1;
            } else {
                break;
            }
        }
        Ok(())
    }

    fn sync_available(&mut self) -> Result<(), CoreError> {
        if self.pool_outstanding {
            return Ok(());
        }
        let pending = sync::pending_pool_adds(&self.store)?;
        if !pending.is_empty() && self.gateway.add_available_songs(&pending) {
            self.pool_outstanding = true;
        }
        Ok(())
    }

    fn sync_playlist_requests(&mut self) -> Result<(), CoreError> {
        if self.playlist_add_outstanding {
            return Ok(());
        }
        let pending = sync::pending_playlist_adds(&self.store)?;
        if !pending.is_empty() && self.gateway.add_playlist_songs(&pending).is_some() {
            self.playlist_add_outstanding = true;
        }
        Ok(())
    }

    /// Purge event-scoped local state. Always runs on an end-event signal,
    /// independent of any server round-trip.
    fn cleanup_event_state(&mut self) -> Result<(), CoreError> {
        self.store.clear_event_state()?;
        self.store.kv_delete(HOSTED_EVENT_KEY)?;
        self.gateway.clear_event();
        self.active_event = None;
        self.pool_outstanding = false;
        self.playlist_add_outstanding = false;
        self.playlist_fetch_outstanding = false;
        Ok(())
    }

    fn apply(&mut self, note: Notification) -> Result<(), CoreError> {
        // Replies scoped to an event that is no longer the active one were
        // issued before the event concluded; drop them.
        if let Some(scope) = note.event_scope() {
            if self.active_event != Some(scope) {
                debug!(event_id = scope, "discarding reply for concluded event");
                return Ok(());
            }
        }

        let mut surfaced = true;
        match &note {
            Notification::ConnectionEstablished { .. } => {
                self.sync_library()?;
            }
            Notification::ConnectionFailed { .. } => {}
            Notification::EventCreated { event_id } => {
                if self.lifecycle == EventLifecycle::EventCreationPending {
                    self.store
                        .kv_set(HOSTED_EVENT_KEY, &event_id.to_string())?;
                    self.active_event = Some(*event_id);
                    self.lifecycle = EventLifecycle::EventActive;
                } else {
                    warn!(
                        event_id,
                        "ignoring event creation in state {:?}", self.lifecycle
                    );
                    surfaced = false;
                }
            }
            Notification::EventCreationFailed { .. } => {
                if self.lifecycle == EventLifecycle::EventCreationPending {
                    self.lifecycle = EventLifecycle::NoEvent;
                }
            }
            Notification::EventEnded => {
                self.cleanup_event_state()?;
                self.lifecycle = EventLifecycle::NoEvent;
            }
            Notification::EventEndingFailed { .. } => {
                if self.lifecycle == EventLifecycle::EventEnding {
                    self.lifecycle = EventLifecycle::EventActive;
                }
            }
            Notification::LibrarySongsSynced { ids } => {
                self.library_outstanding = self.library_outstanding.saturating_sub(1);
                sync::mark_library_synced(&self.store, ids)?;
                // Pick up songs imported while the cycle was in flight.
                if self.library_outstanding == 0 {
                    self.sync_library()?;
                }
            }
            Notification::LibrarySyncFailed { ids, reason } => {
                self.library_outstanding = self.library_outstanding.saturating_sub(1);
                sync::mark_library_failed(&self.store, ids, reason);
            }
            Notification::AvailableSongsSynced { ids, .. } => {
                self.pool_outstanding = false;
                sync::mark_pool_synced(&self.store, ids)?;
                self.sync_available()?;
            }
            Notification::AvailableSyncFailed { ids, reason, .. } => {
                self.pool_outstanding = false;
                sync::mark_pool_failed(&self.store, ids, reason);
            }
            Notification::PlaylistAddsSynced { request_ids, .. } => {
                self.playlist_add_outstanding = false;
                sync::mark_requests_synced(&self.store, request_ids)?;
                // Acknowledged adds now have server-side positions; fetch
                // them with their ordering data.
                self.refresh_playlist()?;
                self.sync_playlist_requests()?;
            }
            Notification::PlaylistAddFailed {
                request_ids,
                reason,
                ..
            } => {
                self.playlist_add_outstanding = false;
                sync::mark_requests_failed(&self.store, request_ids, reason);
            }
            Notification::PlaylistFetched { entries, .. } => {
                self.playlist_fetch_outstanding = false;
                self.store.replace_active_playlist(entries)?;
            }
            Notification::PlaylistFetchFailed { .. } => {
                self.playlist_fetch_outstanding = false;
            }
        }
        if surfaced {
            self.notices.push(note);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RequestStatus, SyncStatus};
    use crate::storage::ServerConfig;

    fn test_config(base_url: String) -> ServerConfig {
        ServerConfig {
            base_url,
            request_timeout_secs: 5,
            api_version: "0.2".into(),
        }
    }

    fn coordinator_for(server: &mockito::ServerGuard) -> Coordinator {
        let (gateway, rx) = ServerGateway::new(&test_config(server.url())).unwrap();
        let store = RecordStore::open_memory().unwrap();
        Coordinator::new(store, gateway, rx).unwrap()
    }

    fn login(coordinator: &Coordinator, user_id: i64) {
        coordinator
            .gateway()
            .session()
            .lock()
            .unwrap()
            .store_ticket("tick".into(), user_id);
    }

    fn tags(title: &str) -> TrackTags {
        TrackTags {
            title: title.into(),
            artist: "B".into(),
            album: "C".into(),
            duration_secs: 180,
        }
    }

    /// Pump notifications until the predicate holds; panics after 5s.
    /// One `wait_and_pump` can drain several notifications, so tests must
    /// not count calls.
    async fn pump_until<F: Fn(&Coordinator) -> bool>(coordinator: &mut Coordinator, pred: F) {
        tokio::time::timeout(std::time::Duration::from_secs(5), async {
            while !pred(coordinator) {
                coordinator.wait_and_pump().await.unwrap();
            }
        })
        .await
        .expect("condition not reached in time");
    }

    async fn activate_event(
        coordinator: &mut Coordinator,
        server: &mut mockito::ServerGuard,
        event_id: i64,
    ) {
        server
            .mock("PUT", "/events")
            .with_status(200)
            .with_body(format!("{{\"event_id\": {event_id}}}"))
            .create_async()
            .await;
        coordinator.create_event("party", "pw").unwrap();
        pump_until(coordinator, |c| {
            c.lifecycle() == EventLifecycle::EventActive
        })
        .await;
    }

    #[tokio::test]
    async fn create_event_success_activates() {
        let mut server = mockito::Server::new_async().await;
        let mut coordinator = coordinator_for(&server);
        login(&coordinator, 42);

        server
            .mock("PUT", "/events")
            .with_status(200)
            .with_body("{\"event_id\": 9}")
            .create_async()
            .await;

        coordinator.create_event("party", "pw").unwrap();
        assert_eq!(coordinator.lifecycle(), EventLifecycle::EventCreationPending);

        coordinator.wait_and_pump().await.unwrap();
        assert_eq!(coordinator.lifecycle(), EventLifecycle::EventActive);
        assert_eq!(coordinator.active_event(), Some(9));
    }

    #[tokio::test]
    async fn create_event_failure_returns_to_no_event() {
        let mut server = mockito::Server::new_async().await;
        let mut coordinator = coordinator_for(&server);
        login(&coordinator, 42);

        server
            .mock("PUT", "/events")
            .with_status(409)
            .create_async()
            .await;

        coordinator.create_event("duplicate", "pw").unwrap();
        coordinator.wait_and_pump().await.unwrap();

        assert_eq!(coordinator.lifecycle(), EventLifecycle::NoEvent);
        assert_eq!(coordinator.active_event(), None);
        let notices = coordinator.take_notices();
        assert!(notices
            .iter()
            .any(|n| matches!(n, Notification::EventCreationFailed { .. })));
    }

    #[tokio::test]
    async fn create_event_requires_authentication() {
        let server = mockito::Server::new_async().await;
        let mut coordinator = coordinator_for(&server);

        let err = coordinator.create_event("party", "pw").unwrap_err();
        assert!(matches!(
            err,
            CoreError::Gateway(GatewayError::NotAuthenticated)
        ));
        assert_eq!(coordinator.lifecycle(), EventLifecycle::NoEvent);
    }

    #[tokio::test]
    async fn imported_song_becomes_synced_after_ack() {
        let mut server = mockito::Server::new_async().await;
        let mut coordinator = coordinator_for(&server);
        login(&coordinator, 42);

        server
            .mock("PUT", "/users/42/library/songs")
            .with_status(200)
            .with_body("[1]")
            .create_async()
            .await;

        let id = coordinator
            .add_song_to_library(&tags("A"), "/music/a.mp3")
            .unwrap();
        assert_eq!(id, 1);
        let song = coordinator.store().library_song(id).unwrap().unwrap();
        assert_eq!(song.sync_status, SyncStatus::NeedsAddSync);

        coordinator.wait_and_pump().await.unwrap();

        let song = coordinator.store().library_song(id).unwrap().unwrap();
        assert_eq!(song.sync_status, SyncStatus::Synced);
        assert!(sync::pending_library_adds(coordinator.store())
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn no_second_library_cycle_while_one_is_outstanding() {
        let mut server = mockito::Server::new_async().await;
        let mut coordinator = coordinator_for(&server);
        login(&coordinator, 42);

        let m = server
            .mock("PUT", "/users/42/library/songs")
            .with_status(200)
            .with_body("[1]")
            .create_async()
            .await;

        // Pretend an earlier batch is still awaiting its ack.
        coordinator.library_outstanding = 1;
        coordinator
            .add_song_to_library(&tags("A"), "/music/a.mp3")
            .unwrap();

        // The ack of the phantom batch releases the guard and triggers the
        // rescan, which dispatches the song exactly once.
        coordinator
            .apply(Notification::LibrarySongsSynced { ids: vec![] })
            .unwrap();
        pump_until(&mut coordinator, |c| {
            c.store().library_song(1).unwrap().unwrap().sync_status == SyncStatus::Synced
        })
        .await;

        m.assert_async().await;
    }

    #[tokio::test]
    async fn failed_playlist_adds_stay_pending_and_retry_succeeds() {
        let mut server = mockito::Server::new_async().await;
        let mut coordinator = coordinator_for(&server);
        login(&coordinator, 42);
        activate_event(&mut coordinator, &mut server, 9).await;

        let fail = server
            .mock("PUT", "/events/9/active_playlist/songs")
            .with_status(500)
            .create_async()
            .await;

        let request_ids = coordinator.queue_playlist_adds(&[5, 7]).unwrap();
        assert_eq!(request_ids.len(), 2);
        pump_until(&mut coordinator, |c| !c.playlist_add_outstanding).await;

        fail.assert_async().await;
        let pending = sync::pending_playlist_adds(coordinator.store()).unwrap();
        assert_eq!(pending.len(), 2);

        // Retry: newest mocks win, so stub success plus the refetch the
        // ack triggers.
        server
            .mock("PUT", "/events/9/active_playlist/songs")
            .with_status(200)
            .create_async()
            .await;
        let refetch = server
            .mock("GET", "/events/9/active_playlist")
            .with_status(200)
            .with_body(
                r#"[{"id": 30, "lib_song_id": 5, "up_votes": 0, "down_votes": 0,
                     "time_added": "2024-06-01T12:00:00Z", "adder_id": 42}]"#,
            )
            .expect(1)
            .create_async()
            .await;

        coordinator.resync().unwrap();
        pump_until(&mut coordinator, |c| {
            c.store().active_playlist().unwrap().len() == 1
        })
        .await;

        refetch.assert_async().await;
        assert!(sync::pending_playlist_adds(coordinator.store())
            .unwrap()
            .is_empty());
        let synced = coordinator
            .store()
            .playlist_requests_with_status(RequestStatus::Synced)
            .unwrap();
        assert_eq!(synced.len(), 2);
        assert_eq!(coordinator.store().active_playlist().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn end_event_purges_event_scoped_state() {
        let mut server = mockito::Server::new_async().await;
        let mut coordinator = coordinator_for(&server);
        login(&coordinator, 42);
        activate_event(&mut coordinator, &mut server, 9).await;

        server
            .mock("PUT", "/events/9/available_music")
            .with_status(200)
            .with_body("[1]")
            .create_async()
            .await;
        server
            .mock("PUT", "/events/9/active_playlist/songs")
            .with_status(500)
            .create_async()
            .await;

        let lib_id = coordinator
            .store()
            .add_library_song("A", "B", "C", "/a.mp3", 180)
            .unwrap();
        coordinator.offer_songs(&[lib_id]).unwrap();
        coordinator.queue_playlist_adds(&[lib_id]).unwrap();
        pump_until(&mut coordinator, |c| {
            !c.pool_outstanding && !c.playlist_add_outstanding
        })
        .await;

        server
            .mock("DELETE", "/events/9")
            .with_status(200)
            .create_async()
            .await;
        coordinator.end_event().unwrap();
        assert_eq!(coordinator.lifecycle(), EventLifecycle::EventEnding);
        pump_until(&mut coordinator, |c| {
            c.lifecycle() == EventLifecycle::NoEvent
        })
        .await;

        assert!(coordinator.store().list_pool().unwrap().is_empty());
        assert!(coordinator
            .store()
            .playlist_requests_with_status(RequestStatus::NeedsSync)
            .unwrap()
            .is_empty());
        assert!(coordinator.store().active_playlist().unwrap().is_empty());
        // The library survives the event.
        assert_eq!(coordinator.store().list_library().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn replies_for_concluded_events_are_discarded() {
        let server = mockito::Server::new_async().await;
        let mut coordinator = coordinator_for(&server);

        coordinator
            .store()
            .add_pool_entries(&[5])
            .unwrap();
        coordinator.active_event = Some(1);

        // An ack from a previous event must not flip rows of this one.
        coordinator
            .apply(Notification::AvailableSongsSynced {
                event_id: 99,
                ids: vec![5],
            })
            .unwrap();

        let unsynced = coordinator.store().unsynced_pool_entries().unwrap();
        assert_eq!(unsynced.len(), 1);
        assert!(coordinator.take_notices().is_empty());
    }

    #[tokio::test]
    async fn event_scoped_mutations_require_an_active_event() {
        let server = mockito::Server::new_async().await;
        let mut coordinator = coordinator_for(&server);

        assert!(matches!(
            coordinator.offer_songs(&[1]).unwrap_err(),
            CoreError::EventState(_)
        ));
        assert!(matches!(
            coordinator.queue_playlist_adds(&[1]).unwrap_err(),
            CoreError::EventState(_)
        ));
        assert!(matches!(
            coordinator.end_event().unwrap_err(),
            CoreError::EventState(_)
        ));
    }

    #[tokio::test]
    async fn hosted_event_is_resumed_from_the_store() {
        let server = mockito::Server::new_async().await;
        let (gateway, rx) = ServerGateway::new(&test_config(server.url())).unwrap();
        let store = RecordStore::open_memory().unwrap();
        store.kv_set("hosted_event_id", "7").unwrap();

        let coordinator = Coordinator::new(store, gateway, rx).unwrap();
        assert_eq!(coordinator.lifecycle(), EventLifecycle::EventActive);
        assert_eq!(coordinator.active_event(), Some(7));
        assert_eq!(
            coordinator.gateway().session().lock().unwrap().event_id(),
            Some(7)
        );
    }

    #[tokio::test]
    async fn playlist_removal_is_an_explicit_no_op() {
        let mut server = mockito::Server::new_async().await;
        let mut coordinator = coordinator_for(&server);
        login(&coordinator, 42);
        activate_event(&mut coordinator, &mut server, 9).await;

        coordinator
            .store()
            .replace_active_playlist(&[crate::model::ActivePlaylistEntry {
                playlist_id: 30,
                library_id: 1,
                up_votes: 0,
                down_votes: 0,
                priority: 0,
                time_added: chrono::Utc::now(),
                adder_id: 42,
            }])
            .unwrap();

        coordinator.remove_playlist_entries(&[30]).unwrap();
        assert_eq!(coordinator.store().active_playlist().unwrap().len(), 1);
    }
}
