//! # Jukesync Core Library
//!
//! Client-side engine for a collaborative event playlist service: a local
//! cache of the user's music library and the shared playlist, kept
//! consistent with the server under unreliable connectivity.
//!
//! ## Architecture
//!
//! - **Record Store**: transactional SQLite tables for the library, the
//!   available pool, the playlist add queue, and the active-playlist cache
//! - **Sync Tracker**: per-collection scans for records pending sync, and
//!   atomic status transitions applied on acknowledgment
//! - **Server Gateway**: one async network call per logical operation,
//!   raising typed completion notifications
//! - **Coordinator**: the single owner wiring tracker output to gateway
//!   input and back, and driving the event lifecycle
//!
//! ## Key Components
//!
//! - [`Coordinator`]: reconciliation and event lifecycle state machine
//! - [`RecordStore`]: local persistence
//! - [`ServerGateway`]: server operations
//! - [`Config`]: application configuration management

pub mod coordinator;
pub mod error;
pub mod events;
pub mod gateway;
pub mod media;
pub mod model;
pub mod storage;
pub mod sync;

pub use coordinator::{Coordinator, EventLifecycle};
pub use error::{ConfigError, CoreError, GatewayError, StoreError};
pub use events::Notification;
pub use gateway::{ServerGateway, Session};
pub use media::{LoftyTagReader, TagReader, TrackTags};
pub use model::{
    ActivePlaylistEntry, AvailablePoolEntry, ClientRequestId, EventId, LibrarySong, LibrarySongId,
    PlayQueueTrack, PlaylistAddRequest, PlaylistEntryId, RequestStatus, SyncStatus,
};
pub use storage::{Config, RecordStore};
