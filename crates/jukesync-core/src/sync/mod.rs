//! Per-collection sync state tracking.
//!
//! Each syncable collection (library, available pool, playlist add queue)
//! gets the same three-part contract: a one-shot scan for records pending
//! an add, and atomic mark-synced / mark-failed transitions applied when
//! the server's answer comes back.

pub mod tracker;


pub use tracker::{
    mark_library_failed, mark_library_synced, mark_pool_failed, mark_pool_synced,
    mark_requests_failed, mark_requests_synced, pending_library_adds, pending_playlist_adds,
    pending_pool_adds,
};
