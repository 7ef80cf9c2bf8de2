//! Session state for the server connection.

use chrono::{DateTime, Utc};

use crate::model::EventId;

/// Connection/session state: ticket, user id, and the currently hosted
/// event. Replaces ad hoc connection fields with one value object owned
/// by the gateway.
#[derive(Debug, Clone, Default)]
pub struct Session {
    ticket: Option<String>,
    user_id: Option<i64>,
    ticket_issued_at: Option<DateTime<Utc>>,
    event_id: Option<EventId>,
    hosting: bool,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a session ticket is currently held. Every operation except
    /// authenticate and event-end is a no-op while this is false.
    pub fn has_valid_ticket(&self) -> bool {
        self.ticket.is_some()
    }

    /// Store the ticket and user id from a successful authenticate,
    /// timestamping issuance.
    pub fn store_ticket(&mut self, ticket: String, user_id: i64) {
        self.ticket = Some(ticket);
        self.user_id = Some(user_id);
        self.ticket_issued_at = Some(Utc::now());
    }

    pub fn ticket(&self) -> Option<&str> {
        self.ticket.as_deref()
    }

    pub fn user_id(&self) -> Option<i64> {
        self.user_id
    }

    pub fn ticket_issued_at(&self) -> Option<DateTime<Utc>> {
        self.ticket_issued_at
    }

    /// Record the event created on the server; the session is now hosting.
    pub fn store_event(&mut self, event_id: EventId) {
        self.event_id = Some(event_id);
        self.hosting = true;
    }

    pub fn event_id(&self) -> Option<EventId> {
        self.event_id
    }

    pub fn is_hosting(&self) -> bool {
        self.hosting
    }

    /// Forget the hosted event. The ticket survives; it is event-independent.
    pub fn clear_event(&mut self) {
        self.event_id = None;
        self.hosting = false;
    }
}
