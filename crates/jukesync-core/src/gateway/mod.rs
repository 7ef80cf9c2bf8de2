//! Server gateway: one logical operation per network call.
//!
//! Each operation builds its request from a pure serialization of its
//! input records, issues it without blocking the caller, and raises
//! exactly one typed [`crate::events::Notification`] on completion.

pub mod client;
pub mod codec;
pub mod session;

pub use client::ServerGateway;
pub use session::Session;

/// Header carrying the session ticket on every authenticated call.
pub const TICKET_HEADER: &str = "X-Jukesync-Ticket-Hash";
/// Header carrying the numeric user id on the authenticate reply.
pub const USER_ID_HEADER: &str = "X-Jukesync-User-Id";
/// Header carrying the API version on the authenticate request.
pub const API_VERSION_HEADER: &str = "X-Jukesync-Api-Version";

/// Thin wrapper around the OS keyring for credential storage.
pub mod keyring_store {
    const SERVICE: &str = "jukesync";

    pub fn get(key: &str) -> Result<Option<String>, Box<dyn std::error::Error>> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        match entry.get_password() {
            Ok(pw) => Ok(Some(pw)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn set(key: &str, value: &str) -> Result<(), Box<dyn std::error::Error>> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        entry.set_password(value)?;
        Ok(())
    }

    pub fn delete(key: &str) -> Result<(), Box<dyn std::error::Error>> {
        let entry = keyring::Entry::new(SERVICE, key)?;
        match entry.delete_credential() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
