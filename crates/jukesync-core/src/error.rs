//! Core error types for jukesync-core.
//!
//! A thiserror hierarchy: each layer (store, gateway, config) has its own
//! error enum, folded into [`CoreError`] at the crate surface.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for jukesync-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Local record-store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Server gateway errors
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Media tag extraction errors
    #[error("Tag error: {0}")]
    Tags(#[from] crate::media::TagError),

    /// An operation was invoked in the wrong event-lifecycle state
    #[error("Invalid event state: {0}")]
    EventState(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Record-store errors.
///
/// Store failures are fatal to the operation that hit them, never to the
/// process: the operation aborts and local state is left unchanged.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open the database file
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Server gateway errors.
///
/// Timeouts and non-success HTTP statuses surface as `Transport`; a
/// response missing expected headers or fields is a `Protocol` mismatch
/// and takes the same failure path.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Protocol mismatch: {0}")]
    Protocol(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("No valid session ticket")]
    NotAuthenticated,

    #[error("Invalid server base URL: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(inner, _msg) => {
                if inner.code == rusqlite::ErrorCode::DatabaseLocked {
                    StoreError::Locked
                } else {
                    StoreError::QueryFailed(err.to_string())
                }
            }
            _ => StoreError::QueryFailed(err.to_string()),
        }
    }
}

impl From<Box<dyn std::error::Error + Send + Sync>> for CoreError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        CoreError::Custom(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
