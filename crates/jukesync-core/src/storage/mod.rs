mod config;
pub mod migrations;
pub mod record_store;

pub use config::{Config, LibraryConfig, ServerConfig};
pub use record_store::RecordStore;

use std::path::PathBuf;

/// Returns `~/.config/jukesync[-dev]/` based on JUKESYNC_ENV.
///
/// Set JUKESYNC_ENV=dev to use a development data directory.
///
/// # Errors
/// Returns an error if the home directory cannot be determined or if
/// creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("JUKESYNC_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("jukesync-dev")
    } else {
        base_dir.join("jukesync")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
