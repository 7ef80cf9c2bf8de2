//! Shared session bootstrap for the network-facing commands.

use std::time::Duration;

use jukesync_core::gateway::keyring_store;
use jukesync_core::{Config, Coordinator, Notification, RecordStore, ServerGateway};

pub type CliError = Box<dyn std::error::Error>;

/// Build a coordinator from config and stored credentials and authenticate
/// against the server. Fails if no credentials are stored or the server
/// rejects them.
pub async fn open_session() -> Result<Coordinator, CliError> {
    let config = Config::load()?;
    let (gateway, rx) = ServerGateway::new(&config.server)?;
    let store = RecordStore::open()?;
    let mut coordinator = Coordinator::new(store, gateway, rx)?;

    let username = config
        .username
        .clone()
        .ok_or("no username configured; run `jukesync-cli auth login` first")?;
    let password = keyring_store::get("password")?
        .ok_or("no stored password; run `jukesync-cli auth login` first")?;

    coordinator.gateway().authenticate(&username, &password);
    match wait_for(&mut coordinator, |n| {
        matches!(
            n,
            Notification::ConnectionEstablished { .. } | Notification::ConnectionFailed { .. }
        )
    })
    .await?
    {
        Notification::ConnectionFailed { reason } => {
            Err(format!("authentication failed: {reason}").into())
        }
        _ => Ok(coordinator),
    }
}

/// Pump notifications until one matches the predicate, returning it.
/// Times out after 60 seconds.
pub async fn wait_for<F>(
    coordinator: &mut Coordinator,
    pred: F,
) -> Result<Notification, CliError>
where
    F: Fn(&Notification) -> bool,
{
    let outcome = tokio::time::timeout(Duration::from_secs(60), async {
        loop {
            if coordinator.wait_and_pump().await? == 0 {
                return Err(jukesync_core::CoreError::Custom(
                    "notification channel closed".into(),
                ));
            }
            for n in coordinator.take_notices() {
                if pred(&n) {
                    return Ok(n);
                }
            }
        }
    })
    .await;

    match outcome {
        Ok(Ok(n)) => Ok(n),
        Ok(Err(e)) => Err(e.into()),
        Err(_) => Err("timed out waiting for the server".into()),
    }
}
