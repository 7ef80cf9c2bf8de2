//! Authentication commands.

use clap::Subcommand;
use jukesync_core::gateway::keyring_store;
use jukesync_core::Config;

use super::common::{self, CliError};

#[derive(Subcommand)]
pub enum AuthAction {
    /// Store credentials and verify them against the server
    Login {
        /// Account username
        #[arg(long)]
        username: String,
        /// Account password (stored in the OS keyring)
        #[arg(long)]
        password: String,
    },
    /// Remove stored credentials
    Logout,
    /// Check whether stored credentials authenticate
    Status,
}

pub async fn run(action: AuthAction) -> Result<(), CliError> {
    match action {
        AuthAction::Login { username, password } => {
            let mut config = Config::load()?;
            config.username = Some(username.clone());
            config.save()?;
            keyring_store::set("password", &password)?;

            let coordinator = common::open_session().await?;
            let session = coordinator.gateway().session();
            let user_id = session.lock().unwrap().user_id().unwrap_or(-1);
            println!("authenticated as {username} (user id {user_id})");
        }
        AuthAction::Logout => {
            keyring_store::delete("password")?;
            let mut config = Config::load()?;
            config.username = None;
            config.save()?;
            println!("logged out");
        }
        AuthAction::Status => match common::open_session().await {
            Ok(coordinator) => {
                let session = coordinator.gateway().session();
                let session = session.lock().unwrap();
                println!(
                    "authenticated (user id {}, ticket issued {})",
                    session.user_id().unwrap_or(-1),
                    session
                        .ticket_issued_at()
                        .map(|t| t.to_rfc3339())
                        .unwrap_or_default()
                );
            }
            Err(e) => println!("not authenticated: {e}"),
        },
    }
    Ok(())
}
