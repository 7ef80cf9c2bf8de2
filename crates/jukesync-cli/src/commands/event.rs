//! Event lifecycle commands.

use clap::Subcommand;
use jukesync_core::Notification;

use super::common::{self, CliError};

#[derive(Subcommand)]
pub enum EventAction {
    /// Create and start hosting a new event
    Create {
        /// Event name shown to guests
        name: String,
        /// Password guests must supply to join
        #[arg(long)]
        password: String,
    },
    /// End the hosted event and purge its local state
    End,
    /// Show the hosted event, if any
    Status,
}

pub async fn run(action: EventAction) -> Result<(), CliError> {
    match action {
        EventAction::Create { name, password } => {
            let mut coordinator = common::open_session().await?;
            coordinator.create_event(&name, &password)?;

            let note = common::wait_for(&mut coordinator, |n| {
                matches!(
                    n,
                    Notification::EventCreated { .. } | Notification::EventCreationFailed { .. }
                )
            })
            .await?;
            match note {
                Notification::EventCreated { event_id } => {
                    println!("hosting event {event_id} ({name})");
                }
                Notification::EventCreationFailed { reason } => {
                    return Err(format!("event creation failed: {reason}").into());
                }
                _ => unreachable!(),
            }
        }
        EventAction::End => {
            let mut coordinator = common::open_session().await?;
            coordinator.end_event()?;

            let note = common::wait_for(&mut coordinator, |n| {
                matches!(
                    n,
                    Notification::EventEnded | Notification::EventEndingFailed { .. }
                )
            })
            .await?;
            match note {
                Notification::EventEnded => println!("event ended"),
                Notification::EventEndingFailed { reason } => {
                    return Err(format!("failed to end event: {reason}").into());
                }
                _ => unreachable!(),
            }
        }
        EventAction::Status => {
            let coordinator = common::open_session().await?;
            match coordinator.active_event() {
                Some(event_id) => println!("hosting event {event_id}"),
                None => println!("no hosted event"),
            }
        }
    }
    Ok(())
}
