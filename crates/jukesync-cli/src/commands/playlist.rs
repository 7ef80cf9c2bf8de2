//! Shared playlist commands.

use clap::Subcommand;
use jukesync_core::{Notification, RecordStore};

use super::common::{self, CliError};

#[derive(Subcommand)]
pub enum PlaylistAction {
    /// Offer library songs to the event's available pool
    Offer {
        /// Library song ids
        #[arg(required = true)]
        ids: Vec<i64>,
    },
    /// Queue library songs onto the shared playlist
    Add {
        /// Library song ids
        #[arg(required = true)]
        ids: Vec<i64>,
    },
    /// Fetch and show the current playlist
    Show,
    /// Show the next track to play
    Next {
        /// Remove the track from the local queue as well
        #[arg(long)]
        take: bool,
    },
}

pub async fn run(action: PlaylistAction) -> Result<(), CliError> {
    match action {
        PlaylistAction::Offer { ids } => {
            let mut coordinator = common::open_session().await?;
            coordinator.offer_songs(&ids)?;

            let note = common::wait_for(&mut coordinator, |n| {
                matches!(
                    n,
                    Notification::AvailableSongsSynced { .. }
                        | Notification::AvailableSyncFailed { .. }
                )
            })
            .await?;
            match note {
                Notification::AvailableSongsSynced { ids, .. } => {
                    println!("offered {} song(s)", ids.len());
                }
                Notification::AvailableSyncFailed { reason, .. } => {
                    return Err(format!("offer failed: {reason}").into());
                }
                _ => unreachable!(),
            }
        }
        PlaylistAction::Add { ids } => {
            let mut coordinator = common::open_session().await?;
            let request_ids = coordinator.queue_playlist_adds(&ids)?;

            let note = common::wait_for(&mut coordinator, |n| {
                matches!(
                    n,
                    Notification::PlaylistAddsSynced { .. }
                        | Notification::PlaylistAddFailed { .. }
                )
            })
            .await?;
            if let Notification::PlaylistAddFailed { reason, .. } = note {
                return Err(format!(
                    "playlist add failed ({} request(s) stay queued): {reason}",
                    request_ids.len()
                )
                .into());
            }

            // The ack triggers a refetch; wait for it so the printed
            // playlist includes the new entries.
            common::wait_for(&mut coordinator, |n| {
                matches!(
                    n,
                    Notification::PlaylistFetched { .. }
                        | Notification::PlaylistFetchFailed { .. }
                )
            })
            .await?;
            print_playlist(coordinator.store())?;
        }
        PlaylistAction::Show => {
            let mut coordinator = common::open_session().await?;
            coordinator.refresh_playlist()?;
            common::wait_for(&mut coordinator, |n| {
                matches!(
                    n,
                    Notification::PlaylistFetched { .. }
                        | Notification::PlaylistFetchFailed { .. }
                )
            })
            .await?;
            print_playlist(coordinator.store())?;
        }
        PlaylistAction::Next { take } => {
            let store = RecordStore::open()?;
            let track = if take {
                store.take_next_in_queue()?
            } else {
                store.next_in_queue()?
            };
            match track {
                Some(track) => {
                    println!("{} - {} ({})", track.artist, track.title, track.file_path);
                }
                None => println!("play queue is empty"),
            }
        }
    }
    Ok(())
}

fn print_playlist(store: &RecordStore) -> Result<(), CliError> {
    for entry in store.active_playlist()? {
        let title = store
            .library_song(entry.library_id)?
            .map(|s| format!("{} - {}", s.artist, s.title))
            .unwrap_or_else(|| format!("library song {}", entry.library_id));
        println!(
            "{:>3}. {title}  (+{} / -{}, added {})",
            entry.priority + 1,
            entry.up_votes,
            entry.down_votes,
            entry.time_added.to_rfc3339()
        );
    }
    Ok(())
}
