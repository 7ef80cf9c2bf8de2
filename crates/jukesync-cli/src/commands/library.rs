//! Local library commands.

use std::path::PathBuf;

use clap::Subcommand;
use jukesync_core::sync::pending_library_adds;
use jukesync_core::{Config, LoftyTagReader, Notification, RecordStore};

use super::common::{self, CliError};

#[derive(Subcommand)]
pub enum LibraryAction {
    /// Import an audio file or a directory of audio files
    Import {
        /// File or directory; defaults to the configured music_dir
        path: Option<PathBuf>,
    },
    /// List library songs with their sync status
    List {
        /// Emit JSON instead of the plain listing
        #[arg(long)]
        json: bool,
    },
    /// Delete every local library row
    Clear,
}

pub async fn run(action: LibraryAction) -> Result<(), CliError> {
    match action {
        LibraryAction::Import { path } => {
            let path = match path {
                Some(p) => p,
                None => Config::load()?
                    .library
                    .music_dir
                    .map(PathBuf::from)
                    .ok_or("no path given and no library.music_dir configured")?,
            };

            let mut coordinator = common::open_session().await?;
            let reader = LoftyTagReader;
            let imported = if path.is_dir() {
                coordinator.import_directory(&reader, &path)?
            } else {
                coordinator.import_file(&reader, &path)?;
                1
            };

            // Wait out the sync cycle so the command reports real status.
            while !pending_library_adds(coordinator.store())?.is_empty() {
                let note = common::wait_for(&mut coordinator, |n| {
                    matches!(
                        n,
                        Notification::LibrarySongsSynced { .. }
                            | Notification::LibrarySyncFailed { .. }
                    )
                })
                .await?;
                if let Notification::LibrarySyncFailed { reason, .. } = note {
                    println!("imported {imported} song(s); sync incomplete: {reason}");
                    return Ok(());
                }
            }
            println!("imported and synced {imported} song(s)");
        }
        LibraryAction::List { json } => {
            let store = RecordStore::open()?;
            let songs = store.list_library()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&songs)?);
            } else {
                for song in songs {
                    println!(
                        "{:>5}  {} - {} [{}] ({}s, {:?})",
                        song.id, song.artist, song.title, song.album, song.duration_secs,
                        song.sync_status
                    );
                }
            }
        }
        LibraryAction::Clear => {
            let store = RecordStore::open()?;
            let deleted = store.clear_library()?;
            println!("deleted {deleted} song(s)");
        }
    }
    Ok(())
}
