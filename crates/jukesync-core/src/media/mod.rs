//! Media file discovery and tag extraction.
//!
//! Tag extraction is a pure function of the file path: it either yields
//! `{title, artist, album, duration}` or fails. The [`TagReader`] trait is
//! the seam; [`LoftyTagReader`] is the production implementation.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

pub const SUPPORTED_AUDIO_EXTENSIONS: [&str; 5] = ["mp3", "m4a", "ogg", "flac", "wav"];

/// Tag metadata extracted from an audio file.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackTags {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub duration_secs: i64,
}

/// Tag extraction errors.
#[derive(Error, Debug)]
pub enum TagError {
    #[error("Unreadable media file {path}: {message}")]
    Unreadable { path: PathBuf, message: String },
}

/// Extracts tags from a media file.
pub trait TagReader {
    fn read_tags(&self, path: &Path) -> Result<TrackTags, TagError>;
}

/// Tag reader backed by `lofty`.
pub struct LoftyTagReader;

impl TagReader for LoftyTagReader {
    fn read_tags(&self, path: &Path) -> Result<TrackTags, TagError> {
        use lofty::file::{AudioFile, TaggedFileExt};
        use lofty::prelude::Accessor;

        let tagged = lofty::read_from_path(path).map_err(|e| TagError::Unreadable {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let duration_secs = tagged.properties().duration().as_secs() as i64;

        let tag = tagged.primary_tag().or_else(|| tagged.tags().first());
        let (title, artist, album) = match tag {
            Some(tag) => (
                tag.title().map(|v| v.trim().to_string()).unwrap_or_default(),
                tag.artist().map(|v| v.trim().to_string()).unwrap_or_default(),
                tag.album().map(|v| v.trim().to_string()).unwrap_or_default(),
            ),
            None => (String::new(), String::new(), String::new()),
        };

        // Untitled files fall back to the file stem so the library row is
        // still addressable.
        let title = if title.is_empty() {
            path.file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("unknown")
                .to_string()
        } else {
            title
        };

        Ok(TrackTags {
            title,
            artist,
            album,
            duration_secs,
        })
    }
}

pub fn is_supported_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            SUPPORTED_AUDIO_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
        .unwrap_or(false)
}

/// Recursively collect supported audio files under a directory.
/// Unreadable directories are skipped, not fatal.
pub fn collect_audio_files(folder: &Path) -> Vec<PathBuf> {
    let mut pending_directories = vec![folder.to_path_buf()];
    let mut tracks = Vec::new();

    while let Some(directory) = pending_directories.pop() {
        let entries = match std::fs::read_dir(&directory) {
            Ok(entries) => entries,
            Err(err) => {
                debug!("failed to read directory {}: {err}", directory.display());
                continue;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                pending_directories.push(path);
            } else if is_supported_audio_file(&path) {
                tracks.push(path);
            }
        }
    }

    tracks.sort();
    tracks
}
