//! Core types for playlist and playback management

use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of the entity (a student) whose songs a player session follows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(i64);

impl OwnerId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for OwnerId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One playable audio item
///
/// `id` is the URL (or filename) the media output loads. Two tracks with the
/// same `id` are the same track as far as the playlist is concerned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// URL or filename, unique within a playlist
    pub id: String,

    /// Human-readable name derived from the filename
    pub title: String,
}

impl Track {
    /// Build a track from its URL, deriving the display title
    pub fn from_url(url: impl Into<String>) -> Self {
        let id = url.into();
        let title = display_title(&id);
        Self { id, title }
    }
}

/// Strip the directory prefix from a track URL and percent-decode the filename
///
/// `http://host/songs/My%20Song.mp3` becomes `My Song.mp3`. If the filename is
/// not valid UTF-8 once decoded, the raw segment is returned.
pub fn display_title(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    let segment = trimmed.rsplit('/').next().unwrap_or(trimmed);

    match percent_decode_str(segment).decode_utf8() {
        Ok(decoded) if !decoded.is_empty() => decoded.into_owned(),
        _ => segment.to_string(),
    }
}

/// Playback state
///
/// `current_index` is `None` exactly when the playlist is empty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaybackState {
    /// Index of the active track
    pub current_index: Option<usize>,

    /// Whether the media output is currently playing
    pub is_playing: bool,

    /// Position within the current track, 0.0 to 1.0
    pub progress: f32,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            current_index: None,
            is_playing: false,
            progress: 0.0,
        }
    }
}

/// Renderable view of a player for UI layers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    /// Owner whose songs are playing, if scoped
    pub owner: Option<OwnerId>,

    /// Titles in playlist order
    pub titles: Vec<String>,

    /// Index of the active track
    pub current_index: Option<usize>,

    /// Title of the active track
    pub now_playing: Option<String>,

    /// Whether the media output is currently playing
    pub is_playing: bool,

    /// Position within the current track, 0.0 to 1.0
    pub progress: f32,
}
