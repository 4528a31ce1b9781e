//! Types for ClassDJ server API requests and responses.

use classdj_playback::OwnerId;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default per-request timeout for non-streaming calls.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for connecting to a ClassDJ server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Base URL of the server (e.g., "http://localhost:5050")
    pub url: String,
    /// Timeout applied to every request except the event stream
    pub request_timeout: Duration,
}

impl ServerConfig {
    /// Create a new server config with just the URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Override the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

// =============================================================================
// General Types
// =============================================================================

/// Response of the server's root endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerInfo {
    #[serde(default)]
    pub message: String,
}

/// Generic `{ "message": ... }` acknowledgement.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,
}

// =============================================================================
// Song Types
// =============================================================================

/// Response of `GET /list_songs`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SongListing {
    #[serde(default)]
    pub songs: Vec<String>,
}

/// Response of `GET /download_student_songs/<owner>`.
///
/// `file` is present when the first song was ready immediately.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DownloadResponse {
    #[serde(default)]
    pub file: Option<String>,
}

/// One entry of `GET /download_progress/<owner>`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProgressEntry {
    #[serde(default)]
    pub path: Option<String>,
}

/// Push notification that a downloaded song is ready to play.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SongReady {
    /// Owner (student) the song was downloaded for
    #[serde(rename = "ownerId", alias = "owner_id", deserialize_with = "owner_from_any")]
    pub owner_id: OwnerId,
    /// Server path (or absolute URL) of the song
    pub path: String,
}

/// Accept owner ids sent either as numbers or numeric strings.
fn owner_from_any<'de, D>(deserializer: D) -> std::result::Result<OwnerId, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawOwner {
        Number(i64),
        Text(String),
    }

    match RawOwner::deserialize(deserializer)? {
        RawOwner::Number(n) => Ok(OwnerId::new(n)),
        RawOwner::Text(s) => s
            .trim()
            .parse::<i64>()
            .map(OwnerId::new)
            .map_err(serde::de::Error::custom),
    }
}

// =============================================================================
// Catalog Types
// =============================================================================

/// A class period with its students, from `GET /classes_full`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassPeriod {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub students: Vec<Student>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<Artist>,
}

impl Student {
    /// The student as a playlist owner.
    pub fn owner_id(&self) -> OwnerId {
        OwnerId::new(self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artist {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub songs: Vec<Song>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    #[serde(default)]
    pub id: Option<i64>,
    pub title: String,
}

/// Level of the class hierarchy an item belongs to.
///
/// Deleting an item removes everything beneath it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogKind {
    Class,
    Student,
    Artist,
    Song,
}

impl CatalogKind {
    /// Path segment used by `DELETE /delete/<kind>/<id>`
    pub fn as_str(self) -> &'static str {
        match self {
            CatalogKind::Class => "class",
            CatalogKind::Student => "student",
            CatalogKind::Artist => "artist",
            CatalogKind::Song => "song",
        }
    }
}

impl fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CatalogKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "class" => Ok(CatalogKind::Class),
            "student" => Ok(CatalogKind::Student),
            "artist" => Ok(CatalogKind::Artist),
            "song" => Ok(CatalogKind::Song),
            other => Err(format!(
                "unknown item kind '{}' (expected class, student, artist or song)",
                other
            )),
        }
    }
}
