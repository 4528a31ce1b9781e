//! Playlist synchronizer
//!
//! Reconciles tracks reported by an external source (batch listing, polled
//! snapshots, push events) with the local playlist. Appends are idempotent and
//! keep arrival order. Only the append that makes the playlist non-empty is
//! reported as [`Arrival::First`], which is what triggers autoplay.

use crate::playlist::Playlist;
use crate::types::{OwnerId, Track};
use tracing::{debug, trace};

/// Outcome of a single arrival
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arrival {
    /// Identifier already present; nothing changed
    Duplicate,

    /// First track of an empty playlist (index 0)
    First,

    /// Track appended behind existing tracks
    Appended { index: usize },
}

impl Arrival {
    /// Whether the playlist changed
    pub fn is_new(self) -> bool {
        !matches!(self, Arrival::Duplicate)
    }

    /// Index of the new track, if one was added
    pub fn index(self) -> Option<usize> {
        match self {
            Arrival::Duplicate => None,
            Arrival::First => Some(0),
            Arrival::Appended { index } => Some(index),
        }
    }
}

/// Owner-scoped playlist reconciliation
#[derive(Debug, Clone, Default)]
pub struct PlaylistSynchronizer {
    owner: Option<OwnerId>,
    playlist: Playlist,
}

impl PlaylistSynchronizer {
    /// Synchronizer that accepts events for any owner
    pub fn new() -> Self {
        Self::default()
    }

    /// Synchronizer scoped to one owner's events
    pub fn for_owner(owner: OwnerId) -> Self {
        Self {
            owner: Some(owner),
            playlist: Playlist::new(),
        }
    }

    pub fn owner(&self) -> Option<OwnerId> {
        self.owner
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    /// Whether a push event from `owner` belongs to this playlist
    pub fn accepts(&self, owner: OwnerId) -> bool {
        self.owner.map_or(true, |own| own == owner)
    }

    /// Record a track reported by the external source
    pub fn on_arrival(&mut self, track: Track) -> Arrival {
        let was_empty = self.playlist.is_empty();
        let id = track.id.clone();

        match self.playlist.push(track) {
            None => {
                trace!(track_id = %id, "Duplicate arrival ignored");
                Arrival::Duplicate
            }
            Some(_) if was_empty => {
                debug!(track_id = %id, "First track arrived");
                Arrival::First
            }
            Some(index) => {
                debug!(track_id = %id, index, "Track appended");
                Arrival::Appended { index }
            }
        }
    }

    /// Reconcile a full snapshot of available track URLs
    ///
    /// Every identifier not already present is appended in snapshot order.
    pub fn on_snapshot(&mut self, snapshot: &[String]) -> Vec<Arrival> {
        let missing: Vec<String> = self
            .playlist
            .missing(snapshot)
            .into_iter()
            .map(str::to_string)
            .collect();

        if !missing.is_empty() {
            debug!(
                new = missing.len(),
                known = self.playlist.len(),
                "Snapshot contains new tracks"
            );
        }

        missing
            .into_iter()
            .map(|id| self.on_arrival(Track::from_url(id)))
            .collect()
    }

    /// Forget every track (full remount)
    pub fn reset(&mut self) {
        self.playlist.clear();
    }
}
