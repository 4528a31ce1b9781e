//! Playback Events
//!
//! Event-based communication for UI synchronization. Events are queued by the
//! player as operations run and drained by the host afterwards.

use serde::{Deserialize, Serialize};

/// Events emitted by the player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlaybackEvent {
    /// A new track joined the playlist
    TrackAdded {
        /// Position of the track in the playlist
        index: usize,
        /// ID of the new track
        track_id: String,
    },

    /// The active track changed (autoplay, next, previous, track end)
    TrackChanged {
        /// Index of the new (current) track
        index: usize,
        /// ID of the new (current) track
        track_id: String,
    },

    /// Playing/paused state changed
    StateChanged {
        /// Whether the output is now playing
        is_playing: bool,
    },

    /// The media output refused to start playing
    PlayRejected {
        /// ID of the track that failed to start
        track_id: String,
        /// Error reported by the output
        message: String,
    },

    /// Play position moved by a seek
    Seeked {
        /// New position from the start of the track
        position_ms: u64,
    },
}
