//! Error types for playback management

use thiserror::Error;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// No track is currently selected
    #[error("No track loaded")]
    NoTrackLoaded,

    /// Seek requested before the track duration was reported
    #[error("Track duration is not known yet")]
    DurationUnknown,

    /// Seek fraction is not a number
    #[error("Invalid seek fraction: {0}")]
    InvalidSeekFraction(f32),

    /// Media output rejected a request (e.g. autoplay policy)
    #[error("Media output error: {0}")]
    Output(String),
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
