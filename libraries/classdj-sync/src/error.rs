use thiserror::Error;

/// Errors that can occur while running a playlist session
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Server error: {0}")]
    Client(#[from] classdj_client::ClientError),

    #[error("Playback error: {0}")]
    Playback(#[from] classdj_playback::PlaybackError),

    #[error("{0} mode needs an owner")]
    OwnerRequired(crate::ArrivalMode),

    #[error("Session is closed")]
    Closed,

    #[error("Session task failed: {0}")]
    Task(String),
}

pub type Result<T> = std::result::Result<T, SessionError>;
