/// Player error types
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PlayerError>;

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Server error: {0}")]
    Client(#[from] classdj_client::ClientError),

    #[error("Session error: {0}")]
    Session(#[from] classdj_sync::SessionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
