//! ClassDJ Server Client
//!
//! HTTP client library for the ClassDJ song server.
//!
//! # Features
//!
//! - **Songs**: list the shared library, trigger a student's download, poll
//!   download progress
//! - **Push**: subscribe to `song_ready` notifications
//! - **Catalog**: fetch the class → student → artist → song hierarchy and
//!   delete items from it
//!
//! # Example
//!
//! ```ignore
//! use classdj_client::{ClassDjClient, ServerConfig};
//! use classdj_playback::OwnerId;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ClassDjClient::new(ServerConfig::new("http://localhost:5050"))?;
//!
//!     let first = client.songs().trigger_download(OwnerId::new(3)).await?;
//!     println!("First song ready: {:?}", first);
//!
//!     let ready = client.songs().download_progress(OwnerId::new(3)).await?;
//!     println!("{} songs downloaded so far", ready.len());
//!
//!     Ok(())
//! }
//! ```

mod catalog;
mod client;
mod error;
mod events;
mod songs;
mod types;

// Re-export main types
pub use client::{resolve_path, ClassDjClient};
pub use error::{ClientError, Result};
pub use events::{SongEventStream, SseDecoder, SseFrame, SONG_READY_EVENT};
pub use songs::song_url;
pub use types::{
    Artist, CatalogKind, ClassPeriod, DownloadResponse, MessageResponse, ProgressEntry, ServerConfig,
    ServerInfo, Song, SongListing, SongReady, Student, DEFAULT_REQUEST_TIMEOUT,
};

// Re-export sub-clients for direct use if needed
pub use catalog::CatalogClient;
pub use songs::SongsClient;
