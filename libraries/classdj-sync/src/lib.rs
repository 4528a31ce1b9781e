//! Live playlist sessions for ClassDJ
//!
//! A session owns one [`PlaylistPlayer`](classdj_playback::PlaylistPlayer) and
//! keeps it fed from the song server in one of three modes:
//!
//! - **Listing**: the whole shared library, once
//! - **Poll**: an owner's downloads, re-read every poll interval
//! - **Push**: an owner's `song_ready` notifications
//!
//! User intents and media reports go in through a [`SessionControl`];
//! snapshots and events come out through the [`SessionHandle`].

mod error;
mod feeds;
mod manager;
mod provider;
mod session;
mod types;

pub use error::{Result, SessionError};
pub use manager::SessionManager;
pub use provider::SongProvider;
pub use session::{SessionControl, SessionHandle};
pub use types::{ArrivalMode, SessionConfig, DEFAULT_POLL_INTERVAL};
