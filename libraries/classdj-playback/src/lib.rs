//! ClassDJ - Playback Management
//!
//! Platform-agnostic playlist and now-playing state for ClassDJ players.
//!
//! This crate provides:
//! - An ordered, deduplicated playlist that fills as songs become ready
//! - Owner-scoped reconciliation of listings, polled snapshots, and push events
//! - Autoplay of the first track to arrive, and only the first
//! - Play/pause, next/previous with wraparound, seek, progress tracking
//!
//! # Architecture
//!
//! `classdj-playback` has no I/O and no async runtime. The media element is
//! provided by the platform through the [`MediaOutput`] trait; arrivals come
//! from whatever drives the player (see `classdj-sync`).
//!
//! # Example
//!
//! ```rust
//! use classdj_playback::{MediaOutput, PlaylistPlayer, Result, Track};
//! use std::time::Duration;
//!
//! struct Silent;
//!
//! impl MediaOutput for Silent {
//!     fn load(&mut self, _track: &Track) -> Result<()> { Ok(()) }
//!     fn play(&mut self) -> Result<()> { Ok(()) }
//!     fn pause(&mut self) {}
//!     fn set_position(&mut self, _position: Duration) -> Result<()> { Ok(()) }
//! }
//!
//! let mut player = PlaylistPlayer::new(Silent);
//! player.on_arrival(Track::from_url("http://localhost:5050/songs/a.mp3"));
//!
//! // First arrival starts playback
//! assert!(player.state().is_playing);
//! assert_eq!(player.now_playing_title(), Some("a.mp3"));
//!
//! player.on_arrival(Track::from_url("http://localhost:5050/songs/b.mp3"));
//! player.next();
//! assert_eq!(player.now_playing_title(), Some("b.mp3"));
//! ```

mod controller;
mod error;
mod events;
mod output;
mod player;
mod playlist;
mod synchronizer;
pub mod types;

// Public exports
pub use controller::PlaybackController;
pub use error::{PlaybackError, Result};
pub use events::PlaybackEvent;
pub use output::MediaOutput;
pub use player::PlaylistPlayer;
pub use playlist::Playlist;
pub use synchronizer::{Arrival, PlaylistSynchronizer};
pub use types::{display_title, OwnerId, PlaybackState, PlayerSnapshot, Track};
