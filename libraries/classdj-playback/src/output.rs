//! Platform-agnostic media output trait
//!
//! Abstracts the single media element a player drives (an HTML audio element
//! in a browser, a decoder + device on desktop, a wall clock in headless runs).

use crate::error::Result;
use crate::types::Track;
use std::time::Duration;

/// Handle to the media output a player drives
///
/// A player owns exactly one output, so at most one track is ever playing.
/// Calls are fire-and-forget: the output reports progress and track end back
/// through the player's `on_progress_tick` and `on_track_ended`.
pub trait MediaOutput: Send {
    /// Point the output at a new track, stopping whatever was loaded
    fn load(&mut self, track: &Track) -> Result<()>;

    /// Start or resume playback
    ///
    /// May be rejected (autoplay policy, device unavailable). The player logs
    /// the rejection and stays paused.
    fn play(&mut self) -> Result<()>;

    /// Pause playback, keeping the position
    fn pause(&mut self);

    /// Move the play position within the loaded track
    fn set_position(&mut self, position: Duration) -> Result<()>;
}

impl<T: MediaOutput + ?Sized> MediaOutput for Box<T> {
    fn load(&mut self, track: &Track) -> Result<()> {
        (**self).load(track)
    }

    fn play(&mut self) -> Result<()> {
        (**self).play()
    }

    fn pause(&mut self) {
        (**self).pause();
    }

    fn set_position(&mut self, position: Duration) -> Result<()> {
        (**self).set_position(position)
    }
}

/// Output that records every call, for unit tests
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingOutput {
    pub calls: Vec<String>,
    pub reject_play: bool,
}

#[cfg(test)]
impl MediaOutput for RecordingOutput {
    fn load(&mut self, track: &Track) -> Result<()> {
        self.calls.push(format!("load {}", track.id));
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        if self.reject_play {
            self.calls.push("play rejected".to_string());
            return Err(crate::error::PlaybackError::Output(
                "autoplay blocked".to_string(),
            ));
        }
        self.calls.push("play".to_string());
        Ok(())
    }

    fn pause(&mut self) {
        self.calls.push("pause".to_string());
    }

    fn set_position(&mut self, position: Duration) -> Result<()> {
        self.calls.push(format!("seek {}ms", position.as_millis()));
        Ok(())
    }
}
