//! Headless media output
//!
//! [`ClockOutput`] plays nothing: it runs a clock per loaded track so a
//! session can be driven without an audio device. The paired [`Clock`] reads
//! that clock and reports progress and track end back into the session.

use classdj_playback::{MediaOutput, PlaybackError, Track};
use classdj_sync::SessionControl;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, trace};

#[derive(Debug, Default)]
struct ClockState {
    track: Option<String>,
    /// Position when the clock was last anchored
    position: Duration,
    /// Set while playing
    started: Option<Instant>,
}

impl ClockState {
    fn elapsed(&self) -> Duration {
        self.position + self.started.map_or(Duration::ZERO, |s| s.elapsed())
    }

    fn stop(&mut self) {
        self.position = self.elapsed();
        self.started = None;
    }
}

fn lock(state: &Mutex<ClockState>) -> MutexGuard<'_, ClockState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Media output backed by a wall clock
#[derive(Debug)]
pub struct ClockOutput {
    state: Arc<Mutex<ClockState>>,
    track_length: Duration,
}

impl ClockOutput {
    /// Create an output whose tracks all last `track_length`
    pub fn new(track_length: Duration) -> (Self, Clock) {
        let state = Arc::new(Mutex::new(ClockState::default()));
        let clock = Clock {
            state: Arc::clone(&state),
            track_length,
        };
        (
            Self {
                state,
                track_length,
            },
            clock,
        )
    }
}

impl MediaOutput for ClockOutput {
    fn load(&mut self, track: &Track) -> classdj_playback::Result<()> {
        let mut state = lock(&self.state);
        debug!(track = %track.title, "Loading track");
        state.track = Some(track.id.clone());
        state.position = Duration::ZERO;
        state.started = None;
        Ok(())
    }

    fn play(&mut self) -> classdj_playback::Result<()> {
        let mut state = lock(&self.state);
        if state.track.is_none() {
            return Err(PlaybackError::Output("nothing loaded".to_string()));
        }
        if state.started.is_none() {
            state.started = Some(Instant::now());
        }
        Ok(())
    }

    fn pause(&mut self) {
        lock(&self.state).stop();
    }

    fn set_position(&mut self, position: Duration) -> classdj_playback::Result<()> {
        let mut state = lock(&self.state);
        if state.track.is_none() {
            return Err(PlaybackError::NoTrackLoaded);
        }
        state.position = position.min(self.track_length);
        if state.started.is_some() {
            state.started = Some(Instant::now());
        }
        Ok(())
    }
}

/// What the clock has to report, for the track it was loaded with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClockReading {
    Progress {
        track: String,
        position: Duration,
        duration: Duration,
    },
    Ended {
        track: String,
    },
}

/// Read side of a [`ClockOutput`]
#[derive(Debug, Clone)]
pub struct Clock {
    state: Arc<Mutex<ClockState>>,
    track_length: Duration,
}

impl Clock {
    /// Sample the clock; `None` while paused or empty
    ///
    /// Reports `Ended` once per track: the clock stops at the end.
    pub fn read(&self) -> Option<ClockReading> {
        let mut state = lock(&self.state);
        let track = state.track.clone()?;
        state.started?;

        let position = state.elapsed();
        if position >= self.track_length {
            state.stop();
            state.position = self.track_length;
            return Some(ClockReading::Ended { track });
        }

        Some(ClockReading::Progress {
            track,
            position,
            duration: self.track_length,
        })
    }

    /// Report readings into a session every `tick` until it closes
    pub async fn drive(self, control: SessionControl, tick: Duration) {
        let mut ticker = time::interval(tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            let sent = match self.read() {
                Some(ClockReading::Progress {
                    track,
                    position,
                    duration,
                }) => {
                    trace!(position = ?position, "Progress tick");
                    control.progress_tick(track, position, duration).await
                }
                Some(ClockReading::Ended { track }) => {
                    debug!(track = %track, "Track ended");
                    control.track_ended(track).await
                }
                None => Ok(()),
            };
            if sent.is_err() {
                debug!("Session closed, clock stopped");
                return;
            }
        }
    }
}
