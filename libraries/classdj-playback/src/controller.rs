//! Playback controller - now-playing state
//!
//! Single source of truth for which track is active and whether it plays.
//! Drives exactly one [`MediaOutput`], advancing with wraparound on track end.

use crate::{
    error::{PlaybackError, Result},
    events::PlaybackEvent,
    output::MediaOutput,
    playlist::Playlist,
    types::PlaybackState,
};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Now-playing state machine over a single media output
pub struct PlaybackController<O: MediaOutput> {
    output: O,
    state: PlaybackState,

    // Reported by the output for the current track; reset on track change
    duration: Option<Duration>,

    // Event queue for UI synchronization
    pending_events: Vec<PlaybackEvent>,
}

impl<O: MediaOutput> PlaybackController<O> {
    /// Create a controller around a media output
    pub fn new(output: O) -> Self {
        Self {
            output,
            state: PlaybackState::default(),
            duration: None,
            pending_events: Vec::new(),
        }
    }

    // ===== Playback Control =====

    /// Pause if playing, otherwise start the current track
    ///
    /// No-op while the playlist is empty.
    pub fn toggle_play_pause(&mut self, playlist: &Playlist) {
        let Some(index) = self.state.current_index else {
            return;
        };
        if playlist.is_empty() {
            return;
        }

        if self.state.is_playing {
            self.pause();
        } else {
            self.start(playlist, index);
        }
    }

    /// Pause the output
    pub fn pause(&mut self) {
        self.output.pause();
        if self.state.is_playing {
            self.state.is_playing = false;
            self.emit(PlaybackEvent::StateChanged { is_playing: false });
        }
    }

    /// Advance to the next track, wrapping from last to first
    pub fn next(&mut self, playlist: &Playlist) {
        let len = playlist.len();
        if len == 0 {
            return;
        }
        let index = self.state.current_index.map_or(0, |i| (i + 1) % len);
        self.select(playlist, index);
    }

    /// Go back one track, wrapping from first to last
    pub fn previous(&mut self, playlist: &Playlist) {
        let len = playlist.len();
        if len == 0 {
            return;
        }
        let index = self.state.current_index.map_or(0, |i| (i + len - 1) % len);
        self.select(playlist, index);
    }

    /// The output finished the current track
    pub fn on_track_ended(&mut self, playlist: &Playlist) {
        debug!(index = ?self.state.current_index, "Track ended, advancing");
        self.next(playlist);
    }

    /// Position report from the output
    ///
    /// Ignored while the duration is zero (metadata not loaded yet).
    pub fn on_progress_tick(&mut self, position: Duration, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        self.duration = Some(duration);
        self.state.progress = (position.as_secs_f32() / duration.as_secs_f32()).clamp(0.0, 1.0);
    }

    /// Jump to a fraction of the current track
    ///
    /// Only valid once the output has reported a duration.
    pub fn seek(&mut self, fraction: f32) -> Result<()> {
        if fraction.is_nan() {
            return Err(PlaybackError::InvalidSeekFraction(fraction));
        }
        if self.state.current_index.is_none() {
            return Err(PlaybackError::NoTrackLoaded);
        }
        let duration = self.duration.ok_or(PlaybackError::DurationUnknown)?;

        let fraction = fraction.clamp(0.0, 1.0);
        let position = duration.mul_f32(fraction);
        self.output.set_position(position)?;
        self.state.progress = fraction;

        self.emit(PlaybackEvent::Seeked {
            position_ms: position.as_millis() as u64,
        });
        Ok(())
    }

    // ===== Playlist Reactions =====

    /// React to a structural playlist change
    ///
    /// An empty-to-non-empty transition autoplays the first track. An index
    /// left outside the playlist is clamped to the last valid track.
    pub fn on_playlist_changed(&mut self, previous_len: usize, playlist: &Playlist) {
        let len = playlist.len();

        match self.state.current_index {
            None if previous_len == 0 && len > 0 => {
                info!(track_id = ?playlist.get(0).map(|t| &t.id), "Autoplaying first track");
                self.select(playlist, 0);
            }
            Some(_) if len == 0 => {
                self.pause();
                self.state = PlaybackState::default();
                self.duration = None;
            }
            Some(index) if index >= len => {
                let was_playing = self.state.is_playing;
                self.state.current_index = Some(len - 1);
                self.state.progress = 0.0;
                self.duration = None;
                if let Some(track) = playlist.get(len - 1) {
                    if let Err(e) = self.output.load(track) {
                        warn!(track_id = %track.id, error = %e, "Failed to load clamped track");
                    }
                    self.emit(PlaybackEvent::TrackChanged {
                        index: len - 1,
                        track_id: track.id.clone(),
                    });
                }
                if was_playing {
                    self.start(playlist, len - 1);
                }
            }
            _ => {}
        }
    }

    /// Forget all state (full remount)
    pub fn reset(&mut self) {
        self.pause();
        self.state = PlaybackState::default();
        self.duration = None;
    }

    // ===== State Queries =====

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Duration reported for the current track, if any
    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }

    // ===== Events =====

    /// Drain all pending events
    pub fn drain_events(&mut self) -> Vec<PlaybackEvent> {
        std::mem::take(&mut self.pending_events)
    }

    pub fn has_pending_events(&self) -> bool {
        !self.pending_events.is_empty()
    }

    pub(crate) fn emit(&mut self, event: PlaybackEvent) {
        self.pending_events.push(event);
    }

    // ===== Internal =====

    /// Make `index` the current track and start it
    fn select(&mut self, playlist: &Playlist, index: usize) {
        let Some(track) = playlist.get(index) else {
            return;
        };

        self.state.current_index = Some(index);
        self.state.progress = 0.0;
        self.duration = None;

        if let Err(e) = self.output.load(track) {
            warn!(track_id = %track.id, error = %e, "Media output failed to load track");
            self.reject(&track.id, &e);
            return;
        }

        self.emit(PlaybackEvent::TrackChanged {
            index,
            track_id: track.id.clone(),
        });
        self.start(playlist, index);
    }

    /// Ask the output to play; a rejection leaves the controller paused
    fn start(&mut self, playlist: &Playlist, index: usize) {
        match self.output.play() {
            Ok(()) => {
                if !self.state.is_playing {
                    self.state.is_playing = true;
                    self.emit(PlaybackEvent::StateChanged { is_playing: true });
                }
            }
            Err(e) => {
                let track_id = playlist
                    .get(index)
                    .map(|t| t.id.clone())
                    .unwrap_or_default();
                warn!(track_id = %track_id, error = %e, "Play request rejected");
                self.reject(&track_id, &e);
            }
        }
    }

    fn reject(&mut self, track_id: &str, error: &PlaybackError) {
        if self.state.is_playing {
            self.state.is_playing = false;
            self.emit(PlaybackEvent::StateChanged { is_playing: false });
        }
        self.emit(PlaybackEvent::PlayRejected {
            track_id: track_id.to_string(),
            message: error.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::RecordingOutput;
    use crate::types::Track;

    fn playlist(ids: &[&str]) -> Playlist {
        let mut playlist = Playlist::new();
        for id in ids {
            playlist.push(Track::from_url(*id));
        }
        playlist
    }

    fn controller_at(playlist: &Playlist, index: usize) -> PlaybackController<RecordingOutput> {
        let mut controller = PlaybackController::new(RecordingOutput::default());
        controller.on_playlist_changed(0, playlist);
        for _ in 0..index {
            controller.next(playlist);
        }
        controller.drain_events();
        controller.output_mut().calls.clear();
        controller
    }

    #[test]
    fn next_wraps_to_first() {
        let list = playlist(&["a", "b", "c"]);
        let mut controller = controller_at(&list, 2);
        assert_eq!(controller.state().current_index, Some(2));

        controller.next(&list);
        assert_eq!(controller.state().current_index, Some(0));
        assert!(controller.state().is_playing);
        assert_eq!(controller.output().calls, vec!["load a", "play"]);
    }

    #[test]
    fn previous_wraps_to_last() {
        let list = playlist(&["a", "b", "c"]);
        let mut controller = controller_at(&list, 0);

        controller.previous(&list);
        assert_eq!(controller.state().current_index, Some(2));
    }

    #[test]
    fn navigation_on_empty_playlist_is_noop() {
        let list = Playlist::new();
        let mut controller = PlaybackController::new(RecordingOutput::default());
        controller.next(&list);
        controller.previous(&list);
        controller.toggle_play_pause(&list);
        assert_eq!(controller.state(), PlaybackState::default());
        assert!(controller.output().calls.is_empty());
    }

    #[test]
    fn toggle_pauses_and_resumes() {
        let list = playlist(&["a"]);
        let mut controller = controller_at(&list, 0);

        controller.toggle_play_pause(&list);
        assert!(!controller.state().is_playing);
        controller.toggle_play_pause(&list);
        assert!(controller.state().is_playing);
        assert_eq!(controller.output().calls, vec!["pause", "play"]);
        assert_eq!(
            controller.drain_events(),
            vec![
                PlaybackEvent::StateChanged { is_playing: false },
                PlaybackEvent::StateChanged { is_playing: true },
            ]
        );
    }

    #[test]
    fn progress_ignores_zero_duration() {
        let list = playlist(&["a"]);
        let mut controller = controller_at(&list, 0);

        controller.on_progress_tick(Duration::from_secs(30), Duration::from_secs(120));
        assert_eq!(controller.state().progress, 0.25);

        controller.on_progress_tick(Duration::from_secs(90), Duration::ZERO);
        assert_eq!(controller.state().progress, 0.25);
    }

    #[test]
    fn next_resets_progress_and_duration() {
        let list = playlist(&["a", "b"]);
        let mut controller = controller_at(&list, 0);
        controller.on_progress_tick(Duration::from_secs(60), Duration::from_secs(120));

        controller.next(&list);
        assert_eq!(controller.state().progress, 0.0);
        assert_eq!(controller.duration(), None);
    }

    #[test]
    fn seek_requires_known_duration() {
        let list = playlist(&["a"]);
        let mut controller = controller_at(&list, 0);

        assert!(matches!(
            controller.seek(0.5),
            Err(PlaybackError::DurationUnknown)
        ));

        controller.on_progress_tick(Duration::ZERO, Duration::from_secs(200));
        controller.seek(0.5).expect("duration known");
        assert_eq!(controller.state().progress, 0.5);
        assert_eq!(controller.output().calls, vec!["seek 100000ms"]);
    }

    #[test]
    fn seek_clamps_and_rejects_nan() {
        let list = playlist(&["a"]);
        let mut controller = controller_at(&list, 0);
        controller.on_progress_tick(Duration::ZERO, Duration::from_secs(10));

        controller.seek(1.7).expect("clamped");
        assert_eq!(controller.state().progress, 1.0);
        assert!(matches!(
            controller.seek(f32::NAN),
            Err(PlaybackError::InvalidSeekFraction(_))
        ));
    }

    #[test]
    fn seek_without_track_fails() {
        let mut controller = PlaybackController::new(RecordingOutput::default());
        assert!(matches!(
            controller.seek(0.1),
            Err(PlaybackError::NoTrackLoaded)
        ));
    }

    #[test]
    fn rejected_play_leaves_paused() {
        let list = playlist(&["a"]);
        let mut controller = PlaybackController::new(RecordingOutput {
            reject_play: true,
            ..Default::default()
        });

        controller.on_playlist_changed(0, &list);
        assert_eq!(controller.state().current_index, Some(0));
        assert!(!controller.state().is_playing);

        let events = controller.drain_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, PlaybackEvent::PlayRejected { track_id, .. } if track_id == "a")));

        // User recovers with an explicit toggle once playback is allowed
        controller.output_mut().reject_play = false;
        controller.toggle_play_pause(&list);
        assert!(controller.state().is_playing);
    }

    #[test]
    fn clamps_index_after_shrink() {
        let list = playlist(&["a", "b", "c"]);
        let mut controller = controller_at(&list, 2);

        let shorter = playlist(&["a", "b"]);
        controller.on_playlist_changed(3, &shorter);
        assert_eq!(controller.state().current_index, Some(1));
        assert!(controller.state().is_playing);
    }

    #[test]
    fn emptied_playlist_clears_state() {
        let list = playlist(&["a"]);
        let mut controller = controller_at(&list, 0);

        controller.on_playlist_changed(1, &Playlist::new());
        assert_eq!(controller.state(), PlaybackState::default());
    }
}
