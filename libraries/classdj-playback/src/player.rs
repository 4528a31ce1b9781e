//! Playlist player
//!
//! Wires the synchronizer to the controller. Arrivals flow one way
//! (source -> synchronizer -> controller); user intents go to the controller.

use crate::{
    controller::PlaybackController,
    error::Result,
    events::PlaybackEvent,
    output::MediaOutput,
    playlist::Playlist,
    synchronizer::{Arrival, PlaylistSynchronizer},
    types::{OwnerId, PlaybackState, PlayerSnapshot, Track},
};
use std::time::Duration;
use tracing::debug;

/// A playlist that fills asynchronously, plus the now-playing state over it
pub struct PlaylistPlayer<O: MediaOutput> {
    sync: PlaylistSynchronizer,
    controller: PlaybackController<O>,
}

impl<O: MediaOutput> PlaylistPlayer<O> {
    /// Player that accepts tracks from any owner
    pub fn new(output: O) -> Self {
        Self {
            sync: PlaylistSynchronizer::new(),
            controller: PlaybackController::new(output),
        }
    }

    /// Player scoped to one owner's push events
    pub fn for_owner(owner: OwnerId, output: O) -> Self {
        Self {
            sync: PlaylistSynchronizer::for_owner(owner),
            controller: PlaybackController::new(output),
        }
    }

    // ===== Arrivals =====

    /// A track became available
    pub fn on_arrival(&mut self, track: Track) -> Arrival {
        let previous_len = self.sync.playlist().len();
        let arrival = self.sync.on_arrival(track);
        self.after_arrivals(previous_len, &[arrival]);
        arrival
    }

    /// A polled snapshot of every available track URL
    pub fn on_snapshot(&mut self, snapshot: &[String]) -> Vec<Arrival> {
        let previous_len = self.sync.playlist().len();
        let arrivals = self.sync.on_snapshot(snapshot);
        self.after_arrivals(previous_len, &arrivals);
        arrivals
    }

    /// A push notification; dropped when it belongs to another owner
    pub fn on_push(&mut self, owner: OwnerId, track: Track) -> Option<Arrival> {
        if !self.sync.accepts(owner) {
            debug!(
                event_owner = %owner,
                active_owner = ?self.sync.owner(),
                "Ignoring push event for another owner"
            );
            return None;
        }
        Some(self.on_arrival(track))
    }

    fn after_arrivals(&mut self, previous_len: usize, arrivals: &[Arrival]) {
        let mut changed = false;
        for index in arrivals.iter().filter_map(|a| a.index()) {
            if let Some(track) = self.sync.playlist().get(index) {
                self.controller.emit(PlaybackEvent::TrackAdded {
                    index,
                    track_id: track.id.clone(),
                });
                changed = true;
            }
        }
        if changed {
            self.controller
                .on_playlist_changed(previous_len, self.sync.playlist());
        }
    }

    // ===== User Intents =====

    pub fn toggle_play_pause(&mut self) {
        self.controller.toggle_play_pause(self.sync.playlist());
    }

    pub fn next(&mut self) {
        self.controller.next(self.sync.playlist());
    }

    pub fn previous(&mut self) {
        self.controller.previous(self.sync.playlist());
    }

    pub fn seek(&mut self, fraction: f32) -> Result<()> {
        self.controller.seek(fraction)
    }

    pub fn pause(&mut self) {
        self.controller.pause();
    }

    // ===== Output Reports =====

    pub fn on_track_ended(&mut self) {
        self.controller.on_track_ended(self.sync.playlist());
    }

    pub fn on_progress_tick(&mut self, position: Duration, duration: Duration) {
        self.controller.on_progress_tick(position, duration);
    }

    // ===== Lifecycle =====

    /// Full remount: empty playlist, paused output, autoplay re-armed
    pub fn reset(&mut self) {
        self.controller.reset();
        self.sync.reset();
    }

    // ===== State Queries =====

    pub fn playlist(&self) -> &Playlist {
        self.sync.playlist()
    }

    pub fn owner(&self) -> Option<OwnerId> {
        self.sync.owner()
    }

    pub fn state(&self) -> PlaybackState {
        self.controller.state()
    }

    pub fn now_playing(&self) -> Option<&Track> {
        self.state()
            .current_index
            .and_then(|i| self.sync.playlist().get(i))
    }

    /// Title for the now-playing display
    pub fn now_playing_title(&self) -> Option<&str> {
        self.now_playing().map(|t| t.title.as_str())
    }

    /// Progress ratio for a progress bar
    pub fn progress(&self) -> f32 {
        self.state().progress
    }

    pub fn output(&self) -> &O {
        self.controller.output()
    }

    pub fn output_mut(&mut self) -> &mut O {
        self.controller.output_mut()
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        let state = self.state();
        PlayerSnapshot {
            owner: self.owner(),
            titles: self.playlist().iter().map(|t| t.title.clone()).collect(),
            current_index: state.current_index,
            now_playing: self.now_playing_title().map(str::to_string),
            is_playing: state.is_playing,
            progress: state.progress,
        }
    }

    /// Drain all pending events
    pub fn drain_events(&mut self) -> Vec<PlaybackEvent> {
        self.controller.drain_events()
    }

    pub fn has_pending_events(&self) -> bool {
        self.controller.has_pending_events()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::RecordingOutput;

    #[test]
    fn first_arrival_autoplays_index_zero() {
        let mut player = PlaylistPlayer::new(RecordingOutput::default());
        player.on_arrival(Track::from_url("a.mp3"));

        let state = player.state();
        assert_eq!(state.current_index, Some(0));
        assert!(state.is_playing);
        assert_eq!(player.now_playing_title(), Some("a.mp3"));
        assert_eq!(
            player.drain_events(),
            vec![
                PlaybackEvent::TrackAdded {
                    index: 0,
                    track_id: "a.mp3".to_string()
                },
                PlaybackEvent::TrackChanged {
                    index: 0,
                    track_id: "a.mp3".to_string()
                },
                PlaybackEvent::StateChanged { is_playing: true },
            ]
        );
    }

    #[test]
    fn later_arrivals_do_not_touch_playback() {
        let mut player = PlaylistPlayer::new(RecordingOutput::default());
        player.on_arrival(Track::from_url("a"));
        player.toggle_play_pause();
        player.drain_events();
        player.output_mut().calls.clear();

        player.on_arrival(Track::from_url("b"));
        assert_eq!(player.state().current_index, Some(0));
        assert!(!player.state().is_playing);
        assert!(player.output().calls.is_empty());
    }

    #[test]
    fn push_for_other_owner_is_dropped() {
        let mut player = PlaylistPlayer::for_owner(OwnerId::new(1), RecordingOutput::default());
        assert_eq!(player.on_push(OwnerId::new(2), Track::from_url("x")), None);
        assert!(player.playlist().is_empty());
        assert!(!player.has_pending_events());

        assert_eq!(
            player.on_push(OwnerId::new(1), Track::from_url("x")),
            Some(Arrival::First)
        );
    }

    #[test]
    fn snapshot_reports_view() {
        let mut player = PlaylistPlayer::for_owner(OwnerId::new(5), RecordingOutput::default());
        player.on_snapshot(&[
            "http://h/songs/One%20Song.mp3".to_string(),
            "http://h/songs/Two.mp3".to_string(),
        ]);

        let view = player.snapshot();
        assert_eq!(view.owner, Some(OwnerId::new(5)));
        assert_eq!(view.titles, vec!["One Song.mp3", "Two.mp3"]);
        assert_eq!(view.now_playing.as_deref(), Some("One Song.mp3"));
        assert!(view.is_playing);
    }

    #[test]
    fn reset_rearms_autoplay() {
        let mut player = PlaylistPlayer::new(RecordingOutput::default());
        player.on_arrival(Track::from_url("a"));
        player.reset();
        assert!(player.playlist().is_empty());
        assert_eq!(player.state(), PlaybackState::default());

        player.on_arrival(Track::from_url("b"));
        assert_eq!(player.now_playing_title(), Some("b"));
        assert!(player.state().is_playing);
    }
}
