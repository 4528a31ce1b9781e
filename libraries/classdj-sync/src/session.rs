//! Live playlist session
//!
//! One player task owns the [`PlaylistPlayer`]. The feed task and user
//! intents reach it as commands over an `mpsc` channel, so poll results, push
//! notifications and button presses are applied one at a time in arrival
//! order. Every applied command publishes a fresh [`PlayerSnapshot`] on a
//! `watch` channel and forwards the player's events on a `broadcast` channel.

use crate::error::{Result, SessionError};
use crate::feeds;
use crate::provider::SongProvider;
use crate::types::{ArrivalMode, SessionConfig};
use classdj_client::SongReady;
use classdj_playback::{MediaOutput, OwnerId, PlaybackEvent, PlayerSnapshot, PlaylistPlayer, Track};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

const COMMAND_BUFFER: usize = 64;
const EVENT_BUFFER: usize = 64;

/// Work item for the player task
#[derive(Debug)]
pub(crate) enum Command {
    Arrival(String),
    Snapshot(Vec<String>),
    Push(SongReady),
    TogglePlayPause,
    Next,
    Previous,
    Pause,
    Seek {
        fraction: f32,
        reply: oneshot::Sender<classdj_playback::Result<()>>,
    },
    ProgressTick {
        track_id: String,
        position: Duration,
        duration: Duration,
    },
    TrackEnded {
        track_id: String,
    },
}

/// Cloneable sender of user intents and media reports into a session
#[derive(Debug, Clone)]
pub struct SessionControl {
    commands: mpsc::Sender<Command>,
}

impl SessionControl {
    pub async fn toggle_play_pause(&self) -> Result<()> {
        self.send(Command::TogglePlayPause).await
    }

    pub async fn next(&self) -> Result<()> {
        self.send(Command::Next).await
    }

    pub async fn previous(&self) -> Result<()> {
        self.send(Command::Previous).await
    }

    pub async fn pause(&self) -> Result<()> {
        self.send(Command::Pause).await
    }

    /// Seek to a fraction of the current track
    ///
    /// Waits for the player so rejections (no track, unknown duration,
    /// fraction out of range) come back to the caller.
    pub async fn seek(&self, fraction: f32) -> Result<()> {
        let (reply, result) = oneshot::channel();
        self.send(Command::Seek { fraction, reply }).await?;
        result.await.map_err(|_| SessionError::Closed)??;
        Ok(())
    }

    /// Report the media output's position within `track_id`
    ///
    /// Reports for a track that is no longer current are dropped.
    pub async fn progress_tick(
        &self,
        track_id: impl Into<String>,
        position: Duration,
        duration: Duration,
    ) -> Result<()> {
        self.send(Command::ProgressTick {
            track_id: track_id.into(),
            position,
            duration,
        })
        .await
    }

    /// Report that `track_id` played to its end
    pub async fn track_ended(&self, track_id: impl Into<String>) -> Result<()> {
        self.send(Command::TrackEnded {
            track_id: track_id.into(),
        })
        .await
    }

    /// Whether the session behind this control has stopped
    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| SessionError::Closed)
    }
}

/// A running playlist session
///
/// Dropping the handle cancels the session's tasks; [`shutdown`](Self::shutdown)
/// also waits for them to finish.
pub struct SessionHandle {
    id: Uuid,
    owner: Option<OwnerId>,
    mode: ArrivalMode,
    control: SessionControl,
    snapshots: watch::Receiver<PlayerSnapshot>,
    events: broadcast::Sender<PlaybackEvent>,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl SessionHandle {
    /// Start a session driving `output`
    ///
    /// Must be called from within a Tokio runtime. Poll and push sessions
    /// need an owner; listing sessions may have none.
    pub fn start<O>(
        provider: Arc<dyn SongProvider>,
        owner: Option<OwnerId>,
        output: O,
        config: SessionConfig,
    ) -> Result<Self>
    where
        O: MediaOutput + 'static,
    {
        if config.mode.needs_owner() && owner.is_none() {
            return Err(SessionError::OwnerRequired(config.mode));
        }

        let player = match owner {
            Some(owner) => PlaylistPlayer::for_owner(owner, output),
            None => PlaylistPlayer::new(output),
        };

        let id = Uuid::new_v4();
        let cancel = CancellationToken::new();
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_BUFFER);
        let (snapshot_tx, snapshot_rx) = watch::channel(player.snapshot());
        let (events_tx, _) = broadcast::channel(EVENT_BUFFER);

        info!(session = %id, owner = ?owner, mode = %config.mode, "Starting playlist session");

        let tasks = vec![
            tokio::spawn(run_player(
                id,
                player,
                commands_rx,
                snapshot_tx,
                events_tx.clone(),
                cancel.clone(),
            )),
            tokio::spawn(feeds::run(
                provider,
                owner,
                config,
                commands_tx.clone(),
                cancel.clone(),
            )),
        ];

        Ok(Self {
            id,
            owner,
            mode: config.mode,
            control: SessionControl {
                commands: commands_tx,
            },
            snapshots: snapshot_rx,
            events: events_tx,
            cancel,
            tasks,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn owner(&self) -> Option<OwnerId> {
        self.owner
    }

    pub fn mode(&self) -> ArrivalMode {
        self.mode
    }

    pub fn control(&self) -> SessionControl {
        self.control.clone()
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> PlayerSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver notified on every snapshot change
    pub fn watch(&self) -> watch::Receiver<PlayerSnapshot> {
        self.snapshots.clone()
    }

    /// Receiver for player events published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.events.subscribe()
    }

    /// Cancel the session and wait for its tasks
    pub async fn shutdown(mut self) -> Result<()> {
        self.cancel.cancel();

        let mut failure = None;
        for task in std::mem::take(&mut self.tasks) {
            if let Err(e) = task.await {
                warn!(session = %self.id, error = %e, "Session task failed");
                failure.get_or_insert(SessionError::Task(e.to_string()));
            }
        }

        info!(session = %self.id, owner = ?self.owner, "Playlist session stopped");
        failure.map_or(Ok(()), Err)
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run_player<O: MediaOutput>(
    session: Uuid,
    mut player: PlaylistPlayer<O>,
    mut commands: mpsc::Receiver<Command>,
    snapshots: watch::Sender<PlayerSnapshot>,
    events: broadcast::Sender<PlaybackEvent>,
    cancel: CancellationToken,
) {
    loop {
        let command = tokio::select! {
            () = cancel.cancelled() => break,
            command = commands.recv() => match command {
                Some(command) => command,
                None => break,
            },
        };
        apply(&mut player, command);
        publish(&mut player, &snapshots, &events);
    }

    // Nothing may keep playing once the session is gone.
    player.pause();
    publish(&mut player, &snapshots, &events);
    debug!(session = %session, "Player task stopped");
}

fn apply<O: MediaOutput>(player: &mut PlaylistPlayer<O>, command: Command) {
    match command {
        Command::Arrival(url) => {
            player.on_arrival(Track::from_url(url));
        }
        Command::Snapshot(urls) => {
            player.on_snapshot(&urls);
        }
        Command::Push(ready) => {
            player.on_push(ready.owner_id, Track::from_url(ready.path));
        }
        Command::TogglePlayPause => player.toggle_play_pause(),
        Command::Next => player.next(),
        Command::Previous => player.previous(),
        Command::Pause => player.pause(),
        Command::Seek { fraction, reply } => {
            let result = player.seek(fraction);
            if let Err(e) = &result {
                debug!(fraction, error = %e, "Seek rejected");
            }
            // Caller may have given up waiting.
            let _ = reply.send(result);
        }
        Command::ProgressTick {
            track_id,
            position,
            duration,
        } => {
            if is_current(player, &track_id) {
                player.on_progress_tick(position, duration);
            }
        }
        Command::TrackEnded { track_id } => {
            if is_current(player, &track_id) {
                player.on_track_ended();
            } else {
                debug!(track = %track_id, "Ignoring end of a track no longer playing");
            }
        }
    }
}

/// Whether an output report still refers to the loaded track
fn is_current<O: MediaOutput>(player: &PlaylistPlayer<O>, track_id: &str) -> bool {
    player.now_playing().is_some_and(|track| track.id == track_id)
}

fn publish<O: MediaOutput>(
    player: &mut PlaylistPlayer<O>,
    snapshots: &watch::Sender<PlayerSnapshot>,
    events: &broadcast::Sender<PlaybackEvent>,
) {
    // Snapshot first: an event's receiver may read the state it describes.
    let next = player.snapshot();
    snapshots.send_if_modified(|current| {
        if *current == next {
            false
        } else {
            *current = next;
            true
        }
    });

    for event in player.drain_events() {
        // No subscribers is fine
        let _ = events.send(event);
    }
}
