//! Session behaviour against an in-memory song server.

use async_trait::async_trait;
use classdj_client::{ClientError, SongEventStream, SongReady};
use classdj_playback::{MediaOutput, OwnerId, PlayerSnapshot, Track};
use classdj_sync::{ArrivalMode, SessionConfig, SessionHandle, SessionManager, SongProvider};
use futures_util::stream;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, watch};

// =============================================================================
// Test doubles
// =============================================================================

/// Song server double: fixed per-owner progress, scripted push streams
#[derive(Default)]
struct FakeServer {
    progress: HashMap<OwnerId, Vec<String>>,
    /// One script per subscription; later subscriptions stay open and silent
    push_scripts: Mutex<Vec<Vec<SongReady>>>,
    subscriptions: AtomicUsize,
    progress_calls: AtomicUsize,
}

impl FakeServer {
    fn with_progress(mut self, owner: i64, names: &[&str]) -> Self {
        self.progress.insert(
            OwnerId::new(owner),
            names.iter().map(|n| url(owner, n)).collect(),
        );
        self
    }

    fn with_push_script(self, events: Vec<SongReady>) -> Self {
        self.push_scripts.lock().unwrap().push(events);
        self
    }

    fn subscriptions(&self) -> usize {
        self.subscriptions.load(Ordering::SeqCst)
    }

    fn progress_calls(&self) -> usize {
        self.progress_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SongProvider for FakeServer {
    async fn list_songs(&self) -> classdj_client::Result<Vec<String>> {
        Err(ClientError::ServerUnreachable("not used".to_string()))
    }

    async fn trigger_download(&self, _owner: OwnerId) -> classdj_client::Result<Option<String>> {
        Ok(None)
    }

    async fn download_progress(&self, owner: OwnerId) -> classdj_client::Result<Vec<String>> {
        self.progress_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.progress.get(&owner).cloned().unwrap_or_default())
    }

    async fn song_events(&self) -> classdj_client::Result<SongEventStream> {
        self.subscriptions.fetch_add(1, Ordering::SeqCst);
        let mut scripts = self.push_scripts.lock().unwrap();
        if scripts.is_empty() {
            return Ok(Box::pin(stream::pending::<classdj_client::Result<SongReady>>()));
        }
        let events: Vec<classdj_client::Result<SongReady>> = scripts.remove(0).into_iter().map(Ok).collect();
        Ok(Box::pin(stream::iter(events)))
    }
}

/// Server that finishes a song while the download request is still in flight
struct AnnouncingServer {
    bus: broadcast::Sender<SongReady>,
}

impl AnnouncingServer {
    fn new() -> Self {
        Self {
            bus: broadcast::channel(16).0,
        }
    }
}

#[async_trait]
impl SongProvider for AnnouncingServer {
    async fn list_songs(&self) -> classdj_client::Result<Vec<String>> {
        Ok(Vec::new())
    }

    async fn trigger_download(&self, owner: OwnerId) -> classdj_client::Result<Option<String>> {
        // Nobody listening is fine
        let _ = self.bus.send(ready(owner.get(), "b.mp3"));
        Ok(Some(url(owner.get(), "a.mp3")))
    }

    async fn download_progress(&self, _owner: OwnerId) -> classdj_client::Result<Vec<String>> {
        Ok(Vec::new())
    }

    async fn song_events(&self) -> classdj_client::Result<SongEventStream> {
        let events = stream::unfold(self.bus.subscribe(), |mut rx| async move {
            let ready = rx.recv().await.ok()?;
            Some((Ok::<SongReady, ClientError>(ready), rx))
        });
        Ok(Box::pin(events))
    }
}

struct SilentOutput;

impl MediaOutput for SilentOutput {
    fn load(&mut self, _track: &Track) -> classdj_playback::Result<()> {
        Ok(())
    }

    fn play(&mut self) -> classdj_playback::Result<()> {
        Ok(())
    }

    fn pause(&mut self) {}

    fn set_position(&mut self, _position: Duration) -> classdj_playback::Result<()> {
        Ok(())
    }
}

fn url(owner: i64, name: &str) -> String {
    format!("http://localhost:5050/downloads/{owner}/{name}")
}

fn ready(owner: i64, name: &str) -> SongReady {
    SongReady {
        owner_id: OwnerId::new(owner),
        path: url(owner, name),
    }
}

async fn wait_for(
    mut rx: watch::Receiver<PlayerSnapshot>,
    done: impl Fn(&PlayerSnapshot) -> bool,
) -> PlayerSnapshot {
    tokio::time::timeout(Duration::from_secs(120), async {
        loop {
            {
                let snapshot = rx.borrow_and_update();
                if done(&snapshot) {
                    return snapshot.clone();
                }
            }
            rx.changed().await.expect("session still running");
        }
    })
    .await
    .expect("condition reached before timeout")
}

// =============================================================================
// Push mode
// =============================================================================

mod push {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_events_for_other_owners_are_dropped() {
        let server = FakeServer::default().with_push_script(vec![
            ready(2, "mine.mp3"),
            ready(5, "theirs.mp3"),
            ready(2, "also-mine.mp3"),
            ready(2, "mine.mp3"),
        ]);

        let session = SessionHandle::start(
            Arc::new(server),
            Some(OwnerId::new(2)),
            SilentOutput,
            SessionConfig::new(ArrivalMode::Push),
        )
        .unwrap();

        let snapshot = wait_for(session.watch(), |s| s.titles.len() == 2).await;
        assert_eq!(snapshot.titles, vec!["mine.mp3", "also-mine.mp3"]);
        assert_eq!(snapshot.now_playing.as_deref(), Some("mine.mp3"));

        session.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_is_resubscribed_after_it_closes() {
        let server = Arc::new(
            FakeServer::default()
                .with_push_script(vec![ready(2, "a.mp3")])
                .with_push_script(vec![ready(2, "b.mp3")]),
        );

        let session = SessionHandle::start(
            Arc::clone(&server) as Arc<dyn SongProvider>,
            Some(OwnerId::new(2)),
            SilentOutput,
            SessionConfig::new(ArrivalMode::Push).with_poll_interval(Duration::from_secs(1)),
        )
        .unwrap();

        let snapshot = wait_for(session.watch(), |s| s.titles.len() == 2).await;
        assert_eq!(snapshot.titles, vec!["a.mp3", "b.mp3"]);
        assert!(server.subscriptions() >= 2);

        session.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_song_finished_during_trigger_is_heard() {
        let session = SessionHandle::start(
            Arc::new(AnnouncingServer::new()),
            Some(OwnerId::new(2)),
            SilentOutput,
            SessionConfig::new(ArrivalMode::Push),
        )
        .unwrap();

        let snapshot = wait_for(session.watch(), |s| s.titles.len() == 2).await;
        assert_eq!(snapshot.titles, vec!["a.mp3", "b.mp3"]);

        session.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_unannounced_songs_come_from_progress() {
        // The only stream announces "a" and closes; "b" and "c" are never announced.
        let server = Arc::new(
            FakeServer::default()
                .with_push_script(vec![ready(2, "a.mp3")])
                .with_progress(2, &["a.mp3", "b.mp3", "c.mp3"]),
        );

        let session = SessionHandle::start(
            Arc::clone(&server) as Arc<dyn SongProvider>,
            Some(OwnerId::new(2)),
            SilentOutput,
            SessionConfig::new(ArrivalMode::Push).with_poll_interval(Duration::from_secs(1)),
        )
        .unwrap();

        let snapshot = wait_for(session.watch(), |s| s.titles.len() == 3).await;
        assert_eq!(snapshot.titles, vec!["a.mp3", "b.mp3", "c.mp3"]);
        assert!(server.progress_calls() >= 1);

        session.shutdown().await.unwrap();
    }
}

// =============================================================================
// Session manager
// =============================================================================

mod manager {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_switching_owner_remounts() {
        let server = FakeServer::default()
            .with_progress(1, &["one.mp3"])
            .with_progress(2, &["two-a.mp3", "two-b.mp3"]);
        let mut manager = SessionManager::new(Arc::new(server), SessionConfig::default());

        let first = manager
            .mount(Some(OwnerId::new(1)), SilentOutput)
            .await
            .unwrap();
        let first_control = first.control();
        let snapshot = wait_for(first.watch(), |s| s.titles.len() == 1).await;
        assert_eq!(snapshot.owner, Some(OwnerId::new(1)));

        let second = manager
            .mount(Some(OwnerId::new(2)), SilentOutput)
            .await
            .unwrap();
        assert_eq!(second.owner(), Some(OwnerId::new(2)));

        let snapshot = wait_for(second.watch(), |s| s.titles.len() == 2).await;
        assert_eq!(snapshot.titles, vec!["two-a.mp3", "two-b.mp3"]);
        assert_eq!(snapshot.current_index, Some(0));

        // The first owner's session is gone.
        assert!(first_control.is_closed());
        assert!(first_control.next().await.is_err());

        manager.unmount().await;
        assert!(manager.current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_polling() {
        let server = Arc::new(FakeServer::default().with_progress(2, &["a.mp3"]));
        let session = SessionHandle::start(
            Arc::clone(&server) as Arc<dyn SongProvider>,
            Some(OwnerId::new(2)),
            SilentOutput,
            SessionConfig::new(ArrivalMode::Poll).with_poll_interval(Duration::from_secs(1)),
        )
        .unwrap();

        wait_for(session.watch(), |s| s.titles.len() == 1).await;
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(server.progress_calls() >= 2);

        session.shutdown().await.unwrap();
        let after_shutdown = server.progress_calls();

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(server.progress_calls(), after_shutdown);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unmount_stops_polling() {
        let server = Arc::new(FakeServer::default().with_progress(2, &["a.mp3"]));
        let mut manager = SessionManager::new(
            Arc::clone(&server) as Arc<dyn SongProvider>,
            SessionConfig::new(ArrivalMode::Poll).with_poll_interval(Duration::from_secs(1)),
        );

        let session = manager
            .mount(Some(OwnerId::new(2)), SilentOutput)
            .await
            .unwrap();
        wait_for(session.watch(), |s| s.titles.len() == 1).await;

        manager.unmount().await;
        let after_unmount = server.progress_calls();

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(server.progress_calls(), after_unmount);
    }

    #[tokio::test]
    async fn test_mount_without_owner_in_poll_mode_fails() {
        let mut manager =
            SessionManager::new(Arc::new(FakeServer::default()), SessionConfig::default());

        assert!(manager.mount(None, SilentOutput).await.is_err());
        assert!(manager.current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_session_starts_empty() {
        let server = FakeServer::default().with_progress(3, &["x.mp3"]);
        let mut manager = SessionManager::new(Arc::new(server), SessionConfig::default());

        let session = manager
            .mount(Some(OwnerId::new(3)), SilentOutput)
            .await
            .unwrap();
        let initial = session.snapshot();

        assert!(initial.titles.is_empty());
        assert_eq!(initial.current_index, None);
        assert!(!initial.is_playing);
    }
}

// =============================================================================
// Events
// =============================================================================

mod events {
    use super::*;
    use classdj_playback::PlaybackEvent;

    #[tokio::test(start_paused = true)]
    async fn test_first_arrival_announces_autoplay() {
        let server = FakeServer::default().with_progress(4, &["first.mp3"]);
        let session = SessionHandle::start(
            Arc::new(server),
            Some(OwnerId::new(4)),
            SilentOutput,
            SessionConfig::default(),
        )
        .unwrap();
        let mut events = session.subscribe();

        let mut seen = Vec::new();
        while seen.len() < 3 {
            seen.push(events.recv().await.unwrap());
        }

        assert!(matches!(seen[0], PlaybackEvent::TrackAdded { index: 0, .. }));
        assert!(matches!(seen[1], PlaybackEvent::TrackChanged { index: 0, .. }));
        assert_eq!(seen[2], PlaybackEvent::StateChanged { is_playing: true });

        session.shutdown().await.unwrap();
    }
}
