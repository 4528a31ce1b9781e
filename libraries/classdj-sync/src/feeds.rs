//! Arrival feeds
//!
//! A feed turns one of the server's delivery styles into player commands.
//! Network failures never end a feed: they are logged and the cycle counts as
//! "no new tracks".

use crate::provider::SongProvider;
use crate::session::Command;
use crate::types::{ArrivalMode, SessionConfig};
use classdj_playback::OwnerId;
use futures_util::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Shortest poll or re-subscribe delay accepted
const MIN_INTERVAL: Duration = Duration::from_millis(100);

pub(crate) async fn run(
    provider: Arc<dyn SongProvider>,
    owner: Option<OwnerId>,
    config: SessionConfig,
    commands: mpsc::Sender<Command>,
    cancel: CancellationToken,
) {
    let interval = config.poll_interval.max(MIN_INTERVAL);
    let provider = provider.as_ref();

    let feed = async {
        match (config.mode, owner) {
            (ArrivalMode::Listing, _) => listing(provider, &commands).await,
            (ArrivalMode::Poll, Some(owner)) => poll(provider, owner, interval, &commands).await,
            (ArrivalMode::Push, Some(owner)) => push(provider, owner, interval, &commands).await,
            (mode, None) => warn!(mode = %mode, "No owner to follow"),
        }
    };

    tokio::select! {
        () = cancel.cancelled() => debug!("Feed cancelled"),
        () = feed => debug!("Feed finished"),
    }
}

async fn listing(provider: &dyn SongProvider, commands: &mpsc::Sender<Command>) {
    let urls = match provider.list_songs().await {
        Ok(urls) => urls,
        Err(e) => {
            warn!(error = %e, "Failed to list songs");
            return;
        }
    };

    info!(count = urls.len(), "Song listing fetched");
    for url in urls {
        if commands.send(Command::Arrival(url)).await.is_err() {
            return;
        }
    }
}

/// Start the owner's download; false once the player is gone
async fn trigger(
    provider: &dyn SongProvider,
    owner: OwnerId,
    commands: &mpsc::Sender<Command>,
) -> bool {
    match provider.trigger_download(owner).await {
        Ok(Some(url)) => {
            debug!(owner = %owner, url = %url, "First song ready");
            commands.send(Command::Arrival(url)).await.is_ok()
        }
        Ok(None) => {
            debug!(owner = %owner, "Download started, nothing ready yet");
            true
        }
        Err(e) => {
            warn!(owner = %owner, error = %e, "Failed to trigger download");
            true
        }
    }
}

async fn poll(
    provider: &dyn SongProvider,
    owner: OwnerId,
    period: Duration,
    commands: &mpsc::Sender<Command>,
) {
    if !trigger(provider, owner, commands).await {
        return;
    }

    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // First tick is immediate
    ticker.tick().await;

    loop {
        ticker.tick().await;
        match provider.download_progress(owner).await {
            Ok(urls) => {
                debug!(owner = %owner, count = urls.len(), "Download progress polled");
                if commands.send(Command::Snapshot(urls)).await.is_err() {
                    return;
                }
            }
            Err(e) => warn!(owner = %owner, error = %e, "Download progress poll failed"),
        }
    }
}

/// Follow `song_ready` notifications for `owner`
///
/// The stream is opened before the download is triggered, and every
/// (re)subscribe is followed by one progress snapshot, so songs finished
/// while no stream was open still arrive.
async fn push(
    provider: &dyn SongProvider,
    owner: OwnerId,
    retry: Duration,
    commands: &mpsc::Sender<Command>,
) {
    let mut triggered = false;

    loop {
        let events = match provider.song_events().await {
            Ok(events) => {
                info!(owner = %owner, "Listening for song_ready events");
                Some(events)
            }
            Err(e) => {
                warn!(owner = %owner, error = %e, "Failed to subscribe to song events");
                None
            }
        };

        if !triggered {
            if !trigger(provider, owner, commands).await {
                return;
            }
            triggered = true;
        }
        if !catch_up(provider, owner, commands).await {
            return;
        }

        if let Some(mut events) = events {
            while let Some(event) = events.next().await {
                match event {
                    Ok(ready) => {
                        if commands.send(Command::Push(ready)).await.is_err() {
                            return;
                        }
                    }
                    Err(e) => {
                        warn!(owner = %owner, error = %e, "Song event stream failed");
                        break;
                    }
                }
            }
            info!(
                owner = %owner,
                retry_ms = u64::try_from(retry.as_millis()).unwrap_or(u64::MAX),
                "Song event stream closed"
            );
        }

        time::sleep(retry).await;
    }
}

/// Reconcile against the owner's progress once; false once the player is gone
async fn catch_up(
    provider: &dyn SongProvider,
    owner: OwnerId,
    commands: &mpsc::Sender<Command>,
) -> bool {
    match provider.download_progress(owner).await {
        Ok(urls) => {
            debug!(owner = %owner, count = urls.len(), "Caught up on download progress");
            commands.send(Command::Snapshot(urls)).await.is_ok()
        }
        Err(e) => {
            warn!(owner = %owner, error = %e, "Download progress catch-up failed");
            true
        }
    }
}
