//! Song source seam
//!
//! Sessions talk to the server through [`SongProvider`] so they can run
//! against a fake in tests.

use async_trait::async_trait;
use classdj_client::{ClassDjClient, Result, SongEventStream};
use classdj_playback::OwnerId;

/// Source of track arrivals for a session
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SongProvider: Send + Sync {
    /// Streaming URLs of every song in the shared library
    async fn list_songs(&self) -> Result<Vec<String>>;

    /// Start an owner's download; the first song's URL if already ready
    async fn trigger_download(&self, owner: OwnerId) -> Result<Option<String>>;

    /// URLs of an owner's songs downloaded so far
    async fn download_progress(&self, owner: OwnerId) -> Result<Vec<String>>;

    /// Subscribe to `song_ready` notifications for every owner
    async fn song_events(&self) -> Result<SongEventStream>;
}

#[async_trait]
impl SongProvider for ClassDjClient {
    async fn list_songs(&self) -> Result<Vec<String>> {
        self.songs().list_songs().await
    }

    async fn trigger_download(&self, owner: OwnerId) -> Result<Option<String>> {
        self.songs().trigger_download(owner).await
    }

    async fn download_progress(&self, owner: OwnerId) -> Result<Vec<String>> {
        self.songs().download_progress(owner).await
    }

    async fn song_events(&self) -> Result<SongEventStream> {
        ClassDjClient::song_events(self).await
    }
}
