//! Song listing and per-owner download operations.

use crate::client::{check_status, resolve_path};
use crate::error::{ClientError, Result};
use crate::types::{DownloadResponse, ProgressEntry, SongListing};
use classdj_playback::OwnerId;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

/// Characters a browser's `encodeURIComponent` leaves untouched.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Build the streaming URL for a song file in the shared library.
pub fn song_url(base_url: &str, filename: &str) -> String {
    format!(
        "{}/songs/{}",
        base_url,
        utf8_percent_encode(filename, URI_COMPONENT)
    )
}

/// Songs client for a ClassDJ server.
pub struct SongsClient<'a> {
    http: &'a Client,
    base_url: &'a str,
    timeout: Duration,
}

impl<'a> SongsClient<'a> {
    pub(crate) fn new(http: &'a Client, base_url: &'a str, timeout: Duration) -> Self {
        Self {
            http,
            base_url,
            timeout,
        }
    }

    /// List every song in the shared library.
    ///
    /// Returns streaming URLs (`<base>/songs/<encoded filename>`) in server order.
    pub async fn list_songs(&self) -> Result<Vec<String>> {
        let url = format!("{}/list_songs", self.base_url);
        debug!(url = %url, "Listing songs");

        let response = self.get(&url).await?;
        let listing: SongListing = response.json().await.map_err(|e| {
            ClientError::ParseError(format!("Failed to parse song listing: {}", e))
        })?;

        Ok(listing
            .songs
            .iter()
            .map(|filename| song_url(self.base_url, filename))
            .collect())
    }

    /// Ask the server to start downloading an owner's songs.
    ///
    /// Returns the URL of the first song if it was ready immediately, or
    /// `None` when nothing is ready yet.
    pub async fn trigger_download(&self, owner: OwnerId) -> Result<Option<String>> {
        let url = format!("{}/download_student_songs/{}", self.base_url, owner);
        debug!(url = %url, owner = %owner, "Triggering download");

        let body = self.get(&url).await?.text().await?;
        if body.trim().is_empty() {
            return Ok(None);
        }

        let parsed: Option<DownloadResponse> = serde_json::from_str(&body).map_err(|e| {
            ClientError::ParseError(format!("Failed to parse download response: {}", e))
        })?;

        let first = parsed
            .and_then(|r| r.file)
            .filter(|f| !f.is_empty())
            .map(|f| resolve_path(self.base_url, &f));

        info!(owner = %owner, first_ready = first.is_some(), "Download triggered");
        Ok(first)
    }

    /// Songs downloaded so far for an owner, in server order.
    pub async fn download_progress(&self, owner: OwnerId) -> Result<Vec<String>> {
        let url = format!("{}/download_progress/{}", self.base_url, owner);
        debug!(url = %url, owner = %owner, "Polling download progress");

        let body = self.get(&url).await?.text().await?;
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }

        let entries: Option<Vec<ProgressEntry>> = serde_json::from_str(&body).map_err(|e| {
            ClientError::ParseError(format!("Failed to parse download progress: {}", e))
        })?;

        Ok(entries
            .unwrap_or_default()
            .into_iter()
            .filter_map(|entry| entry.path)
            .filter(|path| !path.is_empty())
            .map(|path| resolve_path(self.base_url, &path))
            .collect())
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response> {
        let response = self
            .http
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(ClientError::from_send)?;
        check_status(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn song_url_encodes_like_a_browser() {
        assert_eq!(
            song_url("http://h", "Rock & Roll (Live).mp3"),
            "http://h/songs/Rock%20%26%20Roll%20(Live).mp3"
        );
        assert_eq!(song_url("http://h", "a/b.mp3"), "http://h/songs/a%2Fb.mp3");
    }
}
