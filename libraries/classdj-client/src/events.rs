//! `song_ready` push notifications.
//!
//! The server publishes a server-sent event stream at `/events`. Frames named
//! `song_ready` carry a JSON `{ ownerId, path }` payload; every other frame is
//! ignored.

use crate::client::{check_status, resolve_path};
use crate::error::{ClientError, Result};
use crate::types::SongReady;
use futures_util::stream::{self, Stream, StreamExt};
use reqwest::header::ACCEPT;
use reqwest::Client;
use std::pin::Pin;
use tracing::{debug, warn};

/// Name of the push event announcing a ready song.
pub const SONG_READY_EVENT: &str = "song_ready";

/// Stream of ready-song notifications, paths already resolved to URLs.
pub type SongEventStream = Pin<Box<dyn Stream<Item = Result<SongReady>> + Send>>;

pub(crate) async fn subscribe(http: &Client, base_url: &str) -> Result<SongEventStream> {
    let url = format!("{}/events", base_url);
    debug!(url = %url, "Subscribing to song events");

    let response = http
        .get(&url)
        .header(ACCEPT, "text/event-stream")
        .send()
        .await
        .map_err(ClientError::from_send)?;
    let response = check_status(response).await?;

    let base_url = base_url.to_string();
    let mut decoder = SseDecoder::default();

    let events = response
        .bytes_stream()
        .map(move |chunk| match chunk {
            Ok(bytes) => decoder
                .push(&bytes)
                .into_iter()
                .filter_map(|frame| song_ready(&frame, &base_url))
                .map(Ok)
                .collect::<Vec<_>>(),
            Err(e) => vec![Err(ClientError::Request(e))],
        })
        .flat_map(stream::iter);

    Ok(Box::pin(events))
}

/// Decode a frame into a `SongReady`, skipping other events and bad payloads.
fn song_ready(frame: &SseFrame, base_url: &str) -> Option<SongReady> {
    if frame.event != SONG_READY_EVENT {
        return None;
    }

    match serde_json::from_str::<SongReady>(&frame.data) {
        Ok(mut event) => {
            event.path = resolve_path(base_url, &event.path);
            Some(event)
        }
        Err(e) => {
            warn!(error = %e, data = %frame.data, "Skipping malformed song_ready payload");
            None
        }
    }
}

/// One dispatched server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    pub event: String,
    pub data: String,
}

/// Incremental `text/event-stream` decoder.
///
/// Chunks may split lines (and UTF-8 sequences) anywhere; bytes are buffered
/// until a full line is available.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
}

impl SseDecoder {
    /// Feed a chunk; returns the frames completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buffer.extend_from_slice(chunk);
        let mut frames = Vec::new();

        while let Some(newline) = self.buffer.iter().position(|b| *b == b'\n') {
            let mut line: Vec<u8> = self.buffer.drain(..=newline).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            let line = String::from_utf8_lossy(&line);

            if line.is_empty() {
                if let Some(frame) = self.dispatch() {
                    frames.push(frame);
                }
                continue;
            }
            if line.starts_with(':') {
                continue;
            }

            let (field, value) = match line.split_once(':') {
                Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
                None => (&*line, ""),
            };
            match field {
                "event" => self.event = Some(value.to_string()),
                "data" => self.data.push(value.to_string()),
                _ => {}
            }
        }

        frames
    }

    fn dispatch(&mut self) -> Option<SseFrame> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        Some(SseFrame {
            event: event.unwrap_or_else(|| "message".to_string()),
            data,
        })
    }
}
