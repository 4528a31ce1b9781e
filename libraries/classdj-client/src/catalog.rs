//! Class hierarchy and maintenance operations.

use crate::client::check_status;
use crate::error::{ClientError, Result};
use crate::types::{CatalogKind, ClassPeriod, MessageResponse};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

/// Fetching top songs runs a server-side job for every artist.
const FETCH_TOP_SONGS_TIMEOUT: Duration = Duration::from_secs(300);

/// Catalog client for a ClassDJ server.
pub struct CatalogClient<'a> {
    http: &'a Client,
    base_url: &'a str,
    timeout: Duration,
}

impl<'a> CatalogClient<'a> {
    pub(crate) fn new(http: &'a Client, base_url: &'a str, timeout: Duration) -> Self {
        Self {
            http,
            base_url,
            timeout,
        }
    }

    /// Get every class with its students, artists, and songs.
    pub async fn classes_full(&self) -> Result<Vec<ClassPeriod>> {
        let url = format!("{}/classes_full", self.base_url);
        debug!(url = %url, "Fetching class hierarchy");

        let response = self
            .http
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(ClientError::from_send)?;
        let response = check_status(response).await?;

        let classes: Vec<ClassPeriod> = response.json().await.map_err(|e| {
            ClientError::ParseError(format!("Failed to parse class hierarchy: {}", e))
        })?;

        debug!(count = classes.len(), "Class hierarchy fetched");
        Ok(classes)
    }

    /// Delete one class, student, artist or song along with its children.
    pub async fn delete(&self, kind: CatalogKind, id: i64) -> Result<String> {
        let url = format!("{}/delete/{}/{}", self.base_url, kind, id);
        debug!(url = %url, kind = %kind, id, "Deleting catalog item");

        let response = self
            .http
            .delete(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(ClientError::from_send)?;
        let message = read_message(check_status(response).await?).await?;

        info!(kind = %kind, id, "Catalog item deleted");
        Ok(message)
    }

    /// Delete every class and everything beneath it.
    pub async fn delete_all(&self) -> Result<String> {
        let url = format!("{}/delete/all", self.base_url);
        debug!(url = %url, "Deleting the whole catalog");

        let response = self
            .http
            .delete(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(ClientError::from_send)?;
        let message = read_message(check_status(response).await?).await?;

        info!(message = %message, "Catalog cleared");
        Ok(message)
    }

    /// Remove every downloaded song file on the server.
    pub async fn clear_downloads(&self) -> Result<String> {
        let url = format!("{}/delete/all_downloads", self.base_url);
        debug!(url = %url, "Clearing downloads");

        let response = self
            .http
            .delete(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(ClientError::from_send)?;
        let message = read_message(check_status(response).await?).await?;

        info!(message = %message, "Downloads cleared");
        Ok(message)
    }

    /// Ask the server to look up the top songs for every artist.
    pub async fn fetch_top_songs(&self) -> Result<String> {
        let url = format!("{}/fetch_top_songs_all", self.base_url);
        debug!(url = %url, "Fetching top songs for all artists");

        let response = self
            .http
            .get(&url)
            .timeout(self.timeout.max(FETCH_TOP_SONGS_TIMEOUT))
            .send()
            .await
            .map_err(ClientError::from_send)?;
        let message = read_message(check_status(response).await?).await?;

        info!(message = %message, "Top songs fetched");
        Ok(message)
    }
}

/// Read an optional `{ "message": ... }` body.
async fn read_message(response: reqwest::Response) -> Result<String> {
    let body = response.text().await?;
    if body.trim().is_empty() {
        return Ok(String::new());
    }
    let parsed: MessageResponse = serde_json::from_str(&body)
        .map_err(|e| ClientError::ParseError(format!("Failed to parse message: {}", e)))?;
    Ok(parsed.message)
}
