//! Main ClassDJ server client.

use crate::catalog::CatalogClient;
use crate::error::{ClientError, Result};
use crate::events::{self, SongEventStream};
use crate::songs::SongsClient;
use crate::types::{ServerConfig, ServerInfo};
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::{debug, info};

/// Main client for interacting with a ClassDJ song server.
///
/// Cheap to clone; clones share the underlying connection pool.
///
/// # Example
///
/// ```ignore
/// use classdj_client::{ClassDjClient, ServerConfig};
///
/// let client = ClassDjClient::new(ServerConfig::new("http://localhost:5050"))?;
///
/// let info = client.test_connection().await?;
/// println!("{}", info.message);
///
/// let urls = client.songs().list_songs().await?;
/// println!("Found {} songs", urls.len());
/// ```
#[derive(Debug, Clone)]
pub struct ClassDjClient {
    http: Client,
    base_url: String,
    request_timeout: Duration,
}

impl ClassDjClient {
    /// Create a new client with the given configuration.
    pub fn new(config: ServerConfig) -> Result<Self> {
        // Validate URL
        if config.url.is_empty() {
            return Err(ClientError::InvalidUrl("URL cannot be empty".into()));
        }

        // Parse and normalize URL
        let base_url = config.url.trim_end_matches('/').to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ClientError::InvalidUrl(
                "URL must start with http:// or https://".into(),
            ));
        }
        url::Url::parse(&base_url).map_err(|e| ClientError::InvalidUrl(e.to_string()))?;

        // No client-wide timeout: the event stream stays open indefinitely.
        // Every other request sets `request_timeout` itself.
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .user_agent(format!("ClassDJ/{} (Player)", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ClientError::Request)?;

        Ok(Self {
            http,
            base_url,
            request_timeout: config.request_timeout,
        })
    }

    /// Get the normalized server URL.
    pub fn url(&self) -> &str {
        &self.base_url
    }

    /// Test the connection to the server.
    pub async fn test_connection(&self) -> Result<ServerInfo> {
        let url = format!("{}/", self.base_url);
        debug!(url = %url, "Testing server connection");

        let response = self
            .http
            .get(&url)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(ClientError::from_send)?;
        let response = check_status(response).await?;

        let info: ServerInfo = response.json().await.map_err(|e| {
            ClientError::ParseError(format!("Failed to parse server info: {}", e))
        })?;

        info!(message = %info.message, "Connected to server");
        Ok(info)
    }

    /// Song listing, download trigger, and download progress.
    pub fn songs(&self) -> SongsClient<'_> {
        SongsClient::new(&self.http, &self.base_url, self.request_timeout)
    }

    /// Class hierarchy and maintenance endpoints.
    pub fn catalog(&self) -> CatalogClient<'_> {
        CatalogClient::new(&self.http, &self.base_url, self.request_timeout)
    }

    /// Subscribe to `song_ready` push notifications.
    ///
    /// The returned stream ends when the server closes the connection.
    pub async fn song_events(&self) -> Result<SongEventStream> {
        events::subscribe(&self.http, &self.base_url).await
    }

    /// Resolve a server-reported song path against the base URL.
    pub fn resolve(&self, path: &str) -> String {
        resolve_path(&self.base_url, path)
    }
}

/// Resolve a server path; absolute `http(s)://` URLs pass through.
pub fn resolve_path(base_url: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        path.to_string()
    } else {
        format!("{}/{}", base_url, path.trim_start_matches('/'))
    }
}

/// Turn a non-success response into a `ServerError`.
pub(crate) async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response.text().await.unwrap_or_default();
    Err(ClientError::ServerError {
        status: status.as_u16(),
        message: error_text,
    })
}
