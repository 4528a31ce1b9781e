/// Player configuration
use crate::error::{PlayerError, Result};
use classdj_client::ServerConfig;
use classdj_sync::{ArrivalMode, SessionConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlayerConfig {
    #[serde(default = "default_server")]
    pub server: ServerSettings,

    #[serde(default = "default_session")]
    pub session: SessionSettings,

    #[serde(default = "default_output")]
    pub output: OutputSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerSettings {
    #[serde(default = "default_url")]
    pub url: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionSettings {
    #[serde(default)]
    pub mode: ArrivalMode,

    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputSettings {
    /// Length the headless clock gives every track
    #[serde(default = "default_nominal_track_secs")]
    pub nominal_track_secs: u64,

    /// How often the clock reports progress
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

impl PlayerConfig {
    /// Load configuration from file and environment
    ///
    /// `path` must exist when given; otherwise `config.toml` in the working
    /// directory is used if present. `CLASSDJ_`-prefixed variables override
    /// both, with `__` between nested keys (`CLASSDJ_SERVER__URL`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path.to_path_buf()));
            }
            None => {
                let config_path = PathBuf::from("config.toml");
                if config_path.exists() {
                    settings = settings.add_source(config::File::from(config_path));
                }
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix("CLASSDJ")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings
            .build()
            .map_err(|e| PlayerError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| PlayerError::Config(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let url = self.server.url.trim();
        if url.is_empty() {
            return Err(PlayerError::Config(
                "Server URL is required (set CLASSDJ_SERVER__URL)".to_string(),
            ));
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(PlayerError::Config(format!(
                "Server URL must start with http:// or https://, got {:?}",
                url
            )));
        }

        if self.server.request_timeout_secs == 0 {
            return Err(PlayerError::Config(
                "server.request_timeout_secs must be positive".to_string(),
            ));
        }
        if self.session.poll_interval_secs == 0 {
            return Err(PlayerError::Config(
                "session.poll_interval_secs must be positive".to_string(),
            ));
        }
        if self.output.nominal_track_secs == 0 || self.output.tick_ms == 0 {
            return Err(PlayerError::Config(
                "output.nominal_track_secs and output.tick_ms must be positive".to_string(),
            ));
        }

        Ok(())
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig::new(self.server.url.trim())
            .with_timeout(Duration::from_secs(self.server.request_timeout_secs))
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::new(self.session.mode)
            .with_poll_interval(Duration::from_secs(self.session.poll_interval_secs))
    }

    pub fn track_length(&self) -> Duration {
        Duration::from_secs(self.output.nominal_track_secs)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.output.tick_ms)
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            server: default_server(),
            session: default_session(),
            output: default_output(),
        }
    }
}

// Default values
fn default_server() -> ServerSettings {
    ServerSettings {
        url: default_url(),
        request_timeout_secs: default_request_timeout_secs(),
    }
}

fn default_url() -> String {
    "http://localhost:5050".to_string()
}

fn default_request_timeout_secs() -> u64 {
    classdj_client::DEFAULT_REQUEST_TIMEOUT.as_secs()
}

fn default_session() -> SessionSettings {
    SessionSettings {
        mode: ArrivalMode::default(),
        poll_interval_secs: default_poll_interval_secs(),
    }
}

fn default_poll_interval_secs() -> u64 {
    classdj_sync::DEFAULT_POLL_INTERVAL.as_secs()
}

fn default_output() -> OutputSettings {
    OutputSettings {
        nominal_track_secs: default_nominal_track_secs(),
        tick_ms: default_tick_ms(),
    }
}

fn default_nominal_track_secs() -> u64 {
    180
}

fn default_tick_ms() -> u64 {
    500
}
