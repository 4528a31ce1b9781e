use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default delay between download progress polls (and push re-subscriptions)
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Where a session's track arrivals come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrivalMode {
    /// One listing of the shared library, fed in server order
    Listing,
    /// Trigger an owner's download, then poll its progress
    #[default]
    Poll,
    /// Trigger an owner's download, then follow `song_ready` notifications
    Push,
}

impl ArrivalMode {
    /// Whether the mode is scoped to a single owner
    pub fn needs_owner(self) -> bool {
        !matches!(self, ArrivalMode::Listing)
    }
}

impl fmt::Display for ArrivalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArrivalMode::Listing => write!(f, "listing"),
            ArrivalMode::Poll => write!(f, "poll"),
            ArrivalMode::Push => write!(f, "push"),
        }
    }
}

impl FromStr for ArrivalMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "listing" => Ok(ArrivalMode::Listing),
            "poll" => Ok(ArrivalMode::Poll),
            "push" => Ok(ArrivalMode::Push),
            other => Err(format!(
                "unknown arrival mode '{}' (expected listing, poll or push)",
                other
            )),
        }
    }
}

/// Session settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub mode: ArrivalMode,
    pub poll_interval: Duration,
}

impl SessionConfig {
    pub fn new(mode: ArrivalMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mode: ArrivalMode::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}
