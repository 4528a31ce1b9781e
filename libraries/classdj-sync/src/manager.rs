use crate::error::Result;
use crate::provider::SongProvider;
use crate::session::SessionHandle;
use crate::types::SessionConfig;
use classdj_playback::{MediaOutput, OwnerId};
use std::sync::Arc;
use tracing::{info, warn};

/// Keeps at most one playlist session mounted
///
/// Switching owners is a remount: the previous session is shut down before
/// the next one starts, so two players never run at once.
pub struct SessionManager {
    provider: Arc<dyn SongProvider>,
    config: SessionConfig,
    current: Option<SessionHandle>,
}

impl SessionManager {
    pub fn new(provider: Arc<dyn SongProvider>, config: SessionConfig) -> Self {
        Self {
            provider,
            config,
            current: None,
        }
    }

    pub fn config(&self) -> SessionConfig {
        self.config
    }

    /// The mounted session, if any
    pub fn current(&self) -> Option<&SessionHandle> {
        self.current.as_ref()
    }

    /// Tear down the mounted session (if any) and start a fresh one
    pub async fn mount<O>(&mut self, owner: Option<OwnerId>, output: O) -> Result<&SessionHandle>
    where
        O: MediaOutput + 'static,
    {
        self.unmount().await;

        let handle = SessionHandle::start(Arc::clone(&self.provider), owner, output, self.config)?;
        info!(session = %handle.id(), owner = ?owner, "Session mounted");
        Ok(self.current.insert(handle))
    }

    /// Shut down the mounted session
    pub async fn unmount(&mut self) {
        if let Some(previous) = self.current.take() {
            let id = previous.id();
            if let Err(e) = previous.shutdown().await {
                warn!(session = %id, error = %e, "Session did not shut down cleanly");
            }
        }
    }
}
