use crate::error::RunError;
use connectors::{StoreError, StoreHandle};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unconnected,
    Connected,
    Closed,
}

/// The connect/close window around a run. A session is opened at most once
/// and, once open, closed exactly once.
pub struct Session<'a> {
    store: &'a mut dyn StoreHandle,
    state: SessionState,
}

impl<'a> Session<'a> {
    pub fn new(store: &'a mut dyn StoreHandle) -> Self {
        Self {
            store,
            state: SessionState::Unconnected,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub async fn open(&mut self) -> Result<(), RunError> {
        if self.state != SessionState::Unconnected {
            return Err(RunError::SessionClosed);
        }
        self.store.connect().await?;
        self.state = SessionState::Connected;
        info!(
            "Session open on {} ({})",
            self.store.namespace(),
            self.store.kind()
        );
        Ok(())
    }

    pub fn store(&self) -> Result<&dyn StoreHandle, RunError> {
        match self.state {
            SessionState::Connected => Ok(&*self.store),
            _ => Err(RunError::SessionClosed),
        }
    }

    /// Closes the store if the session is open. Calling it again is a no-op.
    pub async fn release(&mut self) -> Result<(), StoreError> {
        if self.state != SessionState::Connected {
            debug!("Session already released or never opened");
            return Ok(());
        }
        self.state = SessionState::Closed;
        self.store.close().await
    }
}
