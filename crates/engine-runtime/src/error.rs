use connectors::ConnectorError;
use thiserror::Error;

/// Errors that end a run. Everything an individual operation does wrong is
/// recorded in the report instead.
#[derive(Debug, Error)]
pub enum RunError {
    /// The store could not be connected; no operation was attempted.
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectorError),

    /// The store session was used outside its connected window.
    #[error("Store session is not open")]
    SessionClosed,
}
