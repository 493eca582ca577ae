use crate::document::base::error::ConnectorError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    /// A store backend name that no adapter handles.
    #[error("Unsupported store: {0}")]
    UnsupportedStore(String),

    /// Failed to initialize a store connection.
    #[error("Connector error: {0}")]
    Connector(#[from] ConnectorError),

    /// A seed file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A seed file was read but is not a JSON array of documents.
    #[error("Invalid seed file {path}: {message}")]
    Seed { path: String, message: String },
}
