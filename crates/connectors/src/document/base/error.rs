use model::execution::result::ErrorKind;
use thiserror::Error;

/// Errors from a single store operation. These never end a run; the runner
/// records them against the operation that raised them.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store refused the query: unknown operator, bad value, write error.
    #[error("Query rejected: {0}")]
    QueryRejected(String),

    /// An index with the same name or keys but different options already exists.
    #[error("Index conflict: {0}")]
    IndexConflict(String),

    /// The store rejected an aggregation stage. Carries the store's raw message.
    #[error("Malformed pipeline: {0}")]
    MalformedPipeline(String),

    /// An operation was attempted before connect or after close.
    #[error("Store is not connected")]
    NotConnected,

    /// Any other driver or transport failure.
    #[error("Driver error: {0}")]
    Driver(String),
}

impl StoreError {
    pub fn error_kind(&self) -> ErrorKind {
        match self {
            StoreError::QueryRejected(_) => ErrorKind::QueryRejected,
            StoreError::IndexConflict(_) => ErrorKind::IndexConflict,
            StoreError::MalformedPipeline(_) => ErrorKind::MalformedPipeline,
            StoreError::NotConnected | StoreError::Driver(_) => ErrorKind::Driver,
        }
    }
}

/// Errors happening while acquiring a store connection.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// The MongoDB driver failed to parse the URI or reach the deployment.
    #[error("MongoDB connection failed: {0}")]
    Mongo(#[from] mongodb::error::Error),

    /// The connection string does not use a MongoDB scheme.
    #[error("Invalid connection string: {0}")]
    InvalidUri(String),

    #[error("Store unreachable: {0}")]
    Unreachable(String),

    /// `connect` was called on a handle that is already connected.
    #[error("Store is already connected")]
    AlreadyConnected,
}
