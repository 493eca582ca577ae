use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    /// A sort or index direction other than 1 / -1.
    #[error("Invalid key direction: {0} (expected 1 or -1)")]
    InvalidDirection(String),
}
