use crate::shutdown::ExitCode;
use connectors::{ConnectorError, error::AdapterError};
use engine_config::error::ConfigError;
use engine_runtime::error::RunError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Failed to read or write a file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid environment: {0}")]
    Env(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to set up the store: {0}")]
    Adapter(#[from] AdapterError),

    #[error("Failed to connect to the store: {0}")]
    Connection(#[from] ConnectorError),

    #[error("Failed to run the catalog: {0}")]
    Runner(#[from] RunError),

    #[error("Failed to serialize data to JSON: {0}")]
    JsonSerialize(#[from] serde_json::Error),
}

impl CliError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            CliError::Connection(_) | CliError::Runner(RunError::Connection(_)) => {
                ExitCode::ConnectionFailed
            }
            _ => ExitCode::Failure,
        }
    }
}
