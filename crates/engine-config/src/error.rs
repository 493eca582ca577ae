use thiserror::Error;

/// Errors raised while loading or checking run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The catalog file could not be read.
    #[error("Failed to read catalog {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The catalog file is not a valid catalog document.
    #[error("Failed to parse catalog {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// Validation produced error-severity findings.
    #[error("Catalog validation failed: {}", .0.join("; "))]
    ValidationFailed(Vec<String>),

    /// A setting value could not be interpreted.
    #[error("Invalid setting {key}: {message}")]
    InvalidSetting { key: String, message: String },
}
