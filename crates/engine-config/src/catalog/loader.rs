use crate::error::ConfigError;
use model::operation::catalog::Catalog;
use std::path::Path;
use tracing::info;

/// Reads a JSON catalog file:
/// `{"name": "...", "operations": [{"name": "...", "kind": "find", ...}]}`.
pub fn load_catalog(path: impl AsRef<Path>) -> Result<Catalog, ConfigError> {
    let path = path.as_ref();
    let path_str = path.display().to_string();
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path_str.clone(),
        source,
    })?;
    let catalog = parse_catalog(&raw).map_err(|source| ConfigError::Parse {
        path: path_str.clone(),
        source,
    })?;
    info!(
        "Loaded catalog '{}' with {} operations from {}",
        catalog.name,
        catalog.len(),
        path_str
    );
    Ok(catalog)
}

pub fn parse_catalog(raw: &str) -> Result<Catalog, serde_json::Error> {
    serde_json::from_str(raw)
}
