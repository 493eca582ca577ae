use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_URI: &str = "mongodb://localhost:27017";
pub const DEFAULT_DATABASE: &str = "plp_bookstore";
pub const DEFAULT_COLLECTION: &str = "books";

/// Where a [`super::adapter::MongoAdapter`] connects to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MongoSettings {
    pub uri: String,
    pub database: String,
    pub collection: String,
    /// Upper bound on server selection while connecting. The driver default
    /// (30s) applies when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_timeout: Option<Duration>,
}

impl MongoSettings {
    pub fn new(
        uri: impl Into<String>,
        database: impl Into<String>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            uri: uri.into(),
            database: database.into(),
            collection: collection.into(),
            connect_timeout: None,
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn namespace(&self) -> String {
        format!("{}.{}", self.database, self.collection)
    }
}

impl Default for MongoSettings {
    fn default() -> Self {
        Self::new(DEFAULT_URI, DEFAULT_DATABASE, DEFAULT_COLLECTION)
    }
}
