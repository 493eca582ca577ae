use connectors::document::mongo::settings::{
    DEFAULT_COLLECTION, DEFAULT_DATABASE, DEFAULT_URI, MongoSettings,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

pub const ENV_URI: &str = "DOCRUN_URI";
pub const ENV_DATABASE: &str = "DOCRUN_DATABASE";
pub const ENV_COLLECTION: &str = "DOCRUN_COLLECTION";

/// Which store a run targets. Resolved in layers: defaults, then environment,
/// then explicit overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSettings {
    pub uri: String,
    pub database: String,
    pub collection: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            uri: DEFAULT_URI.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
        }
    }
}

impl StoreSettings {
    /// Defaults overlaid with any `DOCRUN_*` variables present in `vars`.
    /// Empty values are ignored.
    pub fn from_env(vars: &HashMap<String, String>) -> Self {
        let lookup = |key: &str| {
            vars.get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        let settings = Self::default().with_overrides(
            lookup(ENV_URI),
            lookup(ENV_DATABASE),
            lookup(ENV_COLLECTION),
        );
        debug!("Store settings from environment: {}", settings.namespace());
        settings
    }

    pub fn with_overrides(
        mut self,
        uri: Option<String>,
        database: Option<String>,
        collection: Option<String>,
    ) -> Self {
        if let Some(uri) = uri {
            self.uri = uri;
        }
        if let Some(database) = database {
            self.database = database;
        }
        if let Some(collection) = collection {
            self.collection = collection;
        }
        self
    }

    pub fn namespace(&self) -> String {
        format!("{}.{}", self.database, self.collection)
    }

    pub fn mongo(&self) -> MongoSettings {
        MongoSettings::new(&self.uri, &self.database, &self.collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_match_bookstore() {
        let settings = StoreSettings::from_env(&HashMap::new());
        assert_eq!(settings.uri, "mongodb://localhost:27017");
        assert_eq!(settings.namespace(), "plp_bookstore.books");
    }

    #[test]
    fn env_overrides_defaults() {
        let settings = StoreSettings::from_env(&vars(&[
            (ENV_URI, "mongodb://db.internal:27018"),
            (ENV_COLLECTION, "novels"),
            (ENV_DATABASE, "  "),
        ]));
        assert_eq!(settings.uri, "mongodb://db.internal:27018");
        assert_eq!(settings.database, "plp_bookstore");
        assert_eq!(settings.collection, "novels");
    }

    #[test]
    fn explicit_overrides_win_over_env() {
        let settings = StoreSettings::from_env(&vars(&[(ENV_DATABASE, "from_env")]))
            .with_overrides(None, Some("from_flag".to_string()), None);
        assert_eq!(settings.database, "from_flag");

        let mongo = settings.mongo();
        assert_eq!(mongo.namespace(), "from_flag.books");
        assert!(mongo.connect_timeout.is_none());
    }
}
