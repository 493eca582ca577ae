use crate::{
    document::{
        base::store::StoreHandle,
        memory::adapter::MemoryStore,
        mongo::{adapter::MongoAdapter, settings::MongoSettings},
    },
    error::AdapterError,
};
use std::path::Path;

pub enum Adapter {
    Mongo(MongoAdapter),
    Memory(MemoryStore),
}

impl Adapter {
    pub fn mongo(settings: MongoSettings) -> Self {
        Adapter::Mongo(MongoAdapter::new(settings))
    }

    /// An in-memory store, optionally seeded from a JSON array file.
    pub fn memory(namespace: &str, seed: Option<&Path>) -> Result<Self, AdapterError> {
        let store = match seed {
            Some(path) => MemoryStore::from_seed_file(namespace, path)?,
            None => MemoryStore::new(namespace),
        };
        Ok(Adapter::Memory(store))
    }

    pub fn as_store_mut(&mut self) -> &mut dyn StoreHandle {
        match self {
            Adapter::Mongo(adapter) => adapter,
            Adapter::Memory(store) => store,
        }
    }

    pub fn as_store(&self) -> &dyn StoreHandle {
        match self {
            Adapter::Mongo(adapter) => adapter,
            Adapter::Memory(store) => store,
        }
    }
}
