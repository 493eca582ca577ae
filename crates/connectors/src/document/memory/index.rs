use crate::document::base::error::StoreError;
use bson::{Bson, Document};
use model::{
    core::value,
    operation::spec::{IndexRequest, SortKey},
};

pub const ID_INDEX: &str = "_id_";

#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub name: String,
    pub keys: Vec<SortKey>,
    pub unique: bool,
}

/// Index definitions for one collection. Indexes are bookkeeping only: they
/// name themselves and steer explain output, but lookups still scan.
#[derive(Debug, Clone)]
pub struct IndexCatalog {
    entries: Vec<IndexEntry>,
}

impl Default for IndexCatalog {
    fn default() -> Self {
        Self {
            entries: vec![IndexEntry {
                name: ID_INDEX.to_string(),
                keys: vec![SortKey::asc("_id")],
                unique: true,
            }],
        }
    }
}

impl IndexCatalog {
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Registers an index and returns its name. Re-creating an identical index
    /// is a no-op; clashing names or keys are index conflicts.
    pub fn create(
        &mut self,
        request: &IndexRequest,
        documents: &[Document],
    ) -> Result<String, StoreError> {
        if request.keys.is_empty() {
            return Err(StoreError::QueryRejected(
                "Index keys cannot be empty".to_string(),
            ));
        }

        let name = request.resolved_name();
        if let Some(existing) = self.entries.iter().find(|e| e.name == name) {
            if existing.keys == request.keys && existing.unique == request.unique {
                return Ok(name);
            }
            return Err(StoreError::IndexConflict(format!(
                "An existing index has the same name as the requested index: {name}"
            )));
        }
        if let Some(existing) = self.entries.iter().find(|e| e.keys == request.keys) {
            return Err(StoreError::IndexConflict(format!(
                "Index already exists with a different name: {}",
                existing.name
            )));
        }
        if request.unique {
            Self::check_unique(&name, &request.keys, documents)?;
        }

        self.entries.push(IndexEntry {
            name: name.clone(),
            keys: request.keys.clone(),
            unique: request.unique,
        });
        Ok(name)
    }

    fn check_unique(name: &str, keys: &[SortKey], documents: &[Document]) -> Result<(), StoreError> {
        let mut seen: Vec<Vec<Bson>> = Vec::with_capacity(documents.len());
        for d in documents {
            let key: Vec<Bson> = keys
                .iter()
                .map(|k| value::lookup(d, &k.field).cloned().unwrap_or(Bson::Null))
                .collect();
            let duplicate = seen.iter().any(|other| {
                other
                    .iter()
                    .zip(key.iter())
                    .all(|(a, b)| value::equal(a, b))
            });
            if duplicate {
                return Err(StoreError::IndexConflict(format!(
                    "E11000 duplicate key error building index {name}"
                )));
            }
            seen.push(key);
        }
        Ok(())
    }

    /// The index whose leading key is the first field of `filter`, if any.
    pub fn usable_for(&self, filter: &Document) -> Option<&IndexEntry> {
        let field = filter.keys().find(|k| !k.starts_with('$'))?;
        self.entries
            .iter()
            .find(|e| e.keys.first().is_some_and(|k| &k.field == field))
    }
}
