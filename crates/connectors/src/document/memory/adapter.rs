use crate::{
    document::{
        base::{
            error::{ConnectorError, StoreError},
            store::{DeleteOutcome, StoreHandle, StoreKind, UpdateOutcome},
        },
        memory::{filter, index::IndexCatalog, pipeline, projection, update},
    },
    error::AdapterError,
};
use async_trait::async_trait;
use bson::{Bson, Document, doc, oid::ObjectId};
use model::operation::spec::{ExplainVerbosity, FindOptions, IndexRequest};
use std::{path::Path, sync::Arc, time::Instant};
use tokio::sync::RwLock;
use tracing::{debug, info};

#[derive(Debug, Default)]
struct Collection {
    documents: Vec<Document>,
    indexes: IndexCatalog,
}

/// In-process store holding one collection. Clones share the same data, so a
/// test can keep a clone around to inspect what a run did.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    namespace: String,
    collection: Arc<RwLock<Collection>>,
    connected: bool,
    reachable: bool,
}

impl MemoryStore {
    pub fn new(namespace: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            collection: Arc::new(RwLock::new(Collection::default())),
            connected: false,
            reachable: true,
        }
    }

    /// Builds a store holding `documents`. Documents without an `_id` get a
    /// fresh `ObjectId`.
    pub fn with_documents(namespace: &str, documents: Vec<Document>) -> Self {
        let collection = Collection {
            documents: documents.into_iter().map(with_id).collect(),
            indexes: IndexCatalog::default(),
        };
        Self {
            collection: Arc::new(RwLock::new(collection)),
            ..Self::new(namespace)
        }
    }

    /// Loads a JSON array of documents. Extended JSON (`{"$oid": ...}`) is honoured.
    pub fn from_seed_file(namespace: &str, path: impl AsRef<Path>) -> Result<Self, AdapterError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let documents = parse_seed(&raw).map_err(|message| AdapterError::Seed {
            path: path.display().to_string(),
            message,
        })?;
        info!("Seeded {} documents from {}", documents.len(), path.display());
        Ok(Self::with_documents(namespace, documents))
    }

    /// A store whose `connect` always fails.
    pub fn unreachable(namespace: &str) -> Self {
        Self {
            reachable: false,
            ..Self::new(namespace)
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Snapshot of the stored documents, in insertion order.
    pub async fn documents(&self) -> Vec<Document> {
        self.collection.read().await.documents.clone()
    }

    pub async fn index_names(&self) -> Vec<String> {
        let collection = self.collection.read().await;
        collection
            .indexes
            .entries()
            .iter()
            .map(|e| e.name.clone())
            .collect()
    }

    fn ensure_connected(&self) -> Result<(), StoreError> {
        if self.connected {
            Ok(())
        } else {
            Err(StoreError::NotConnected)
        }
    }

    fn matching<'a>(
        documents: &'a [Document],
        filter: &Document,
    ) -> Result<Vec<&'a Document>, StoreError> {
        let mut out = Vec::new();
        for d in documents {
            if filter::matches(d, filter)? {
                out.push(d);
            }
        }
        Ok(out)
    }

    fn first_match(documents: &[Document], filter: &Document) -> Result<Option<usize>, StoreError> {
        for (i, d) in documents.iter().enumerate() {
            if filter::matches(d, filter)? {
                return Ok(Some(i));
            }
        }
        Ok(None)
    }

    /// Filter, sort, skip, limit, then project.
    fn select(
        documents: &[Document],
        filter: &Document,
        options: &FindOptions,
    ) -> Result<Vec<Document>, StoreError> {
        let mut records: Vec<Document> = Self::matching(documents, filter)?
            .into_iter()
            .cloned()
            .collect();
        projection::sort(&mut records, &options.sort);

        let skip = options.skip.unwrap_or(0) as usize;
        let records = records.into_iter().skip(skip);
        let records: Vec<Document> = match options.limit.map(i64::unsigned_abs) {
            Some(limit) if limit > 0 => records.take(limit as usize).collect(),
            _ => records.collect(),
        };

        match &options.projection {
            Some(p) => records.iter().map(|d| projection::project(d, p)).collect(),
            None => Ok(records),
        }
    }
}

fn with_id(document: Document) -> Document {
    if document.contains_key("_id") {
        return document;
    }
    let mut out = doc! { "_id": ObjectId::new() };
    for (key, value) in document {
        out.insert(key, value);
    }
    out
}

fn parse_seed(raw: &str) -> Result<Vec<Document>, String> {
    let value: serde_json::Value = serde_json::from_str(raw).map_err(|e| e.to_string())?;
    let serde_json::Value::Array(items) = value else {
        return Err("expected a JSON array of documents".to_string());
    };
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match Bson::try_from(item) {
            Ok(Bson::Document(d)) => Ok(d),
            Ok(other) => Err(format!("entry {i} is not a document: {other}")),
            Err(e) => Err(format!("entry {i}: {e}")),
        })
        .collect()
}

#[async_trait]
impl StoreHandle for MemoryStore {
    async fn connect(&mut self) -> Result<(), ConnectorError> {
        if !self.reachable {
            return Err(ConnectorError::Unreachable(self.namespace.clone()));
        }
        if self.connected {
            return Err(ConnectorError::AlreadyConnected);
        }
        self.connected = true;
        info!("Connected to in-memory store {}", self.namespace);
        Ok(())
    }

    async fn find(
        &self,
        filter: &Document,
        options: &FindOptions,
    ) -> Result<Vec<Document>, StoreError> {
        self.ensure_connected()?;
        let collection = self.collection.read().await;
        let records = Self::select(&collection.documents, filter, options)?;
        debug!("find {:?} returned {} records", filter, records.len());
        Ok(records)
    }

    async fn update_one(
        &self,
        filter: &Document,
        update: &Document,
    ) -> Result<UpdateOutcome, StoreError> {
        self.ensure_connected()?;
        let mut collection = self.collection.write().await;

        let Some(i) = Self::first_match(&collection.documents, filter)? else {
            return Ok(UpdateOutcome::default());
        };

        // A failing modifier must leave the stored record untouched.
        let mut updated = collection.documents[i].clone();
        let modified = update::apply(&mut updated, update)?;
        collection.documents[i] = updated;

        Ok(UpdateOutcome {
            matched: 1,
            modified: modified as u64,
        })
    }

    async fn delete_one(&self, filter: &Document) -> Result<DeleteOutcome, StoreError> {
        self.ensure_connected()?;
        let mut collection = self.collection.write().await;

        match Self::first_match(&collection.documents, filter)? {
            Some(i) => {
                collection.documents.remove(i);
                Ok(DeleteOutcome { deleted: 1 })
            }
            None => Ok(DeleteOutcome::default()),
        }
    }

    async fn aggregate(&self, stages: &[Document]) -> Result<Vec<Document>, StoreError> {
        self.ensure_connected()?;
        let documents = self.collection.read().await.documents.clone();
        let records = pipeline::run(documents, stages)?;
        debug!(
            "aggregate with {} stages returned {} records",
            stages.len(),
            records.len()
        );
        Ok(records)
    }

    async fn create_index(&self, request: &IndexRequest) -> Result<String, StoreError> {
        self.ensure_connected()?;
        let mut collection = self.collection.write().await;
        let Collection { documents, indexes } = &mut *collection;
        let name = indexes.create(request, documents)?;
        info!("Index {} ready on {}", name, self.namespace);
        Ok(name)
    }

    async fn explain(
        &self,
        filter: &Document,
        options: &FindOptions,
        verbosity: ExplainVerbosity,
    ) -> Result<Document, StoreError> {
        self.ensure_connected()?;
        let started = Instant::now();
        let collection = self.collection.read().await;

        let index = collection.indexes.usable_for(filter);
        let mut winning_plan = match index {
            Some(entry) => doc! { "stage": "IXSCAN", "indexName": entry.name.clone() },
            None => doc! { "stage": "COLLSCAN" },
        };
        winning_plan.insert("filter", filter.clone());

        let mut plan = doc! {
            "queryPlanner": {
                "namespace": self.namespace.clone(),
                "winningPlan": winning_plan,
            }
        };
        if verbosity == ExplainVerbosity::QueryPlanner {
            return Ok(plan);
        }

        let returned = Self::select(&collection.documents, filter, options)?.len();
        let examined = match index {
            Some(_) => Self::matching(&collection.documents, filter)?.len(),
            None => collection.documents.len(),
        };
        plan.insert(
            "executionStats",
            doc! {
                "nReturned": returned as i64,
                "totalDocsExamined": examined as i64,
                "executionTimeMillis": started.elapsed().as_millis() as i64,
            },
        );
        Ok(plan)
    }

    async fn close(&mut self) -> Result<(), StoreError> {
        self.ensure_connected()?;
        self.connected = false;
        info!("Closed in-memory store {}", self.namespace);
        Ok(())
    }

    fn kind(&self) -> StoreKind {
        StoreKind::Memory
    }

    fn namespace(&self) -> String {
        self.namespace.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::operation::spec::{SortDirection, SortKey};
    use std::io::Write;

    fn books() -> Vec<Document> {
        vec![
            doc! { "title": "1984", "author": "George Orwell", "genre": "Dystopian", "published_year": 1949, "price": 10.99, "in_stock": true },
            doc! { "title": "The Hobbit", "author": "J.R.R. Tolkien", "genre": "Fantasy", "published_year": 1937, "price": 14.99, "in_stock": true },
            doc! { "title": "Moby Dick", "author": "Herman Melville", "genre": "Adventure", "published_year": 1851, "price": 12.5, "in_stock": false },
            doc! { "title": "Animal Farm", "author": "George Orwell", "genre": "Political Satire", "published_year": 1945, "price": 8.5, "in_stock": false },
        ]
    }

    async fn connected() -> MemoryStore {
        let mut store = MemoryStore::with_documents("plp_bookstore.books", books());
        store.connect().await.unwrap();
        store
    }

    #[tokio::test]
    async fn operations_require_connection() {
        let mut store = MemoryStore::with_documents("plp_bookstore.books", books());
        assert!(matches!(
            store.find(&doc! {}, &FindOptions::default()).await,
            Err(StoreError::NotConnected)
        ));

        store.connect().await.unwrap();
        assert!(matches!(
            store.connect().await,
            Err(ConnectorError::AlreadyConnected)
        ));
        store.close().await.unwrap();
        assert!(matches!(
            store.delete_one(&doc! {}).await,
            Err(StoreError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn unreachable_store_fails_to_connect() {
        let mut store = MemoryStore::unreachable("nowhere.books");
        assert!(matches!(
            store.connect().await,
            Err(ConnectorError::Unreachable(_))
        ));
        assert!(!store.is_connected());
    }

    #[tokio::test]
    async fn find_applies_sort_skip_limit_projection() {
        let store = connected().await;
        let options = FindOptions::default()
            .sort_by("price", SortDirection::Ascending)
            .skip(1)
            .limit(2)
            .projection(doc! { "title": 1, "_id": 0 });

        let records = store.find(&doc! {}, &options).await.unwrap();
        assert_eq!(
            records,
            vec![doc! { "title": "1984" }, doc! { "title": "Moby Dick" }]
        );
    }

    #[tokio::test]
    async fn update_and_delete_touch_first_match() {
        let store = connected().await;
        let outcome = store
            .update_one(&doc! { "title": "The Hobbit" }, &doc! { "$set": { "price": 17.99 } })
            .await
            .unwrap();
        assert_eq!(outcome, UpdateOutcome { matched: 1, modified: 1 });

        let missing = store
            .update_one(&doc! { "title": "Dune" }, &doc! { "$set": { "price": 1 } })
            .await
            .unwrap();
        assert_eq!(missing, UpdateOutcome::default());

        let deleted = store.delete_one(&doc! { "author": "George Orwell" }).await.unwrap();
        assert_eq!(deleted.deleted, 1);

        let remaining = store.documents().await;
        assert_eq!(remaining.len(), 3);
        assert_eq!(remaining[0].get_str("title").unwrap(), "The Hobbit");
        assert_eq!(remaining[0].get_f64("price").unwrap(), 17.99);
    }

    #[tokio::test]
    async fn failed_update_leaves_record_untouched() {
        let store = connected().await;
        let result = store
            .update_one(
                &doc! { "title": "1984" },
                &doc! { "$set": { "price": 1.0 }, "$inc": { "title": 1 } },
            )
            .await;
        assert!(matches!(result, Err(StoreError::QueryRejected(_))));

        let records = store
            .find(&doc! { "title": "1984" }, &FindOptions::default())
            .await
            .unwrap();
        assert_eq!(records[0].get_f64("price").unwrap(), 10.99);
    }

    #[tokio::test]
    async fn explain_reports_index_usage() {
        let store = connected().await;
        let by_title = doc! { "title": "1984" };

        let plan = store
            .explain(&by_title, &FindOptions::default(), ExplainVerbosity::ExecutionStats)
            .await
            .unwrap();
        let winning = plan
            .get_document("queryPlanner")
            .and_then(|q| q.get_document("winningPlan"))
            .unwrap();
        assert_eq!(winning.get_str("stage").unwrap(), "COLLSCAN");
        let stats = plan.get_document("executionStats").unwrap();
        assert_eq!(stats.get_i64("nReturned").unwrap(), 1);
        assert_eq!(stats.get_i64("totalDocsExamined").unwrap(), 4);

        let name = store
            .create_index(&IndexRequest::new(vec![SortKey::asc("title")]))
            .await
            .unwrap();
        assert_eq!(name, "title_1");

        let plan = store
            .explain(&by_title, &FindOptions::default(), ExplainVerbosity::ExecutionStats)
            .await
            .unwrap();
        let winning = plan
            .get_document("queryPlanner")
            .and_then(|q| q.get_document("winningPlan"))
            .unwrap();
        assert_eq!(winning.get_str("stage").unwrap(), "IXSCAN");
        assert_eq!(winning.get_str("indexName").unwrap(), "title_1");
        let stats = plan.get_document("executionStats").unwrap();
        assert_eq!(stats.get_i64("totalDocsExamined").unwrap(), 1);

        let planner_only = store
            .explain(&by_title, &FindOptions::default(), ExplainVerbosity::QueryPlanner)
            .await
            .unwrap();
        assert!(!planner_only.contains_key("executionStats"));
    }

    #[tokio::test]
    async fn aggregate_uses_current_documents() {
        let store = connected().await;
        store.delete_one(&doc! { "title": "Moby Dick" }).await.unwrap();
        let counts = store
            .aggregate(&[
                doc! { "$group": { "_id": "$author", "count": { "$sum": 1 } } },
                doc! { "$sort": { "count": -1 } },
                doc! { "$limit": 1 },
            ])
            .await
            .unwrap();
        assert_eq!(counts, vec![doc! { "_id": "George Orwell", "count": 2 }]);
    }

    #[tokio::test]
    async fn seed_file_assigns_ids() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"title": "Dune", "price": 9.99}}, {{"_id": {{"$oid": "65a1b2c3d4e5f60718293a4b"}}, "title": "Emma"}}]"#
        )
        .unwrap();

        let store = MemoryStore::from_seed_file("plp_bookstore.books", file.path()).unwrap();
        let documents = store.documents().await;
        assert_eq!(documents.len(), 2);
        assert!(matches!(documents[0].get("_id"), Some(Bson::ObjectId(_))));
        assert_eq!(documents[0].keys().next().map(String::as_str), Some("_id"));
        assert_eq!(
            documents[1].get_object_id("_id").unwrap().to_hex(),
            "65a1b2c3d4e5f60718293a4b"
        );
    }

    #[test]
    fn seed_file_must_be_an_array() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"title": "Dune"}}"#).unwrap();
        assert!(matches!(
            MemoryStore::from_seed_file("plp_bookstore.books", file.path()),
            Err(AdapterError::Seed { .. })
        ));
    }
}
