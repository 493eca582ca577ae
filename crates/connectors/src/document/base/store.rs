use crate::document::base::error::{ConnectorError, StoreError};
use async_trait::async_trait;
use bson::Document;
use model::operation::spec::{ExplainVerbosity, FindOptions, IndexRequest};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreKind {
    Mongo,
    Memory,
    Other(String),
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreKind::Mongo => write!(f, "MongoDB"),
            StoreKind::Memory => write!(f, "memory"),
            StoreKind::Other(name) => write!(f, "{name}"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UpdateOutcome {
    pub matched: u64,
    pub modified: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeleteOutcome {
    pub deleted: u64,
}

/// A connection to one collection of a document store.
///
/// `connect` must succeed before any operation is issued, and `close` releases
/// the connection. Operations take `&self`; a handle is only ever driven by
/// one task at a time.
#[async_trait]
pub trait StoreHandle: Send + Sync {
    async fn connect(&mut self) -> Result<(), ConnectorError>;

    async fn find(
        &self,
        filter: &Document,
        options: &FindOptions,
    ) -> Result<Vec<Document>, StoreError>;

    /// Applies `update` (operator form) to the first record matching `filter`.
    async fn update_one(
        &self,
        filter: &Document,
        update: &Document,
    ) -> Result<UpdateOutcome, StoreError>;

    async fn delete_one(&self, filter: &Document) -> Result<DeleteOutcome, StoreError>;

    async fn aggregate(&self, pipeline: &[Document]) -> Result<Vec<Document>, StoreError>;

    /// Creates an index and returns its name.
    async fn create_index(&self, request: &IndexRequest) -> Result<String, StoreError>;

    async fn explain(
        &self,
        filter: &Document,
        options: &FindOptions,
        verbosity: ExplainVerbosity,
    ) -> Result<Document, StoreError>;

    async fn close(&mut self) -> Result<(), StoreError>;

    fn kind(&self) -> StoreKind;

    /// Human-readable target, e.g. `plp_bookstore.books`.
    fn namespace(&self) -> String;
}
