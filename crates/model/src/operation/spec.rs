use crate::error::ModelError;
use bson::{Bson, Document, doc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A named, declarative operation to run against a document store.
///
/// Specs are plain data: filters, updates, projections and pipeline stages are
/// carried as BSON documents and passed through to the store untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationSpec {
    pub name: String,
    #[serde(flatten)]
    pub operation: Operation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Operation {
    /// Query the collection and return every matching record.
    Find {
        #[serde(default)]
        filter: Document,
        #[serde(default)]
        options: FindOptions,
    },

    /// Apply an update to the first record matching `filter`.
    UpdateOne {
        filter: Document,
        update: Document,
        /// Fail the operation when no record matched.
        #[serde(default)]
        required: bool,
    },

    /// Remove the first record matching `filter`.
    DeleteOne { filter: Document },

    /// Run the pipeline stages, in order, over the whole collection.
    Aggregate { pipeline: Vec<Document> },

    CreateIndex(IndexRequest),

    /// Ask the store how it would execute a find, instead of running it.
    Explain {
        #[serde(default)]
        filter: Document,
        #[serde(default)]
        options: FindOptions,
        #[serde(default)]
        verbosity: ExplainVerbosity,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Find,
    UpdateOne,
    DeleteOne,
    Aggregate,
    CreateIndex,
    Explain,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Find => write!(f, "find"),
            OperationKind::UpdateOne => write!(f, "updateOne"),
            OperationKind::DeleteOne => write!(f, "deleteOne"),
            OperationKind::Aggregate => write!(f, "aggregate"),
            OperationKind::CreateIndex => write!(f, "createIndex"),
            OperationKind::Explain => write!(f, "explain"),
        }
    }
}

/// Optional modifiers for find and explain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FindOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projection: Option<Document>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<SortKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<u64>,
}

impl FindOptions {
    pub fn projection(mut self, projection: Document) -> Self {
        self.projection = Some(projection);
        self
    }

    pub fn sort_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort.push(SortKey::new(field, direction));
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    /// The sort keys as a `{field: 1 | -1}` document, if any were given.
    pub fn sort_document(&self) -> Option<Document> {
        (!self.sort.is_empty()).then(|| keys_document(&self.sort))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[serde(alias = "asc")]
    Ascending,
    #[serde(alias = "desc")]
    Descending,
}

impl SortDirection {
    pub fn as_i32(self) -> i32 {
        match self {
            SortDirection::Ascending => 1,
            SortDirection::Descending => -1,
        }
    }
}

impl TryFrom<&Bson> for SortDirection {
    type Error = ModelError;

    fn try_from(value: &Bson) -> Result<Self, Self::Error> {
        match crate::core::value::as_i64(value) {
            Some(1) => Ok(SortDirection::Ascending),
            Some(-1) => Ok(SortDirection::Descending),
            _ => Err(ModelError::InvalidDirection(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Ascending)
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Descending)
    }
}

/// Parses a `{field: 1 | -1, ...}` document into ordered sort keys.
pub fn parse_keys(document: &Document) -> Result<Vec<SortKey>, ModelError> {
    document
        .iter()
        .map(|(field, value)| Ok(SortKey::new(field.clone(), SortDirection::try_from(value)?)))
        .collect()
}

/// Renders sort keys as a `{field: 1 | -1, ...}` document, preserving order.
pub fn keys_document(keys: &[SortKey]) -> Document {
    let mut document = Document::new();
    for key in keys {
        document.insert(key.field.clone(), key.direction.as_i32());
    }
    document
}

/// Keys and options for an index creation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRequest {
    pub keys: Vec<SortKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub unique: bool,
}

impl IndexRequest {
    pub fn new(keys: Vec<SortKey>) -> Self {
        Self {
            keys,
            name: None,
            unique: false,
        }
    }

    pub fn keys_document(&self) -> Document {
        keys_document(&self.keys)
    }

    /// The conventional index name, `field_dir` pairs joined by `_`
    /// (`author_1_published_year_-1`).
    pub fn default_name(&self) -> String {
        self.keys
            .iter()
            .map(|k| format!("{}_{}", k.field, k.direction.as_i32()))
            .collect::<Vec<_>>()
            .join("_")
    }

    pub fn resolved_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.default_name())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExplainVerbosity {
    QueryPlanner,
    #[default]
    ExecutionStats,
    AllPlansExecution,
}

impl ExplainVerbosity {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExplainVerbosity::QueryPlanner => "queryPlanner",
            ExplainVerbosity::ExecutionStats => "executionStats",
            ExplainVerbosity::AllPlansExecution => "allPlansExecution",
        }
    }
}

/// Normalizes an update to operator form. A plain field mapping such as
/// `{price: 17.99}` becomes `{$set: {price: 17.99}}`; documents that already
/// use update operators are returned unchanged.
pub fn update_document(update: &Document) -> Document {
    if update.keys().any(|k| k.starts_with('$')) {
        update.clone()
    } else {
        doc! { "$set": update.clone() }
    }
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::Find { .. } => OperationKind::Find,
            Operation::UpdateOne { .. } => OperationKind::UpdateOne,
            Operation::DeleteOne { .. } => OperationKind::DeleteOne,
            Operation::Aggregate { .. } => OperationKind::Aggregate,
            Operation::CreateIndex(_) => OperationKind::CreateIndex,
            Operation::Explain { .. } => OperationKind::Explain,
        }
    }
}

impl OperationSpec {
    pub fn new(name: impl Into<String>, operation: Operation) -> Self {
        Self {
            name: name.into(),
            operation,
        }
    }

    pub fn kind(&self) -> OperationKind {
        self.operation.kind()
    }

    pub fn find(name: impl Into<String>, filter: Document) -> Self {
        Self::find_with(name, filter, FindOptions::default())
    }

    pub fn find_with(name: impl Into<String>, filter: Document, options: FindOptions) -> Self {
        Self::new(name, Operation::Find { filter, options })
    }

    pub fn update_one(name: impl Into<String>, filter: Document, update: Document) -> Self {
        Self::new(
            name,
            Operation::UpdateOne {
                filter,
                update,
                required: false,
            },
        )
    }

    pub fn delete_one(name: impl Into<String>, filter: Document) -> Self {
        Self::new(name, Operation::DeleteOne { filter })
    }

    pub fn aggregate(name: impl Into<String>, pipeline: Vec<Document>) -> Self {
        Self::new(name, Operation::Aggregate { pipeline })
    }

    pub fn create_index(name: impl Into<String>, keys: Vec<SortKey>) -> Self {
        Self::new(name, Operation::CreateIndex(IndexRequest::new(keys)))
    }

    pub fn explain(name: impl Into<String>, filter: Document) -> Self {
        Self::new(
            name,
            Operation::Explain {
                filter,
                options: FindOptions::default(),
                verbosity: ExplainVerbosity::default(),
            },
        )
    }

    /// Marks an update as required: it fails when nothing matched.
    /// Has no effect on other operation kinds.
    pub fn required(mut self) -> Self {
        if let Operation::UpdateOne { required, .. } = &mut self.operation {
            *required = true;
        }
        self
    }
}
