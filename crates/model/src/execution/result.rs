use crate::operation::spec::OperationKind;
use bson::Document;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a single operation failed. None of these abort a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A required update matched no record.
    NotFound,
    /// The store refused the query (bad operator, bad value, write error).
    QueryRejected,
    /// An index with the same name or keys but different options already exists.
    IndexConflict,
    /// The store rejected an aggregation stage or operator.
    MalformedPipeline,
    Driver,
    /// The run deadline passed before or while the operation ran.
    Timeout,
    /// The run was cancelled before or while the operation ran.
    Cancelled,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::NotFound => "not-found",
            ErrorKind::QueryRejected => "store-rejected-query",
            ErrorKind::IndexConflict => "index-conflict",
            ErrorKind::MalformedPipeline => "malformed-pipeline",
            ErrorKind::Driver => "generic-driver-error",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

/// What a successful operation produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Payload {
    Records(Vec<Document>),
    Update { matched: u64, modified: u64 },
    Delete { deleted: u64 },
    Index { name: String },
    /// Execution plan as returned by the store; not interpreted.
    Plan(Document),
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Records(records) if records.len() == 1 => write!(f, "1 record"),
            Payload::Records(records) => write!(f, "{} records", records.len()),
            Payload::Update { matched, modified } => {
                write!(f, "matched {matched}, modified {modified}")
            }
            Payload::Delete { deleted } => write!(f, "deleted {deleted}"),
            Payload::Index { name } => write!(f, "index {name}"),
            Payload::Plan(_) => write!(f, "execution plan"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationFailure {
    pub kind: ErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "lowercase")]
pub enum Outcome {
    Ok(Payload),
    Failed(OperationFailure),
}

/// The recorded outcome of one catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationResult {
    pub name: String,
    pub kind: OperationKind,
    pub outcome: Outcome,
    pub elapsed_ms: u64,
}

impl OperationResult {
    pub fn ok(name: impl Into<String>, kind: OperationKind, payload: Payload) -> Self {
        Self {
            name: name.into(),
            kind,
            outcome: Outcome::Ok(payload),
            elapsed_ms: 0,
        }
    }

    pub fn failed(
        name: impl Into<String>,
        kind: OperationKind,
        error: ErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            outcome: Outcome::Failed(OperationFailure {
                kind: error,
                message: message.into(),
            }),
            elapsed_ms: 0,
        }
    }

    pub fn with_elapsed(mut self, elapsed_ms: u64) -> Self {
        self.elapsed_ms = elapsed_ms;
        self
    }

    pub fn is_ok(&self) -> bool {
        matches!(self.outcome, Outcome::Ok(_))
    }

    pub fn payload(&self) -> Option<&Payload> {
        match &self.outcome {
            Outcome::Ok(payload) => Some(payload),
            Outcome::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&OperationFailure> {
        match &self.outcome {
            Outcome::Ok(_) => None,
            Outcome::Failed(failure) => Some(failure),
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.failure().map(|f| f.kind)
    }

    /// One-line description for tabular output.
    pub fn summary(&self) -> String {
        match &self.outcome {
            Outcome::Ok(payload) => payload.to_string(),
            Outcome::Failed(failure) => format!("{}: {}", failure.kind, failure.message),
        }
    }
}
