use connectors::{StoreError, StoreHandle};
use model::{
    execution::result::{ErrorKind, OperationFailure, Payload},
    operation::spec::{Operation, update_document},
};

/// A failed operation, ready to be recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure(pub OperationFailure);

impl Failure {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Failure(OperationFailure {
            kind,
            message: message.into(),
        })
    }
}

impl From<StoreError> for Failure {
    fn from(err: StoreError) -> Self {
        Failure(OperationFailure {
            kind: err.error_kind(),
            message: err.to_string(),
        })
    }
}

/// Issues one operation against the store and shapes its payload.
pub async fn dispatch(
    store: &dyn StoreHandle,
    operation: &Operation,
) -> Result<Payload, Failure> {
    match operation {
        Operation::Find { filter, options } => {
            let records = store.find(filter, options).await?;
            Ok(Payload::Records(records))
        }
        Operation::UpdateOne {
            filter,
            update,
            required,
        } => {
            let outcome = store.update_one(filter, &update_document(update)).await?;
            if *required && outcome.matched == 0 {
                return Err(Failure::new(
                    ErrorKind::NotFound,
                    format!("No record matched filter {filter}"),
                ));
            }
            Ok(Payload::Update {
                matched: outcome.matched,
                modified: outcome.modified,
            })
        }
        Operation::DeleteOne { filter } => {
            let outcome = store.delete_one(filter).await?;
            Ok(Payload::Delete {
                deleted: outcome.deleted,
            })
        }
        Operation::Aggregate { pipeline } => {
            let records = store.aggregate(pipeline).await?;
            Ok(Payload::Records(records))
        }
        Operation::CreateIndex(request) => {
            let name = store.create_index(request).await?;
            Ok(Payload::Index { name })
        }
        Operation::Explain {
            filter,
            options,
            verbosity,
        } => {
            let plan = store.explain(filter, options, *verbosity).await?;
            Ok(Payload::Plan(plan))
        }
    }
}
