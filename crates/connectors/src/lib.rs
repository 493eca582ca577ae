pub mod adapter;
pub mod document;
pub mod error;

pub use document::base::{
    error::{ConnectorError, StoreError},
    store::{DeleteOutcome, StoreHandle, StoreKind, UpdateOutcome},
};
