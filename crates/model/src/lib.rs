pub mod core;
pub mod error;
pub mod execution;
pub mod operation;

pub use bson::{self, Bson, Document, doc};
