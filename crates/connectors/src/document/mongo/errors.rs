use crate::document::base::error::StoreError;
use model::operation::spec::OperationKind;
use mongodb::error::{Error, ErrorKind, WriteFailure};

/// Server error codes that mean "this index clashes with an existing one".
const INDEX_OPTIONS_CONFLICT: i32 = 85;
const INDEX_KEY_SPECS_CONFLICT: i32 = 86;
const DUPLICATE_KEY: i32 = 11000;

/// Maps a driver error raised by `operation` onto the store error taxonomy.
///
/// Command errors during an aggregation are reported as malformed pipelines
/// with the server's message untouched; elsewhere they are query rejections.
pub fn classify(err: Error, operation: OperationKind) -> StoreError {
    match err.kind.as_ref() {
        ErrorKind::Command(command) => match (command.code, operation) {
            (INDEX_OPTIONS_CONFLICT | INDEX_KEY_SPECS_CONFLICT, _)
            | (DUPLICATE_KEY, OperationKind::CreateIndex) => {
                StoreError::IndexConflict(command.message.clone())
            }
            (_, OperationKind::Aggregate) => StoreError::MalformedPipeline(command.message.clone()),
            _ => StoreError::QueryRejected(format!(
                "{} ({}): {}",
                command.code_name, command.code, command.message
            )),
        },
        ErrorKind::Write(WriteFailure::WriteError(write)) => {
            StoreError::QueryRejected(write.message.clone())
        }
        ErrorKind::Write(_) => StoreError::QueryRejected(err.to_string()),
        ErrorKind::InvalidArgument { message, .. } => StoreError::QueryRejected(message.clone()),
        _ => StoreError::Driver(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use mongodb::error::{CommandError, WriteError};

    fn command_error(code: i32, code_name: &str, message: &str) -> Error {
        let command: CommandError = bson::from_document(doc! {
            "code": code,
            "codeName": code_name,
            "errmsg": message,
        })
        .unwrap();
        Error::from(ErrorKind::Command(command))
    }

    #[test]
    fn index_clashes_are_conflicts() {
        let options = command_error(
            INDEX_OPTIONS_CONFLICT,
            "IndexOptionsConflict",
            "Index already exists with a different name: title_1",
        );
        assert!(matches!(
            classify(options, OperationKind::CreateIndex),
            StoreError::IndexConflict(msg) if msg.contains("different name")
        ));

        let keys = command_error(INDEX_KEY_SPECS_CONFLICT, "IndexKeySpecsConflict", "key specs differ");
        assert!(matches!(
            classify(keys, OperationKind::CreateIndex),
            StoreError::IndexConflict(_)
        ));

        let duplicate = command_error(DUPLICATE_KEY, "DuplicateKey", "E11000 duplicate key error");
        assert!(matches!(
            classify(duplicate, OperationKind::CreateIndex),
            StoreError::IndexConflict(_)
        ));
    }

    #[test]
    fn aggregate_command_errors_keep_the_raw_message() {
        let err = command_error(40324, "Location40324", "Unrecognized pipeline stage name: '$bogus'");
        match classify(err, OperationKind::Aggregate) {
            StoreError::MalformedPipeline(message) => {
                assert_eq!(message, "Unrecognized pipeline stage name: '$bogus'")
            }
            other => panic!("expected a malformed pipeline, got {other:?}"),
        }
    }

    #[test]
    fn other_command_and_write_errors_are_rejections() {
        let err = command_error(2, "BadValue", "unknown operator: $near");
        match classify(err, OperationKind::Find) {
            StoreError::QueryRejected(message) => {
                assert_eq!(message, "BadValue (2): unknown operator: $near")
            }
            other => panic!("expected a rejection, got {other:?}"),
        }

        // A duplicate key outside index creation is a plain rejection.
        let duplicate = command_error(DUPLICATE_KEY, "DuplicateKey", "E11000 duplicate key error");
        assert!(matches!(
            classify(duplicate, OperationKind::UpdateOne),
            StoreError::QueryRejected(_)
        ));

        let write: WriteError = bson::from_document(doc! {
            "code": 66,
            "codeName": "ImmutableField",
            "errmsg": "Performing an update on the path '_id' would modify the immutable field '_id'",
        })
        .unwrap();
        let err = Error::from(ErrorKind::Write(WriteFailure::WriteError(write)));
        assert!(matches!(
            classify(err, OperationKind::UpdateOne),
            StoreError::QueryRejected(msg) if msg.contains("immutable field")
        ));
    }

    #[test]
    fn transport_failures_are_driver_errors() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "connection reset by peer");
        let err = Error::from(io);
        assert!(matches!(
            classify(err, OperationKind::Find),
            StoreError::Driver(msg) if msg.contains("connection reset by peer")
        ));
    }
}
