use crate::document::base::error::StoreError;
use bson::{Bson, Document};
use model::core::value;

/// Applies an operator-form update (`$set`, `$unset`, `$inc`) to `doc` in place.
/// Returns whether the document changed.
pub fn apply(doc: &mut Document, update: &Document) -> Result<bool, StoreError> {
    if update.is_empty() {
        return Err(StoreError::QueryRejected(
            "Update document requires atomic operators".to_string(),
        ));
    }

    let before = doc.clone();
    for (op, fields) in update {
        let fields = match fields {
            Bson::Document(fields) => fields,
            _ => {
                return Err(StoreError::QueryRejected(format!(
                    "Modifiers operate on fields but we found type {:?} instead for {op}",
                    fields.element_type()
                )));
            }
        };

        for (path, argument) in fields {
            guard_id(doc, path, op, argument)?;
            match op.as_str() {
                "$set" => value::assign(doc, path, argument.clone()),
                "$unset" => {
                    value::remove(doc, path);
                }
                "$inc" => increment(doc, path, argument)?,
                other if other.starts_with('$') => {
                    return Err(StoreError::QueryRejected(format!(
                        "Unknown modifier: {other}"
                    )));
                }
                _ => {
                    return Err(StoreError::QueryRejected(
                        "Update document requires atomic operators".to_string(),
                    ));
                }
            }
        }
    }

    Ok(*doc != before)
}

fn guard_id(doc: &Document, path: &str, op: &str, argument: &Bson) -> Result<(), StoreError> {
    let unchanged = op == "$set" && doc.get("_id").is_some_and(|id| value::equal(id, argument));
    if path == "_id" && !unchanged {
        return Err(StoreError::QueryRejected(
            "Performing an update on the path '_id' would modify the immutable field '_id'"
                .to_string(),
        ));
    }
    Ok(())
}

fn increment(doc: &mut Document, path: &str, by: &Bson) -> Result<(), StoreError> {
    let step = value::as_f64(by).ok_or_else(|| {
        StoreError::QueryRejected(format!("Cannot increment with non-numeric argument: {by}"))
    })?;

    let next = match value::lookup(doc, path) {
        None => by.clone(),
        Some(Bson::Int32(current)) if matches!(by, Bson::Int32(_)) => {
            Bson::Int32(current.wrapping_add(step as i32))
        }
        Some(current @ (Bson::Int32(_) | Bson::Int64(_))) if !matches!(by, Bson::Double(_)) => {
            Bson::Int64(value::as_i64(current).unwrap_or_default() + step as i64)
        }
        Some(current) => match value::as_f64(current) {
            Some(n) => Bson::Double(n + step),
            None => {
                return Err(StoreError::QueryRejected(format!(
                    "Cannot apply $inc to a value of non-numeric type at '{path}'"
                )));
            }
        },
    };
    value::assign(doc, path, next);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn set_reports_modification() {
        let mut book = doc! { "_id": 1, "title": "The Hobbit", "price": 14.99 };
        assert!(apply(&mut book, &doc! { "$set": { "price": 17.99 } }).unwrap());
        assert_eq!(book.get_f64("price").unwrap(), 17.99);

        // Setting the same value again matches but modifies nothing.
        assert!(!apply(&mut book, &doc! { "$set": { "price": 17.99 } }).unwrap());
    }

    #[test]
    fn inc_and_unset() {
        let mut book = doc! { "_id": 1, "stock": 3, "draft": true };
        apply(&mut book, &doc! { "$inc": { "stock": -1 }, "$unset": { "draft": "" } }).unwrap();
        assert_eq!(book, doc! { "_id": 1, "stock": 2 });
    }

    #[test]
    fn rejects_id_changes_and_unknown_modifiers() {
        let mut book = doc! { "_id": 1 };
        assert!(matches!(
            apply(&mut book, &doc! { "$set": { "_id": 2 } }),
            Err(StoreError::QueryRejected(_))
        ));
        assert!(matches!(
            apply(&mut book, &doc! { "$rename": { "a": "b" } }),
            Err(StoreError::QueryRejected(_))
        ));
        assert!(matches!(
            apply(&mut book, &doc! { "price": 1 }),
            Err(StoreError::QueryRejected(_))
        ));
    }
}
