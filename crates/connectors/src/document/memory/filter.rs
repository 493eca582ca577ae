use crate::document::base::error::StoreError;
use bson::{Bson, Document};
use model::core::value::{self, comparable, compare, equal};
use std::cmp::Ordering;

/// Returns whether `doc` satisfies `filter`.
///
/// Supports implicit equality, the comparison operators `$eq $ne $gt $gte $lt
/// $lte $in $nin $exists`, and the logical operators `$and $or $nor`. Unknown
/// operators are rejected the way a server would reject them.
pub fn matches(doc: &Document, filter: &Document) -> Result<bool, StoreError> {
    for (key, condition) in filter {
        let ok = match key.as_str() {
            "$and" => {
                let mut all = true;
                for clause in clauses(condition, key)? {
                    if !matches(doc, clause)? {
                        all = false;
                        break;
                    }
                }
                all
            }
            "$or" => {
                let mut any = false;
                for clause in clauses(condition, key)? {
                    if matches(doc, clause)? {
                        any = true;
                        break;
                    }
                }
                any
            }
            "$nor" => {
                let mut none = true;
                for clause in clauses(condition, key)? {
                    if matches(doc, clause)? {
                        none = false;
                        break;
                    }
                }
                none
            }
            op if op.starts_with('$') => {
                return Err(StoreError::QueryRejected(format!(
                    "unknown top level operator: {op}"
                )));
            }
            path => field_matches(value::lookup(doc, path), condition)?,
        };

        if !ok {
            return Ok(false);
        }
    }
    Ok(true)
}

fn clauses<'a>(condition: &'a Bson, op: &str) -> Result<Vec<&'a Document>, StoreError> {
    let items = match condition {
        Bson::Array(items) if !items.is_empty() => items,
        _ => {
            return Err(StoreError::QueryRejected(format!(
                "{op} must be a nonempty array"
            )));
        }
    };

    items
        .iter()
        .map(|item| match item {
            Bson::Document(d) => Ok(d),
            _ => Err(StoreError::QueryRejected(format!(
                "{op} argument's entries must be objects"
            ))),
        })
        .collect()
}

fn is_operator_document(condition: &Bson) -> Option<&Document> {
    match condition {
        Bson::Document(d) if d.keys().next().is_some_and(|k| k.starts_with('$')) => Some(d),
        _ => None,
    }
}

fn field_matches(value: Option<&Bson>, condition: &Bson) -> Result<bool, StoreError> {
    match is_operator_document(condition) {
        Some(operators) => {
            for (op, argument) in operators {
                if !operator_matches(value, op, argument)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        None => Ok(equals(value, condition)),
    }
}

/// Equality with the usual document-store twists: a missing field equals
/// null, and an array field matches when any element matches.
fn equals(value: Option<&Bson>, target: &Bson) -> bool {
    match value {
        None => matches!(target, Bson::Null),
        Some(Bson::Array(items)) if !matches!(target, Bson::Array(_)) => {
            items.iter().any(|item| equal(item, target))
        }
        Some(v) => equal(v, target),
    }
}

fn range(value: Option<&Bson>, target: &Bson, accept: fn(Ordering) -> bool) -> bool {
    let check = |v: &Bson| comparable(v, target) && accept(compare(v, target));
    match value {
        None => false,
        Some(Bson::Array(items)) => items.iter().any(check),
        Some(v) => check(v),
    }
}

fn operator_matches(value: Option<&Bson>, op: &str, argument: &Bson) -> Result<bool, StoreError> {
    let matched = match op {
        "$eq" => equals(value, argument),
        "$ne" => !equals(value, argument),
        "$gt" => range(value, argument, |o| o == Ordering::Greater),
        "$gte" => range(value, argument, |o| o != Ordering::Less),
        "$lt" => range(value, argument, |o| o == Ordering::Less),
        "$lte" => range(value, argument, |o| o != Ordering::Greater),
        "$in" => in_list(value, argument, op)?,
        "$nin" => !in_list(value, argument, op)?,
        "$exists" => value.is_some() == value::is_truthy(argument),
        "$not" => match argument {
            Bson::Document(_) => !field_matches(value, argument)?,
            _ => {
                return Err(StoreError::QueryRejected(
                    "$not needs a document argument".to_string(),
                ));
            }
        },
        other => {
            return Err(StoreError::QueryRejected(format!(
                "unknown operator: {other}"
            )));
        }
    };
    Ok(matched)
}

fn in_list(value: Option<&Bson>, argument: &Bson, op: &str) -> Result<bool, StoreError> {
    match argument {
        Bson::Array(candidates) => Ok(candidates.iter().any(|c| equals(value, c))),
        _ => Err(StoreError::QueryRejected(format!("{op} needs an array"))),
    }
}
