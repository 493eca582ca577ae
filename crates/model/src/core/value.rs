use bson::{Bson, Document};
use std::cmp::Ordering;

/// Rank of a BSON type in the cross-type comparison order used by document stores
/// (null < numbers < strings < objects < arrays < binary < object ids < booleans < dates < ...).
fn type_rank(value: &Bson) -> u8 {
    match value {
        Bson::MinKey => 0,
        Bson::Null | Bson::Undefined => 1,
        Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) | Bson::Decimal128(_) => 2,
        Bson::String(_) | Bson::Symbol(_) => 3,
        Bson::Document(_) => 4,
        Bson::Array(_) => 5,
        Bson::Binary(_) => 6,
        Bson::ObjectId(_) => 7,
        Bson::Boolean(_) => 8,
        Bson::DateTime(_) => 9,
        Bson::Timestamp(_) => 10,
        Bson::RegularExpression(_) => 11,
        Bson::JavaScriptCode(_) | Bson::JavaScriptCodeWithScope(_) | Bson::DbPointer(_) => 12,
        Bson::MaxKey => 13,
    }
}

/// Numeric view of a BSON value. Only numeric types convert.
pub fn as_f64(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(v) => Some(*v as f64),
        Bson::Int64(v) => Some(*v as f64),
        Bson::Double(v) => Some(*v),
        _ => None,
    }
}

pub fn as_i64(value: &Bson) -> Option<i64> {
    match value {
        Bson::Int32(v) => Some(*v as i64),
        Bson::Int64(v) => Some(*v),
        Bson::Double(v) if v.fract() == 0.0 => Some(*v as i64),
        _ => None,
    }
}

/// Truthiness the way query projections and `$exists` interpret it.
pub fn is_truthy(value: &Bson) -> bool {
    match value {
        Bson::Boolean(b) => *b,
        Bson::Null | Bson::Undefined => false,
        other => as_f64(other).is_none_or(|n| n != 0.0),
    }
}

/// Total ordering over BSON values. Numbers compare by value across int/double
/// widths; values of different types compare by type rank.
pub fn compare(a: &Bson, b: &Bson) -> Ordering {
    let (rank_a, rank_b) = (type_rank(a), type_rank(b));
    if rank_a != rank_b {
        return rank_a.cmp(&rank_b);
    }

    match (a, b) {
        (Bson::String(x), Bson::String(y)) => x.cmp(y),
        (Bson::Symbol(x), Bson::Symbol(y)) => x.cmp(y),
        (Bson::Boolean(x), Bson::Boolean(y)) => x.cmp(y),
        (Bson::ObjectId(x), Bson::ObjectId(y)) => x.bytes().cmp(&y.bytes()),
        (Bson::DateTime(x), Bson::DateTime(y)) => x.cmp(y),
        (Bson::Timestamp(x), Bson::Timestamp(y)) => {
            (x.time, x.increment).cmp(&(y.time, y.increment))
        }
        (Bson::Binary(x), Bson::Binary(y)) => x.bytes.cmp(&y.bytes),
        (Bson::Array(x), Bson::Array(y)) => compare_sequences(x, y),
        (Bson::Document(x), Bson::Document(y)) => compare_documents(x, y),
        _ => match (as_f64(a), as_f64(b)) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        },
    }
}

fn compare_sequences(a: &[Bson], b: &[Bson]) -> Ordering {
    for (x, y) in a.iter().zip(b.iter()) {
        let ord = compare(x, y);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.len().cmp(&b.len())
}

fn compare_documents(a: &Document, b: &Document) -> Ordering {
    for ((ka, va), (kb, vb)) in a.iter().zip(b.iter()) {
        let ord = ka.cmp(kb).then_with(|| compare(va, vb));
        if ord != Ordering::Equal {
            return ord;
        }
    }
    a.len().cmp(&b.len())
}

/// Whether two values fall in the same type bracket. Range operators
/// (`$gt`, `$lt`, ...) only match within a bracket.
pub fn comparable(a: &Bson, b: &Bson) -> bool {
    type_rank(a) == type_rank(b)
}

pub fn equal(a: &Bson, b: &Bson) -> bool {
    compare(a, b) == Ordering::Equal
}

/// Resolves a dotted path (`"address.city"`) inside a document.
pub fn lookup<'a>(doc: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut parts = path.split('.');
    let mut current = doc.get(parts.next()?)?;
    for part in parts {
        current = match current {
            Bson::Document(inner) => inner.get(part)?,
            Bson::Array(items) => items.get(part.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Writes `value` at a dotted path, creating intermediate documents as needed.
pub fn assign(doc: &mut Document, path: &str, value: Bson) {
    match path.split_once('.') {
        None => {
            doc.insert(path, value);
        }
        Some((head, rest)) => {
            if !matches!(doc.get(head), Some(Bson::Document(_))) {
                doc.insert(head, Document::new());
            }
            if let Some(Bson::Document(inner)) = doc.get_mut(head) {
                assign(inner, rest, value);
            }
        }
    }
}

/// Removes the value at a dotted path. Returns whether anything was removed.
pub fn remove(doc: &mut Document, path: &str) -> bool {
    match path.split_once('.') {
        None => doc.remove(path).is_some(),
        Some((head, rest)) => match doc.get_mut(head) {
            Some(Bson::Document(inner)) => remove(inner, rest),
            _ => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn numbers_compare_across_widths() {
        assert_eq!(compare(&Bson::Int32(3), &Bson::Double(3.0)), Ordering::Equal);
        assert_eq!(compare(&Bson::Int64(2), &Bson::Double(2.5)), Ordering::Less);
    }

    #[test]
    fn null_sorts_before_numbers_and_strings() {
        assert_eq!(compare(&Bson::Null, &Bson::Int32(0)), Ordering::Less);
        assert_eq!(
            compare(&Bson::Int32(100), &Bson::String("a".into())),
            Ordering::Less
        );
    }

    #[test]
    fn lookup_and_assign_dotted_paths() {
        let mut doc = doc! { "title": "1984", "meta": { "pages": 328 } };
        assert_eq!(lookup(&doc, "meta.pages"), Some(&Bson::Int32(328)));
        assert_eq!(lookup(&doc, "meta.missing"), None);

        assign(&mut doc, "meta.isbn.10", Bson::String("0451524934".into()));
        assert_eq!(
            lookup(&doc, "meta.isbn.10"),
            Some(&Bson::String("0451524934".into()))
        );

        assert!(remove(&mut doc, "meta.pages"));
        assert!(!remove(&mut doc, "meta.pages"));
    }

    #[test]
    fn truthiness_follows_projection_rules() {
        assert!(is_truthy(&Bson::Int32(1)));
        assert!(!is_truthy(&Bson::Int32(0)));
        assert!(!is_truthy(&Bson::Boolean(false)));
        assert!(is_truthy(&Bson::String("x".into())));
    }
}
