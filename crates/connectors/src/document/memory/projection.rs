use crate::document::{base::error::StoreError, memory::expr};
use bson::{Bson, Document};
use model::{
    core::value,
    operation::spec::{SortDirection, SortKey},
};
use std::cmp::Ordering;

/// Field selection for one projection document.
enum Mode {
    Include(Vec<String>),
    Exclude(Vec<String>),
}

fn is_computed(spec: &Bson) -> bool {
    matches!(spec, Bson::Document(_)) || matches!(spec, Bson::String(s) if s.starts_with('$'))
}

fn mode(projection: &Document, allow_computed: bool) -> Result<(Mode, bool), StoreError> {
    let mut include = Vec::new();
    let mut exclude = Vec::new();
    let mut keep_id = true;

    for (field, spec) in projection {
        if allow_computed && is_computed(spec) {
            continue;
        }
        let on = value::is_truthy(spec);
        if field == "_id" {
            keep_id = on;
        } else if on {
            include.push(field.clone());
        } else {
            exclude.push(field.clone());
        }
    }

    let computed = allow_computed && projection.values().any(is_computed);
    match (include.is_empty(), exclude.is_empty()) {
        (false, false) => Err(StoreError::QueryRejected(format!(
            "Cannot do exclusion on field {} in inclusion projection",
            exclude[0]
        ))),
        (false, true) => Ok((Mode::Include(include), keep_id)),
        (true, false) => Ok((Mode::Exclude(exclude), keep_id)),
        // Only `_id` and/or computed fields: computed fields imply inclusion.
        (true, true) if computed => Ok((Mode::Include(include), keep_id)),
        (true, true) => Ok((Mode::Exclude(exclude), keep_id)),
    }
}

/// Applies a find-style projection (`{title: 1, _id: 0}`): inclusion or
/// exclusion, never both, with `_id` kept unless explicitly excluded.
pub fn project(doc: &Document, projection: &Document) -> Result<Document, StoreError> {
    if projection.is_empty() {
        return Ok(doc.clone());
    }
    let (mode, keep_id) = mode(projection, false)?;
    Ok(select(doc, &mode, keep_id))
}

fn select(doc: &Document, mode: &Mode, keep_id: bool) -> Document {
    match mode {
        Mode::Include(fields) => {
            let mut out = Document::new();
            if keep_id && let Some(id) = doc.get("_id") {
                out.insert("_id", id.clone());
            }
            for field in fields {
                if let Some(v) = value::lookup(doc, field) {
                    value::assign(&mut out, field, v.clone());
                }
            }
            out
        }
        Mode::Exclude(fields) => {
            let mut out = doc.clone();
            if !keep_id {
                out.remove("_id");
            }
            for field in fields {
                value::remove(&mut out, field);
            }
            out
        }
    }
}

/// `$project` stage: find-style selection plus computed fields
/// (`{decade: {$floor: ...}}`, `{writer: "$author"}`).
pub fn project_stage(doc: &Document, projection: &Document) -> Result<Document, StoreError> {
    let (mode, keep_id) = mode(projection, true).map_err(|e| match e {
        StoreError::QueryRejected(msg) => StoreError::MalformedPipeline(msg),
        other => other,
    })?;

    let has_computed = projection.values().any(is_computed);
    let mut out = match (&mode, has_computed) {
        (Mode::Exclude(fields), true) if !fields.is_empty() => {
            return Err(StoreError::MalformedPipeline(
                "Cannot use expression other than $meta in exclusion projection".to_string(),
            ));
        }
        _ => select(doc, &mode, keep_id),
    };

    for (field, spec) in projection {
        if is_computed(spec) {
            value::assign(&mut out, field, expr::evaluate(spec, doc)?);
        }
    }
    Ok(out)
}

/// Stable multi-key sort. Missing fields sort as null.
pub fn sort(documents: &mut [Document], keys: &[SortKey]) {
    if keys.is_empty() {
        return;
    }
    documents.sort_by(|a, b| {
        for key in keys {
            let left = value::lookup(a, &key.field).unwrap_or(&Bson::Null);
            let right = value::lookup(b, &key.field).unwrap_or(&Bson::Null);
            let ord = match key.direction {
                SortDirection::Ascending => value::compare(left, right),
                SortDirection::Descending => value::compare(right, left),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    fn book() -> Document {
        doc! { "_id": 7, "title": "1984", "author": "George Orwell", "price": 8.5, "genre": "Dystopian" }
    }

    #[test]
    fn inclusion_without_id() {
        let projected = project(
            &book(),
            &doc! { "title": 1, "author": 1, "price": 1, "_id": 0 },
        )
        .unwrap();
        assert_eq!(
            projected,
            doc! { "title": "1984", "author": "George Orwell", "price": 8.5 }
        );
    }

    #[test]
    fn exclusion_keeps_everything_else() {
        let projected = project(&book(), &doc! { "genre": 0 }).unwrap();
        assert_eq!(
            projected,
            doc! { "_id": 7, "title": "1984", "author": "George Orwell", "price": 8.5 }
        );
    }

    #[test]
    fn id_only_exclusion() {
        let projected = project(&book(), &doc! { "_id": 0 }).unwrap();
        assert!(!projected.contains_key("_id"));
        assert_eq!(projected.len(), 4);
    }

    #[test]
    fn mixed_projection_is_rejected() {
        assert!(matches!(
            project(&book(), &doc! { "title": 1, "genre": 0 }),
            Err(StoreError::QueryRejected(_))
        ));
    }

    #[test]
    fn project_stage_computes_fields() {
        let projected = project_stage(
            &book(),
            &doc! { "_id": 0, "title": 1, "writer": "$author", "double": { "$multiply": ["$price", 2] } },
        )
        .unwrap();
        assert_eq!(
            projected,
            doc! { "title": "1984", "writer": "George Orwell", "double": 17.0 }
        );
    }

    #[test]
    fn sorts_by_multiple_keys() {
        let mut docs = vec![
            doc! { "genre": "b", "price": 1 },
            doc! { "genre": "a", "price": 1 },
            doc! { "genre": "a", "price": 3 },
            doc! { "price": 2 },
        ];
        sort(&mut docs, &[SortKey::asc("genre"), SortKey::desc("price")]);
        assert_eq!(
            docs,
            vec![
                doc! { "price": 2 },
                doc! { "genre": "a", "price": 3 },
                doc! { "genre": "a", "price": 1 },
                doc! { "genre": "b", "price": 1 },
            ]
        );
    }
}
