use crate::document::{
    base::error::StoreError,
    memory::{
        expr::{self, number},
        filter, projection,
    },
};
use bson::{Bson, Document};
use model::{core::value, operation::spec::parse_keys};
use std::cmp::Ordering;

/// Runs aggregation stages, in order, over `documents`.
///
/// Supported stages: `$match $group $sort $limit $skip $project $addFields
/// $set $count`. Every error is a [`StoreError::MalformedPipeline`].
pub fn run(
    mut documents: Vec<Document>,
    pipeline: &[Document],
) -> Result<Vec<Document>, StoreError> {
    for stage in pipeline {
        let (name, spec) = stage_parts(stage)?;
        documents = match name {
            "$match" => match_stage(documents, as_document(name, spec)?)?,
            "$group" => group(&documents, as_document(name, spec)?)?,
            "$sort" => {
                let keys = parse_keys(as_document(name, spec)?).map_err(|_| {
                    StoreError::MalformedPipeline(
                        "$sort key ordering must be 1 (for ascending) or -1 (for descending)"
                            .to_string(),
                    )
                })?;
                if keys.is_empty() {
                    return Err(StoreError::MalformedPipeline(
                        "$sort stage must have at least one sort key".to_string(),
                    ));
                }
                projection::sort(&mut documents, &keys);
                documents
            }
            "$limit" => {
                let n = positive(name, spec)?;
                documents.truncate(n);
                documents
            }
            "$skip" => {
                let n = non_negative(name, spec)?;
                documents.into_iter().skip(n).collect()
            }
            "$project" => {
                let spec = as_document(name, spec)?;
                documents
                    .iter()
                    .map(|d| projection::project_stage(d, spec))
                    .collect::<Result<_, _>>()?
            }
            "$addFields" | "$set" => {
                let spec = as_document(name, spec)?;
                documents
                    .into_iter()
                    .map(|mut d| {
                        for (field, e) in spec {
                            let computed = expr::evaluate(e, &d)?;
                            value::assign(&mut d, field, computed);
                        }
                        Ok(d)
                    })
                    .collect::<Result<_, StoreError>>()?
            }
            "$count" => count(name, spec, documents.len())?,
            other => {
                return Err(StoreError::MalformedPipeline(format!(
                    "Unrecognized pipeline stage name: '{other}'"
                )));
            }
        };
    }
    Ok(documents)
}

fn stage_parts(stage: &Document) -> Result<(&str, &Bson), StoreError> {
    let mut iter = stage.iter();
    match (iter.next(), iter.next()) {
        (Some((name, spec)), None) => Ok((name.as_str(), spec)),
        _ => Err(StoreError::MalformedPipeline(
            "A pipeline stage specification object must contain exactly one field.".to_string(),
        )),
    }
}

fn as_document<'a>(stage: &str, spec: &'a Bson) -> Result<&'a Document, StoreError> {
    match spec {
        Bson::Document(d) => Ok(d),
        _ => Err(StoreError::MalformedPipeline(format!(
            "the {stage} specification must be an object"
        ))),
    }
}

fn positive(stage: &str, spec: &Bson) -> Result<usize, StoreError> {
    match value::as_i64(spec) {
        Some(n) if n > 0 => Ok(n as usize),
        _ => Err(StoreError::MalformedPipeline(format!(
            "the {stage} must be positive"
        ))),
    }
}

fn non_negative(stage: &str, spec: &Bson) -> Result<usize, StoreError> {
    match value::as_i64(spec) {
        Some(n) if n >= 0 => Ok(n as usize),
        _ => Err(StoreError::MalformedPipeline(format!(
            "invalid argument to {stage} stage: Expected a non-negative number"
        ))),
    }
}

fn match_stage(
    documents: Vec<Document>,
    predicate: &Document,
) -> Result<Vec<Document>, StoreError> {
    let mut kept = Vec::with_capacity(documents.len());
    for d in documents {
        let keep = filter::matches(&d, predicate).map_err(|e| match e {
            StoreError::QueryRejected(msg) => StoreError::MalformedPipeline(msg),
            other => other,
        })?;
        if keep {
            kept.push(d);
        }
    }
    Ok(kept)
}

fn count(stage: &str, spec: &Bson, n: usize) -> Result<Vec<Document>, StoreError> {
    let field = match spec {
        Bson::String(field) if !field.is_empty() && !field.starts_with('$') => field,
        _ => {
            return Err(StoreError::MalformedPipeline(format!(
                "the {stage} field must be a non-empty string not starting with '$'"
            )));
        }
    };
    if n == 0 {
        return Ok(Vec::new());
    }
    let mut out = Document::new();
    out.insert(field.clone(), number(n as f64, true));
    Ok(vec![out])
}

enum Accumulator {
    Sum { total: f64, integral: bool },
    Avg { total: f64, count: u64 },
    Min(Option<Bson>),
    Max(Option<Bson>),
    First(Option<Bson>),
    Last(Bson),
    Push(Vec<Bson>),
}

impl Accumulator {
    fn new(op: &str) -> Result<Self, StoreError> {
        Ok(match op {
            "$sum" | "$count" => Accumulator::Sum {
                total: 0.0,
                integral: true,
            },
            "$avg" => Accumulator::Avg {
                total: 0.0,
                count: 0,
            },
            "$min" => Accumulator::Min(None),
            "$max" => Accumulator::Max(None),
            "$first" => Accumulator::First(None),
            "$last" => Accumulator::Last(Bson::Null),
            "$push" => Accumulator::Push(Vec::new()),
            other => {
                return Err(StoreError::MalformedPipeline(format!(
                    "unknown group operator '{other}'"
                )));
            }
        })
    }

    fn fold(&mut self, v: Bson) {
        match self {
            Accumulator::Sum { total, integral } => {
                if let Some(n) = value::as_f64(&v) {
                    *total += n;
                    *integral &= matches!(v, Bson::Int32(_) | Bson::Int64(_));
                }
            }
            Accumulator::Avg { total, count } => {
                if let Some(n) = value::as_f64(&v) {
                    *total += n;
                    *count += 1;
                }
            }
            Accumulator::Min(current) => Self::keep_if(current, v, Ordering::Less),
            Accumulator::Max(current) => Self::keep_if(current, v, Ordering::Greater),
            Accumulator::First(current) => {
                if current.is_none() {
                    *current = Some(v);
                }
            }
            Accumulator::Last(current) => *current = v,
            Accumulator::Push(items) => items.push(v),
        }
    }

    fn keep_if(current: &mut Option<Bson>, v: Bson, wanted: Ordering) {
        if matches!(v, Bson::Null | Bson::Undefined) {
            return;
        }
        let replace = match current {
            None => true,
            Some(c) => value::compare(&v, c) == wanted,
        };
        if replace {
            *current = Some(v);
        }
    }

    fn finish(self) -> Bson {
        match self {
            Accumulator::Sum { total, integral } => number(total, integral),
            Accumulator::Avg { count: 0, .. } => Bson::Null,
            Accumulator::Avg { total, count } => Bson::Double(total / count as f64),
            Accumulator::Min(v) | Accumulator::Max(v) | Accumulator::First(v) => {
                v.unwrap_or(Bson::Null)
            }
            Accumulator::Last(v) => v,
            Accumulator::Push(items) => Bson::Array(items),
        }
    }
}

/// One accumulator field of a `$group` stage, e.g. `avgPrice: {$avg: "$price"}`.
struct AccumulatorSpec<'a> {
    field: &'a str,
    op: &'a str,
    argument: Bson,
}

fn accumulator_specs(spec: &Document) -> Result<Vec<AccumulatorSpec<'_>>, StoreError> {
    let mut specs = Vec::new();
    for (field, definition) in spec {
        if field == "_id" {
            continue;
        }
        let definition = match definition {
            Bson::Document(d) if d.len() == 1 => d,
            _ => {
                return Err(StoreError::MalformedPipeline(format!(
                    "The field '{field}' must be an accumulator object"
                )));
            }
        };
        let (op, argument) = definition.iter().next().ok_or_else(|| {
            StoreError::MalformedPipeline(format!("empty accumulator for '{field}'"))
        })?;
        Accumulator::new(op)?;

        // `{$count: {}}` counts documents, like `{$sum: 1}`.
        let argument = if op == "$count" {
            Bson::Int32(1)
        } else {
            argument.clone()
        };
        specs.push(AccumulatorSpec {
            field,
            op,
            argument,
        });
    }
    Ok(specs)
}

fn group(documents: &[Document], spec: &Document) -> Result<Vec<Document>, StoreError> {
    let key_expr = spec.get("_id").ok_or_else(|| {
        StoreError::MalformedPipeline("a group specification must include an _id".to_string())
    })?;
    let specs = accumulator_specs(spec)?;

    // Groups in first-seen order; keys compared with store equality.
    let mut groups: Vec<(Bson, Vec<Accumulator>)> = Vec::new();
    for d in documents {
        let key = expr::evaluate(key_expr, d)?;
        let position = match groups.iter().position(|(k, _)| value::equal(k, &key)) {
            Some(position) => position,
            None => {
                let accumulators = specs
                    .iter()
                    .map(|s| Accumulator::new(s.op))
                    .collect::<Result<Vec<_>, _>>()?;
                groups.push((key, accumulators));
                groups.len() - 1
            }
        };

        for (accumulator, s) in groups[position].1.iter_mut().zip(specs.iter()) {
            accumulator.fold(expr::evaluate(&s.argument, d)?);
        }
    }

    Ok(groups
        .into_iter()
        .map(|(key, accumulators)| {
            let mut out = Document::new();
            out.insert("_id", key);
            for (accumulator, s) in accumulators.into_iter().zip(specs.iter()) {
                out.insert(s.field, accumulator.finish());
            }
            out
        })
        .collect())
}
