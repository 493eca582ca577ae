use crate::document::base::error::StoreError;
use bson::{Bson, Document};
use model::core::value;

/// Evaluates an aggregation expression against one document.
///
/// `"$field"` resolves a (dotted) field path, `"$$ROOT"` the whole document;
/// single-key documents whose key starts with `$` are operator calls; other
/// documents and arrays are evaluated member by member; anything else is a
/// literal.
pub fn evaluate(expr: &Bson, doc: &Document) -> Result<Bson, StoreError> {
    match expr {
        Bson::String(s) if s == "$$ROOT" => Ok(Bson::Document(doc.clone())),
        Bson::String(s) if s.starts_with('$') => {
            Ok(value::lookup(doc, &s[1..]).cloned().unwrap_or(Bson::Null))
        }
        Bson::Document(d) => match operator(d) {
            Some((op, args)) => call(op, args, doc),
            None => {
                let mut out = Document::new();
                for (key, inner) in d {
                    out.insert(key.clone(), evaluate(inner, doc)?);
                }
                Ok(Bson::Document(out))
            }
        },
        Bson::Array(items) => Ok(Bson::Array(
            items
                .iter()
                .map(|item| evaluate(item, doc))
                .collect::<Result<_, _>>()?,
        )),
        literal => Ok(literal.clone()),
    }
}

fn operator(d: &Document) -> Option<(&str, &Bson)> {
    let mut iter = d.iter();
    match (iter.next(), iter.next()) {
        (Some((key, args)), None) if key.starts_with('$') => Some((key.as_str(), args)),
        _ => None,
    }
}

/// Builds a numeric result, keeping integer width when every input was integral.
pub fn number(n: f64, integral: bool) -> Bson {
    if integral && n.fract() == 0.0 {
        if n >= i32::MIN as f64 && n <= i32::MAX as f64 {
            return Bson::Int32(n as i32);
        }
        if n >= i64::MIN as f64 && n <= i64::MAX as f64 {
            return Bson::Int64(n as i64);
        }
    }
    Bson::Double(n)
}

fn is_integral(v: &Bson) -> bool {
    matches!(v, Bson::Int32(_) | Bson::Int64(_))
}

fn arguments(args: &Bson, doc: &Document) -> Result<Vec<Bson>, StoreError> {
    match args {
        Bson::Array(items) => items.iter().map(|a| evaluate(a, doc)).collect(),
        single => Ok(vec![evaluate(single, doc)?]),
    }
}

fn numeric(op: &str, values: &[Bson]) -> Result<Option<Vec<f64>>, StoreError> {
    let mut out = Vec::with_capacity(values.len());
    for v in values {
        match v {
            Bson::Null | Bson::Undefined => return Ok(None),
            other => match value::as_f64(other) {
                Some(n) => out.push(n),
                None => {
                    return Err(StoreError::MalformedPipeline(format!(
                        "{op} only supports numeric types, not {:?}",
                        other.element_type()
                    )));
                }
            },
        }
    }
    Ok(Some(out))
}

fn exact_arity(op: &str, values: &[Bson], n: usize) -> Result<(), StoreError> {
    if values.len() != n {
        return Err(StoreError::MalformedPipeline(format!(
            "Expression {op} takes exactly {n} arguments. {} were passed in.",
            values.len()
        )));
    }
    Ok(())
}

fn call(op: &str, args: &Bson, doc: &Document) -> Result<Bson, StoreError> {
    if op == "$literal" {
        return Ok(args.clone());
    }

    let values = arguments(args, doc)?;
    let integral = values.iter().all(is_integral);

    match op {
        "$add" | "$multiply" => {
            let Some(nums) = numeric(op, &values)? else {
                return Ok(Bson::Null);
            };
            let result: f64 = if op == "$add" {
                nums.iter().sum()
            } else {
                nums.iter().product()
            };
            Ok(number(result, integral))
        }
        "$subtract" => {
            exact_arity(op, &values, 2)?;
            let Some(nums) = numeric(op, &values)? else {
                return Ok(Bson::Null);
            };
            Ok(number(nums[0] - nums[1], integral))
        }
        "$divide" => {
            exact_arity(op, &values, 2)?;
            let Some(nums) = numeric(op, &values)? else {
                return Ok(Bson::Null);
            };
            if nums[1] == 0.0 {
                return Err(StoreError::MalformedPipeline(
                    "can't $divide by zero".to_string(),
                ));
            }
            Ok(Bson::Double(nums[0] / nums[1]))
        }
        "$floor" | "$ceil" => {
            exact_arity(op, &values, 1)?;
            let Some(nums) = numeric(op, &values)? else {
                return Ok(Bson::Null);
            };
            if integral {
                return Ok(values[0].clone());
            }
            let n = if op == "$floor" {
                nums[0].floor()
            } else {
                nums[0].ceil()
            };
            Ok(Bson::Double(n))
        }
        other => Err(StoreError::MalformedPipeline(format!(
            "Unrecognized expression '{other}'"
        ))),
    }
}
