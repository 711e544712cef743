//! Named functions available to [`crate::recipe::Recipe`] steps.

use crate::constraint::Predicate;
use crate::error::BoxError;
use crate::types::Value;

/// Single-value mutation function.
pub type MutationFn = fn(&Value) -> Result<Value, BoxError>;

/// Multi-input derivation function.
pub type DerivationFn = fn(&[Value]) -> Result<Value, BoxError>;

/// Look up a mutation: `upper`, `lower`, `trim`, `to_int`, `to_float`.
pub fn mutation(name: &str) -> Option<MutationFn> {
    let f: MutationFn = match name {
        "upper" => |v| Ok(map_text(v, str::to_uppercase)),
        "lower" => |v| Ok(map_text(v, str::to_lowercase)),
        "trim" => |v| Ok(map_text(v, |s| s.trim().to_owned())),
        "to_int" => to_int,
        "to_float" => to_float,
        _ => return None,
    };
    Some(f)
}

/// Look up a derivation: `concat`, `sum`.
pub fn derivation(name: &str) -> Option<DerivationFn> {
    let f: DerivationFn = match name {
        "concat" => |vals| Ok(Value::Utf8(vals.iter().map(Value::to_string).collect())),
        "sum" => sum,
        _ => return None,
    };
    Some(f)
}

/// Look up a predicate: `not_empty`, `is_int`, `is_float`, `is_truthy`.
pub fn predicate(name: &str) -> Option<Predicate> {
    let p = match name {
        "not_empty" => Predicate::named(name, |v| !v.is_null() && !v.to_string().is_empty()),
        "is_int" => Predicate::named(name, |v| to_int(v).is_ok()),
        "is_float" => Predicate::named(name, |v| to_float(v).is_ok()),
        "is_truthy" => Predicate::named(name, Value::is_truthy),
        _ => return None,
    };
    Some(p)
}

fn map_text(v: &Value, f: impl Fn(&str) -> String) -> Value {
    match v {
        Value::Utf8(s) => Value::Utf8(f(s)),
        other => other.clone(),
    }
}

fn to_int(v: &Value) -> Result<Value, BoxError> {
    match v {
        Value::Int64(_) | Value::Null => Ok(v.clone()),
        Value::Utf8(s) => Ok(Value::Int64(s.trim().parse()?)),
        other => Err(format!("cannot convert {other:?} to an integer").into()),
    }
}

fn to_float(v: &Value) -> Result<Value, BoxError> {
    match v {
        Value::Float64(_) | Value::Null => Ok(v.clone()),
        Value::Int64(i) => Ok(Value::Float64(*i as f64)),
        Value::Utf8(s) => Ok(Value::Float64(s.trim().parse()?)),
        other => Err(format!("cannot convert {other:?} to a float").into()),
    }
}

/// Integer sum if every input is an integer, float sum otherwise. Text inputs are parsed.
fn sum(vals: &[Value]) -> Result<Value, BoxError> {
    let mut ints = Some(0_i64);
    let mut floats = 0.0_f64;
    for v in vals {
        let v = match v {
            Value::Utf8(s) => match s.trim().parse::<i64>() {
                Ok(i) => Value::Int64(i),
                Err(_) => to_float(v)?,
            },
            other => other.clone(),
        };
        match v {
            Value::Int64(i) => {
                ints = ints.and_then(|acc| acc.checked_add(i));
                floats += i as f64;
            }
            Value::Float64(f) => {
                ints = None;
                floats += f;
            }
            Value::Null => {}
            other => return Err(format!("cannot sum {other:?}").into()),
        }
    }
    Ok(match ints {
        Some(i) => Value::Int64(i),
        None => Value::Float64(floats),
    })
}

#[cfg(test)]
mod tests {
    use super::{derivation, mutation, predicate};
    use crate::types::Value;

    #[test]
    fn text_mutations() {
        let upper = mutation("upper").unwrap();
        assert_eq!(upper(&Value::from("ab")).unwrap(), Value::from("AB"));
        assert_eq!(upper(&Value::Int64(1)).unwrap(), Value::Int64(1));
        let trim = mutation("trim").unwrap();
        assert_eq!(trim(&Value::from(" a ")).unwrap(), Value::from("a"));
        assert!(mutation("reverse").is_none());
    }

    #[test]
    fn numeric_conversions() {
        let to_int = mutation("to_int").unwrap();
        assert_eq!(to_int(&Value::from(" 42")).unwrap(), Value::Int64(42));
        assert!(to_int(&Value::from("4.2")).is_err());
        let to_float = mutation("to_float").unwrap();
        assert_eq!(to_float(&Value::from("4.5")).unwrap(), Value::Float64(4.5));
    }

    #[test]
    fn sum_keeps_integers_when_possible() {
        let sum = derivation("sum").unwrap();
        assert_eq!(
            sum(&[Value::from("1"), Value::Int64(2)]).unwrap(),
            Value::Int64(3)
        );
        assert_eq!(
            sum(&[Value::from("1"), Value::from("0.5")]).unwrap(),
            Value::Float64(1.5)
        );
        assert!(sum(&[Value::from("x")]).is_err());
    }

    #[test]
    fn concat_joins_display_forms() {
        let concat = derivation("concat").unwrap();
        assert_eq!(
            concat(&[Value::from("a"), Value::Int64(1)]).unwrap(),
            Value::from("a1")
        );
    }

    #[test]
    fn predicates_by_name() {
        let not_empty = predicate("not_empty").unwrap();
        assert_eq!(not_empty.name(), "not_empty");
        assert!(not_empty.test(&Value::from("x")));
        assert!(!not_empty.test(&Value::from("")));
        assert!(predicate("is_int").unwrap().test(&Value::from("7")));
        assert!(!predicate("is_float").unwrap().test(&Value::from("seven")));
        assert!(predicate("nope").is_none());
    }
}
