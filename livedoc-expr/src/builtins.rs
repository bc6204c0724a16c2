//! Builtin functions and methods available to every expression
//!
//! Builtins are resolved after variables and fixtures, so a document or fixture file can shadow
//! any of them.

use crate::ast::BinaryOp;
use crate::error::EvalErrorKind;
use crate::eval::apply_binary;
use crate::value::{Function, Value};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use std::cmp::Ordering;
use std::collections::HashMap;

type Builtin = fn(&[Value]) -> Result<Value, EvalErrorKind>;

static BUILTINS: Lazy<HashMap<&'static str, Value>> = Lazy::new(|| {
    let table: [(&'static str, Builtin); 17] = [
        ("len", len),
        ("str", str_),
        ("int", int),
        ("float", float),
        ("bool", bool_),
        ("list", list),
        ("dict", dict),
        ("abs", abs),
        ("min", min),
        ("max", max),
        ("round", round),
        ("sum", sum),
        ("sorted", sorted),
        ("isinstance", isinstance),
        ("upper", upper),
        ("lower", lower),
        ("print", print),
    ];
    table
        .into_iter()
        .map(|(name, call)| (name, Value::Function(Function::new(name, call))))
        .collect()
});

/// Look up a builtin function by name.
pub fn lookup(name: &str) -> Option<Value> {
    BUILTINS.get(name).cloned()
}

/// Names of all builtins, sorted.
pub fn names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = BUILTINS.keys().copied().collect();
    names.sort_unstable();
    names
}

fn type_error(message: impl Into<String>) -> EvalErrorKind {
    EvalErrorKind::Type(message.into())
}

fn exactly_one<'a>(name: &str, args: &'a [Value]) -> Result<&'a Value, EvalErrorKind> {
    match args {
        [value] => Ok(value),
        _ => Err(type_error(format!(
            "{}() takes exactly one argument ({} given)",
            name,
            args.len()
        ))),
    }
}

fn string_arg<'a>(name: &str, args: &'a [Value]) -> Result<&'a str, EvalErrorKind> {
    match exactly_one(name, args)? {
        Value::Str(s) => Ok(s),
        other => Err(type_error(format!(
            "{}() argument must be str, not {}",
            name,
            other.type_name()
        ))),
    }
}

fn len(args: &[Value]) -> Result<Value, EvalErrorKind> {
    let count = match exactly_one("len", args)? {
        Value::Str(s) => s.chars().count(),
        Value::List(items) => items.len(),
        Value::Map(map) => map.len(),
        other => {
            return Err(type_error(format!(
                "object of type '{}' has no len()",
                other.type_name()
            )))
        }
    };
    Ok(Value::Int(count as i64))
}

fn str_(args: &[Value]) -> Result<Value, EvalErrorKind> {
    if args.is_empty() {
        return Ok(Value::from(""));
    }
    Ok(Value::Str(exactly_one("str", args)?.to_string()))
}

fn int(args: &[Value]) -> Result<Value, EvalErrorKind> {
    if args.is_empty() {
        return Ok(Value::Int(0));
    }
    match exactly_one("int", args)? {
        Value::Int(i) => Ok(Value::Int(*i)),
        Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
        Value::Float(f) if f.is_finite() => {
            let truncated = f.trunc();
            if truncated < i64::MIN as f64 || truncated >= i64::MAX as f64 {
                Err(EvalErrorKind::Overflow)
            } else {
                Ok(Value::Int(truncated as i64))
            }
        }
        Value::Float(f) => Err(EvalErrorKind::Value(format!(
            "cannot convert float {} to integer",
            Value::Float(*f)
        ))),
        Value::Str(s) => s.trim().parse().map(Value::Int).map_err(|_| {
            EvalErrorKind::Value(format!(
                "invalid literal for int() with base 10: {}",
                Value::Str(s.clone()).repr()
            ))
        }),
        other => Err(type_error(format!(
            "int() argument must be a string or a number, not '{}'",
            other.type_name()
        ))),
    }
}

fn float(args: &[Value]) -> Result<Value, EvalErrorKind> {
    if args.is_empty() {
        return Ok(Value::Float(0.0));
    }
    match exactly_one("float", args)? {
        Value::Str(s) => s.trim().parse().map(Value::Float).map_err(|_| {
            EvalErrorKind::Value(format!(
                "could not convert string to float: {}",
                Value::Str(s.clone()).repr()
            ))
        }),
        value => value.as_f64().map(Value::Float).ok_or_else(|| {
            type_error(format!(
                "float() argument must be a string or a number, not '{}'",
                value.type_name()
            ))
        }),
    }
}

fn bool_(args: &[Value]) -> Result<Value, EvalErrorKind> {
    if args.is_empty() {
        return Ok(Value::Bool(false));
    }
    Ok(Value::Bool(exactly_one("bool", args)?.truthy()))
}

fn iterate(value: &Value) -> Result<Vec<Value>, EvalErrorKind> {
    match value {
        Value::List(items) => Ok(items.clone()),
        Value::Str(s) => Ok(s.chars().map(|c| Value::Str(c.to_string())).collect()),
        Value::Map(map) => Ok(map.keys().cloned().map(Value::Str).collect()),
        other => Err(type_error(format!(
            "'{}' object is not iterable",
            other.type_name()
        ))),
    }
}

fn list(args: &[Value]) -> Result<Value, EvalErrorKind> {
    if args.is_empty() {
        return Ok(Value::List(Vec::new()));
    }
    iterate(exactly_one("list", args)?).map(Value::List)
}

fn dict(args: &[Value]) -> Result<Value, EvalErrorKind> {
    match args {
        [] => Ok(Value::Map(IndexMap::new())),
        [Value::Map(map)] => Ok(Value::Map(map.clone())),
        [other] => Err(type_error(format!(
            "cannot convert '{}' object to dict",
            other.type_name()
        ))),
        _ => Err(type_error(format!(
            "dict expected at most 1 argument, got {}",
            args.len()
        ))),
    }
}

fn abs(args: &[Value]) -> Result<Value, EvalErrorKind> {
    match exactly_one("abs", args)? {
        Value::Float(f) => Ok(Value::Float(f.abs())),
        value => match value.as_i64() {
            Some(i) => i.checked_abs().map(Value::Int).ok_or(EvalErrorKind::Overflow),
            None => Err(type_error(format!(
                "bad operand type for abs(): '{}'",
                value.type_name()
            ))),
        },
    }
}

fn order(a: &Value, b: &Value) -> Result<Ordering, EvalErrorKind> {
    a.partial_order(b).ok_or_else(|| {
        type_error(format!(
            "'<' not supported between instances of '{}' and '{}'",
            a.type_name(),
            b.type_name()
        ))
    })
}

fn extreme(name: &str, args: &[Value], wanted: Ordering) -> Result<Value, EvalErrorKind> {
    let candidates = match args {
        [] => {
            return Err(type_error(format!(
                "{} expected at least 1 argument, got 0",
                name
            )))
        }
        [single] => iterate(single)?,
        many => many.to_vec(),
    };
    let mut candidates = candidates.into_iter();
    let mut best = candidates
        .next()
        .ok_or_else(|| EvalErrorKind::Value(format!("{}() arg is an empty sequence", name)))?;
    for candidate in candidates {
        if order(&candidate, &best)? == wanted {
            best = candidate;
        }
    }
    Ok(best)
}

fn min(args: &[Value]) -> Result<Value, EvalErrorKind> {
    extreme("min", args, Ordering::Less)
}

fn max(args: &[Value]) -> Result<Value, EvalErrorKind> {
    extreme("max", args, Ordering::Greater)
}

fn round(args: &[Value]) -> Result<Value, EvalErrorKind> {
    let (value, digits) = match args {
        [value] => (value, None),
        [value, Value::None] => (value, None),
        [value, digits] => match digits.as_i64() {
            Some(d) => (value, Some(d)),
            None => {
                return Err(type_error(format!(
                    "'{}' object cannot be interpreted as an integer",
                    digits.type_name()
                )))
            }
        },
        _ => {
            return Err(type_error(format!(
                "round() takes at most 2 arguments ({} given)",
                args.len()
            )))
        }
    };
    if let Some(i) = value.as_i64() {
        return Ok(Value::Int(i));
    }
    let f = value.as_f64().ok_or_else(|| {
        type_error(format!(
            "type {} doesn't define __round__ method",
            value.type_name()
        ))
    })?;
    match digits {
        None => {
            let rounded = f.round_ties_even();
            if !rounded.is_finite() {
                return Err(EvalErrorKind::Value(format!(
                    "cannot convert float {} to integer",
                    Value::Float(f)
                )));
            }
            Ok(Value::Int(rounded as i64))
        }
        Some(d) => {
            let scale = 10f64.powi(d.clamp(-308, 308) as i32);
            Ok(Value::Float((f * scale).round_ties_even() / scale))
        }
    }
}

fn sum(args: &[Value]) -> Result<Value, EvalErrorKind> {
    let (items, start) = match args {
        [items] => (items, Value::Int(0)),
        [items, start] => (items, start.clone()),
        _ => {
            return Err(type_error(format!(
                "sum() takes at most 2 arguments ({} given)",
                args.len()
            )))
        }
    };
    iterate(items)?
        .iter()
        .try_fold(start, |total, item| apply_binary(BinaryOp::Add, &total, item))
}

fn sorted(args: &[Value]) -> Result<Value, EvalErrorKind> {
    let mut items = iterate(exactly_one("sorted", args)?)?;
    let mut failure = None;
    items.sort_by(|a, b| match order(a, b) {
        Ok(ordering) => ordering,
        Err(error) => {
            failure.get_or_insert(error);
            Ordering::Equal
        }
    });
    match failure {
        Some(error) => Err(error),
        None => Ok(Value::List(items)),
    }
}

fn isinstance(args: &[Value]) -> Result<Value, EvalErrorKind> {
    let (value, kind) = match args {
        [value, Value::Function(kind)] => (value, kind.name()),
        [_, other] => {
            return Err(type_error(format!(
                "isinstance() arg 2 must be a type, not {}",
                other.type_name()
            )))
        }
        _ => {
            return Err(type_error(format!(
                "isinstance expected 2 arguments, got {}",
                args.len()
            )))
        }
    };
    let matches = match kind {
        "int" => matches!(value, Value::Int(_) | Value::Bool(_)),
        "float" => matches!(value, Value::Float(_)),
        "str" => matches!(value, Value::Str(_)),
        "bool" => matches!(value, Value::Bool(_)),
        "list" => matches!(value, Value::List(_)),
        "dict" => matches!(value, Value::Map(_)),
        other => {
            return Err(type_error(format!(
                "isinstance() arg 2 must be a type, not function '{}'",
                other
            )))
        }
    };
    Ok(Value::Bool(matches))
}

fn upper(args: &[Value]) -> Result<Value, EvalErrorKind> {
    Ok(Value::Str(string_arg("upper", args)?.to_uppercase()))
}

fn lower(args: &[Value]) -> Result<Value, EvalErrorKind> {
    Ok(Value::Str(string_arg("lower", args)?.to_lowercase()))
}

/// `print(a, b)` returns its arguments joined by spaces; `OUT = print(...)` captures it.
fn print(args: &[Value]) -> Result<Value, EvalErrorKind> {
    let parts: Vec<String> = args.iter().map(Value::to_string).collect();
    Ok(Value::Str(parts.join(" ")))
}

const STRING_METHODS: [&str; 8] = [
    "upper",
    "lower",
    "strip",
    "startswith",
    "endswith",
    "replace",
    "split",
    "join",
];

const MAP_METHODS: [&str; 3] = ["get", "keys", "values"];

/// Resolve `target.name`.
///
/// Map keys win over map methods. Methods come back as functions bound to the target, so
/// `s.upper` and `s.upper()` both work as expected.
pub fn attribute(target: &Value, name: &str) -> Result<Value, EvalErrorKind> {
    match target {
        Value::Map(map) => {
            if let Some(value) = map.get(name) {
                return Ok(value.clone());
            }
            if MAP_METHODS.contains(&name) {
                let map = map.clone();
                let method = name.to_string();
                return Ok(Value::Function(Function::new(name, move |args| {
                    map_method(&map, &method, args)
                })));
            }
        }
        Value::Str(s) if STRING_METHODS.contains(&name) => {
            let receiver = s.clone();
            let method = name.to_string();
            return Ok(Value::Function(Function::new(name, move |args| {
                string_method(&receiver, &method, args)
            })));
        }
        _ => {}
    }
    Err(EvalErrorKind::Attribute {
        type_name: target.type_name(),
        attribute: name.to_string(),
    })
}

fn string_method(receiver: &str, method: &str, args: &[Value]) -> Result<Value, EvalErrorKind> {
    let strings = args
        .iter()
        .map(|arg| match arg {
            Value::Str(s) => Ok(s.as_str()),
            other => Err(type_error(format!(
                "{}() argument must be str, not {}",
                method,
                other.type_name()
            ))),
        })
        .collect::<Result<Vec<&str>, _>>();
    let value = match (method, args) {
        ("upper", []) => Value::Str(receiver.to_uppercase()),
        ("lower", []) => Value::Str(receiver.to_lowercase()),
        ("strip", []) => Value::from(receiver.trim()),
        ("strip", [_]) => {
            let chars: Vec<char> = strings?[0].chars().collect();
            Value::from(receiver.trim_matches(chars.as_slice()))
        }
        ("startswith", [_]) => Value::Bool(receiver.starts_with(strings?[0])),
        ("endswith", [_]) => Value::Bool(receiver.ends_with(strings?[0])),
        ("replace", [_, _]) => {
            let strings = strings?;
            Value::Str(receiver.replace(strings[0], strings[1]))
        }
        ("split", []) => Value::List(receiver.split_whitespace().map(Value::from).collect()),
        ("split", [_]) => {
            let separator = strings?[0];
            if separator.is_empty() {
                return Err(EvalErrorKind::Value("empty separator".to_string()));
            }
            Value::List(receiver.split(separator).map(Value::from).collect())
        }
        ("join", [items]) => {
            let parts = iterate(items)?
                .into_iter()
                .map(|item| match item {
                    Value::Str(s) => Ok(s),
                    other => Err(type_error(format!(
                        "sequence item: expected str instance, {} found",
                        other.type_name()
                    ))),
                })
                .collect::<Result<Vec<String>, _>>()?;
            Value::Str(parts.join(receiver))
        }
        _ => {
            return Err(type_error(format!(
                "str.{}() got an unexpected number of arguments ({} given)",
                method,
                args.len()
            )))
        }
    };
    Ok(value)
}

fn map_method(
    map: &IndexMap<String, Value>,
    method: &str,
    args: &[Value],
) -> Result<Value, EvalErrorKind> {
    match (method, args) {
        ("keys", []) => Ok(Value::List(map.keys().cloned().map(Value::Str).collect())),
        ("values", []) => Ok(Value::List(map.values().cloned().collect())),
        ("get", [key]) => Ok(map.get(&map_key(key)).cloned().unwrap_or(Value::None)),
        ("get", [key, default]) => Ok(map.get(&map_key(key)).cloned().unwrap_or_else(|| default.clone())),
        _ => Err(type_error(format!(
            "dict.{}() got an unexpected number of arguments ({} given)",
            method,
            args.len()
        ))),
    }
}

/// Maps are keyed by strings; other key values use their display form.
pub fn map_key(key: &Value) -> String {
    match key {
        Value::Str(s) => s.clone(),
        other => other.to_string(),
    }
}
