//! Tree-walking evaluator
//!
//! Evaluation only ever reads the two scopes. Assignment is handled one level up, by
//! [`crate::expression::Expression::evaluate`], which owns the mutable variable scope.

use crate::ast::{BinaryOp, CompareOp, Expr, ExprKind, LogicalOp, UnaryOp};
use crate::builtins;
use crate::error::{EvalErrorKind, EvalResult};
use crate::scope::{Fixtures, Variables};
use crate::value::Value;
use indexmap::IndexMap;

pub struct Evaluator<'a> {
    variables: &'a Variables,
    fixtures: &'a Fixtures,
}

impl<'a> Evaluator<'a> {
    pub fn new(variables: &'a Variables, fixtures: &'a Fixtures) -> Self {
        Self {
            variables,
            fixtures,
        }
    }

    /// Resolve a free name: variables, then fixtures, then builtins.
    pub fn resolve(&self, name: &str) -> Option<Value> {
        self.variables
            .get(name)
            .or_else(|| self.fixtures.get(name))
            .cloned()
            .or_else(|| builtins::lookup(name))
    }

    pub fn eval(&self, expr: &Expr) -> EvalResult<Value> {
        let at = |kind: EvalErrorKind| kind.at(expr.span.clone());
        match &expr.kind {
            ExprKind::None => Ok(Value::None),
            ExprKind::Bool(b) => Ok(Value::Bool(*b)),
            ExprKind::Int(i) => Ok(Value::Int(*i)),
            ExprKind::Float(f) => Ok(Value::Float(*f)),
            ExprKind::Str(s) => Ok(Value::Str(s.clone())),
            ExprKind::Name(name) => self
                .resolve(name)
                .ok_or_else(|| at(EvalErrorKind::UndefinedName(name.clone()))),
            ExprKind::List(items) => items
                .iter()
                .map(|item| self.eval(item))
                .collect::<EvalResult<Vec<_>>>()
                .map(Value::List),
            ExprKind::Map(pairs) => {
                let mut map = IndexMap::with_capacity(pairs.len());
                for (key, value) in pairs {
                    let key = builtins::map_key(&self.eval(key)?);
                    map.insert(key, self.eval(value)?);
                }
                Ok(Value::Map(map))
            }
            ExprKind::Unary { op, operand } => {
                let value = self.eval(operand)?;
                apply_unary(*op, &value).map_err(at)
            }
            ExprKind::Binary { op, left, right } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                apply_binary(*op, &left, &right).map_err(at)
            }
            ExprKind::Logical { op, left, right } => {
                let left = self.eval(left)?;
                match (op, left.truthy()) {
                    (LogicalOp::And, false) | (LogicalOp::Or, true) => Ok(left),
                    _ => self.eval(right),
                }
            }
            ExprKind::Compare { first, rest } => {
                let mut left = self.eval(first)?;
                for (op, operand) in rest {
                    let right = self.eval(operand)?;
                    if !compare(*op, &left, &right).map_err(at)? {
                        return Ok(Value::Bool(false));
                    }
                    left = right;
                }
                Ok(Value::Bool(true))
            }
            ExprKind::Call { callee, args } => {
                let callee = self.eval(callee)?;
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg))
                    .collect::<EvalResult<Vec<_>>>()?;
                match callee {
                    Value::Function(function) => function.call(&args).map_err(at),
                    other => Err(at(EvalErrorKind::Type(format!(
                        "'{}' object is not callable",
                        other.type_name()
                    )))),
                }
            }
            ExprKind::Index { target, index } => {
                let target = self.eval(target)?;
                let index = self.eval(index)?;
                subscript(&target, &index).map_err(at)
            }
            ExprKind::Attribute { target, name } => {
                let target = self.eval(target)?;
                builtins::attribute(&target, name).map_err(at)
            }
        }
    }
}

fn apply_unary(op: UnaryOp, value: &Value) -> Result<Value, EvalErrorKind> {
    let symbol = match op {
        UnaryOp::Not => return Ok(Value::Bool(!value.truthy())),
        UnaryOp::Negate => "-",
        UnaryOp::Plus => "+",
    };
    match (op, value) {
        (UnaryOp::Negate, Value::Float(f)) => Ok(Value::Float(-f)),
        (UnaryOp::Plus, Value::Float(f)) => Ok(Value::Float(*f)),
        (UnaryOp::Negate, v) if v.as_i64().is_some() => v
            .as_i64()
            .and_then(i64::checked_neg)
            .map(Value::Int)
            .ok_or(EvalErrorKind::Overflow),
        (UnaryOp::Plus, v) if v.as_i64().is_some() => Ok(Value::Int(v.as_i64().unwrap_or(0))),
        _ => Err(EvalErrorKind::Type(format!(
            "bad operand type for unary {}: '{}'",
            symbol,
            value.type_name()
        ))),
    }
}

/// Numbers after int/float promotion. Booleans count as integers.
enum Numbers {
    Ints(i64, i64),
    Floats(f64, f64),
}

fn numbers(left: &Value, right: &Value) -> Option<Numbers> {
    if let (Some(a), Some(b)) = (left.as_i64(), right.as_i64()) {
        return Some(Numbers::Ints(a, b));
    }
    Some(Numbers::Floats(left.as_f64()?, right.as_f64()?))
}

/// Longest string (in bytes) or list a repetition may build.
pub const MAX_REPEAT_LEN: usize = 1 << 24;

/// Repetition count for a sequence of `len` items; negative counts repeat zero times.
fn repeat_count(len: usize, times: i64) -> Result<usize, EvalErrorKind> {
    let times = usize::try_from(times).unwrap_or(0);
    match len.checked_mul(times) {
        Some(0) => Ok(0),
        Some(total) if total <= MAX_REPEAT_LEN => Ok(times),
        _ => Err(EvalErrorKind::Overflow),
    }
}

/// Apply an arithmetic operator to two values.
pub fn apply_binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, EvalErrorKind> {
    let unsupported = || {
        EvalErrorKind::Type(format!(
            "unsupported operand type(s) for {}: '{}' and '{}'",
            op.symbol(),
            left.type_name(),
            right.type_name()
        ))
    };

    match (op, left, right) {
        (BinaryOp::Add, Value::Str(a), Value::Str(b)) => return Ok(Value::Str(format!("{}{}", a, b))),
        (BinaryOp::Add, Value::List(a), Value::List(b)) => {
            return Ok(Value::List(a.iter().chain(b).cloned().collect()))
        }
        (BinaryOp::Mul, Value::Str(s), n) | (BinaryOp::Mul, n, Value::Str(s))
            if matches!(n, Value::Int(_) | Value::Bool(_)) =>
        {
            let times = repeat_count(s.len(), n.as_i64().unwrap_or(0))?;
            return Ok(Value::Str(s.repeat(times)));
        }
        (BinaryOp::Mul, Value::List(items), n) | (BinaryOp::Mul, n, Value::List(items))
            if matches!(n, Value::Int(_) | Value::Bool(_)) =>
        {
            let times = repeat_count(items.len(), n.as_i64().unwrap_or(0))?;
            let mut repeated = Vec::with_capacity(items.len() * times);
            for _ in 0..times {
                repeated.extend_from_slice(items);
            }
            return Ok(Value::List(repeated));
        }
        _ => {}
    }

    match numbers(left, right).ok_or_else(unsupported)? {
        Numbers::Ints(a, b) => int_arithmetic(op, a, b),
        Numbers::Floats(a, b) => float_arithmetic(op, a, b),
    }
}

fn int_arithmetic(op: BinaryOp, a: i64, b: i64) -> Result<Value, EvalErrorKind> {
    let result = match op {
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Sub => a.checked_sub(b),
        BinaryOp::Mul => a.checked_mul(b),
        BinaryOp::Div => return float_arithmetic(op, a as f64, b as f64),
        BinaryOp::FloorDiv => {
            if b == 0 {
                return Err(EvalErrorKind::DivisionByZero);
            }
            a.checked_div(b).map(|q| {
                if (a % b != 0) && ((a < 0) != (b < 0)) {
                    q - 1
                } else {
                    q
                }
            })
        }
        BinaryOp::Mod => {
            if b == 0 {
                return Err(EvalErrorKind::DivisionByZero);
            }
            a.checked_rem(b)
                .map(|r| if r != 0 && ((r < 0) != (b < 0)) { r + b } else { r })
        }
        BinaryOp::Pow => match u32::try_from(b) {
            Ok(exponent) => a.checked_pow(exponent),
            Err(_) if b < 0 => return float_arithmetic(op, a as f64, b as f64),
            Err(_) => None,
        },
    };
    result.map(Value::Int).ok_or(EvalErrorKind::Overflow)
}

fn float_arithmetic(op: BinaryOp, a: f64, b: f64) -> Result<Value, EvalErrorKind> {
    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div | BinaryOp::FloorDiv | BinaryOp::Mod if b == 0.0 => {
            return Err(EvalErrorKind::DivisionByZero)
        }
        BinaryOp::Div => a / b,
        BinaryOp::FloorDiv => (a / b).floor(),
        BinaryOp::Mod => {
            let r = a % b;
            if r != 0.0 && ((r < 0.0) != (b < 0.0)) {
                r + b
            } else {
                r
            }
        }
        BinaryOp::Pow if a == 0.0 && b < 0.0 => return Err(EvalErrorKind::DivisionByZero),
        BinaryOp::Pow => a.powf(b),
    };
    Ok(Value::Float(result))
}

/// Apply a comparison operator to two already evaluated operands.
///
/// Equality across unrelated types is `false`; ordering across them is a type error.
pub fn compare(op: CompareOp, left: &Value, right: &Value) -> Result<bool, EvalErrorKind> {
    use std::cmp::Ordering::*;
    let ordering = match op {
        CompareOp::Eq => return Ok(left.loose_eq(right)),
        CompareOp::Ne => return Ok(!left.loose_eq(right)),
        CompareOp::In => return contains(right, left),
        CompareOp::NotIn => return contains(right, left).map(|found| !found),
        _ => left.partial_order(right),
    };
    let ordering = match ordering {
        Some(ordering) => ordering,
        // NaN never orders
        None if left.is_number() && right.is_number() => return Ok(false),
        None => {
            return Err(EvalErrorKind::Type(format!(
                "'{}' not supported between instances of '{}' and '{}'",
                op.symbol(),
                left.type_name(),
                right.type_name()
            )))
        }
    };
    Ok(match op {
        CompareOp::Lt => ordering == Less,
        CompareOp::Le => ordering != Greater,
        CompareOp::Gt => ordering == Greater,
        _ => ordering != Less,
    })
}

fn contains(container: &Value, item: &Value) -> Result<bool, EvalErrorKind> {
    match (container, item) {
        (Value::Str(haystack), Value::Str(needle)) => Ok(haystack.contains(needle.as_str())),
        (Value::Str(_), other) => Err(EvalErrorKind::Type(format!(
            "'in <string>' requires string as left operand, not {}",
            other.type_name()
        ))),
        (Value::List(items), item) => Ok(items.iter().any(|candidate| candidate.loose_eq(item))),
        (Value::Map(map), key) => Ok(map.contains_key(&builtins::map_key(key))),
        (other, _) => Err(EvalErrorKind::Type(format!(
            "argument of type '{}' is not iterable",
            other.type_name()
        ))),
    }
}

fn subscript(target: &Value, index: &Value) -> Result<Value, EvalErrorKind> {
    match target {
        Value::List(items) => {
            let position = sequence_index(index, items.len(), "list")?;
            Ok(items[position].clone())
        }
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            let position = sequence_index(index, chars.len(), "string")?;
            Ok(Value::Str(chars[position].to_string()))
        }
        Value::Map(map) => map
            .get(&builtins::map_key(index))
            .cloned()
            .ok_or_else(|| EvalErrorKind::Key(index.repr())),
        other => Err(EvalErrorKind::Type(format!(
            "'{}' object is not subscriptable",
            other.type_name()
        ))),
    }
}

/// Bounds-checked position for `index`, counting from the end when negative.
fn sequence_index(index: &Value, len: usize, kind: &str) -> Result<usize, EvalErrorKind> {
    let raw = match index {
        Value::Int(_) | Value::Bool(_) => index.as_i64().unwrap_or(0),
        other => {
            return Err(EvalErrorKind::Type(format!(
                "{} indices must be integers, not {}",
                kind,
                other.type_name()
            )))
        }
    };
    let len = len as i64;
    let position = if raw < 0 { raw + len } else { raw };
    if (0..len).contains(&position) {
        Ok(position as usize)
    } else {
        Err(EvalErrorKind::Index(format!("{} index out of range", kind)))
    }
}
