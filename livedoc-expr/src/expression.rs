//! Marker classification and the four operation kinds
//!
//! A marker's text is classified once, by the first top-level `=` or comparison operator:
//!
//!     a = 3          Assignment
//!     OUT = f(x)     Print
//!     total == 10    Comparison
//!     f(x)           Call
//!
//! Operators inside string literals or brackets never count, since the scan runs over tokens and
//! tracks bracket depth.

use crate::ast::CompareOp;
use crate::error::{EvalErrorKind, EvaluationError};
use crate::eval::compare;
use crate::eval_str;
use crate::scope::{Fixtures, Variables};
use crate::token::{tokenize, Token};
use crate::value::Value;
use std::fmt;

/// Bound to the marker's visible text before each evaluation.
pub const TEXT_VARIABLE: &str = "TEXT";
/// Output capture, cleared before each marker; `OUT = ...` markers append to it.
pub const OUTPUT_VARIABLE: &str = "OUT";
/// Assigning this name starts a new test in the reports.
pub const TESTNAME_VARIABLE: &str = "TESTNAME";

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Assignment {
        left: String,
        right: String,
    },
    Comparison {
        left: String,
        right: String,
        operator: CompareOp,
    },
    Call {
        expression: String,
    },
    Print {
        expression: String,
    },
}

/// Result of a successfully evaluated marker.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The autotyped value stored under `name`
    Assigned { name: String, value: Value },
    Compared(ComparisonResult),
    Called { value: Value },
    Printed { value: Value },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonResult {
    /// Left operand as evaluated, before autotype
    pub left: Value,
    /// Right operand as evaluated, before autotype
    pub right: Value,
    pub success: bool,
    /// `<left> <op> <right>` over the autotyped operands
    pub resolved: String,
}

/// Classify marker text into one of the four operation kinds.
///
/// Text that does not lex is treated as a Call; evaluating it reports the syntax error.
pub fn classify(text: &str) -> Expression {
    let call = || Expression::Call {
        expression: text.trim().to_string(),
    };
    let tokens = match tokenize(text) {
        Ok(tokens) => tokens,
        Err(_) => return call(),
    };

    let mut depth = 0usize;
    for (token, span) in tokens {
        if token.opens_group() {
            depth += 1;
            continue;
        }
        if token.closes_group() {
            depth = depth.saturating_sub(1);
            continue;
        }
        if depth > 0 || !token.is_marker_operator() {
            continue;
        }

        let left = text[..span.start].trim().to_string();
        let right = text[span.end..].trim().to_string();
        if token == Token::Equals {
            return if left == OUTPUT_VARIABLE {
                Expression::Print { expression: right }
            } else {
                Expression::Assignment { left, right }
            };
        }
        if let Some(operator) = CompareOp::from_symbol(&text[span]) {
            return Expression::Comparison {
                left,
                right,
                operator,
            };
        }
    }
    call()
}

/// Coerce a scalar into numeric form when it reads as a number.
///
/// Numbers and booleans are kept as they are. Strings are stripped of surrounding whitespace
/// and quote characters and tried as an integer, then as a float; a string that is neither
/// comes back unchanged. Lists, maps, functions and `None` are never converted.
pub fn autotype(value: Value) -> Value {
    match value {
        Value::Str(text) => {
            let stripped = text.trim_matches(|c: char| c.is_whitespace() || c == '\'' || c == '"');
            if let Ok(int) = stripped.parse::<i64>() {
                Value::Int(int)
            } else if let Ok(float) = stripped.parse::<f64>() {
                Value::Float(float)
            } else {
                Value::Str(text)
            }
        }
        other => other,
    }
}

fn is_identifier(name: &str) -> bool {
    matches!(tokenize(name).as_deref(), Ok([(Token::Identifier(_), _)]))
}

impl Expression {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Expression::Assignment { .. } => "assignment",
            Expression::Comparison { .. } => "comparison",
            Expression::Call { .. } => "call",
            Expression::Print { .. } => "print",
        }
    }

    /// Evaluate against the scopes. Assignment and Print write to `variables`.
    pub fn evaluate(
        &self,
        variables: &mut Variables,
        fixtures: &Fixtures,
    ) -> Result<Outcome, EvaluationError> {
        tracing::trace!(kind = self.kind_name(), expression = %self, "evaluating");
        match self {
            Expression::Assignment { left, right } => {
                if !is_identifier(left) {
                    return Err(EvaluationError::new(
                        format!("{} = {}", left, right),
                        EvalErrorKind::Syntax(format!("cannot assign to '{}'", left)),
                    ));
                }
                let value = autotype(eval_str(right, variables, fixtures)?);
                variables.set(left.clone(), value.clone());
                Ok(Outcome::Assigned {
                    name: left.clone(),
                    value,
                })
            }
            Expression::Comparison {
                left,
                right,
                operator,
            } => {
                let left_value = eval_str(left, variables, fixtures)?;
                let right_value = eval_str(right, variables, fixtures)?;
                let l = autotype(left_value.clone());
                let r = autotype(right_value.clone());
                let success = compare(*operator, &l, &r)
                    .map_err(|kind| EvaluationError::new(self.to_string(), kind))?;
                Ok(Outcome::Compared(ComparisonResult {
                    left: left_value,
                    right: right_value,
                    success,
                    resolved: format!("{} {} {}", l, operator, r),
                }))
            }
            Expression::Call { expression } => Ok(Outcome::Called {
                value: eval_str(expression, variables, fixtures)?,
            }),
            Expression::Print { expression } => {
                let value = eval_str(expression, variables, fixtures)?;
                let mut captured = match variables.get(OUTPUT_VARIABLE) {
                    Some(Value::Str(existing)) => existing.clone(),
                    _ => String::new(),
                };
                captured.push_str(&value.to_string());
                variables.set(OUTPUT_VARIABLE, Value::Str(captured));
                Ok(Outcome::Printed { value })
            }
        }
    }
}

/// The expression as shown in reports: the right side of an assignment, the whole comparison,
/// or the called expression.
impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Assignment { right, .. } => f.write_str(right),
            Expression::Comparison {
                left,
                right,
                operator,
            } => write!(f, "{} {} {}", left, operator, right),
            Expression::Call { expression } | Expression::Print { expression } => {
                f.write_str(expression)
            }
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Assigned { name, value } => write!(f, "{} = {}", name, value.repr()),
            Outcome::Compared(result) => write!(
                f,
                "{} is {}",
                result.resolved,
                if result.success { "True" } else { "False" }
            ),
            Outcome::Called { value } | Outcome::Printed { value } => write!(f, "{}", value),
        }
    }
}
