//! Error types for expression parsing and evaluation

use crate::token::Span;
use std::fmt::Write;

/// What went wrong while parsing or evaluating an expression.
///
/// Messages follow the wording documentation authors know from Python, since that is the
/// language markers have always been written in.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalErrorKind {
    #[error("invalid syntax: {0}")]
    Syntax(String),

    #[error("name '{0}' is not defined")]
    UndefinedName(String),

    #[error("{0}")]
    Type(String),

    #[error("{0}")]
    Value(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("{0}")]
    Index(String),

    #[error("key {0} not found")]
    Key(String),

    #[error("'{type_name}' object has no attribute '{attribute}'")]
    Attribute {
        type_name: &'static str,
        attribute: String,
    },

    #[error("integer overflow")]
    Overflow,

    /// Raised by a fixture function
    #[error("{0}")]
    Raised(String),
}

impl EvalErrorKind {
    /// Short category name used in diagnostic traces.
    pub fn category(&self) -> &'static str {
        match self {
            EvalErrorKind::Syntax(_) => "SyntaxError",
            EvalErrorKind::UndefinedName(_) => "NameError",
            EvalErrorKind::Type(_) => "TypeError",
            EvalErrorKind::Value(_) => "ValueError",
            EvalErrorKind::DivisionByZero => "ZeroDivisionError",
            EvalErrorKind::Index(_) => "IndexError",
            EvalErrorKind::Key(_) => "KeyError",
            EvalErrorKind::Attribute { .. } => "AttributeError",
            EvalErrorKind::Overflow => "OverflowError",
            EvalErrorKind::Raised(_) => "FixtureError",
        }
    }

    pub(crate) fn at(self, span: Span) -> Failure {
        Failure { kind: self, span }
    }
}

/// An error located inside the expression source, before the source is attached.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub kind: EvalErrorKind,
    pub span: Span,
}

impl Failure {
    pub fn into_error(self, source: &str) -> EvaluationError {
        EvaluationError {
            expression: source.to_string(),
            kind: self.kind,
            span: Some(self.span),
        }
    }
}

pub type EvalResult<T> = Result<T, Failure>;

/// Failure of a marker expression.
///
/// Displays as the bare failure description (e.g. `division by zero`); the expression text and
/// the failing span are kept for the diagnostic trace.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind}")]
pub struct EvaluationError {
    pub expression: String,
    pub kind: EvalErrorKind,
    pub span: Option<Span>,
}

impl EvaluationError {
    pub fn new(expression: impl Into<String>, kind: EvalErrorKind) -> Self {
        Self {
            expression: expression.into(),
            kind,
            span: None,
        }
    }

    /// Full diagnostic trace: the expression with the failing part underlined.
    ///
    /// ```text
    /// Traceback (expression evaluation):
    ///   | a * (5 / 0)
    ///   |      ^^^^^
    /// ZeroDivisionError: division by zero
    /// ```
    pub fn trace(&self) -> String {
        let mut trace = String::from("Traceback (expression evaluation):\n");
        for line in self.expression.lines() {
            let _ = writeln!(trace, "  | {}", line);
        }
        if self.expression.lines().count() <= 1 {
            if let Some(span) = &self.span {
                let start = self.expression[..span.start.min(self.expression.len())]
                    .chars()
                    .count();
                let width = self
                    .expression
                    .get(span.clone())
                    .map(|s| s.chars().count())
                    .unwrap_or(0)
                    .max(1);
                let _ = writeln!(trace, "  | {}{}", " ".repeat(start), "^".repeat(width));
            }
        }
        let _ = write!(trace, "{}: {}", self.kind.category(), self.kind);
        trace
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_the_description() {
        let error = EvaluationError::new("5 / 0", EvalErrorKind::DivisionByZero);
        assert_eq!(error.to_string(), "division by zero");
    }

    #[test]
    fn test_trace_underlines_span() {
        let error = EvalErrorKind::DivisionByZero.at(5..10).into_error("a * (5 / 0)");
        let trace = error.trace();
        assert!(trace.contains("  | a * (5 / 0)\n"));
        assert!(trace.contains("  |      ^^^^^\n"));
        assert!(trace.ends_with("ZeroDivisionError: division by zero"));
    }

    #[test]
    fn test_trace_without_span() {
        let error = EvaluationError::new("x", EvalErrorKind::UndefinedName("x".to_string()));
        assert_eq!(
            error.trace(),
            "Traceback (expression evaluation):\n  | x\nNameError: name 'x' is not defined"
        );
    }
}
