//! Marker expression language for livedoc
//!
//!     Every marker in a livedoc document carries a short expression in its title. This crate
//!     turns that text into one of four operations and runs it against two scopes: the
//!     variables written by earlier markers of the same document, and the read-only fixtures
//!     supplied from outside.
//!
//! Architecture
//!
//!     - token: logos lexer for the expression syntax
//!     - parser: recursive descent over the token stream, producing [ast::Expr]
//!     - eval: tree-walking evaluator resolving names from variables, fixtures, then builtins
//!     - expression: marker classification ([classify]) and the four operation kinds
//!
//!     The file structure :
//!     .
//!     ├── ast.rs              # Expression tree with byte spans
//!     ├── builtins.rs         # Builtin functions and string/map methods
//!     ├── error.rs            # EvaluationError and its kinds
//!     ├── eval.rs             # Evaluator and operator semantics
//!     ├── expression.rs       # classify / evaluate / autotype
//!     ├── parser.rs           # Recursive descent parser
//!     ├── scope.rs            # Variables and Fixtures
//!     ├── token.rs            # logos token definitions
//!     ├── value.rs            # Runtime values and their display
//!     └── lib.rs
//!
//! Syntax
//!
//!     The language reads like a small subset of Python, which is what documentation authors
//!     already write in markers: literals, arithmetic, `and`/`or`/`not`, chained comparisons,
//!     `in`, indexing, attribute access and calls. There are no statements and no way to reach
//!     the filesystem or network; callable fixtures are the only extension point.

pub mod ast;
pub mod builtins;
pub mod error;
pub mod eval;
pub mod expression;
pub mod parser;
pub mod scope;
pub mod token;
pub mod value;

pub use error::{EvalErrorKind, EvaluationError};
pub use eval::Evaluator;
pub use expression::{
    autotype, classify, ComparisonResult, Expression, Outcome, OUTPUT_VARIABLE, TESTNAME_VARIABLE,
    TEXT_VARIABLE,
};
pub use scope::{Fixtures, Variables};
pub use value::{Function, Value};

/// Parse and evaluate a bare expression against the given scopes.
///
/// This is the building block used by every marker kind; it does not classify the text.
pub fn eval_str(
    source: &str,
    variables: &Variables,
    fixtures: &Fixtures,
) -> Result<Value, EvaluationError> {
    let expr = parser::parse(source).map_err(|failure| failure.into_error(source))?;
    Evaluator::new(variables, fixtures)
        .eval(&expr)
        .map_err(|failure| failure.into_error(source))
}
