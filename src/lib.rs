//! # livedoc
//!
//! Executable documentation: markdown and HTML documents whose examples are checked.
//!
//! Authors write markers as links whose target is `-` and whose title is an expression:
//!
//! ```text
//! The basket costs [13.5](- "round(items * price, 2) == TEXT").
//! ```
//!
//! Running a document evaluates every marker in order and renders it as a success, a failure,
//! an informational value or an error, while reporters collect the verdicts per test.
//!
//! The workspace is split along those lines:
//!
//! - [expr]: classification and evaluation of marker expressions
//! - [report]: report fan-out, console and JUnit reporters
//! - [config]: layered configuration
//! - [babel]: formats, the document processor and the directory runner

pub use livedoc_babel as babel;
pub use livedoc_config as config;
pub use livedoc_expr as expr;
pub use livedoc_report as report;

pub use livedoc_babel::{DocumentProcessor, FormatRegistry, Runner, Status, Theme};
pub use livedoc_expr::{Fixtures, Value};
pub use livedoc_report::Report;
