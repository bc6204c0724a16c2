//! Console reporter
//!
//! Keeps one status per test and emits a summary line when the test or the file changes.
//! A comparison can only move a test from `NotSet` or `Ok`: once a test has failed, later
//! successes do not bring it back, and any exception marks it `Error` whatever came before.

use crate::error::ReportError;
use crate::reporter::{ReportContext, Reporter};
use std::error::Error;
use std::fmt;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsoleStatus {
    #[default]
    NotSet,
    Ok,
    Fail,
    Error,
}

impl fmt::Display for ConsoleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConsoleStatus::NotSet => "EMPTY",
            ConsoleStatus::Ok => "OK",
            ConsoleStatus::Fail => "FAIL",
            ConsoleStatus::Error => "ERROR",
        })
    }
}

/// One emitted summary line: `<file> - <test>... <STATUS>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleSummary {
    pub file: Option<String>,
    pub test: String,
    pub status: ConsoleStatus,
}

impl fmt::Display for ConsoleSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}... {}",
            self.file.as_deref().unwrap_or("<unknown>"),
            self.test,
            self.status
        )
    }
}

#[derive(Debug, Default)]
pub struct ConsoleReporter {
    context: ReportContext,
    status: ConsoleStatus,
    #[cfg(test)]
    summaries: Vec<ConsoleSummary>,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Status of the test in progress.
    pub fn status(&self) -> ConsoleStatus {
        self.status
    }

    #[cfg(test)]
    fn summaries(&self) -> &[ConsoleSummary] {
        &self.summaries
    }

    fn emit_status(&mut self) {
        if self.status == ConsoleStatus::NotSet {
            return;
        }
        let summary = ConsoleSummary {
            file: self.context.current_file().map(str::to_string),
            test: self.context.current_test().to_string(),
            status: self.status,
        };
        if summary.status == ConsoleStatus::Ok {
            info!("{}", summary);
        } else {
            error!("{}", summary);
        }
        #[cfg(test)]
        self.summaries.push(summary);
        self.status = ConsoleStatus::NotSet;
    }
}

impl Reporter for ConsoleReporter {
    fn change_file(&mut self, name: &str) {
        self.context.change_file(name);
    }

    fn change_test(&mut self, name: &str) {
        if name == self.context.current_test() {
            return;
        }
        self.emit_status();
        self.context.change_test(name);
    }

    fn add_comparison(&mut self, expression: &str, resolved: &str, success: bool) {
        if matches!(self.status, ConsoleStatus::NotSet | ConsoleStatus::Ok) {
            self.status = if success {
                ConsoleStatus::Ok
            } else {
                ConsoleStatus::Fail
            };
        }
        debug!(
            file = self.context.current_file().unwrap_or("<unknown>"),
            test = self.context.current_test(),
            "{} ({}) = {}",
            expression,
            resolved,
            success
        );
    }

    fn add_exception(&mut self, expression: &str, error: &dyn Error) {
        self.status = ConsoleStatus::Error;
        warn!("Exception raised in '{}': {}", expression, error);
    }

    fn file_finish(&mut self) -> Result<(), ReportError> {
        self.emit_status();
        self.context.finish();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn failure() -> io::Error {
        io::Error::new(io::ErrorKind::Other, "division by zero")
    }

    #[test]
    fn test_starts_empty() {
        let mut reporter = ConsoleReporter::new();
        assert_eq!(reporter.status(), ConsoleStatus::NotSet);
        reporter.file_finish().unwrap();
        assert!(reporter.summaries().is_empty());
    }

    #[test]
    fn test_failure_is_not_recovered_by_later_success() {
        let mut reporter = ConsoleReporter::new();
        reporter.add_comparison("a", "a", true);
        assert_eq!(reporter.status(), ConsoleStatus::Ok);
        reporter.add_comparison("b", "b", false);
        assert_eq!(reporter.status(), ConsoleStatus::Fail);
        reporter.add_comparison("c", "c", true);
        assert_eq!(reporter.status(), ConsoleStatus::Fail);
    }

    #[test]
    fn test_exception_forces_error_regardless_of_order() {
        let mut reporter = ConsoleReporter::new();
        reporter.add_exception("x", &failure());
        reporter.add_comparison("a", "a", true);
        assert_eq!(reporter.status(), ConsoleStatus::Error);

        let mut reporter = ConsoleReporter::new();
        reporter.add_comparison("a", "a", false);
        reporter.add_exception("x", &failure());
        assert_eq!(reporter.status(), ConsoleStatus::Error);
    }

    #[test]
    fn test_summary_per_test() {
        let mut reporter = ConsoleReporter::new();
        reporter.change_file("doc.md");
        reporter.add_comparison("a", "a", true);
        reporter.change_test("Second");
        reporter.add_comparison("b", "b", false);
        reporter.file_finish().unwrap();

        let lines: Vec<String> = reporter.summaries().iter().map(|s| s.to_string()).collect();
        assert_eq!(
            lines,
            vec!["doc.md - <main>... OK", "doc.md - Second... FAIL"]
        );
        assert_eq!(reporter.status(), ConsoleStatus::NotSet);
    }

    #[test]
    fn test_exception_then_success_still_summarises_error() {
        let mut reporter = ConsoleReporter::new();
        reporter.change_file("doc.md");
        reporter.change_test("First");
        reporter.add_comparison("a", "a", true);
        reporter.add_exception("b", &failure());
        reporter.add_comparison("c", "c", true);
        reporter.change_test("Second");
        reporter.add_comparison("d", "d", true);
        reporter.file_finish().unwrap();

        let lines: Vec<String> = reporter.summaries().iter().map(ToString::to_string).collect();
        insta::assert_debug_snapshot!(lines, @r###"
        [
            "doc.md - First... ERROR",
            "doc.md - Second... OK",
        ]
        "###);
    }

    #[test]
    fn test_same_test_name_is_a_noop() {
        let mut reporter = ConsoleReporter::new();
        reporter.change_file("doc.md");
        reporter.change_test("Intro");
        reporter.add_comparison("a", "a", true);
        reporter.change_test("Intro");
        assert!(reporter.summaries().is_empty());
        assert_eq!(reporter.status(), ConsoleStatus::Ok);
    }

    #[test]
    fn test_tests_without_comparisons_print_nothing() {
        let mut reporter = ConsoleReporter::new();
        reporter.change_file("doc.md");
        reporter.change_test("One");
        reporter.change_test("Two");
        reporter.file_finish().unwrap();
        assert!(reporter.summaries().is_empty());
    }
}
