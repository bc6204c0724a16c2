//! Fan-out of report events to the registered reporters

use crate::error::ReportError;
use crate::reporter::Reporter;
use std::error::Error;

#[derive(Default)]
pub struct Report {
    reporters: Vec<Box<dyn Reporter>>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a reporter; `None` is ignored so optional reporters can be passed straight in.
    pub fn register(&mut self, reporter: Option<Box<dyn Reporter>>) {
        if let Some(reporter) = reporter {
            self.reporters.push(reporter);
        }
    }

    pub fn with_reporter(mut self, reporter: impl Reporter + 'static) -> Self {
        self.reporters.push(Box::new(reporter));
        self
    }

    pub fn len(&self) -> usize {
        self.reporters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reporters.is_empty()
    }

    pub fn test_file(&mut self, name: &str) {
        for reporter in &mut self.reporters {
            reporter.change_file(name);
        }
    }

    pub fn test_name(&mut self, name: &str) {
        for reporter in &mut self.reporters {
            reporter.change_test(name);
        }
    }

    pub fn add_comparison(&mut self, expression: &str, resolved: &str, success: bool) {
        for reporter in &mut self.reporters {
            reporter.add_comparison(expression, resolved, success);
        }
    }

    pub fn add_exception(&mut self, expression: &str, error: &dyn Error) {
        for reporter in &mut self.reporters {
            reporter.add_exception(expression, error);
        }
    }

    /// Finish the file on every reporter. All reporters run; the first error is returned.
    pub fn file_finish(&mut self) -> Result<(), ReportError> {
        let mut first_error = None;
        for reporter in &mut self.reporters {
            if let Err(error) = reporter.file_finish() {
                first_error.get_or_insert(error);
            }
        }
        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}
