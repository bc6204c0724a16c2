use crate::error::ReportError;
use std::error::Error;

/// Test name used until a heading sets one.
pub const DEFAULT_TEST_NAME: &str = "<main>";

/// Receiver of report events.
pub trait Reporter {
    /// A new source file starts; the test name goes back to [DEFAULT_TEST_NAME].
    fn change_file(&mut self, name: &str);

    fn change_test(&mut self, name: &str);

    fn add_comparison(&mut self, expression: &str, resolved: &str, success: bool);

    fn add_exception(&mut self, expression: &str, error: &dyn Error);

    /// The current file is done. Reporters that write to disk do it here.
    fn file_finish(&mut self) -> Result<(), ReportError>;
}

/// Current file and test, as tracked by every reporter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportContext {
    current_file: Option<String>,
    current_test: String,
}

impl Default for ReportContext {
    fn default() -> Self {
        Self {
            current_file: None,
            current_test: DEFAULT_TEST_NAME.to_string(),
        }
    }
}

impl ReportContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_file(&self) -> Option<&str> {
        self.current_file.as_deref()
    }

    pub fn current_test(&self) -> &str {
        &self.current_test
    }

    pub fn change_file(&mut self, name: &str) {
        self.current_file = Some(name.to_string());
        self.current_test = DEFAULT_TEST_NAME.to_string();
    }

    pub fn change_test(&mut self, name: &str) {
        self.current_test = name.to_string();
    }

    pub fn finish(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_lifecycle() {
        let mut context = ReportContext::new();
        assert_eq!(context.current_file(), None);
        assert_eq!(context.current_test(), DEFAULT_TEST_NAME);

        context.change_file("a.md");
        context.change_test("Intro");
        assert_eq!(context.current_file(), Some("a.md"));
        assert_eq!(context.current_test(), "Intro");

        context.change_file("b.md");
        assert_eq!(context.current_test(), DEFAULT_TEST_NAME);

        context.finish();
        assert_eq!(context, ReportContext::default());
    }
}
