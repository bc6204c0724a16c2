//! HTML format implementation
//!
//! Handles `.html` and `.htm` documents. The output keeps the source extension and is a full
//! page: the source head is carried over behind the generator meta tag, and the body is the
//! rewritten source body followed by the footer.

use crate::error::FormatError;
use crate::format::{Format, Processed};
use crate::processor::DocumentProcessor;
use crate::theme::Theme;
use livedoc_expr::Fixtures;
use livedoc_report::Report;

/// HTML format rendered with a theme
#[derive(Debug, Clone, Default)]
pub struct HtmlFormat {
    theme: Theme,
}

impl HtmlFormat {
    pub fn new(theme: Theme) -> Self {
        Self { theme }
    }
}

impl Format for HtmlFormat {
    fn name(&self) -> &str {
        "html"
    }

    fn file_extensions(&self) -> &[&str] {
        &["html", "htm"]
    }

    fn process(
        &self,
        content: &str,
        fixtures: &Fixtures,
        report: &mut Report,
    ) -> Result<Processed, FormatError> {
        DocumentProcessor::new(self.theme.clone()).process(content, fixtures, report)
    }
}
