//! Markdown format implementation
//!
//!     Markdown is rendered to HTML with comrak and then processed like any HTML document, so
//!     both the inline link syntax and raw anchors work as markers:
//!
//!         The total is [15](- "total == TEXT").
//!         The total is <a href="-" title="total == TEXT">15</a>.
//!
//!     Tables are enabled since column templates are written in table headers. Raw HTML is
//!     passed through, otherwise comrak would drop the raw anchors.

use crate::error::FormatError;
use crate::format::{Format, Processed};
use crate::processor::DocumentProcessor;
use crate::theme::Theme;
use comrak::{markdown_to_html, ComrakOptions};
use livedoc_expr::Fixtures;
use livedoc_report::Report;

/// Markdown format rendered with a theme
#[derive(Debug, Clone, Default)]
pub struct MarkdownFormat {
    theme: Theme,
}

impl MarkdownFormat {
    pub fn new(theme: Theme) -> Self {
        Self { theme }
    }
}

/// Convert markdown to an HTML fragment.
pub fn to_html(source: &str) -> String {
    markdown_to_html(source, &default_comrak_options())
}

fn default_comrak_options() -> ComrakOptions<'static> {
    let mut options = ComrakOptions::default();
    options.extension.table = true;
    options.render.unsafe_ = true;
    options
}

impl Format for MarkdownFormat {
    fn name(&self) -> &str {
        "markdown"
    }

    fn file_extensions(&self) -> &[&str] {
        &["md", "markdown"]
    }

    fn output_extension(&self) -> Option<&str> {
        Some("html")
    }

    fn process(
        &self,
        content: &str,
        fixtures: &Fixtures,
        report: &mut Report,
    ) -> Result<Processed, FormatError> {
        DocumentProcessor::new(self.theme.clone()).process(&to_html(content), fixtures, report)
    }
}
