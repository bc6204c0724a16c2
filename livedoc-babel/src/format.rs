//! Format trait definition
//!
//! Every document type livedoc understands implements [`Format`]: it says which files it
//! handles, where its output goes, and how a document is turned into its rendition.

use crate::error::FormatError;
use crate::status::Status;
use livedoc_expr::Fixtures;
use livedoc_report::Report;
use std::path::Path;

/// A rendered document and the worst verdict seen while rendering it.
#[derive(Debug, Clone, PartialEq)]
pub struct Processed {
    pub content: String,
    pub status: Status,
}

/// Trait for document formats
///
/// # Examples
///
/// ```ignore
/// struct PlainText;
///
/// impl Format for PlainText {
///     fn name(&self) -> &str {
///         "text"
///     }
///
///     fn file_extensions(&self) -> &[&str] {
///         &["txt"]
///     }
///
///     fn process(&self, content: &str, _: &Fixtures, _: &mut Report) -> Result<Processed, FormatError> {
///         Ok(Processed { content: content.to_string(), status: Status::Success })
///     }
/// }
/// ```
pub trait Format: Send + Sync {
    /// The name of this format (e.g., "markdown", "html")
    fn name(&self) -> &str;

    /// File extensions handled by this format, lower case and without the dot
    fn file_extensions(&self) -> &[&str] {
        &[]
    }

    /// Whether this format handles `path`. Extensions compare case-insensitively.
    fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                self.file_extensions()
                    .iter()
                    .any(|known| known.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }

    /// Extension of the rendered file; `None` keeps the source extension.
    fn output_extension(&self) -> Option<&str> {
        None
    }

    /// Passthrough formats copy the file's bytes instead of processing text.
    fn is_passthrough(&self) -> bool {
        false
    }

    fn process(
        &self,
        content: &str,
        fixtures: &Fixtures,
        report: &mut Report,
    ) -> Result<Processed, FormatError>;
}
