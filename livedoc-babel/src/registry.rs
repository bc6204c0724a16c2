//! Format registry for format discovery and selection
//!
//! Formats are kept in registration order and a path goes to the first format that matches it,
//! so a catch-all format belongs at the end.

use crate::error::FormatError;
use crate::format::Format;
use crate::formats::{CopyFormat, HtmlFormat, MarkdownFormat};
use crate::theme::Theme;
use std::path::Path;

/// Registry of document formats
///
/// # Examples
///
/// ```ignore
/// let registry = FormatRegistry::with_theme(Theme::new());
/// let format = registry.for_path(Path::new("guide.md"))?;
/// assert_eq!(format.name(), "markdown");
/// ```
pub struct FormatRegistry {
    formats: Vec<Box<dyn Format>>,
}

impl FormatRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        FormatRegistry {
            formats: Vec::new(),
        }
    }

    /// Register a format
    ///
    /// If a format with the same name already exists, it is replaced in place.
    pub fn register<F: Format + 'static>(&mut self, format: F) {
        let format: Box<dyn Format> = Box::new(format);
        match self
            .formats
            .iter()
            .position(|existing| existing.name() == format.name())
        {
            Some(index) => self.formats[index] = format,
            None => self.formats.push(format),
        }
    }

    /// First registered format that handles `path`
    pub fn for_path(&self, path: &Path) -> Result<&dyn Format, FormatError> {
        self.formats
            .iter()
            .find(|format| format.matches(path))
            .map(|format| format.as_ref())
            .ok_or_else(|| FormatError::FormatNotFound(path.display().to_string()))
    }

    /// Create a registry with the default formats and theme
    pub fn with_defaults() -> Self {
        Self::with_theme(Theme::default())
    }

    /// HTML and Markdown rendered with `theme`, then the copy fallback
    pub fn with_theme(theme: Theme) -> Self {
        let mut registry = Self::new();

        registry.register(HtmlFormat::new(theme.clone()));
        registry.register(MarkdownFormat::new(theme));
        registry.register(CopyFormat);

        registry
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
