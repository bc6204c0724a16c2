//! Theme: style names, CSS classes and the page template
//!
//! The processor never writes a class name directly. It asks the theme for a logical style
//! (`success`, `failure_expected`, ...) and the theme answers with the configured class. The
//! embedded stylesheet is written against the logical names and filled in with the same
//! classes, so overriding a class keeps the built-in styling.

use std::collections::BTreeMap;
use tracing::warn;

const STYLESHEET: &str = include_str!("../assets/livedoc.css");
const SCRIPT: &str = include_str!("../assets/livedoc.js");

/// Logical style names and their default classes.
pub const DEFAULT_CLASSES: &[(&str, &str)] = &[
    ("info", "info"),
    ("success", "success"),
    ("failure", "failure"),
    ("failure_expected", "failure-expected"),
    ("failure_result", "failure-result"),
    ("call_span", "call"),
    ("call_expression", "call-expression"),
    ("call_separator", "call-separator"),
    ("call_result", "call-result"),
    ("print_span", "print"),
    ("print_expression", "print-expression"),
    ("print_separator", "print-separator"),
    ("print_result", "print-result"),
    ("footer", "footer"),
    ("exception_button", "exception-button"),
    ("exception", "exception"),
    ("exception_text", "exception-text"),
];

pub const DEFAULT_GENERATOR: &str = "livedoc";

#[derive(Debug, Clone)]
pub struct Theme {
    generator: String,
    classes: BTreeMap<String, String>,
}

impl Theme {
    pub fn new() -> Self {
        Self {
            generator: DEFAULT_GENERATOR.to_string(),
            classes: DEFAULT_CLASSES
                .iter()
                .map(|(name, class)| (name.to_string(), class.to_string()))
                .collect(),
        }
    }

    pub fn with_generator(mut self, generator: impl Into<String>) -> Self {
        self.generator = generator.into();
        self
    }

    /// Override the class of one style. Unknown style names are ignored with a warning.
    pub fn with_class(mut self, name: &str, class: impl Into<String>) -> Self {
        match self.classes.get_mut(name) {
            Some(slot) => *slot = class.into(),
            None => warn!("Ignoring class override for unknown style '{}'", name),
        }
        self
    }

    pub fn with_classes<'a, I>(self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        overrides
            .into_iter()
            .fold(self, |theme, (name, class)| theme.with_class(name, class.as_str()))
    }

    /// Value of the `generator` meta tag and the footer attribution.
    pub fn generator(&self) -> &str {
        &self.generator
    }

    /// Class for a style name; `""` for names the theme does not know.
    pub fn class(&self, name: &str) -> &str {
        match self.classes.get(name) {
            Some(class) => class,
            None => {
                warn!("Unknown style '{}'", name);
                ""
            }
        }
    }

    /// The embedded stylesheet with the theme's classes filled in.
    pub fn stylesheet(&self) -> String {
        self.classes
            .iter()
            .fold(STYLESHEET.to_string(), |css, (name, class)| {
                css.replace(&format!("{{{{{}}}}}", name), class)
            })
    }

    /// Wrap a rendered body in a complete page.
    pub fn render_page(&self, headers: &[String], body: &str) -> String {
        format!(
            r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="UTF-8">
  {}
  <style>
{}
  </style>
  <script>
{}
  </script>
</head>
<body>
{}
</body>
</html>
"#,
            headers.join("\n  "),
            self.stylesheet(),
            SCRIPT,
            body
        )
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::new()
    }
}
