//! Format implementations
//!
//! HTML documents run through the [crate::processor::DocumentProcessor] directly, Markdown is
//! converted to HTML first, and anything else is copied to the output untouched.

pub mod copy;
pub mod html;
pub mod markdown;

pub use copy::CopyFormat;
pub use html::HtmlFormat;
pub use markdown::MarkdownFormat;
