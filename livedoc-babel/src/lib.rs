//! Document formats and processing for livedoc
//!
//!     This crate turns documents with livedoc markers into rendered pages plus report events.
//!     It powers the livedoc binary but is shell agnostic: no code here prints, reads the
//!     environment or exits the process.
//!
//! Architecture
//!
//!     - Format trait: which files a format handles, where its output goes, how to process it
//!     - FormatRegistry: ordered formats, the first match for a path wins
//!     - DocumentProcessor: the marker pipeline over an rcdom tree
//!     - Runner: walks a source tree, loads fixtures, writes outputs, drives the report
//!
//!     The file structure :
//!     .
//!     ├── dom.rs                  # rcdom parsing, construction and splicing helpers
//!     ├── error.rs                # FormatError and RunError
//!     ├── format.rs               # Format trait definition
//!     ├── formats
//!     │   ├── copy.rs             # passthrough for any other file
//!     │   ├── html                # HTML documents
//!     │   └── markdown            # Markdown documents, through comrak
//!     ├── processor.rs            # DocumentProcessor
//!     ├── registry.rs             # FormatRegistry for discovery and selection
//!     ├── runner.rs               # directory runner and fixture files
//!     ├── status.rs               # file-level Status
//!     ├── theme.rs                # style names, classes and the page template
//!     └── lib.rs
//!
//! Implementation Principles
//!
//!     Markup is handled by dedicated crates: comrak renders markdown, html5ever parses and
//!     serializes HTML. The processor only walks and splices the tree, so whatever markup
//!     surrounds a marker comes out the way the author wrote it.

pub mod dom;
pub mod error;
pub mod format;
pub mod formats;
pub mod processor;
pub mod registry;
pub mod runner;
pub mod status;
pub mod theme;

pub use error::{FormatError, RunError};
pub use format::{Format, Processed};
pub use processor::DocumentProcessor;
pub use registry::FormatRegistry;
pub use runner::Runner;
pub use status::Status;
pub use theme::Theme;
