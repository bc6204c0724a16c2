//! Error types for format processing and document runs

use std::path::PathBuf;

/// Failure of a single format while turning a document into its rendition.
///
/// Marker failures never surface here: they are rendered inline and reported.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("no format handles '{0}'")]
    FormatNotFound(String),

    #[error("parse error: {0}")]
    ParseError(String),

    #[error("serialization error: {0}")]
    SerializationError(String),
}

/// Fatal failure of a run over a file or a directory tree.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("source {0} does not exist")]
    MissingSource(PathBuf),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to walk source tree: {0}")]
    Walk(#[from] ignore::Error),

    #[error("invalid fixtures in {path}: {source}")]
    Fixtures {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to process {path}: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: FormatError,
    },

    #[error(transparent)]
    Report(#[from] livedoc_report::ReportError),
}
