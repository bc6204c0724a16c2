//! Runner: process a file or a directory tree into an output directory
//!
//!     Documents are visited in sorted order with hidden entries skipped. Each document is
//!     announced to the report under its path relative to the source, processed by the first
//!     matching format, written under the same relative path in the output directory, and
//!     finished in the report before the next one starts.
//!
//!     Fixtures come from two YAML files that are never processed themselves:
//!
//!         fixtures.yaml               # source root, applies to every document
//!         guide.md.fixtures.yaml      # next to guide.md, wins over the shared file
//!
//!     Passthrough files (images, stylesheets, ...) are copied byte for byte and are not
//!     reported.

use crate::error::RunError;
use crate::registry::FormatRegistry;
use crate::status::Status;
use ignore::WalkBuilder;
use livedoc_expr::Fixtures;
use livedoc_report::Report;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const DEFAULT_SHARED_FIXTURES: &str = "fixtures.yaml";
pub const DEFAULT_COMPANION_SUFFIX: &str = ".fixtures.yaml";

pub struct Runner {
    registry: FormatRegistry,
    report: Report,
    fixtures: Fixtures,
    shared_fixtures: String,
    companion_suffix: String,
}

impl Runner {
    pub fn new(registry: FormatRegistry, report: Report) -> Self {
        Self {
            registry,
            report,
            fixtures: Fixtures::new(),
            shared_fixtures: DEFAULT_SHARED_FIXTURES.to_string(),
            companion_suffix: DEFAULT_COMPANION_SUFFIX.to_string(),
        }
    }

    /// Fixtures available to every document, below the fixture files.
    pub fn with_fixtures(mut self, fixtures: Fixtures) -> Self {
        self.fixtures = fixtures;
        self
    }

    pub fn with_fixture_files(
        mut self,
        shared: impl Into<String>,
        companion_suffix: impl Into<String>,
    ) -> Self {
        self.shared_fixtures = shared.into();
        self.companion_suffix = companion_suffix.into();
        self
    }

    pub fn report(&self) -> &Report {
        &self.report
    }

    /// Process `source` into `output` and return the worst status of all documents.
    pub fn run(&mut self, source: &Path, output: &Path) -> Result<Status, RunError> {
        if !source.exists() {
            return Err(RunError::MissingSource(source.to_path_buf()));
        }
        let root = if source.is_dir() {
            source.to_path_buf()
        } else {
            source.parent().map(Path::to_path_buf).unwrap_or_default()
        };

        let mut shared = self.fixtures.clone();
        if let Some(loaded) = load_fixtures(&root.join(&self.shared_fixtures))? {
            shared = shared.merged(&loaded);
        }

        let mut status = Status::Success;
        for path in self.documents(source)? {
            let relative = pathdiff::diff_paths(&path, &root).unwrap_or_else(|| path.clone());
            status = status.max(self.run_file(&path, &relative, &shared, output)?);
        }
        info!("Finished {} with status {}", source.display(), status);
        Ok(status)
    }

    fn documents(&self, source: &Path) -> Result<Vec<PathBuf>, RunError> {
        let mut documents = Vec::new();
        let walker = WalkBuilder::new(source)
            .standard_filters(false)
            .hidden(true)
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();
        for entry in walker {
            let entry = entry?;
            let path = entry.path();
            if path.is_file() && !self.is_fixture_file(path) {
                documents.push(path.to_path_buf());
            }
        }
        Ok(documents)
    }

    fn is_fixture_file(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .map(|name| name == self.shared_fixtures || name.ends_with(&self.companion_suffix))
            .unwrap_or(false)
    }

    fn companion_fixtures(&self, path: &Path) -> PathBuf {
        let mut name = path.file_name().unwrap_or_default().to_os_string();
        name.push(&self.companion_suffix);
        path.with_file_name(name)
    }

    fn run_file(
        &mut self,
        path: &Path,
        relative: &Path,
        shared: &Fixtures,
        output: &Path,
    ) -> Result<Status, RunError> {
        let format = self.registry.for_path(path).map_err(|source| RunError::Format {
            path: path.to_path_buf(),
            source,
        })?;
        let mut target = output.join(relative);
        if let Some(extension) = format.output_extension() {
            target.set_extension(extension);
        }
        create_parent(&target)?;

        if format.is_passthrough() {
            debug!("Copying {} to {}", path.display(), target.display());
            fs::copy(path, &target).map_err(|source| RunError::Write {
                path: target.clone(),
                source,
            })?;
            return Ok(Status::Success);
        }

        let fixtures = match load_fixtures(&self.companion_fixtures(path))? {
            Some(local) => shared.merged(&local),
            None => shared.clone(),
        };
        let content = fs::read_to_string(path).map_err(|source| RunError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        info!("Processing {} as {}", relative.display(), format.name());
        self.report.test_file(&relative.to_string_lossy());
        let processed = format
            .process(&content, &fixtures, &mut self.report)
            .map_err(|source| RunError::Format {
                path: path.to_path_buf(),
                source,
            })?;
        fs::write(&target, processed.content).map_err(|source| RunError::Write {
            path: target.clone(),
            source,
        })?;
        self.report.file_finish()?;
        debug!("{} -> {} ({})", path.display(), target.display(), processed.status);
        Ok(processed.status)
    }
}

fn create_parent(target: &Path) -> Result<(), RunError> {
    match target.parent() {
        Some(parent) => fs::create_dir_all(parent).map_err(|source| RunError::Write {
            path: parent.to_path_buf(),
            source,
        }),
        None => Ok(()),
    }
}

/// Read a fixture file; `None` when it does not exist.
pub fn load_fixtures(path: &Path) -> Result<Option<Fixtures>, RunError> {
    if !path.is_file() {
        return Ok(None);
    }
    let source = fs::read_to_string(path).map_err(|source| RunError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let fixtures = Fixtures::from_yaml_str(&source).map_err(|source| RunError::Fixtures {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Loaded {} fixtures from {}", fixtures.len(), path.display());
    Ok(Some(fixtures))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn runner() -> Runner {
        Runner::new(FormatRegistry::with_defaults(), Report::new())
    }

    #[test]
    fn test_fixture_files_are_recognised() {
        let runner = runner();
        assert!(runner.is_fixture_file(Path::new("docs/fixtures.yaml")));
        assert!(runner.is_fixture_file(Path::new("docs/guide.md.fixtures.yaml")));
        assert!(!runner.is_fixture_file(Path::new("docs/guide.md")));
        assert_eq!(
            runner.companion_fixtures(Path::new("docs/guide.md")),
            PathBuf::from("docs/guide.md.fixtures.yaml")
        );
    }

    #[test]
    fn test_missing_source_is_an_error() {
        let dir = tempdir().unwrap();
        let result = runner().run(&dir.path().join("nope"), &dir.path().join("out"));
        assert!(matches!(result, Err(RunError::MissingSource(_))));
    }

    #[test]
    fn test_single_file_source() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("doc.md");
        fs::write(&source, "[2](- \"1 + 1 == TEXT\")\n").unwrap();
        let output = dir.path().join("out");

        let status = runner().run(&source, &output).unwrap();
        assert_eq!(status, Status::Success);
        let html = fs::read_to_string(output.join("doc.html")).unwrap();
        assert!(html.contains("<span class=\"success\">2</span>"));
    }

    #[test]
    fn test_invalid_fixtures_are_fatal() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("doc.md"), "text\n").unwrap();
        fs::write(dir.path().join("fixtures.yaml"), "a: [1, 2\n").unwrap();
        let result = runner().run(dir.path(), &dir.path().join("out"));
        assert!(matches!(result, Err(RunError::Fixtures { .. })));
    }
}
