//! Passthrough format
//!
//! Matches every file, so it is registered last. Files are copied to the output byte for byte
//! by the runner; [`CopyFormat::process`] only exists for callers that hold text already.

use crate::error::FormatError;
use crate::format::{Format, Processed};
use crate::status::Status;
use livedoc_expr::Fixtures;
use livedoc_report::Report;
use std::path::Path;

#[derive(Debug, Clone, Copy, Default)]
pub struct CopyFormat;

impl Format for CopyFormat {
    fn name(&self) -> &str {
        "copy"
    }

    fn matches(&self, _path: &Path) -> bool {
        true
    }

    fn is_passthrough(&self) -> bool {
        true
    }

    fn process(
        &self,
        content: &str,
        _fixtures: &Fixtures,
        _report: &mut Report,
    ) -> Result<Processed, FormatError> {
        Ok(Processed {
            content: content.to_string(),
            status: Status::Success,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_echoes_content() {
        let processed = CopyFormat
            .process("a == b", &Fixtures::new(), &mut Report::new())
            .unwrap();
        assert_eq!(processed.content, "a == b");
        assert_eq!(processed.status, Status::Success);
        assert!(CopyFormat.matches(Path::new("anything.bin")));
    }
}
