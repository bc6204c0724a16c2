//! JUnit XML reporter
//!
//! Cases are buffered in one suite per test name and written as a single document per source
//! file when the file finishes:
//!
//!     <testsuites>
//!       <testsuite name="Installation" file="guide/intro.md" tests="2" failures="1" errors="0">
//!         <testcase name="total == 10" classname="guide/intro.md"/>
//!         <testcase name="count == 3" classname="guide/intro.md">
//!           <failure message="...">...</failure>
//!         </testcase>
//!       </testsuite>
//!     </testsuites>

use crate::error::ReportError;
use crate::reporter::{ReportContext, Reporter};
use std::error::Error;
use std::fmt::Write;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
enum CaseOutcome {
    Passed,
    Failed(String),
    Errored(String),
}

#[derive(Debug, Clone)]
struct TestCase {
    name: String,
    outcome: CaseOutcome,
}

#[derive(Debug, Clone)]
struct TestSuite {
    name: String,
    file: Option<String>,
    cases: Vec<TestCase>,
}

impl TestSuite {
    fn count(&self, predicate: impl Fn(&CaseOutcome) -> bool) -> usize {
        self.cases.iter().filter(|case| predicate(&case.outcome)).count()
    }
}

#[derive(Debug)]
pub struct JunitReporter {
    context: ReportContext,
    output_dir: PathBuf,
    suites: Vec<TestSuite>,
    /// Set when the test or file changed since the last case; the next case opens a suite.
    suite_open: bool,
}

impl JunitReporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            context: ReportContext::new(),
            output_dir: output_dir.into(),
            suites: Vec::new(),
            suite_open: false,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Where the current file's report goes: `<output_dir>/<file without extension>.xml`.
    pub fn output_path(&self) -> Option<PathBuf> {
        let file = self.context.current_file()?;
        Some(self.output_dir.join(Path::new(file).with_extension("xml")))
    }

    fn push_case(&mut self, name: &str, outcome: CaseOutcome) {
        if !self.suite_open || self.suites.is_empty() {
            self.suites.push(TestSuite {
                name: self.context.current_test().to_string(),
                file: self.context.current_file().map(str::to_string),
                cases: Vec::new(),
            });
            self.suite_open = true;
        }
        if let Some(suite) = self.suites.last_mut() {
            suite.cases.push(TestCase {
                name: name.to_string(),
                outcome,
            });
        }
    }

    /// Render the buffered suites.
    pub fn as_xml(&self) -> String {
        let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<testsuites>\n");
        for suite in &self.suites {
            let tests = suite.cases.len();
            let failures = suite.count(|o| matches!(o, CaseOutcome::Failed(_)));
            let errors = suite.count(|o| matches!(o, CaseOutcome::Errored(_)));
            let classname = escape(suite.file.as_deref().unwrap_or(""));
            let _ = write!(xml, "  <testsuite name=\"{}\"", escape(&suite.name));
            if suite.file.is_some() {
                let _ = write!(xml, " file=\"{}\"", classname);
            }
            let _ = writeln!(
                xml,
                " tests=\"{}\" failures=\"{}\" errors=\"{}\">",
                tests, failures, errors
            );
            for case in &suite.cases {
                let _ = write!(
                    xml,
                    "    <testcase name=\"{}\" classname=\"{}\"",
                    escape(&case.name),
                    classname
                );
                match &case.outcome {
                    CaseOutcome::Passed => xml.push_str("/>\n"),
                    CaseOutcome::Failed(message) => {
                        let message = escape(message);
                        let _ = writeln!(
                            xml,
                            ">\n      <failure message=\"{}\">{}</failure>\n    </testcase>",
                            message, message
                        );
                    }
                    CaseOutcome::Errored(message) => {
                        let message = escape(message);
                        let _ = writeln!(
                            xml,
                            ">\n      <error message=\"{}\">{}</error>\n    </testcase>",
                            message, message
                        );
                    }
                }
            }
            xml.push_str("  </testsuite>\n");
        }
        xml.push_str("</testsuites>\n");
        xml
    }
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c => escaped.push(c),
        }
    }
    escaped
}

impl Reporter for JunitReporter {
    fn change_file(&mut self, name: &str) {
        self.context.change_file(name);
        self.suite_open = false;
    }

    fn change_test(&mut self, name: &str) {
        self.context.change_test(name);
        self.suite_open = false;
    }

    fn add_comparison(&mut self, expression: &str, resolved: &str, success: bool) {
        let outcome = if success {
            CaseOutcome::Passed
        } else {
            CaseOutcome::Failed(format!(
                "The expression '{}', resolved as '{}', returned 'False', which is false",
                expression, resolved
            ))
        };
        self.push_case(expression, outcome);
    }

    fn add_exception(&mut self, expression: &str, error: &dyn Error) {
        self.push_case(
            expression,
            CaseOutcome::Errored(format!("The expression '{}' raised: {}", expression, error)),
        );
    }

    fn file_finish(&mut self) -> Result<(), ReportError> {
        if let Some(path) = self.output_path() {
            let write_xml = |path: &Path, xml: String| -> std::io::Result<()> {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(path, xml)
            };
            write_xml(&path, self.as_xml()).map_err(|source| ReportError::Write {
                path: path.clone(),
                source,
            })?;
            debug!("JUnit report written to {}", path.display());
        }
        self.suites.clear();
        self.suite_open = false;
        self.context.finish();
        Ok(())
    }
}
