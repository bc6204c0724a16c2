//! Test reporting for livedoc runs
//!
//!     The document processor reports every comparison and every failed marker to a [Report],
//!     which fans each event out, synchronously and in registration order, to the registered
//!     [Reporter]s.
//!
//!     Events arrive in this shape for every processed file:
//!
//!         test_file("guide/intro.md")
//!         test_name("Installation")       (one per heading)
//!         add_comparison(..) / add_exception(..)
//!         file_finish()
//!
//!     The file structure :
//!     .
//!     ├── console.rs          # Per-test status lines through tracing
//!     ├── error.rs            # ReportError
//!     ├── junit.rs            # JUnit XML, one document per source file
//!     ├── report.rs           # Report fan-out
//!     ├── reporter.rs         # Reporter trait and the file/test context every reporter keeps
//!     └── lib.rs

pub mod console;
pub mod error;
pub mod junit;
pub mod report;
pub mod reporter;

pub use console::{ConsoleReporter, ConsoleStatus, ConsoleSummary};
pub use error::ReportError;
pub use junit::JunitReporter;
pub use report::Report;
pub use reporter::{ReportContext, Reporter, DEFAULT_TEST_NAME};
