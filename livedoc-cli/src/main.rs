//! Command-line interface for livedoc
//! Runs the markers of a document, or of every document under a directory, writes the rendered
//! pages and exits with the worst status found.
//!
//! Usage:
//!   livedoc `<source>` [-o `<dir>`] [-c `<config>`] [--junit `<dir>`] [--quiet]
//!
//! Exit codes: 0 when every comparison holds, 1 when one fails, 2 when an expression raised,
//! 3 when the run itself could not complete (bad configuration, unreadable files, ...).

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use livedoc_babel::{FormatRegistry, Runner, Status, Theme};
use livedoc_config::{LivedocConfig, Loader};
use livedoc_report::{ConsoleReporter, JunitReporter, Report, Reporter};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_FILE: &str = "livedoc.toml";
const FATAL_EXIT_CODE: u8 = 3;

fn build_cli() -> Command {
    Command::new("livedoc")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Runs the examples embedded in markdown and HTML documents")
        .arg_required_else_help(true)
        .arg(
            Arg::new("source")
                .help("Document or directory of documents to process")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .help("Directory for the rendered documents (default: output)"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("Configuration file (default: ./livedoc.toml when present)"),
        )
        .arg(
            Arg::new("junit")
                .long("junit")
                .value_name("DIR")
                .help("Write JUnit XML reports under DIR"),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .short('q')
                .help("Only log failures and errors")
                .action(ArgAction::SetTrue),
        )
}

fn main() -> ExitCode {
    let matches = build_cli().get_matches();
    init_tracing(matches.get_flag("quiet"));

    match run(&matches) {
        Ok(status) => ExitCode::from(status.exit_code() as u8),
        Err(err) => {
            error!("{:#}", err);
            ExitCode::from(FATAL_EXIT_CODE)
        }
    }
}

fn init_tracing(quiet: bool) {
    let default_level = if quiet { "warn" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(matches: &ArgMatches) -> Result<Status> {
    let source = matches
        .get_one::<String>("source")
        .map(PathBuf::from)
        .context("a source path is required")?;
    let config = load_config(matches)?;

    let mut theme = Theme::new().with_classes(&config.theme.classes);
    if let Some(generator) = &config.theme.generator {
        theme = theme.with_generator(generator.as_str());
    }

    let mut runner = Runner::new(FormatRegistry::with_theme(theme), build_report(&config))
        .with_fixture_files(
            config.fixtures.shared_file.as_str(),
            config.fixtures.companion_suffix.as_str(),
        );
    let status = runner
        .run(&source, &config.output.directory)
        .with_context(|| format!("failed to process {}", source.display()))?;
    Ok(status)
}

fn load_config(matches: &ArgMatches) -> Result<LivedocConfig> {
    let mut loader = match matches.get_one::<String>("config") {
        Some(path) => Loader::new().with_file(path),
        None => Loader::new().with_optional_file(DEFAULT_CONFIG_FILE),
    };
    if let Some(output) = matches.get_one::<String>("output") {
        loader = loader.set_override("output.directory", output.as_str())?;
    }
    if let Some(junit) = matches.get_one::<String>("junit") {
        loader = loader
            .set_override("report.junit", true)?
            .set_override("report.junit_directory", junit.as_str())?;
    }
    loader.build().context("invalid configuration")
}

fn build_report(config: &LivedocConfig) -> Report {
    let mut report = Report::new();
    report.register(config.report.console.then(|| boxed(ConsoleReporter::new())));
    report.register(
        config
            .report
            .junit
            .then(|| boxed(JunitReporter::new(&config.report.junit_directory))),
    );
    report
}

fn boxed(reporter: impl Reporter + 'static) -> Box<dyn Reporter> {
    Box::new(reporter)
}
