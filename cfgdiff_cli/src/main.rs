use anyhow::{bail, Context};
use cfgdiff_common::{load_config, AppConfig, ComparisonReport, FileKind, WalkReport};
use cfgdiff_core::{
    compare_ini_documents, compare_service, detect_file, extract_service, print_report,
    CompareOptions, DirectoryWalker, ExtractorRegistry, FilePairComparator, IniDocument,
};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cfgdiff")]
#[command(version)]
#[command(about = "Compare INI, YAML, JSON and plain-text configuration files", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two files, or walk two directories
    Diff {
        /// Origin file or directory
        left: PathBuf,

        /// Destination file or directory
        right: PathBuf,

        /// Also walk the destination against the origin
        #[arg(short, long)]
        reverse: bool,

        /// Do not print per-file reports
        #[arg(short, long)]
        quiet: bool,

        /// Show comparator logs
        #[arg(short, long)]
        verbose: bool,

        /// Disable ANSI colors in output
        #[arg(long)]
        no_color: bool,

        /// Do not write `<left>.diff` report files
        #[arg(long)]
        no_report: bool,

        /// Ignore patterns for directory walks (can be specified multiple times)
        #[arg(short, long)]
        ignore: Vec<String>,

        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the detected format of a file
    Detect {
        file: PathBuf,
    },
    /// Compare a service's expected configuration with its live file
    Service {
        /// Service name as configured in cfgdiff.toml
        name: String,

        /// Expected configuration, in the service's extractor format
        #[arg(long)]
        expected: PathBuf,

        /// Live INI configuration of the service
        #[arg(long)]
        live: PathBuf,

        /// Also compare the live file against the expected configuration
        #[arg(long)]
        side_by_side: bool,

        /// Show comparator logs
        #[arg(short, long)]
        verbose: bool,

        /// Disable ANSI colors in output
        #[arg(long)]
        no_color: bool,
    },
}

/// Final state of a command, mapped to the process exit status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Identical,
    Differences,
    Failures,
}

impl Outcome {
    fn exit_code(self) -> u8 {
        match self {
            Outcome::Identical => 0,
            Outcome::Differences => 1,
            Outcome::Failures => 2,
        }
    }

    fn from_walk(report: &WalkReport) -> Self {
        if report.has_failures() {
            Outcome::Failures
        } else if report.has_differences() {
            Outcome::Differences
        } else {
            Outcome::Identical
        }
    }

    fn from_reports<'a>(reports: impl IntoIterator<Item = &'a ComparisonReport>) -> Self {
        if reports.into_iter().any(ComparisonReport::has_differences) {
            Outcome::Differences
        } else {
            Outcome::Identical
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr so reports and JSON output stay clean on stdout
    let default_level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    match run(cli.command) {
        Ok(outcome) => ExitCode::from(outcome.exit_code()),
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(Outcome::Failures.exit_code())
        }
    }
}

fn run(command: Commands) -> anyhow::Result<Outcome> {
    match command {
        Commands::Diff {
            left,
            right,
            reverse,
            quiet,
            verbose,
            no_color,
            no_report,
            ignore,
            json,
        } => {
            let config = load_app_config()?;
            let options = compare_options(&config, verbose, no_report);
            let color = use_color(no_color);
            if left.is_dir() || right.is_dir() {
                let mut patterns = config.ignore_patterns.clone();
                patterns.extend(ignore);
                run_walk(&left, &right, reverse || config.reverse, options, &patterns, json)
            } else {
                run_file_pair(&left, &right, options, quiet, color, json)
            }
        }
        Commands::Detect { file } => {
            let kind = detect_file(&file)
                .with_context(|| format!("Failed to open file: '{}'", file.display()))?;
            println!("{}", kind);
            Ok(Outcome::Identical)
        }
        Commands::Service {
            name,
            expected,
            live,
            side_by_side,
            verbose,
            no_color,
        } => {
            let config = load_app_config()?;
            let options = compare_options(&config, verbose, true);
            run_service(&config, &name, &expected, &live, side_by_side, options, use_color(no_color))
        }
    }
}

fn load_app_config() -> anyhow::Result<AppConfig> {
    let loaded = load_config().context("Failed to load configuration")?;
    if loaded.exists {
        debug!(
            "Loaded configuration from {}{}",
            loaded.path.display(),
            if loaded.portable { " (portable)" } else { "" }
        );
    } else {
        debug!("No configuration at {}, using defaults", loaded.path.display());
    }
    Ok(loaded.config)
}

/// Command-line flags override the configuration file
fn compare_options(config: &AppConfig, verbose: bool, no_report: bool) -> CompareOptions {
    CompareOptions::new()
        .with_verbose(verbose || config.verbose)
        .with_write_report(config.write_report && !no_report)
}

fn use_color(no_color: bool) -> bool {
    !no_color && std::io::stdout().is_terminal()
}

#[derive(Serialize)]
struct JsonFileReport<'a> {
    left: String,
    right: String,
    left_format: FileKind,
    right_format: FileKind,
    different: bool,
    report: &'a ComparisonReport,
}

#[derive(Serialize)]
struct JsonWalkReport<'a> {
    origin: String,
    destination: String,
    different: bool,
    report: &'a WalkReport,
}

fn run_file_pair(
    left: &Path,
    right: &Path,
    options: CompareOptions,
    quiet: bool,
    color: bool,
    json: bool,
) -> anyhow::Result<Outcome> {
    let comparator = FilePairComparator::new(options);
    let report = comparator.compare_files(left, right)?;

    if json {
        let output = JsonFileReport {
            left: left.display().to_string(),
            right: right.display().to_string(),
            left_format: detect_file(left)?,
            right_format: detect_file(right)?,
            different: report.has_differences(),
            report: &report,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !quiet {
        print_report(&report, color)?;
    }

    Ok(Outcome::from_reports([&report]))
}

fn run_walk(
    origin: &Path,
    destination: &Path,
    reverse: bool,
    options: CompareOptions,
    ignore_patterns: &[String],
    json: bool,
) -> anyhow::Result<Outcome> {
    if !origin.is_dir() || !destination.is_dir() {
        bail!(
            "Cannot compare a file with a directory: '{}' and '{}'",
            origin.display(),
            destination.display()
        );
    }

    info!("Comparing:");
    info!("  Origin:      {}", origin.display());
    info!("  Destination: {}", destination.display());

    let walker = DirectoryWalker::new(options, ignore_patterns);
    let report = walker.walk(origin, destination, reverse)?;

    if json {
        let output = JsonWalkReport {
            origin: origin.display().to_string(),
            destination: destination.display().to_string(),
            different: report.has_differences(),
            report: &report,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print!("{}", report.render());
    }

    Ok(Outcome::from_walk(&report))
}

fn run_service(
    config: &AppConfig,
    name: &str,
    expected: &Path,
    live: &Path,
    side_by_side: bool,
    options: CompareOptions,
    color: bool,
) -> anyhow::Result<Outcome> {
    let mapping = config.services.get(name).ok_or_else(|| {
        cfgdiff_common::CfgDiffError::UnknownService(format!(
            "{}, add a [services.{}] table to the configuration file",
            name, name
        ))
    })?;

    let expected_raw = std::fs::read(expected)
        .with_context(|| format!("Failed to open file: '{}'", expected.display()))?;
    let live_raw = std::fs::read(live)
        .with_context(|| format!("Failed to open file: '{}'", live.display()))?;
    let expected_label = expected.display().to_string();
    let live_label = live.display().to_string();

    let registry = ExtractorRegistry::with_builtins();
    let mut reports = vec![compare_service(
        &registry,
        name,
        mapping,
        &expected_raw,
        &live_raw,
        &expected_label,
        &live_label,
        &options,
    )?];

    if side_by_side {
        let reverse = options.scoped(|| -> anyhow::Result<ComparisonReport> {
            let expected = extract_service(&registry, name, mapping, &expected_raw)?;
            let live_doc = IniDocument::parse(&live_raw, &live_label)?;
            Ok(compare_ini_documents(&live_doc, &expected, &live_label, &expected_label))
        })?;
        reports.push(reverse);
    }

    for report in &reports {
        print_report(report, color)?;
    }
    Ok(Outcome::from_reports(&reports))
}
