//! Command-line front end: clean, check or outline editor HTML.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use editor_core::{ConfigError, Normalizer, Options, ViolationKind};
use mimalloc::MiMalloc;
use serde::Serialize;
use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const DEFAULT_OUTLINE_CAP: usize = 500;

#[derive(Parser)]
#[command(name = "editable", about = "Normalize rich-text editor HTML", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Strip disallowed markup, repair the structure and print the result.
    Clean {
        #[command(flatten)]
        input: InputArgs,
        /// Wrap top-level inline content in default lines.
        #[arg(long)]
        require_format: bool,
    },
    /// Report structural violations as JSON without changing anything.
    Check {
        #[command(flatten)]
        input: InputArgs,
        /// Apply the textual tag filter before checking.
        #[arg(long)]
        strip: bool,
    },
    /// Print an indented node outline of the content.
    Outline {
        #[command(flatten)]
        input: InputArgs,
        /// Clean the content before outlining it.
        #[arg(long)]
        clean: bool,
        #[arg(long, default_value_t = DEFAULT_OUTLINE_CAP)]
        cap: usize,
    },
}

#[derive(Args)]
struct InputArgs {
    /// HTML file to read, or `-` for stdin.
    #[arg(default_value = "-")]
    file: PathBuf,
    /// TOML file with editor options.
    #[arg(long, value_name = "FILE")]
    options: Option<PathBuf>,
}

#[derive(Error, Debug)]
enum CliError {
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to write output: {0}")]
    Write(#[from] io::Error),

    #[error("failed to encode report: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct ViolationReport {
    kind: ViolationKind,
    tag: Option<String>,
    path: Vec<usize>,
}

fn read_source(path: &Path) -> Result<String, CliError> {
    let read_err = |source| CliError::Read {
        path: path.to_path_buf(),
        source,
    };
    if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf).map_err(read_err)?;
        return Ok(buf);
    }
    fs::read_to_string(path).map_err(read_err)
}

fn load_normalizer(options: Option<&Path>) -> Result<Normalizer, CliError> {
    let options = match options {
        Some(path) => Options::from_toml_str(&read_source(path)?)?,
        None => Options::default(),
    };
    Ok(Normalizer::new(options)?)
}

impl Command {
    fn input(&self) -> &InputArgs {
        match self {
            Command::Clean { input, .. }
            | Command::Check { input, .. }
            | Command::Outline { input, .. } => input,
        }
    }
}

fn check_report(normalizer: &Normalizer, source: &str, strip: bool) -> Vec<ViolationReport> {
    let source = if strip {
        normalizer.strip_disallowed(source)
    } else {
        source.into()
    };
    let dom = html::parse_fragment(&source);
    normalizer
        .check_structure(&dom, dom.document())
        .into_iter()
        .map(|v| ViolationReport {
            kind: v.kind,
            tag: v.tag,
            path: v.path,
        })
        .collect()
}

/// Runs one command against already loaded input. `Ok(false)` means the command ran but
/// found problems.
fn execute(
    command: &Command,
    normalizer: &Normalizer,
    source: &str,
    out: &mut impl Write,
) -> Result<bool, CliError> {
    match *command {
        Command::Clean { require_format, .. } => {
            writeln!(out, "{}", normalizer.clean(source, require_format))?;
            Ok(true)
        }
        Command::Check { strip, .. } => {
            let reports = check_report(normalizer, source, strip);
            log::info!(target: "editable", "{} violation(s) found", reports.len());
            serde_json::to_writer_pretty(&mut *out, &reports)?;
            writeln!(out)?;
            Ok(reports.is_empty())
        }
        Command::Outline { clean, cap, .. } => {
            let source = if clean {
                normalizer.clean(source, false)
            } else {
                source.to_string()
            };
            let dom = html::parse_fragment(&source);
            for line in html::debug::outline(&dom, dom.document(), cap) {
                writeln!(out, "{line}")?;
            }
            Ok(true)
        }
    }
}

fn run(command: &Command, out: &mut impl Write) -> Result<bool, CliError> {
    let input = command.input();
    let normalizer = load_normalizer(input.options.as_deref())?;
    let source = read_source(&input.file)?;
    execute(command, &normalizer, &source, out)
}

fn exit_status(result: &Result<bool, CliError>) -> u8 {
    match result {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(_) => 2,
    }
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    let result = run(&cli.command, &mut io::stdout().lock());
    if let Err(err) = &result {
        eprintln!("error: {err}");
    }
    ExitCode::from(exit_status(&result))
}
