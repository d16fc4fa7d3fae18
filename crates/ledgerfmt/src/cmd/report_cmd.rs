//! ledgerfmt-report - Print register and balance reports from a journal.
//!
//! # Usage
//!
//! ```bash
//! ledgerfmt-report journal.json register
//! ledgerfmt-report journal.json register -F '%d %-20p %12t\n' --invert
//! ledgerfmt-report journal.json balance --depth 2 --options report.json
//! ```
//!
//! # Reports
//!
//! - `register` - One line per transaction with running totals
//! - `balance` - The account tree with subtree totals
//!
//! Options are taken from `--options FILE` (JSON, see
//! [`ReportOptions`]) and then overridden by flags. Format strings given on
//! the command line understand `\n`, `\t` and `\\`.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ledgerfmt_report::{balance_report, register_report, ReportError, ReportOptions};
use std::fs;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use crate::diagnostics;
use crate::journal_file::load_journal;

/// Print reports from ledgerfmt journal files.
#[derive(Parser, Debug)]
#[command(name = "ledgerfmt-report")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// The JSON journal to report on
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// The report to generate
    #[command(subcommand)]
    pub report: Report,

    /// Read report options from a JSON file
    #[arg(long, value_name = "OPTIONS", global = true)]
    pub options: Option<PathBuf>,

    /// Value expression shown by %t and summed by the balance report
    #[arg(short = 't', long = "value", value_name = "EXPR", global = true)]
    pub value_expr: Option<String>,

    /// Total expression shown by %T
    #[arg(short = 'T', long = "total", value_name = "EXPR", global = true)]
    pub total_expr: Option<String>,

    /// Only print rows matching this predicate
    #[arg(short, long, value_name = "EXPR", global = true)]
    pub display: Option<String>,

    /// Only report on transactions matching this predicate
    #[arg(short, long, value_name = "EXPR", global = true)]
    pub limit: Option<String>,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Report selection.
#[derive(Subcommand, Debug)]
pub enum Report {
    /// One line per transaction with running totals
    Register {
        /// Format of the first transaction of each entry
        #[arg(short = 'F', long, value_name = "FORMAT")]
        format: Option<String>,
        /// Format of the other transactions of an entry
        #[arg(long, value_name = "FORMAT")]
        next_format: Option<String>,
        /// Negate amounts
        #[arg(long)]
        invert: bool,
        /// Print one subtotal line per entry
        #[arg(long)]
        collapse: bool,
    },
    /// The account tree with totals
    Balance {
        /// Format of each account line
        #[arg(short = 'F', long, value_name = "FORMAT")]
        format: Option<String>,
        /// Deepest account level to print
        #[arg(long, value_name = "N")]
        depth: Option<usize>,
        /// Also print the root account
        #[arg(long)]
        top: bool,
    },
}

/// Main entry point for the report command.
pub fn main() -> ExitCode {
    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let mut stdout = io::stdout().lock();
    let mut stderr = io::stderr().lock();
    let color = io::stderr().is_terminal();
    match run(&args, &mut stdout, &mut stderr, color) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}

/// Run the command, writing the report to `out` and diagnostics to `err`.
///
/// # Errors
///
/// Fails when the journal or options cannot be loaded, an option does not
/// compile (after a diagnostic is written to `err`), or rendering fails.
pub fn run<W, E>(args: &Args, out: &mut W, err: &mut E, color: bool) -> Result<()>
where
    W: Write + ?Sized,
    E: Write + ?Sized,
{
    let options = build_options(args)?;
    let journal = load_journal(&args.file)?;

    let result = match &args.report {
        Report::Register { .. } => register_report(&journal, &options, &mut *out).map(drop),
        Report::Balance { .. } => balance_report(&journal, &options, &mut *out).map(drop),
    };

    if let Err(ReportError::Options(error)) = &result {
        diagnostics::report_options_error(error, &options, color, err)?;
    }
    result.context("failed to print report")
}

/// Merge the options file and the command-line flags.
///
/// # Errors
///
/// Fails when the options file cannot be read or parsed.
pub fn build_options(args: &Args) -> Result<ReportOptions> {
    let mut options = match &args.options {
        Some(path) => load_options(path)?,
        None => ReportOptions::default(),
    };

    if let Some(expr) = &args.value_expr {
        options.value_expr = Some(expr.clone());
    }
    if let Some(expr) = &args.total_expr {
        options.total_expr = Some(expr.clone());
    }
    if let Some(expr) = &args.display {
        options.display_predicate = Some(expr.clone());
    }
    if let Some(expr) = &args.limit {
        options.limit_predicate = Some(expr.clone());
    }

    match &args.report {
        Report::Register {
            format,
            next_format,
            invert,
            collapse,
        } => {
            if let Some(format) = format {
                options.first_line_format = unescape(format);
            }
            if let Some(format) = next_format {
                options.next_lines_format = unescape(format);
            }
            options.inverted |= invert;
            options.collapsed |= collapse;
        }
        Report::Balance { format, depth, top } => {
            if let Some(format) = format {
                options.balance_format = unescape(format);
            }
            if let Some(depth) = depth {
                options.max_depth = *depth;
            }
            options.report_top |= top;
        }
    }
    Ok(options)
}

fn load_options(path: &Path) -> Result<ReportOptions> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid options in {}", path.display()))
}

/// Expand `\n`, `\t` and `\\`; any other backslash is kept as is.
#[must_use]
pub fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
