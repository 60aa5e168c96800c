//! qasmparse Command-Line Interface
//!
//! Parses, validates, inspects and formats `OpenQASM` 3.0 files.
//!
//! ```text
//! qasmparse parse circuit.qasm            # report diagnostics
//! qasmparse validate -v *.qasm            # first error per file
//! qasmparse -f tree ast -d 2 circuit.qasm # box-drawing syntax tree
//! qasmparse -f json stats circuit.qasm    # statistics as JSON
//! qasmparse format circuit.qasm -o out.qasm
//! ```

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::style;
use qasmparser::QasmParser;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::common::{OutputFormat, Session};
use commands::{ast, format, parse, stats, validate, version};
use config::FlagOverrides;

/// qasmparse - error-tolerant OpenQASM 3.0 parser
#[derive(Parser)]
#[command(name = "qasmparse")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Output file (stdout if omitted)
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    format: OutputFormat,

    /// Flag OpenQASM 2 syntax and non-3 versions
    #[arg(long, global = true)]
    strict: bool,

    /// Maximum diagnostics per file (0 or less for unlimited)
    #[arg(long, global = true, allow_negative_numbers = true)]
    max_errors: Option<i64>,

    /// Do not collect comments
    #[arg(long, global = true)]
    no_comments: bool,

    /// Do not resynchronize after syntax errors
    #[arg(long, global = true)]
    no_recovery: bool,

    /// YAML file with parser options
    #[arg(long, global = true, env = "QASMPARSER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse files and report diagnostics
    Parse {
        /// Input files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Only report files with errors
        #[arg(short, long)]
        errors_only: bool,
    },

    /// Check files and report the first error in each
    Validate {
        /// Input files
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Print the syntax tree
    Ast {
        /// Input files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Maximum depth to print (root is 0)
        #[arg(short, long)]
        depth: Option<usize>,

        /// Show at most 10 children per node
        #[arg(short, long)]
        compact: bool,
    },

    /// Show program statistics
    Stats {
        /// Input files
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Print files in canonical layout
    Format {
        /// Input files
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Show version information
    Version,
}

fn run(cli: Cli) -> anyhow::Result<()> {
    if matches!(cli.command, Commands::Version) {
        version::execute();
        return Ok(());
    }

    let flags = FlagOverrides {
        strict: cli.strict,
        max_errors: cli.max_errors,
        no_comments: cli.no_comments,
        no_recovery: cli.no_recovery,
    };
    let options = config::load_options(cli.config.as_deref(), &flags)?;
    let mut session = Session::new(
        QasmParser::with_options(options),
        cli.format,
        cli.verbose,
        cli.output.as_deref(),
    )?;

    // Execute command
    let result = match &cli.command {
        Commands::Parse { files, errors_only } => parse::execute(&mut session, files, *errors_only),
        Commands::Validate { files } => validate::execute(&mut session, files),
        Commands::Ast {
            files,
            depth,
            compact,
        } => ast::execute(&mut session, files, *depth, *compact),
        Commands::Stats { files } => stats::execute(&mut session, files),
        Commands::Format { files } => format::execute(&mut session, files),
        Commands::Version => Ok(()),
    };

    // Reports are flushed even when some files failed.
    session.finish()?;
    result
}

fn main() {
    let cli = Cli::parse();

    // Setup logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Handle errors
    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_parse_files_and_flags() {
        let cli = Cli::try_parse_from([
            "qasmparse",
            "--strict",
            "--max-errors",
            "-1",
            "parse",
            "-e",
            "a.qasm",
            "b.qasm",
        ])
        .unwrap();
        assert!(cli.strict);
        assert_eq!(cli.max_errors, Some(-1));
        match cli.command {
            Commands::Parse { files, errors_only } => {
                assert!(errors_only);
                assert_eq!(files, [Path::new("a.qasm"), Path::new("b.qasm")]);
            }
            _ => panic!("Expected Parse command"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["qasmparse", "ast", "x.qasm", "-f", "tree", "-d", "2", "-c"])
                .unwrap();
        assert_eq!(cli.format, OutputFormat::Tree);
        match cli.command {
            Commands::Ast { depth, compact, .. } => {
                assert_eq!(depth, Some(2));
                assert!(compact);
            }
            _ => panic!("Expected Ast command"),
        }
    }

    #[test]
    fn test_verbose_count() {
        let cli = Cli::try_parse_from(["qasmparse", "-vv", "version"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_files_are_required() {
        assert!(Cli::try_parse_from(["qasmparse", "validate"]).is_err());
    }

    #[test]
    fn test_unknown_format() {
        assert!(Cli::try_parse_from(["qasmparse", "-f", "yaml", "stats", "a.qasm"]).is_err());
    }

    #[test]
    fn test_no_subcommand() {
        assert!(Cli::try_parse_from(["qasmparse"]).is_err());
    }
}
