//! # evs CLI entry point
//!
//! Parses command-line arguments, installs logging, and dispatches to the
//! subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use evs_cli::ddl::{run_ddl, DdlArgs};
use evs_cli::logging::{self, LogFormat};
use evs_cli::validate::{run_validate, ValidateArgs};

/// Event validation and Hive table generation driven by one JSON schema.
#[derive(Parser, Debug)]
#[command(name = "evs", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Append logs to `logger_<YYYYMMDD>.log` in this directory instead of stderr.
    #[arg(long, env = "EVS_LOG_DIR", global = true)]
    log_dir: Option<PathBuf>,

    /// Log line format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate an event against the schema and queue it when valid.
    Validate(ValidateArgs),

    /// Print (and optionally write) the CREATE EXTERNAL TABLE statement.
    Ddl(DdlArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose, cli.log_format, cli.log_dir.as_deref()) {
        eprintln!("error: {e:#}");
        return ExitCode::from(2);
    }

    let repo_root = resolve_repo_root().unwrap_or_else(|| {
        tracing::debug!("no schemas/ directory above the working directory; using it as root");
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    });
    tracing::debug!(repo_root = %repo_root.display(), "resolved repository root");

    let result = match cli.command {
        Commands::Validate(args) => run_validate(&args, &repo_root),
        Commands::Ddl(args) => run_ddl(&args, &repo_root),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}

/// Walk up from the current directory to the first one holding `schemas/`.
fn resolve_repo_root() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    let mut dir = cwd.as_path();
    loop {
        if dir.join("schemas").is_dir() {
            return Some(dir.to_path_buf());
        }
        dir = dir.parent()?;
    }
}
