// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! SafeConsole CLI - session and API usage tooling for the SafeConsole client.
//!
//! # Examples
//!
//! ```bash
//! # Store a session obtained from the login flow
//! safeconsole login --id u-1 --name Alice --email alice@example.com \
//!     --role safety_manager --token "$TOKEN"
//!
//! # Who is logged in
//! safeconsole whoami
//!
//! # Sync and show API usage
//! safeconsole usage
//!
//! # Issue metered calls
//! safeconsole request /api/incidents /api/training
//!
//! # Dry-run the classifier
//! safeconsole classify /api/auth/login /api/permits --format json
//! ```

mod commands;
mod context;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use safeconsole_store::LogLevel;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use commands::{classify, config, request, session, usage};

// ============================================================================
// CLI Definition
// ============================================================================

/// SafeConsole CLI - session and API usage tooling.
#[derive(Parser)]
#[command(name = "safeconsole")]
#[command(about = "Session and API usage tooling for SafeConsole")]
#[command(long_about = r#"
SafeConsole keeps the signed-in session and meters calls to the safety
management backend against the subscription's monthly and daily quotas.

Counted modules:
  Incidents, Training, Audits, Permit to Work, Medical, PPE, RCA,
  Environmental, Governance, Unsafety, Reports, Other

Never counted: auth, dashboard/KPI, chart views, uploads.

Examples:
  safeconsole whoami                 # Session status
  safeconsole usage                  # Sync and show quota
  safeconsole request /api/incidents # Metered call
  safeconsole classify <URL>         # Dry-run classification
"#)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run. If none, runs 'usage' by default.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output format (text or json).
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Settings file to use instead of the default.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Keep the session in memory only.
    #[arg(long, global = true)]
    pub ephemeral: bool,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Quiet mode (minimal output).
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Store the identity and token of a signed-in user.
    Login(session::LoginArgs),

    /// Clear the stored session.
    Logout,

    /// Show the current session.
    Whoami,

    /// Show API usage (default if no command specified).
    #[command(visible_alias = "u")]
    Usage(usage::UsageArgs),

    /// Send metered requests to the backend.
    #[command(visible_alias = "r")]
    Request(request::RequestArgs),

    /// Show how calls would be counted, without sending them.
    #[command(visible_alias = "c")]
    Classify(classify::ClassifyArgs),

    /// Manage configuration.
    Config(config::ConfigArgs),
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text with colors.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// CLI exit codes.
#[repr(i32)]
pub enum ExitCode {
    /// General error.
    Error = 1,
}

// ============================================================================
// Logging Setup
// ============================================================================

/// Filter directive: `--verbose` wins over the configured level.
fn log_directive(verbose: bool, level: LogLevel) -> String {
    if verbose {
        "safeconsole=debug,info".to_string()
    } else {
        format!("safeconsole={level}")
    }
}

fn setup_logging(verbose: bool, quiet: bool, level: LogLevel) {
    if quiet {
        return;
    }

    let filter = EnvFilter::new(log_directive(verbose, level));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose || cli.quiet {
        LogLevel::default()
    } else {
        context::load_settings(&cli).await.get().await.log_level
    };
    setup_logging(cli.verbose, cli.quiet, level);

    let result = match &cli.command {
        Some(Commands::Login(args)) => session::login(args, &cli).await,
        Some(Commands::Logout) => session::logout(&cli).await,
        Some(Commands::Whoami) => session::whoami(&cli).await,
        Some(Commands::Usage(args)) => usage::run(args, &cli).await,
        Some(Commands::Request(args)) => request::run(args, &cli).await,
        Some(Commands::Classify(args)) => classify::run(args, &cli).await,
        Some(Commands::Config(args)) => config::run(args, &cli).await,
        None => usage::run(&usage::UsageArgs::default(), &cli).await,
    };

    if let Err(e) = result {
        if !cli.quiet {
            eprintln!("Error: {e:#}");
        }
        std::process::exit(ExitCode::Error as i32);
    }

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_directive_follows_settings() {
        assert_eq!(log_directive(false, LogLevel::Warn), "safeconsole=warn");
        assert_eq!(log_directive(false, LogLevel::Trace), "safeconsole=trace");
        assert_eq!(
            log_directive(true, LogLevel::Error),
            "safeconsole=debug,info"
        );
    }

    #[test]
    fn test_cli_defaults_to_usage() {
        let cli = Cli::try_parse_from(["safeconsole", "--format", "json"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.format, OutputFormat::Json);
    }
}
