// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! CLI argument parsing and command definitions.
//!
//! - `run`: Start the API server (default)
//! - `validate`: Validate the configuration and policy files
//! - `hash-password`: Print an Argon2id hash for a bootstrap account
//! - `version`: Show version information

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

// =============================================================================
// Main CLI Structure
// =============================================================================

/// Campus administration API server.
#[derive(Parser, Debug)]
#[command(
    name = "campus",
    author = "Sylvex <contact@sylvex.io>",
    version = campus_api::VERSION,
    about = "University administration API with token authentication and role-based access",
    long_about = None,
    propagate_version = true
)]
pub struct Cli {
    /// Configuration file path
    #[arg(
        short,
        long,
        default_value = "campus.yaml",
        env = "CAMPUS_CONFIG",
        global = true
    )]
    pub config: PathBuf,

    /// Log level (trace, debug, info, warn, error). Overrides the config file.
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Log format. Overrides the config file.
    #[arg(long, env = "CAMPUS_LOG_FORMAT", global = true)]
    pub log_format: Option<LogFormat>,

    /// Enable quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

// =============================================================================
// Subcommands
// =============================================================================

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the API server
    ///
    /// This is the default command when no subcommand is specified.
    Run,

    /// Validate the configuration file
    ///
    /// Parses and validates the configuration, and loads the policy files
    /// when the policy engine is enabled, without starting the server.
    Validate(ValidateArgs),

    /// Hash a password for a bootstrap account
    ///
    /// Prints an Argon2id PHC string suitable for `accounts[].password_hash`.
    #[command(name = "hash-password")]
    HashPassword(HashPasswordArgs),

    /// Show detailed version information
    Version,
}

// =============================================================================
// Command Arguments
// =============================================================================

/// Arguments for the `validate` command.
#[derive(Args, Debug, Clone, Default)]
pub struct ValidateArgs {
    /// Show parsed configuration (secrets masked) after validation
    #[arg(short, long)]
    pub show_config: bool,

    /// Output format for validation results
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,

    /// Strict mode: treat warnings as errors
    #[arg(long)]
    pub strict: bool,
}

/// Arguments for the `hash-password` command.
#[derive(Args, Debug, Clone, Default)]
pub struct HashPasswordArgs {
    /// Password to hash
    #[arg(required_unless_present = "stdin")]
    pub password: Option<String>,

    /// Read the password from stdin
    #[arg(long)]
    pub stdin: bool,

    /// Memory cost in KiB
    #[arg(long)]
    pub memory_kib: Option<u32>,

    /// Number of passes
    #[arg(long)]
    pub iterations: Option<u32>,

    /// Degree of parallelism
    #[arg(long)]
    pub parallelism: Option<u32>,
}

// =============================================================================
// Enums
// =============================================================================

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON format for structured logging
    Json,
    /// Compact format for minimal output
    Compact,
}

impl From<campus_config::LogFormat> for LogFormat {
    fn from(format: campus_config::LogFormat) -> Self {
        match format {
            campus_config::LogFormat::Text => LogFormat::Text,
            campus_config::LogFormat::Json => LogFormat::Json,
            campus_config::LogFormat::Compact => LogFormat::Compact,
        }
    }
}

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON format for programmatic parsing
    Json,
}

// =============================================================================
// Helper Methods
// =============================================================================

impl Cli {
    /// Parse CLI arguments from the command line.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective command, defaulting to `Run` if none specified.
    pub fn effective_command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Run)
    }

    /// Check if verbose logging is enabled.
    pub fn is_verbose(&self) -> bool {
        self.verbose && !self.quiet
    }

    /// Get the effective log level: flags first, then `--log-level`, then
    /// the configured level.
    pub fn effective_log_level<'a>(&'a self, configured: &'a str) -> &'a str {
        if self.quiet {
            "warn"
        } else if self.verbose {
            "debug"
        } else {
            self.log_level.as_deref().unwrap_or(configured)
        }
    }

    /// Get the effective log format.
    pub fn effective_log_format(&self, configured: campus_config::LogFormat) -> LogFormat {
        self.log_format.unwrap_or_else(|| configured.into())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command() {
        let cli = Cli::parse_from(["campus"]);
        assert!(cli.command.is_none());
        assert!(matches!(cli.effective_command(), Commands::Run));
    }

    #[test]
    fn test_run_command() {
        let cli = Cli::parse_from(["campus", "run"]);
        assert!(matches!(cli.command, Some(Commands::Run)));
    }

    #[test]
    fn test_validate_command() {
        let cli = Cli::parse_from(["campus", "validate", "--show-config"]);
        if let Some(Commands::Validate(args)) = cli.command {
            assert!(args.show_config);
            assert_eq!(args.format, OutputFormat::Text);
        } else {
            panic!("Expected Validate command");
        }
    }

    #[test]
    fn test_hash_password_command() {
        let cli = Cli::parse_from(["campus", "hash-password", "s3cret", "--iterations", "3"]);
        if let Some(Commands::HashPassword(args)) = cli.command {
            assert_eq!(args.password.as_deref(), Some("s3cret"));
            assert_eq!(args.iterations, Some(3));
            assert!(!args.stdin);
        } else {
            panic!("Expected HashPassword command");
        }
    }

    #[test]
    fn test_hash_password_requires_input() {
        assert!(Cli::try_parse_from(["campus", "hash-password"]).is_err());
        assert!(Cli::try_parse_from(["campus", "hash-password", "--stdin"]).is_ok());
    }

    #[test]
    fn test_config_path() {
        let cli = Cli::parse_from(["campus", "-c", "/etc/campus/campus.yaml"]);
        assert_eq!(cli.config, PathBuf::from("/etc/campus/campus.yaml"));
    }

    #[test]
    fn test_log_level_precedence() {
        let cli = Cli::parse_from(["campus"]);
        assert_eq!(cli.effective_log_level("info"), "info");

        let cli = Cli::parse_from(["campus", "-l", "trace"]);
        assert_eq!(cli.effective_log_level("info"), "trace");

        let cli = Cli::parse_from(["campus", "-q", "-l", "trace"]);
        assert_eq!(cli.effective_log_level("info"), "warn");

        let cli = Cli::parse_from(["campus", "-v"]);
        assert_eq!(cli.effective_log_level("info"), "debug");
    }

    #[test]
    fn test_log_format_precedence() {
        let cli = Cli::parse_from(["campus"]);
        assert_eq!(
            cli.effective_log_format(campus_config::LogFormat::Json),
            LogFormat::Json
        );

        let cli = Cli::parse_from(["campus", "--log-format", "compact"]);
        assert_eq!(
            cli.effective_log_format(campus_config::LogFormat::Json),
            LogFormat::Compact
        );
    }
}
