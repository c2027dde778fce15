// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! CLI argument parsing and command definitions.
//!
//! - `validate`: Load and validate a listener configuration (default)
//! - `plan`: Print the monitored items a configuration would create

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

// =============================================================================
// Main CLI Structure
// =============================================================================

/// TRAP OPC UA subscription listener
///
/// Offline tooling for listener configurations: validation and dry-run
/// inspection of the subscription plan.
#[derive(Parser, Debug)]
#[command(
    name = "trap-listener",
    author = "Sylvex <contact@sylvex.io>",
    version = trap_core::VERSION,
    about = "TRAP OPC UA subscription listener",
    long_about = None,
    propagate_version = true
)]
pub struct Cli {
    /// Configuration file path
    #[arg(
        short,
        long,
        default_value = "listener.toml",
        env = "TRAP_CONFIG",
        global = true
    )]
    pub config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        short,
        long,
        default_value = "info",
        env = "TRAP_LOG_LEVEL",
        global = true
    )]
    pub log_level: String,

    /// Log format (text, json, compact)
    #[arg(long, default_value = "text", env = "TRAP_LOG_FORMAT", global = true)]
    pub log_format: LogFormat,

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
    /// Validate the configuration file
    ///
    /// Loads the file, resolves placeholders, validates it and builds the
    /// subscription plan without connecting to a server.
    Validate(ValidateArgs),

    /// Show the subscription plan
    ///
    /// Prints every point mapping and every event monitored item the
    /// configuration would register.
    Plan(PlanArgs),
}

// =============================================================================
// Command Arguments
// =============================================================================

/// Arguments for the `validate` command.
#[derive(Args, Debug, Clone, Default)]
pub struct ValidateArgs {
    /// Output format for validation results
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,

    /// Strict mode: treat warnings as errors
    #[arg(long)]
    pub strict: bool,
}

/// Arguments for the `plan` command.
#[derive(Args, Debug, Clone, Default)]
pub struct PlanArgs {
    /// Output format for the plan
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
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

    /// Get the effective command, defaulting to `validate`.
    pub fn effective_command(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or_else(|| Commands::Validate(ValidateArgs::default()))
    }

    /// Get the effective log level based on flags.
    pub fn effective_log_level(&self) -> &str {
        if self.quiet {
            "warn"
        } else if self.verbose {
            "debug"
        } else {
            &self.log_level
        }
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
        let cli = Cli::parse_from(["trap-listener"]);
        assert!(cli.command.is_none());
        assert!(matches!(cli.effective_command(), Commands::Validate(_)));
    }

    #[test]
    fn test_validate_command() {
        let cli = Cli::parse_from(["trap-listener", "validate", "-c", "plant.yaml", "--strict"]);
        assert_eq!(cli.config, PathBuf::from("plant.yaml"));
        match cli.command {
            Some(Commands::Validate(args)) => {
                assert!(args.strict);
                assert_eq!(args.format, OutputFormat::Text);
            }
            other => panic!("Expected Validate command, got {:?}", other),
        }
    }

    #[test]
    fn test_plan_command_json() {
        let cli = Cli::parse_from(["trap-listener", "plan", "--format", "json"]);
        match cli.command {
            Some(Commands::Plan(args)) => assert_eq!(args.format, OutputFormat::Json),
            other => panic!("Expected Plan command, got {:?}", other),
        }
    }

    #[test]
    fn test_log_flags() {
        let cli = Cli::parse_from(["trap-listener", "--log-format", "json", "-l", "trace", "plan"]);
        assert_eq!(cli.log_format, LogFormat::Json);
        assert_eq!(cli.effective_log_level(), "trace");
    }

    #[test]
    fn test_quiet_overrides_level() {
        let cli = Cli::parse_from(["trap-listener", "-q", "-l", "debug"]);
        assert_eq!(cli.effective_log_level(), "warn");

        let cli = Cli::parse_from(["trap-listener", "-v"]);
        assert_eq!(cli.effective_log_level(), "debug");
    }
}
