// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Error types for the listener CLI.

use thiserror::Error;
use trap_config::ConfigError;
use trap_opcua_listener::OpcUaError;

/// Result type alias for trap-bin operations.
pub type BinResult<T> = Result<T, BinError>;

/// Errors that can occur in the listener CLI.
#[derive(Debug, Error)]
pub enum BinError {
    /// Configuration problem found by the CLI itself.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Configuration file could not be loaded.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// The listener rejected the configuration.
    #[error("Listener error: {0}")]
    Listener(#[from] OpcUaError),

    /// Output could not be rendered.
    #[error("Output error: {0}")]
    Output(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),

    /// Error with context.
    #[error("{context}: {source}")]
    WithContext {
        /// The context description.
        context: String,
        /// The underlying error.
        #[source]
        source: Box<BinError>,
    },
}

impl BinError {
    /// Creates a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Creates an output error.
    pub fn output(msg: impl Into<String>) -> Self {
        Self::Output(msg.into())
    }

    /// Adds context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Returns the exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Configuration(_) => 1,
            Self::Config(e) if e.is_io_error() => 4,
            Self::Config(_) => 1,
            Self::Listener(_) => 2,
            Self::Output(_) => 3,
            Self::Io(_) => 4,
            Self::WithContext { source, .. } => source.exit_code(),
        }
    }
}

impl From<std::io::Error> for BinError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<std::fmt::Error> for BinError {
    fn from(err: std::fmt::Error) -> Self {
        Self::Output(err.to_string())
    }
}

impl From<serde_json::Error> for BinError {
    fn from(err: serde_json::Error) -> Self {
        Self::Output(err.to_string())
    }
}

// =============================================================================
// Error Reporting
// =============================================================================

/// Prints an error and its cause chain to stderr.
pub fn report_error(error: &BinError) {
    eprintln!("Error: {}", error);

    if let BinError::Listener(listener) = error {
        for hint in listener.recovery_hints() {
            eprintln!("  Hint: {}", hint);
        }
    }

    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        eprintln!("  Caused by: {}", cause);
        source = cause.source();
    }
}

/// Reports an error and exits with the appropriate code.
pub fn report_error_and_exit(error: BinError) -> ! {
    report_error(&error);
    std::process::exit(error.exit_code())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use trap_opcua_listener::ConfigurationError;

    #[test]
    fn test_error_creation() {
        let err = BinError::config("no points");
        assert_eq!(err.to_string(), "Configuration error: no points");
    }

    #[test]
    fn test_fmt_error_is_output() {
        let err = BinError::from(std::fmt::Error);
        assert!(matches!(err, BinError::Output(_)));
    }

    #[test]
    fn test_error_with_context() {
        let err = BinError::config("inner error").with_context("listener.toml");
        assert_eq!(err.to_string(), "listener.toml: Configuration error: inner error");
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(BinError::config("test").exit_code(), 1);
        assert_eq!(BinError::output("test").exit_code(), 3);
        assert_eq!(BinError::Io("test".to_string()).exit_code(), 4);
        assert_eq!(
            BinError::from(ConfigError::file_not_found("missing.toml")).exit_code(),
            4
        );
        assert_eq!(
            BinError::from(ConfigError::validation("endpoint", "empty")).exit_code(),
            1
        );

        let listener = OpcUaError::configuration(ConfigurationError::missing_field("endpoint"));
        assert_eq!(BinError::from(listener).exit_code(), 2);
    }
}
