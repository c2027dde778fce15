// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Error types for the OPC UA subscription listener.
//!
//! Errors are grouped by the phase that raises them, which also decides how
//! the caller reacts:
//!
//! ```text
//! OpcUaError
//! ├── Configuration - Invalid, missing or duplicate point/filter definitions
//! │                   (raised at client construction, never retried)
//! ├── Connection    - Transport/session could not be established
//! │                   (handled by the connect-fail behavior)
//! ├── Subscription  - Subscription creation or monitored item registration
//! │                   (aborts the affected stream's startup)
//! └── Notification  - Per-notification faults reported by the transport
//!                     (logged and skipped by the processor)
//! ```
//!
//! # Examples
//!
//! ```
//! use trap_opcua_listener::error::{OpcUaError, ConfigurationError, ErrorSeverity};
//!
//! let error = OpcUaError::configuration(ConfigurationError::missing_field("endpoint"));
//!
//! assert!(!error.is_retryable());
//! assert_eq!(error.severity(), ErrorSeverity::Critical);
//! assert_eq!(error.error_code().to_string(), "UA-0802");
//! ```

use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::Level;

use crate::types::StatusCode;

// =============================================================================
// OpcUaError - Main Error Type
// =============================================================================

/// The main error type for the listener.
#[derive(Debug, Error)]
pub enum OpcUaError {
    /// Connection-related errors.
    #[error("{0}")]
    Connection(#[from] ConnectionError),

    /// Subscription and monitored item registration errors.
    #[error("{0}")]
    Subscription(#[from] SubscriptionError),

    /// Configuration errors.
    #[error("{0}")]
    Configuration(#[from] ConfigurationError),

    /// Runtime notification errors.
    #[error("{0}")]
    Notification(#[from] NotificationError),
}

impl OpcUaError {
    // =========================================================================
    // Factory Methods
    // =========================================================================

    /// Creates a connection error.
    #[inline]
    pub fn connection(error: ConnectionError) -> Self {
        Self::Connection(error)
    }

    /// Creates a subscription error.
    #[inline]
    pub fn subscription(error: SubscriptionError) -> Self {
        Self::Subscription(error)
    }

    /// Creates a configuration error.
    #[inline]
    pub fn configuration(error: ConfigurationError) -> Self {
        Self::Configuration(error)
    }

    /// Creates a notification error.
    #[inline]
    pub fn notification(error: NotificationError) -> Self {
        Self::Notification(error)
    }

    /// Creates a connect failed error.
    pub fn connect_failed(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connection(ConnectionError::connect_failed(endpoint, message))
    }

    /// Creates a not connected error.
    pub fn not_connected() -> Self {
        Self::Connection(ConnectionError::NotConnected)
    }

    /// Creates a monitored item failed error.
    pub fn monitored_item_failed(node_id: impl Into<String>, status: StatusCode) -> Self {
        Self::Subscription(SubscriptionError::monitored_item_failed(node_id, status))
    }

    // =========================================================================
    // Error Properties
    // =========================================================================

    /// Returns `true` if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connection(e) => e.is_retryable(),
            Self::Subscription(e) => e.is_retryable(),
            Self::Notification(_) => true,
            Self::Configuration(_) => false,
        }
    }

    /// Returns the suggested retry delay for this error.
    ///
    /// Returns `None` if the error is not retryable.
    pub fn suggested_retry_delay(&self) -> Option<Duration> {
        if !self.is_retryable() {
            return None;
        }

        match self {
            Self::Connection(e) => Some(e.suggested_retry_delay()),
            Self::Subscription(_) => Some(Duration::from_secs(1)),
            _ => None,
        }
    }

    /// Returns the severity level of this error.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Connection(e) => e.severity(),
            Self::Subscription(e) => e.severity(),
            Self::Notification(_) => ErrorSeverity::Warning,
            Self::Configuration(_) => ErrorSeverity::Critical,
        }
    }

    /// Returns the error category for logging.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Connection(_) => "connection",
            Self::Subscription(_) => "subscription",
            Self::Configuration(_) => "configuration",
            Self::Notification(_) => "notification",
        }
    }

    /// Returns a unique error code for this error.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Connection(e) => e.error_code(),
            Self::Subscription(e) => e.error_code(),
            Self::Configuration(e) => e.error_code(),
            Self::Notification(e) => e.error_code(),
        }
    }

    /// Returns recovery hints for this error.
    pub fn recovery_hints(&self) -> Vec<&'static str> {
        match self {
            Self::Connection(e) => e.recovery_hints(),
            Self::Subscription(e) => e.recovery_hints(),
            Self::Configuration(e) => e.recovery_hints(),
            Self::Notification(_) => vec!["Check the server diagnostics for the failing subscription"],
        }
    }

    /// Returns the tracing level for this error.
    pub fn tracing_level(&self) -> Level {
        self.severity().to_tracing_level()
    }

    /// Logs this error with appropriate level and context.
    pub fn log(&self, context: &str) {
        let code = self.error_code();

        match self.tracing_level() {
            Level::ERROR => tracing::error!(
                error_code = %code,
                category = self.category(),
                context = context,
                retryable = self.is_retryable(),
                "{self}"
            ),
            Level::WARN => tracing::warn!(
                error_code = %code,
                category = self.category(),
                context = context,
                retryable = self.is_retryable(),
                "{self}"
            ),
            _ => tracing::debug!(
                error_code = %code,
                category = self.category(),
                context = context,
                retryable = self.is_retryable(),
                "{self}"
            ),
        }
    }
}

// =============================================================================
// ConnectionError
// =============================================================================

/// Connection-related errors.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// Connecting to the endpoint failed.
    #[error("Failed to connect to OPC UA server '{endpoint}': {message}")]
    ConnectFailed {
        /// Target endpoint.
        endpoint: String,
        /// Error message.
        message: String,
    },

    /// Operation requires an established connection.
    #[error("Not connected to OPC UA server")]
    NotConnected,

    /// Closing the connection failed.
    #[error("Disconnecting from server failed: {message}")]
    DisconnectFailed {
        /// Error message.
        message: String,
    },
}

impl ConnectionError {
    /// Creates a connect failed error.
    pub fn connect_failed(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConnectFailed {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Creates a disconnect failed error.
    pub fn disconnect_failed(message: impl Into<String>) -> Self {
        Self::DisconnectFailed {
            message: message.into(),
        }
    }

    /// Returns `true` if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::DisconnectFailed { .. })
    }

    /// Returns the suggested retry delay.
    pub fn suggested_retry_delay(&self) -> Duration {
        match self {
            Self::ConnectFailed { .. } => Duration::from_secs(5),
            _ => Duration::from_secs(1),
        }
    }

    /// Returns the severity level.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::ConnectFailed { .. } => ErrorSeverity::Error,
            Self::NotConnected | Self::DisconnectFailed { .. } => ErrorSeverity::Warning,
        }
    }

    /// Returns the error code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::ConnectFailed { .. } => ErrorCode::new(1, 1),
            Self::NotConnected => ErrorCode::new(1, 2),
            Self::DisconnectFailed { .. } => ErrorCode::new(1, 3),
        }
    }

    /// Returns recovery hints.
    pub fn recovery_hints(&self) -> Vec<&'static str> {
        match self {
            Self::ConnectFailed { .. } => vec![
                "Check that the OPC UA server is running",
                "Verify the endpoint URL",
                "Set connect_fail_behavior to 'retry' to keep trying",
            ],
            Self::NotConnected => vec!["Start the client before registering items"],
            Self::DisconnectFailed { .. } => vec!["The server may already have closed the session"],
        }
    }
}

// =============================================================================
// SubscriptionError
// =============================================================================

/// Subscription creation and monitored item registration errors.
#[derive(Debug, Error)]
pub enum SubscriptionError {
    /// Subscription creation failed.
    #[error("Failed to create subscription: {message}")]
    CreationFailed {
        /// Error message.
        message: String,
    },

    /// The batch monitor call itself failed.
    #[error("Failed to start monitoring {kind}: {message}")]
    MonitorFailed {
        /// Batch kind ("items" or "event stream").
        kind: &'static str,
        /// Error message.
        message: String,
    },

    /// A single monitored item was rejected by the server.
    #[error("Creating monitored item for node '{node_id}' failed with status code: {status}")]
    MonitoredItemFailed {
        /// Node ID, or `?` when unknown.
        node_id: String,
        /// Status returned by the server.
        status: StatusCode,
    },

    /// The server returned a different number of results than requested.
    #[error("Monitor call returned {actual} results for {expected} requests")]
    ResultCountMismatch {
        /// Requested items.
        expected: usize,
        /// Returned results.
        actual: usize,
    },

    /// Cancelling the subscription failed.
    #[error("Cancelling OPC UA subscription failed: {message}")]
    CancelFailed {
        /// Error message.
        message: String,
    },
}

impl SubscriptionError {
    /// Creates a subscription creation failed error.
    pub fn creation_failed(message: impl Into<String>) -> Self {
        Self::CreationFailed {
            message: message.into(),
        }
    }

    /// Creates a monitor failed error.
    pub fn monitor_failed(kind: &'static str, message: impl Into<String>) -> Self {
        Self::MonitorFailed {
            kind,
            message: message.into(),
        }
    }

    /// Creates a monitored item failed error.
    pub fn monitored_item_failed(node_id: impl Into<String>, status: StatusCode) -> Self {
        Self::MonitoredItemFailed {
            node_id: node_id.into(),
            status,
        }
    }

    /// Creates a cancel failed error.
    pub fn cancel_failed(message: impl Into<String>) -> Self {
        Self::CancelFailed {
            message: message.into(),
        }
    }

    /// Returns `true` if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::CreationFailed { .. } | Self::MonitorFailed { .. }
        )
    }

    /// Returns the severity level.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::CancelFailed { .. } => ErrorSeverity::Warning,
            _ => ErrorSeverity::Error,
        }
    }

    /// Returns the error code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::CreationFailed { .. } => ErrorCode::new(6, 1),
            Self::MonitorFailed { .. } => ErrorCode::new(6, 2),
            Self::MonitoredItemFailed { .. } => ErrorCode::new(6, 4),
            Self::ResultCountMismatch { .. } => ErrorCode::new(6, 5),
            Self::CancelFailed { .. } => ErrorCode::new(6, 6),
        }
    }

    /// Returns recovery hints.
    pub fn recovery_hints(&self) -> Vec<&'static str> {
        match self {
            Self::CreationFailed { .. } => vec![
                "Check server subscription limits",
                "Verify the subscription interval",
            ],
            Self::MonitoredItemFailed { .. } => vec![
                "Verify the node ID exists on the server",
                "Check that the node supports the requested filter",
            ],
            _ => vec!["Check subscription configuration"],
        }
    }
}

// =============================================================================
// ConfigurationError
// =============================================================================

/// Configuration errors, raised before any connection attempt.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// Invalid node ID.
    #[error("Invalid node ID '{node_id}': {reason}")]
    InvalidNodeId {
        /// The invalid node ID.
        node_id: String,
        /// Reason.
        reason: String,
    },

    /// Missing required field.
    #[error("Missing required field: {field}")]
    MissingField {
        /// Field name.
        field: String,
    },

    /// A point definition failed structural validation.
    #[error("{reason}")]
    InvalidPoint {
        /// Reason.
        reason: String,
    },

    /// Two points resolve to the same measurement, field and tag set.
    #[error("name {field:?} is duplicated (metric name {measurement:?}, tags {tags:?})")]
    DuplicatePoint {
        /// Field name.
        field: String,
        /// Measurement name.
        measurement: String,
        /// Sorted tag string.
        tags: String,
    },

    /// Invalid change filter.
    #[error("{reason}, node '{node_id}'")]
    InvalidFilter {
        /// Offending node identifier.
        node_id: String,
        /// Reason.
        reason: String,
    },

    /// Invalid event filter.
    #[error("failed to create event filter: {reason}")]
    InvalidEventFilter {
        /// Reason.
        reason: String,
    },

    /// Invalid legacy tag list.
    #[error("{reason}")]
    InvalidTags {
        /// Reason.
        reason: String,
    },

    /// Invalid value.
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue {
        /// Field name.
        field: String,
        /// Reason.
        reason: String,
    },
}

impl ConfigurationError {
    /// Creates an invalid node ID error.
    pub fn invalid_node_id(node_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidNodeId {
            node_id: node_id.into(),
            reason: reason.into(),
        }
    }

    /// Creates a missing field error.
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Creates an invalid point error.
    pub fn invalid_point(reason: impl Into<String>) -> Self {
        Self::InvalidPoint {
            reason: reason.into(),
        }
    }

    /// Creates a duplicate point error.
    pub fn duplicate_point(
        field: impl Into<String>,
        measurement: impl Into<String>,
        tags: impl Into<String>,
    ) -> Self {
        Self::DuplicatePoint {
            field: field.into(),
            measurement: measurement.into(),
            tags: tags.into(),
        }
    }

    /// Creates an invalid change filter error.
    pub fn invalid_filter(node_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidFilter {
            node_id: node_id.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid event filter error.
    pub fn invalid_event_filter(reason: impl Into<String>) -> Self {
        Self::InvalidEventFilter {
            reason: reason.into(),
        }
    }

    /// Creates an invalid tags error.
    pub fn invalid_tags(reason: impl Into<String>) -> Self {
        Self::InvalidTags {
            reason: reason.into(),
        }
    }

    /// Creates an invalid value error.
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Returns the error code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::InvalidNodeId { .. } => ErrorCode::new(8, 1),
            Self::MissingField { .. } => ErrorCode::new(8, 2),
            Self::InvalidPoint { .. } => ErrorCode::new(8, 3),
            Self::DuplicatePoint { .. } => ErrorCode::new(8, 4),
            Self::InvalidFilter { .. } => ErrorCode::new(8, 5),
            Self::InvalidEventFilter { .. } => ErrorCode::new(8, 6),
            Self::InvalidTags { .. } => ErrorCode::new(8, 7),
            Self::InvalidValue { .. } => ErrorCode::new(8, 8),
        }
    }

    /// Returns recovery hints.
    pub fn recovery_hints(&self) -> Vec<&'static str> {
        match self {
            Self::InvalidNodeId { .. } => vec![
                "Use format: ns=<index>;<type>=<value>",
                "Types: i (numeric), s (string), g (guid), b (opaque)",
            ],
            Self::DuplicatePoint { .. } => vec![
                "Give each point a unique field name",
                "Or distinguish the points with different tags",
            ],
            Self::InvalidFilter { .. } => vec![
                "trigger: Status, StatusValue or StatusValueTimestamp",
                "deadband_type: Absolute or Percent",
                "deadband_value must be set and non-negative",
            ],
            _ => vec!["Check the listener configuration"],
        }
    }
}

// =============================================================================
// NotificationError
// =============================================================================

/// Faults delivered on the notification channel.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NotificationError {
    /// The server reported a bad status for the publish cycle.
    #[error("Publish failed with status {status}")]
    Status {
        /// Status code.
        status: StatusCode,
    },

    /// The transport reported a fault.
    #[error("Notification transport fault: {message}")]
    Transport {
        /// Error message.
        message: String,
    },
}

impl NotificationError {
    /// Creates a transport fault.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Returns the error code.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Status { .. } => ErrorCode::new(10, 1),
            Self::Transport { .. } => ErrorCode::new(10, 2),
        }
    }
}

// =============================================================================
// ErrorSeverity
// =============================================================================

/// Error severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    /// Informational - no action required.
    Info,
    /// Warning - action may be required.
    Warning,
    /// Error - action required, but recoverable.
    Error,
    /// Critical - immediate action required.
    Critical,
}

impl ErrorSeverity {
    /// Converts to tracing level.
    pub fn to_tracing_level(self) -> Level {
        match self {
            Self::Info => Level::INFO,
            Self::Warning => Level::WARN,
            Self::Error | Self::Critical => Level::ERROR,
        }
    }

    /// Returns the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// ErrorCode
// =============================================================================

/// Structured error code for categorization.
///
/// Format: `UA-XXYY` where XX is category and YY is specific error.
///
/// Categories:
/// - 1: Connection
/// - 6: Subscription
/// - 8: Configuration
/// - 10: Notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode {
    /// Category.
    pub category: u8,
    /// Specific error within category.
    pub code: u8,
}

impl ErrorCode {
    /// Creates a new error code.
    pub const fn new(category: u8, code: u8) -> Self {
        Self { category, code }
    }

    /// Returns the full error code as a u16.
    pub fn as_u16(&self) -> u16 {
        ((self.category as u16) << 8) | (self.code as u16)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UA-{:02X}{:02X}", self.category, self.code)
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// A Result type with OpcUaError.
pub type OpcUaResult<T> = Result<T, OpcUaError>;

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_error_retryable() {
        assert!(ConnectionError::connect_failed("opc.tcp://localhost:4840", "refused").is_retryable());
        assert!(ConnectionError::NotConnected.is_retryable());
        assert!(!ConnectionError::disconnect_failed("closed").is_retryable());
    }

    #[test]
    fn test_configuration_error_not_retryable() {
        let error = OpcUaError::configuration(ConfigurationError::invalid_point(
            "empty node namespace not allowed",
        ));
        assert!(!error.is_retryable());
        assert!(error.suggested_retry_delay().is_none());
        assert_eq!(error.severity(), ErrorSeverity::Critical);
        assert_eq!(error.category(), "configuration");
    }

    #[test]
    fn test_duplicate_point_message() {
        let error = ConfigurationError::duplicate_point("temp", "opcua", "a=1, b=2");
        assert_eq!(
            error.to_string(),
            r#"name "temp" is duplicated (metric name "opcua", tags "a=1, b=2")"#
        );
    }

    #[test]
    fn test_invalid_filter_names_node() {
        let error = ConfigurationError::invalid_filter("ns=3;s=Temperature", "deadband_value was not set");
        assert_eq!(
            error.to_string(),
            "deadband_value was not set, node 'ns=3;s=Temperature'"
        );
    }

    #[test]
    fn test_monitored_item_failed() {
        let error = OpcUaError::monitored_item_failed("ns=2;i=1", StatusCode::BAD_NODE_ID_UNKNOWN);
        assert_eq!(error.category(), "subscription");
        assert!(error.to_string().contains("ns=2;i=1"));
        assert!(error.to_string().contains("BadNodeIdUnknown"));
        assert_eq!(error.error_code(), ErrorCode::new(6, 4));
    }

    #[test]
    fn test_error_code() {
        let code = ErrorCode::new(1, 5);
        assert_eq!(code.to_string(), "UA-0105");
        assert_eq!(code.as_u16(), 0x0105);
        assert_eq!(ErrorCode::new(10, 2).to_string(), "UA-0A02");
    }

    #[test]
    fn test_recovery_hints() {
        let error = OpcUaError::connect_failed("opc.tcp://localhost:4840", "refused");
        assert!(error.recovery_hints().iter().any(|h| h.contains("running")));

        let error = ConfigurationError::invalid_node_id("bad", "missing namespace");
        assert!(error.recovery_hints().iter().any(|h| h.contains("ns=")));
    }

    #[test]
    fn test_error_severity_levels() {
        assert_eq!(ErrorSeverity::Warning.to_tracing_level(), Level::WARN);
        assert_eq!(ErrorSeverity::Critical.to_tracing_level(), Level::ERROR);
        assert_eq!(
            OpcUaError::notification(NotificationError::transport("eof")).severity(),
            ErrorSeverity::Warning
        );
    }
}
