// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! OPC UA transport abstraction layer.
//!
//! The listener does not speak the wire protocol itself. It drives an
//! [`OpcUaTransport`] that can connect, create one subscription, register
//! monitored items in batches and push publish results onto a channel as
//! [`Notification`]s.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::{NotificationError, OpcUaResult};
use crate::monitoring::MonitoredItemCreateRequest;
use crate::types::{StatusCode, TimestampsToReturn, Variant};

// =============================================================================
// TransportState
// =============================================================================

/// Connection state of the transport layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransportState {
    /// Transport is not connected.
    #[default]
    Disconnected,

    /// Transport is establishing connection.
    Connecting,

    /// Transport is connected and ready.
    Connected,

    /// Transport connection has failed.
    Failed,
}

impl TransportState {
    /// Returns `true` if the transport is connected.
    #[inline]
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for TransportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Connected => write!(f, "Connected"),
            Self::Failed => write!(f, "Failed"),
        }
    }
}

// =============================================================================
// SubscriptionParameters
// =============================================================================

/// Parameters for creating the subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionParameters {
    /// Publishing interval.
    pub publishing_interval: Duration,
    /// Lifetime count.
    pub lifetime_count: u32,
    /// Max keep-alive count.
    pub max_keep_alive_count: u32,
    /// Priority.
    pub priority: u8,
}

impl SubscriptionParameters {
    /// Creates parameters with the given publishing interval.
    pub fn new(publishing_interval: Duration) -> Self {
        Self {
            publishing_interval,
            lifetime_count: 10_000,
            max_keep_alive_count: 3_000,
            priority: 0,
        }
    }
}

// =============================================================================
// MonitoredItemCreateResult
// =============================================================================

/// Per-item result of a monitor call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonitoredItemCreateResult {
    /// Status of the registration.
    pub status: StatusCode,
    /// Server-assigned monitored item ID.
    pub monitored_item_id: u32,
    /// Sampling interval granted by the server, in milliseconds.
    pub revised_sampling_interval: f64,
    /// Queue size granted by the server.
    pub revised_queue_size: u32,
}

impl MonitoredItemCreateResult {
    /// Creates a good result echoing the request.
    pub fn good(monitored_item_id: u32, request: &MonitoredItemCreateRequest) -> Self {
        Self {
            status: StatusCode::GOOD,
            monitored_item_id,
            revised_sampling_interval: request.parameters.sampling_interval,
            revised_queue_size: request.parameters.queue_size,
        }
    }

    /// Creates a failed result.
    pub fn failed(status: StatusCode) -> Self {
        Self {
            status,
            monitored_item_id: 0,
            revised_sampling_interval: 0.0,
            revised_queue_size: 0,
        }
    }
}

// =============================================================================
// Notifications
// =============================================================================

/// A value with its status and timestamps.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataValue {
    /// Value, if any.
    pub value: Option<Variant>,
    /// Status of the value.
    pub status: StatusCode,
    /// Time the value was produced at the source.
    pub source_timestamp: Option<DateTime<Utc>>,
    /// Time the server observed the value.
    pub server_timestamp: Option<DateTime<Utc>>,
}

impl DataValue {
    /// Creates a good value without timestamps.
    pub fn good(value: Variant) -> Self {
        Self {
            value: Some(value),
            ..Default::default()
        }
    }

    /// Creates a value-less data value with the given status.
    pub fn with_status(status: StatusCode) -> Self {
        Self {
            status,
            ..Default::default()
        }
    }

    /// Sets both timestamps.
    pub fn with_timestamps(
        mut self,
        source: Option<DateTime<Utc>>,
        server: Option<DateTime<Utc>>,
    ) -> Self {
        self.source_timestamp = source;
        self.server_timestamp = server;
        self
    }
}

/// One changed item within a data change notification.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitoredItemNotification {
    /// Client handle of the monitored item.
    pub client_handle: u32,
    /// New value.
    pub value: DataValue,
}

/// Data change notification.
///
/// Items are assumed to be in chronological order as delivered by the
/// protocol stack; the listener does not re-check this.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataChangeNotification {
    /// Changed items.
    pub items: Vec<MonitoredItemNotification>,
}

/// Field values of one event, positionally matching the select clauses.
#[derive(Debug, Clone, PartialEq)]
pub struct EventFieldList {
    /// Client handle of the event monitored item.
    pub client_handle: u32,
    /// Field values; `None` for null.
    pub fields: Vec<Option<Variant>>,
}

/// Event notification.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EventNotificationList {
    /// Events.
    pub events: Vec<EventFieldList>,
}

/// Item delivered on the notification channel.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// The publish cycle reported an error.
    Error(NotificationError),
    /// Data change payload.
    DataChange(DataChangeNotification),
    /// Event payload.
    Event(EventNotificationList),
    /// Any other payload type.
    Other {
        /// Payload type name, for logging.
        type_name: String,
    },
    /// Publish result without payload.
    Empty,
}

impl Notification {
    /// Returns a short payload kind for logging.
    pub fn kind(&self) -> &str {
        match self {
            Self::Error(_) => "error",
            Self::DataChange(_) => "data_change",
            Self::Event(_) => "event",
            Self::Other { type_name } => type_name,
            Self::Empty => "empty",
        }
    }
}

/// Sender half of the notification channel.
pub type NotificationSender = mpsc::Sender<Notification>;

// =============================================================================
// OpcUaTransport Trait
// =============================================================================

/// Protocol client used by the listener.
///
/// Implementations own the session; the listener calls these methods from a
/// single task at a time.
#[async_trait]
pub trait OpcUaTransport: Send + Sync {
    /// Establishes the connection and session.
    async fn connect(&mut self) -> OpcUaResult<()>;

    /// Creates the subscription. Publish results are sent on `notifications`.
    ///
    /// Returns the subscription ID.
    async fn create_subscription(
        &mut self,
        params: SubscriptionParameters,
        notifications: NotificationSender,
    ) -> OpcUaResult<u32>;

    /// Registers a batch of monitored items on the subscription.
    ///
    /// Returns one result per request, in request order.
    async fn monitor_items(
        &mut self,
        timestamps: TimestampsToReturn,
        requests: &[MonitoredItemCreateRequest],
    ) -> OpcUaResult<Vec<MonitoredItemCreateResult>>;

    /// Cancels the subscription.
    async fn cancel_subscription(&mut self) -> OpcUaResult<()>;

    /// Closes the session and connection.
    async fn disconnect(&mut self) -> OpcUaResult<()>;

    /// Returns the current state.
    fn state(&self) -> TransportState;

    /// Returns `true` if connected.
    fn is_connected(&self) -> bool {
        self.state().is_connected()
    }
}

// =============================================================================
// Tests
// =============================================================================
