// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! OPC UA subscription listener for TRAP gateway.
//!
//! Subscribes to data changes and events on an OPC UA server and turns the
//! notifications into [`trap_core::Measurement`]s.
//!
//! # Features
//!
//! - Point mapping with group defaults, merged tags and duplicate detection
//! - Data change filters (trigger and deadband)
//! - Event filters with field selection and source-name allow-lists
//! - Connect failure policies: `error`, `retry`, `ignore`
//! - Last-value cache with quality tracking
//!
//! # Error Handling
//!
//! ```text
//! OpcUaError
//! ├── Connection    - Connect and disconnect failures
//! ├── Subscription  - Subscription creation and item registration
//! ├── Configuration - Invalid points, filters and event groups
//! └── Notification  - Runtime publish errors
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use trap_opcua_listener::{ListenerConfig, PointDefinition, SubscribeClient};
//!
//! let config = ListenerConfig::new("opc.tcp://localhost:4840")
//!     .with_node(PointDefinition::new("temp", "3", "s", "Temperature"));
//!
//! let mut client = SubscribeClient::new(&config, transport)?;
//! let mut data = client.start_data_stream().await?;
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod client;
pub mod config;
pub mod error;
pub mod event_filter;
pub mod mapping;
pub mod monitoring;
pub mod plan;
pub mod types;

pub use error::{
    ConfigurationError, ConnectionError, ErrorCode, ErrorSeverity, NotificationError, OpcUaError,
    OpcUaResult, SubscriptionError,
};

pub use types::{
    AttributeId, BuiltinType, EncodedNodeId, LocalizedText, MonitoringMode, NodeId,
    NodeIdEncoding, NodeIdentifier, QualifiedName, StatusCode, TimestampsToReturn, Variant,
};

pub use config::{
    ChangeFilterSettings, ConnectFailBehavior, EventGroupDefinition, GroupDefinition,
    ListenerConfig, MonitoringParameters, OptionalField, PointDefinition, TagMap,
    TimestampSource,
};

pub use mapping::{MappingTable, MetricKey, PointMapping};

pub use monitoring::{
    DataChangeFilter, DataChangeTrigger, DeadbandKind, MonitoredItemCreateRequest,
    MonitoringFilter, RequestedParameters,
};

pub use event_filter::{EventFilter, EventNodeMapping};

pub use plan::SubscriptionPlan;

pub use client::{
    ClientState, DataValue, Notification, OpcUaTransport, SubscribeClient, TransportState,
};
