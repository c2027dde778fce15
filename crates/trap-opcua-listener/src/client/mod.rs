// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Subscription client.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      SubscribeClient                            │
//! │        (connect policy, subscription, item registration)        │
//! └─────────────────────────────────────────────────────────────────┘
//!            │ monitor_items                  ▲ handle registry
//!            ▼                                │
//! ┌─────────────────────────┐    ┌───────────────────────────────────┐
//! │     OpcUaTransport      │───▶│       NotificationProcessor       │
//! │  (protocol client)      │    │  (last-value cache, measurements) │
//! └─────────────────────────┘    └───────────────────────────────────┘
//!                                       │ data          │ events
//!                                       ▼               ▼
//!                                  mpsc::Receiver<Measurement>
//! ```
//!
//! # Examples
//!
//! ```rust,ignore
//! use trap_opcua_listener::{ListenerConfig, SubscribeClient};
//!
//! let mut client = SubscribeClient::new(&config, transport)?;
//! if let Some(mut data) = client.start_data_stream().await? {
//!     while let Some(measurement) = data.recv().await {
//!         println!("{}", measurement);
//!     }
//! }
//! if let Some(done) = client.stop().await {
//!     done.await?;
//! }
//! ```

mod processor;
mod subscribe;
mod transport;

pub use processor::{
    HandleRegistry, HandleTarget, LastValue, NotificationProcessor, ProcessorOptions,
    DATA_TYPE_FIELD, EVENT_MEASUREMENT, MESSAGE_FIELD, QUALITY_FIELD,
};
pub use subscribe::{ClientState, SubscribeClient};
pub use transport::{
    DataChangeNotification, DataValue, EventFieldList, EventNotificationList,
    MonitoredItemCreateResult, MonitoredItemNotification, Notification, NotificationSender,
    OpcUaTransport, SubscriptionParameters, TransportState,
};
