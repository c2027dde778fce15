// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Notification processing loop.
//!
//! A single task owns the last-value cache. It drains the notification
//! channel, updates the cache and emits one measurement per changed item or
//! received event. Because nothing else touches the cache, it needs no lock;
//! only the handle registry is shared with the client.

use std::ops::ControlFlow;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use trap_core::{FieldValue, Measurement};

use crate::config::{ListenerConfig, OptionalField, TimestampSource};
use crate::event_filter::EventNodeMapping;
use crate::mapping::MappingTable;
use crate::types::{BuiltinType, StatusCode, TYPE_NAME_PREFIX};

use super::transport::{
    DataChangeNotification, DataValue, EventFieldList, EventNotificationList, Notification,
};

/// Measurement name of emitted events.
pub const EVENT_MEASUREMENT: &str = "opcua_event";

/// Field holding the status text of a data-change measurement.
pub const QUALITY_FIELD: &str = "Quality";

/// Field holding the value type when enabled.
pub const DATA_TYPE_FIELD: &str = "DataType";

/// Event field whose localized text is extracted.
pub const MESSAGE_FIELD: &str = "Message";

// =============================================================================
// Handle registry
// =============================================================================

/// What a client handle refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleTarget {
    /// Index into the mapping table.
    Data(usize),
    /// Index into the event mappings.
    Event(usize),
}

/// Shared handle lookup, written at registration and read while streaming.
pub type HandleRegistry = Arc<DashMap<u32, HandleTarget>>;

// =============================================================================
// LastValue
// =============================================================================

/// Last received state of one mapped point.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LastValue {
    /// Status of the last notification.
    pub quality: StatusCode,
    /// Last good value; `None` until one arrives.
    pub value: Option<FieldValue>,
    /// Server timestamp of the last good value.
    pub server_time: Option<DateTime<Utc>>,
    /// Source timestamp of the last good value.
    pub source_time: Option<DateTime<Utc>>,
    /// Built-in type of the last good value.
    pub data_type: Option<BuiltinType>,
}

// =============================================================================
// ProcessorOptions
// =============================================================================

/// Output settings of the processor.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessorOptions {
    /// Timestamp attached to data-change measurements.
    pub timestamp: TimestampSource,
    /// chrono format for date/time values.
    pub timestamp_format: String,
    /// Emit the `DataType` field.
    pub include_data_type: bool,
    /// Endpoint, attached to events as the `source` tag.
    pub endpoint: String,
}

impl ProcessorOptions {
    /// Extracts the options from a configuration.
    pub fn from_config(config: &ListenerConfig) -> Self {
        Self {
            timestamp: config.timestamp,
            timestamp_format: config.timestamp_format.clone(),
            include_data_type: config.has_optional_field(OptionalField::DataType),
            endpoint: config.endpoint.clone(),
        }
    }
}

// =============================================================================
// NotificationProcessor
// =============================================================================

/// Converts notifications into measurements.
pub struct NotificationProcessor {
    table: Arc<MappingTable>,
    events: Arc<Vec<EventNodeMapping>>,
    last_values: Vec<LastValue>,
    handles: HandleRegistry,
    data_tx: mpsc::Sender<Measurement>,
    event_tx: mpsc::Sender<Measurement>,
    options: ProcessorOptions,
    cancel: CancellationToken,
}

impl NotificationProcessor {
    /// Creates a processor with one empty cache slot per mapping.
    pub fn new(
        table: Arc<MappingTable>,
        events: Arc<Vec<EventNodeMapping>>,
        handles: HandleRegistry,
        data_tx: mpsc::Sender<Measurement>,
        event_tx: mpsc::Sender<Measurement>,
        options: ProcessorOptions,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            last_values: vec![LastValue::default(); table.len()],
            table,
            events,
            handles,
            data_tx,
            event_tx,
            options,
            cancel,
        }
    }

    /// Returns the cached state of a mapping.
    pub fn last_value(&self, index: usize) -> Option<&LastValue> {
        self.last_values.get(index)
    }

    /// Runs until cancelled, the channel closes or a fatal notification
    /// arrives.
    pub async fn run(mut self, mut notifications: mpsc::Receiver<Notification>) {
        tracing::debug!(endpoint = %self.options.endpoint, "Notification processor started");

        loop {
            tokio::select! {
                biased;

                _ = self.cancel.cancelled() => {
                    tracing::debug!("Notification processor cancelled");
                    break;
                }

                received = notifications.recv() => {
                    let Some(notification) = received else {
                        tracing::debug!("Notification channel closed");
                        break;
                    };
                    if self.handle(notification).await.is_break() {
                        break;
                    }
                }
            }
        }

        tracing::debug!(endpoint = %self.options.endpoint, "Notification processor stopped");
    }

    /// Processes one notification.
    pub async fn handle(&mut self, notification: Notification) -> ControlFlow<()> {
        match notification {
            Notification::Error(error) => {
                tracing::error!(error = %error, "Error in subscription notification");
            }
            Notification::Empty => {
                tracing::error!(
                    endpoint = %self.options.endpoint,
                    "Received notification without payload, stopping notification processing"
                );
                return ControlFlow::Break(());
            }
            Notification::DataChange(data) => self.handle_data_change(data).await,
            Notification::Event(events) => self.handle_events(events).await,
            Notification::Other { type_name } => {
                tracing::warn!(kind = %type_name, "Unexpected notification type");
            }
        }
        ControlFlow::Continue(())
    }

    async fn handle_data_change(&mut self, data: DataChangeNotification) {
        for item in data.items {
            let index = match self.handles.get(&item.client_handle).map(|t| *t) {
                Some(HandleTarget::Data(index)) => index,
                _ => {
                    tracing::warn!(handle = item.client_handle, "Data change for unknown handle");
                    continue;
                }
            };

            self.update_value(index, item.value);

            if let Some(measurement) = self.measurement_for(index) {
                if self.data_tx.send(measurement).await.is_err() {
                    tracing::debug!("Data receiver dropped, measurement discarded");
                }
            }
        }
    }

    /// Applies a data value to the cache.
    ///
    /// A non-good status only replaces the quality; the previous value and
    /// timestamps are kept.
    fn update_value(&mut self, index: usize, data: DataValue) {
        let Some(slot) = self.last_values.get_mut(index) else {
            return;
        };
        let previous = slot.value.clone();
        slot.quality = data.status;

        if !data.status.is_good() {
            if let Some(mapping) = self.table.get(index) {
                tracing::error!(
                    node_id = %mapping.id,
                    metric = %mapping.measurement,
                    tags = %mapping.tag_string(),
                    status = %data.status,
                    "Status not OK for node"
                );
            }
            return;
        }

        if let Some(value) = &data.value {
            slot.data_type = Some(value.builtin_type());
            slot.value = Some(value.to_field_value_with_format(&self.options.timestamp_format));
        }
        slot.server_time = data.server_timestamp;
        slot.source_time = data.source_timestamp;

        tracing::debug!(
            index,
            old = ?previous,
            new = ?slot.value,
            "Updated node value"
        );
    }

    /// Builds the measurement for a mapping from its cached state.
    pub fn measurement_for(&self, index: usize) -> Option<Measurement> {
        let mapping = self.table.get(index)?;
        let last = self.last_values.get(index)?;

        let timestamp = match self.options.timestamp {
            TimestampSource::Gather => Utc::now(),
            TimestampSource::Server => last.server_time.unwrap_or_default(),
            TimestampSource::Source => last.source_time.unwrap_or_default(),
        };

        let mut measurement = Measurement::new(&mapping.measurement, timestamp)
            .with_tag("id", &mapping.id);
        for (key, value) in &mapping.tags {
            measurement = measurement.with_tag(key, value);
        }

        if let Some(value) = &last.value {
            measurement = measurement.with_field(&mapping.field_name, value.clone());
        }
        measurement = measurement.with_field(QUALITY_FIELD, last.quality.to_string());

        if !last.quality.is_good() {
            tracing::debug!(
                metric = %mapping.measurement,
                field = %mapping.field_name,
                tags = %mapping.tag_string(),
                status = %last.quality,
                "Status not OK for node"
            );
        }

        if self.options.include_data_type {
            if let Some(data_type) = last.data_type {
                let name = data_type.qualified_name().replacen(TYPE_NAME_PREFIX, "", 1);
                measurement = measurement.with_field(DATA_TYPE_FIELD, name);
            }
        }

        Some(measurement)
    }

    async fn handle_events(&mut self, events: EventNotificationList) {
        for event in events.events {
            let index = match self.handles.get(&event.client_handle).map(|t| *t) {
                Some(HandleTarget::Event(index)) => index,
                _ => {
                    tracing::warn!(handle = event.client_handle, "Event for unknown handle");
                    continue;
                }
            };

            if let Some(measurement) = self.event_measurement(index, event) {
                if self.event_tx.send(measurement).await.is_err() {
                    tracing::debug!("Event receiver dropped, measurement discarded");
                }
            }
        }
    }

    /// Builds the measurement for one event.
    pub fn event_measurement(&self, index: usize, event: EventFieldList) -> Option<Measurement> {
        let mapping = self.events.get(index)?;

        let mut measurement = Measurement::new(EVENT_MEASUREMENT, Utc::now())
            .with_tag("node_id", mapping.node_id.to_string())
            .with_tag("source", &self.options.endpoint);

        for (position, value) in event.fields.into_iter().enumerate() {
            let Some(name) = mapping.fields.get(position) else {
                tracing::warn!(position, "Event field without configured name");
                continue;
            };
            let Some(value) = value else {
                tracing::warn!(field = %name, "Field {} has nil value", name);
                continue;
            };

            if name == MESSAGE_FIELD {
                match value.as_localized_text() {
                    Some(text) => {
                        measurement = measurement.with_field(name, text.text.clone());
                    }
                    None => {
                        tracing::warn!(
                            field = %name,
                            kind = %value.builtin_type(),
                            "Message field is not localized text, dropping it"
                        );
                    }
                }
                continue;
            }

            measurement = measurement.with_field(name, value.to_field_value());
        }

        Some(measurement)
    }
}

// =============================================================================
// Tests
// =============================================================================
