// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Monitored item requests.
//!
//! Translates mapped points and event mappings into the requests handed to
//! the transport's monitor call. Each request carries a client handle that
//! the notification processor later resolves back to its mapping.

use std::fmt;
use std::time::Duration;

use crate::config::{ChangeFilterSettings, MonitoringParameters};
use crate::error::{ConfigurationError, OpcUaError, OpcUaResult};
use crate::event_filter::{build_event_filter, EventFilter, EventNodeMapping};
use crate::mapping::MappingTable;
use crate::types::{AttributeId, MonitoringMode, NodeId};

/// Queue size used when a point does not set one.
pub const DEFAULT_QUEUE_SIZE: u32 = 10;

/// Discard policy used when a point does not set one.
pub const DEFAULT_DISCARD_OLDEST: bool = true;

// =============================================================================
// Filters
// =============================================================================

/// Condition under which a data change is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataChangeTrigger {
    /// Report status changes only.
    Status,
    /// Report status or value changes.
    StatusValue,
    /// Report status, value or source timestamp changes.
    StatusValueTimestamp,
}

impl DataChangeTrigger {
    /// Parses the configuration name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Status" => Some(Self::Status),
            "StatusValue" => Some(Self::StatusValue),
            "StatusValueTimestamp" => Some(Self::StatusValueTimestamp),
            _ => None,
        }
    }

    /// Returns the protocol enumeration value.
    pub const fn value(&self) -> u32 {
        match self {
            Self::Status => 0,
            Self::StatusValue => 1,
            Self::StatusValueTimestamp => 2,
        }
    }
}

/// Deadband kind of a data change filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeadbandKind {
    /// Absolute change threshold.
    Absolute,
    /// Percentage of the engineering-unit range.
    Percent,
}

impl DeadbandKind {
    /// Parses the configuration name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Absolute" => Some(Self::Absolute),
            "Percent" => Some(Self::Percent),
            _ => None,
        }
    }

    /// Returns the protocol enumeration value.
    pub const fn value(&self) -> u32 {
        match self {
            Self::Absolute => 1,
            Self::Percent => 2,
        }
    }
}

/// Validated data change filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataChangeFilter {
    /// Trigger.
    pub trigger: DataChangeTrigger,
    /// Deadband kind.
    pub deadband: DeadbandKind,
    /// Deadband threshold, non-negative.
    pub deadband_value: f64,
}

impl DataChangeFilter {
    /// Validates raw settings.
    ///
    /// The returned message does not name the node; callers add it.
    pub fn from_settings(settings: &ChangeFilterSettings) -> Result<Self, String> {
        let trigger = DataChangeTrigger::from_name(&settings.trigger)
            .ok_or_else(|| format!("trigger '{}' not supported", settings.trigger))?;
        let deadband = DeadbandKind::from_name(&settings.deadband_type)
            .ok_or_else(|| format!("deadband_type '{}' not supported", settings.deadband_type))?;
        let deadband_value = settings
            .deadband_value
            .ok_or_else(|| "deadband_value was not set".to_string())?;
        if deadband_value < 0.0 {
            return Err("negative deadband_value not supported".to_string());
        }
        Ok(Self {
            trigger,
            deadband,
            deadband_value,
        })
    }
}

/// Filter payload attached to a monitored item.
#[derive(Debug, Clone, PartialEq)]
pub enum MonitoringFilter {
    /// Data change filter.
    DataChange(DataChangeFilter),
    /// Event filter.
    Event(EventFilter),
}

// =============================================================================
// MonitoredItemCreateRequest
// =============================================================================

/// Requested monitoring parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestedParameters {
    /// Client handle.
    pub client_handle: u32,
    /// Sampling interval in milliseconds.
    pub sampling_interval: f64,
    /// Queue size.
    pub queue_size: u32,
    /// Discard oldest on overflow.
    pub discard_oldest: bool,
    /// Optional filter.
    pub filter: Option<MonitoringFilter>,
}

/// Request to create one monitored item.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitoredItemCreateRequest {
    /// Node to monitor.
    pub node_id: NodeId,
    /// Attribute to monitor.
    pub attribute: AttributeId,
    /// Monitoring mode.
    pub monitoring_mode: MonitoringMode,
    /// Requested parameters.
    pub parameters: RequestedParameters,
}

impl MonitoredItemCreateRequest {
    /// Creates a reporting request with protocol defaults.
    pub fn with_defaults(node_id: NodeId, attribute: AttributeId, client_handle: u32) -> Self {
        Self {
            node_id,
            attribute,
            monitoring_mode: MonitoringMode::Reporting,
            parameters: RequestedParameters {
                client_handle,
                sampling_interval: 0.0,
                queue_size: DEFAULT_QUEUE_SIZE,
                discard_oldest: DEFAULT_DISCARD_OLDEST,
                filter: None,
            },
        }
    }

    /// Returns the client handle.
    #[inline]
    pub fn client_handle(&self) -> u32 {
        self.parameters.client_handle
    }

    /// Applies per-point parameters.
    ///
    /// Queue size and discard policy only override the defaults when set.
    pub fn apply(&mut self, params: &MonitoringParameters) -> Result<(), ConfigurationError> {
        self.parameters.sampling_interval = millis(params.sampling_interval);

        if let Some(queue_size) = params.queue_size {
            self.parameters.queue_size = queue_size;
        }
        if let Some(discard_oldest) = params.discard_oldest {
            self.parameters.discard_oldest = discard_oldest;
        }
        if let Some(settings) = &params.data_change_filter {
            let filter = DataChangeFilter::from_settings(settings).map_err(|reason| {
                ConfigurationError::invalid_filter(self.node_id.to_string(), reason)
            })?;
            self.parameters.filter = Some(MonitoringFilter::DataChange(filter));
        }
        Ok(())
    }
}

impl fmt::Display for MonitoredItemCreateRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} ({} ms, queue {})",
            self.parameters.client_handle,
            self.node_id,
            self.parameters.sampling_interval,
            self.parameters.queue_size
        )
    }
}

fn millis(duration: Duration) -> f64 {
    duration.as_millis() as f64
}

// =============================================================================
// Translation
// =============================================================================

/// Builds one data-change request per mapping.
///
/// Returns the parsed node IDs alongside the requests, both indexed by
/// mapping position; the position is also the client handle.
pub fn build_data_requests(
    table: &MappingTable,
) -> OpcUaResult<(Vec<NodeId>, Vec<MonitoredItemCreateRequest>)> {
    let mut node_ids = Vec::with_capacity(table.len());
    let mut requests = Vec::with_capacity(table.len());

    for (index, (mapping, point)) in table.iter().enumerate() {
        let node_id: NodeId = mapping.id.parse()?;
        let handle = client_handle(index)?;

        let mut request =
            MonitoredItemCreateRequest::with_defaults(node_id.clone(), AttributeId::Value, handle);
        request
            .apply(&point.monitoring_params)
            .map_err(OpcUaError::configuration)?;

        node_ids.push(node_id);
        requests.push(request);
    }

    tracing::debug!(items = requests.len(), "Monitored item requests created");
    Ok((node_ids, requests))
}

/// Builds one event request per event mapping.
///
/// Handles start at `handle_offset` so that event items never share a
/// handle with data items on the same subscription.
pub fn build_event_requests(
    mappings: &[EventNodeMapping],
    handle_offset: u32,
) -> OpcUaResult<Vec<MonitoredItemCreateRequest>> {
    let mut requests = Vec::with_capacity(mappings.len());

    for (index, mapping) in mappings.iter().enumerate() {
        let handle = client_handle(index)?
            .checked_add(handle_offset)
            .ok_or_else(handle_overflow)?;

        let mut request = MonitoredItemCreateRequest::with_defaults(
            mapping.node_id.clone(),
            AttributeId::EventNotifier,
            handle,
        );
        if !mapping.sampling_interval.is_zero() {
            request.parameters.sampling_interval = millis(mapping.sampling_interval);
        }
        if let Some(queue_size) = mapping.queue_size {
            request.parameters.queue_size = queue_size;
        }
        let filter = build_event_filter(mapping).map_err(OpcUaError::configuration)?;
        request.parameters.filter = Some(MonitoringFilter::Event(filter));

        requests.push(request);
    }

    tracing::debug!(items = requests.len(), "Event streaming requests created");
    Ok(requests)
}

fn client_handle(index: usize) -> OpcUaResult<u32> {
    u32::try_from(index).map_err(|_| handle_overflow())
}

fn handle_overflow() -> OpcUaError {
    OpcUaError::configuration(ConfigurationError::invalid_value(
        "nodes",
        "too many monitored items for 32-bit client handles",
    ))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PointDefinition;

    fn filter(trigger: &str, deadband: &str, value: Option<f64>) -> ChangeFilterSettings {
        ChangeFilterSettings::new(trigger, deadband, value)
    }

    #[test]
    fn test_valid_filter() {
        let f = DataChangeFilter::from_settings(&filter("StatusValue", "Absolute", Some(0.5)))
            .unwrap();
        assert_eq!(f.trigger, DataChangeTrigger::StatusValue);
        assert_eq!(f.deadband, DeadbandKind::Absolute);
        assert_eq!(f.deadband_value, 0.5);

        let zero = DataChangeFilter::from_settings(&filter("Status", "Percent", Some(0.0)));
        assert!(zero.is_ok());
    }

    #[test]
    fn test_filter_rejections() {
        let cases = [
            (filter("Sometimes", "Absolute", Some(1.0)), "trigger 'Sometimes' not supported"),
            (filter("Status", "Relative", Some(1.0)), "deadband_type 'Relative' not supported"),
            (filter("Status", "Absolute", None), "deadband_value was not set"),
            (filter("Status", "Absolute", Some(-1.0)), "negative deadband_value not supported"),
        ];
        for (settings, expected) in cases {
            assert_eq!(DataChangeFilter::from_settings(&settings).unwrap_err(), expected);
        }
    }

    #[test]
    fn test_defaults_kept_when_unset() {
        let table =
            MappingTable::build("opcua", &[PointDefinition::new("a", "2", "i", "7")], &[])
                .unwrap();
        let (node_ids, requests) = build_data_requests(&table).unwrap();

        assert_eq!(node_ids, vec![NodeId::numeric(2, 7)]);
        let request = &requests[0];
        assert_eq!(request.client_handle(), 0);
        assert_eq!(request.attribute, AttributeId::Value);
        assert_eq!(request.parameters.queue_size, DEFAULT_QUEUE_SIZE);
        assert!(request.parameters.discard_oldest);
        assert!(request.parameters.filter.is_none());
    }

    #[test]
    fn test_parameters_applied() {
        let params = MonitoringParameters {
            sampling_interval: Duration::from_millis(250),
            queue_size: Some(5),
            discard_oldest: Some(false),
            data_change_filter: Some(filter("StatusValueTimestamp", "Percent", Some(2.0))),
        };
        let points = vec![
            PointDefinition::new("a", "2", "i", "7"),
            PointDefinition::new("b", "2", "s", "Flow").with_monitoring(params),
        ];
        let table = MappingTable::build("opcua", &points, &[]).unwrap();
        let (_, requests) = build_data_requests(&table).unwrap();

        let request = &requests[1];
        assert_eq!(request.client_handle(), 1);
        assert_eq!(request.parameters.sampling_interval, 250.0);
        assert_eq!(request.parameters.queue_size, 5);
        assert!(!request.parameters.discard_oldest);
        assert!(matches!(
            request.parameters.filter,
            Some(MonitoringFilter::DataChange(DataChangeFilter {
                trigger: DataChangeTrigger::StatusValueTimestamp,
                deadband: DeadbandKind::Percent,
                ..
            }))
        ));
    }

    #[test]
    fn test_invalid_filter_names_node() {
        let params = MonitoringParameters {
            data_change_filter: Some(filter("Status", "Absolute", None)),
            ..Default::default()
        };
        let points = vec![PointDefinition::new("t", "3", "s", "Temperature").with_monitoring(params)];
        let table = MappingTable::build("opcua", &points, &[]).unwrap();

        let err = build_data_requests(&table).unwrap_err();
        assert_eq!(
            err.to_string(),
            "deadband_value was not set, node 'ns=3;s=Temperature'"
        );
    }

    #[test]
    fn test_unparseable_node_id_rejected() {
        let points = vec![PointDefinition::new("g", "1", "g", "not-a-guid")];
        let table = MappingTable::build("opcua", &points, &[]).unwrap();
        assert!(build_data_requests(&table).is_err());
    }
}
