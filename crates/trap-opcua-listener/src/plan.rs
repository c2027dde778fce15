// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Subscription plan.
//!
//! Everything the client derives from its configuration before touching the
//! network: the mapping table, the parsed node IDs and both batches of
//! monitored item requests. Building a plan has no side effects, so the CLI
//! uses it for dry runs.

use crate::config::ListenerConfig;
use crate::error::{ConfigurationError, OpcUaError, OpcUaResult};
use crate::event_filter::{build_event_mappings, EventNodeMapping};
use crate::mapping::MappingTable;
use crate::monitoring::{build_data_requests, build_event_requests, MonitoredItemCreateRequest};
use crate::types::NodeId;

/// Validated monitoring plan of one listener.
#[derive(Debug, Clone)]
pub struct SubscriptionPlan {
    /// Data point mappings.
    pub table: MappingTable,
    /// Parsed node IDs, indexed like the table.
    pub node_ids: Vec<NodeId>,
    /// Data-change requests; handle `i` is table index `i`.
    pub data_requests: Vec<MonitoredItemCreateRequest>,
    /// One mapping per event notifier node.
    pub event_mappings: Vec<EventNodeMapping>,
    /// Event requests; handles follow the data handles.
    pub event_requests: Vec<MonitoredItemCreateRequest>,
}

impl SubscriptionPlan {
    /// Validates the configuration and builds the plan.
    pub fn from_config(config: &ListenerConfig) -> OpcUaResult<Self> {
        config.validate()?;

        let table = MappingTable::from_config(config)?;
        let (node_ids, data_requests) = build_data_requests(&table)?;

        let event_mappings = build_event_mappings(&config.event_groups);
        let offset = u32::try_from(data_requests.len()).map_err(|_| {
            OpcUaError::configuration(ConfigurationError::invalid_value(
                "nodes",
                "too many monitored items for 32-bit client handles",
            ))
        })?;
        let event_requests = build_event_requests(&event_mappings, offset)?;

        tracing::debug!(
            data_items = data_requests.len(),
            event_items = event_requests.len(),
            "Subscription plan built"
        );

        Ok(Self {
            table,
            node_ids,
            data_requests,
            event_mappings,
            event_requests,
        })
    }

    /// Returns `true` if data points are configured.
    pub fn has_data(&self) -> bool {
        !self.data_requests.is_empty()
    }

    /// Returns `true` if event groups are configured.
    pub fn has_events(&self) -> bool {
        !self.event_requests.is_empty()
    }

    /// Returns the node ID behind a data handle, if known.
    pub fn data_node(&self, index: usize) -> Option<&NodeId> {
        self.node_ids.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EventGroupDefinition, GroupDefinition, PointDefinition};
    use crate::types::AttributeId;
    use std::time::Duration;

    fn config() -> ListenerConfig {
        ListenerConfig::new("opc.tcp://localhost:4840")
            .with_node(PointDefinition::new("temp", "3", "s", "Temperature"))
            .with_group(
                GroupDefinition::new("line1")
                    .with_defaults("2", "i")
                    .with_point(PointDefinition::new("speed", "", "", "1001")),
            )
            .with_event_group(
                EventGroupDefinition::new(NodeId::numeric(0, 2041), Duration::from_secs(1))
                    .with_node(NodeId::numeric(0, 2253))
                    .with_field("Severity"),
            )
    }

    #[test]
    fn test_event_handles_follow_data_handles() {
        let plan = SubscriptionPlan::from_config(&config()).unwrap();

        assert_eq!(plan.data_requests.len(), 2);
        assert_eq!(plan.event_requests.len(), 1);
        assert_eq!(plan.event_requests[0].client_handle(), 2);
        assert_eq!(plan.event_requests[0].attribute, AttributeId::EventNotifier);
        assert_eq!(plan.data_node(1), Some(&NodeId::numeric(2, 1001)));
        assert!(plan.has_data() && plan.has_events());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ListenerConfig::new("");
        assert!(SubscriptionPlan::from_config(&config).is_err());
    }

    #[test]
    fn test_events_only() {
        let mut config = config();
        config.nodes.clear();
        config.groups.clear();

        let plan = SubscriptionPlan::from_config(&config).unwrap();
        assert!(!plan.has_data());
        assert_eq!(plan.event_requests[0].client_handle(), 0);
    }
}
