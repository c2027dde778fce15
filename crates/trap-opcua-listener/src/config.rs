// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Listener configuration.
//!
//! The structures here are what the configuration file deserializes into.
//! Tag sources are collapsed while parsing: every point and group accepts a
//! `default_tags` map and the older `tags` list of `[name, value]` pairs, and
//! the rest of the crate only ever sees the resulting map.
//!
//! # Example (TOML)
//!
//! ```toml
//! endpoint = "opc.tcp://localhost:4840"
//! name = "opcua"
//! subscription_interval = "100ms"
//! connect_fail_behavior = "retry"
//!
//! [[nodes]]
//! name = "temp"
//! namespace = "3"
//! identifier_type = "s"
//! identifier = "Temperature"
//!
//! [[groups]]
//! name = "line1"
//! namespace = "2"
//! identifier_type = "i"
//! default_tags = { site = "north" }
//!
//! [[groups.nodes]]
//! name = "speed"
//! identifier = "1001"
//! ```

use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use crate::error::{ConfigurationError, OpcUaError, OpcUaResult};
use crate::types::{humantime_serde, NodeId, NodeIdEncoding};

/// Default measurement name for root points.
pub const DEFAULT_METRIC_NAME: &str = "opcua_listener";

/// RFC 3339 with as many fractional digits as needed.
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

/// Capacity of the notification channel and both output channels.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 100;

/// Tag map after collapsing both tag sources.
pub type TagMap = BTreeMap<String, String>;

// =============================================================================
// Enumerations
// =============================================================================

/// Which time is attached to data-change measurements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampSource {
    /// Local receive time.
    #[default]
    #[serde(alias = "")]
    Gather,
    /// Server timestamp reported with the value.
    Server,
    /// Source timestamp reported with the value.
    Source,
}

/// What to do when the initial connection fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectFailBehavior {
    /// Propagate the failure; startup aborts.
    #[default]
    Error,
    /// Log it and let the caller try again at the next interval.
    Retry,
    /// Log it and disable streaming for this run.
    Ignore,
}

impl fmt::Display for ConnectFailBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Error => "error",
            Self::Retry => "retry",
            Self::Ignore => "ignore",
        })
    }
}

/// Extra fields that can be added to data-change measurements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionalField {
    /// The value's built-in type name.
    DataType,
}

// =============================================================================
// MonitoringParameters
// =============================================================================

/// Raw change filter settings.
///
/// Kinds are kept as text here and checked when monitoring requests are
/// built, so that the error can name the offending node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeFilterSettings {
    /// `Status`, `StatusValue` or `StatusValueTimestamp`.
    #[serde(default)]
    pub trigger: String,
    /// `Absolute` or `Percent`.
    #[serde(default)]
    pub deadband_type: String,
    /// Threshold; must be set and non-negative.
    #[serde(default)]
    pub deadband_value: Option<f64>,
}

impl ChangeFilterSettings {
    /// Creates filter settings.
    pub fn new(
        trigger: impl Into<String>,
        deadband_type: impl Into<String>,
        deadband_value: Option<f64>,
    ) -> Self {
        Self {
            trigger: trigger.into(),
            deadband_type: deadband_type.into(),
            deadband_value,
        }
    }
}

/// Per-point monitoring parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonitoringParameters {
    /// Sampling interval; zero lets the point inherit the group's.
    #[serde(default, with = "humantime_serde")]
    pub sampling_interval: Duration,
    /// Queue size; server default when unset.
    #[serde(default)]
    pub queue_size: Option<u32>,
    /// Discard policy; server default when unset.
    #[serde(default)]
    pub discard_oldest: Option<bool>,
    /// Optional data change filter.
    #[serde(default)]
    pub data_change_filter: Option<ChangeFilterSettings>,
}

// =============================================================================
// PointDefinition
// =============================================================================

/// A configured data point.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "PointSettings")]
pub struct PointDefinition {
    /// Field name in the produced measurement.
    pub name: String,
    /// Namespace index as text.
    pub namespace: String,
    /// One of `i`, `s`, `g`, `b`.
    pub identifier_type: String,
    /// Identifier.
    pub identifier: String,
    /// Point-level tags.
    pub tags: TagMap,
    /// Monitoring parameters.
    pub monitoring_params: MonitoringParameters,
}

impl PointDefinition {
    /// Creates a point definition.
    pub fn new(
        name: impl Into<String>,
        namespace: impl Into<String>,
        identifier_type: impl Into<String>,
        identifier: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            identifier_type: identifier_type.into(),
            identifier: identifier.into(),
            ..Default::default()
        }
    }

    /// Adds a tag.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Sets the monitoring parameters.
    pub fn with_monitoring(mut self, params: MonitoringParameters) -> Self {
        self.monitoring_params = params;
        self
    }

    /// Returns the identifier text `ns=<namespace>;<type>=<identifier>`.
    ///
    /// The namespace is always written, including namespace 0.
    pub fn node_id_string(&self) -> String {
        format!(
            "ns={};{}={}",
            self.namespace, self.identifier_type, self.identifier
        )
    }
}

/// On-disk form of [`PointDefinition`].
#[derive(Debug, Clone, Default, Deserialize)]
struct PointSettings {
    #[serde(default)]
    name: String,
    #[serde(default)]
    namespace: String,
    #[serde(default)]
    identifier_type: String,
    #[serde(default)]
    identifier: String,
    #[serde(default)]
    default_tags: TagMap,
    #[serde(default)]
    tags: Vec<Vec<String>>,
    #[serde(default)]
    monitoring_params: MonitoringParameters,
}

impl TryFrom<PointSettings> for PointDefinition {
    type Error = ConfigurationError;

    fn try_from(raw: PointSettings) -> Result<Self, Self::Error> {
        let tags = collapse_tags(raw.default_tags, &raw.tags, &raw.name)?;
        Ok(Self {
            name: raw.name,
            namespace: raw.namespace,
            identifier_type: raw.identifier_type,
            identifier: raw.identifier,
            tags,
            monitoring_params: raw.monitoring_params,
        })
    }
}

// =============================================================================
// GroupDefinition
// =============================================================================

/// A group of points sharing defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "GroupSettings")]
pub struct GroupDefinition {
    /// Measurement name; empty uses the top-level name.
    pub name: String,
    /// Default namespace.
    pub namespace: String,
    /// Default identifier type.
    pub identifier_type: String,
    /// Group tags.
    pub tags: TagMap,
    /// Default sampling interval.
    pub sampling_interval: Duration,
    /// Member points.
    pub nodes: Vec<PointDefinition>,
}

impl GroupDefinition {
    /// Creates an empty group.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Sets the default namespace and identifier type.
    pub fn with_defaults(
        mut self,
        namespace: impl Into<String>,
        identifier_type: impl Into<String>,
    ) -> Self {
        self.namespace = namespace.into();
        self.identifier_type = identifier_type.into();
        self
    }

    /// Adds a group tag.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Sets the default sampling interval.
    pub fn with_sampling_interval(mut self, interval: Duration) -> Self {
        self.sampling_interval = interval;
        self
    }

    /// Adds a point.
    pub fn with_point(mut self, point: PointDefinition) -> Self {
        self.nodes.push(point);
        self
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct GroupSettings {
    #[serde(default)]
    name: String,
    #[serde(default)]
    namespace: String,
    #[serde(default)]
    identifier_type: String,
    #[serde(default)]
    default_tags: TagMap,
    #[serde(default)]
    tags: Vec<Vec<String>>,
    #[serde(default, with = "humantime_serde")]
    sampling_interval: Duration,
    #[serde(default)]
    nodes: Vec<PointDefinition>,
}

impl TryFrom<GroupSettings> for GroupDefinition {
    type Error = ConfigurationError;

    fn try_from(raw: GroupSettings) -> Result<Self, Self::Error> {
        let tags = collapse_tags(raw.default_tags, &raw.tags, &raw.name)?;
        Ok(Self {
            name: raw.name,
            namespace: raw.namespace,
            identifier_type: raw.identifier_type,
            tags,
            sampling_interval: raw.sampling_interval,
            nodes: raw.nodes,
        })
    }
}

// =============================================================================
// Tag collapse
// =============================================================================

/// Merges the two tag sources of a point or group into one map.
///
/// When both are set the map wins and a warning is logged.
pub fn collapse_tags(
    default_tags: TagMap,
    legacy: &[Vec<String>],
    owner: &str,
) -> Result<TagMap, ConfigurationError> {
    if !default_tags.is_empty() {
        if !legacy.is_empty() {
            tracing::warn!(
                owner = owner,
                "Tags found in both `tags` and `default_tags`, only using tags defined in `default_tags`"
            );
        }
        return Ok(default_tags);
    }
    legacy_tags_to_map(legacy)
}

/// Converts a list of `[name, value]` pairs into a map.
pub fn legacy_tags_to_map(pairs: &[Vec<String>]) -> Result<TagMap, ConfigurationError> {
    let mut map = TagMap::new();
    for (i, pair) in pairs.iter().enumerate() {
        let n = i + 1;
        let [name, value] = pair.as_slice() else {
            return Err(ConfigurationError::invalid_tags(format!(
                "tag {} needs 2 values, has {}: {:?}",
                n,
                pair.len(),
                pair
            )));
        };
        if name.is_empty() {
            return Err(ConfigurationError::invalid_tags(format!(
                "tag {} has empty name",
                n
            )));
        }
        if value.is_empty() {
            return Err(ConfigurationError::invalid_tags(format!(
                "tag {} has empty value",
                n
            )));
        }
        if map.insert(name.clone(), value.clone()).is_some() {
            return Err(ConfigurationError::invalid_tags(format!(
                "tag {} has duplicate key: {}",
                n, name
            )));
        }
    }
    Ok(map)
}

// =============================================================================
// EventGroupDefinition
// =============================================================================

/// Event streaming settings for a set of notifier nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventGroupDefinition {
    /// Sampling interval for the event monitored items.
    #[serde(with = "humantime_serde", alias = "streaming_interval")]
    pub sampling_interval: Duration,
    /// Event type whose fields are selected.
    #[serde(alias = "streaming_event_type")]
    pub event_type: NodeId,
    /// Encoding override for the event type in filter operands.
    #[serde(default)]
    pub event_type_encoding: Option<NodeIdEncoding>,
    /// Notifier nodes to monitor.
    #[serde(default, alias = "streaming_node_ids")]
    pub node_ids: Vec<NodeId>,
    /// Source-name allow-list; empty accepts every source.
    #[serde(default, alias = "streaming_source_names")]
    pub source_names: Vec<String>,
    /// Event fields to select, in output order.
    #[serde(default, alias = "streaming_fields")]
    pub fields: Vec<String>,
    /// Queue size; server default when unset.
    #[serde(default)]
    pub queue_size: Option<u32>,
}

impl EventGroupDefinition {
    /// Creates an event group for `event_type`.
    pub fn new(event_type: NodeId, sampling_interval: Duration) -> Self {
        Self {
            sampling_interval,
            event_type,
            event_type_encoding: None,
            node_ids: Vec::new(),
            source_names: Vec::new(),
            fields: Vec::new(),
            queue_size: None,
        }
    }

    /// Adds a notifier node.
    pub fn with_node(mut self, node: NodeId) -> Self {
        self.node_ids.push(node);
        self
    }

    /// Adds a selected field.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.fields.push(field.into());
        self
    }

    /// Adds an allowed source name.
    pub fn with_source_name(mut self, source: impl Into<String>) -> Self {
        self.source_names.push(source.into());
        self
    }

    /// Overrides the event type encoding.
    pub fn with_event_type_encoding(mut self, encoding: NodeIdEncoding) -> Self {
        self.event_type_encoding = Some(encoding);
        self
    }

    /// Validates the event group.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.sampling_interval.is_zero() {
            return Err(ConfigurationError::invalid_value(
                "sampling_interval",
                "streaming interval must be greater than 0",
            ));
        }
        if self.node_ids.is_empty() {
            return Err(ConfigurationError::invalid_value(
                "node_ids",
                "at least one node id must be specified",
            ));
        }
        if self.fields.is_empty() {
            return Err(ConfigurationError::invalid_value(
                "fields",
                "at least one field must be specified",
            ));
        }
        Ok(())
    }
}

// =============================================================================
// ListenerConfig
// =============================================================================

/// Top-level listener configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ListenerConfig {
    /// Server endpoint URL.
    pub endpoint: String,

    /// Measurement name for root points and unnamed groups.
    #[serde(default = "default_metric_name")]
    pub name: String,

    /// Timestamp attached to data-change measurements.
    #[serde(default)]
    pub timestamp: TimestampSource,

    /// Format for date/time values.
    #[serde(default = "default_timestamp_format")]
    pub timestamp_format: String,

    /// Extra fields to emit.
    #[serde(default)]
    pub optional_fields: Vec<OptionalField>,

    /// Publishing interval of the subscription.
    #[serde(default = "default_subscription_interval", with = "humantime_serde")]
    pub subscription_interval: Duration,

    /// Initial connection failure policy.
    #[serde(default)]
    pub connect_fail_behavior: ConnectFailBehavior,

    /// Notification and output channel capacity.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Root points.
    #[serde(default)]
    pub nodes: Vec<PointDefinition>,

    /// Point groups.
    #[serde(default, alias = "group")]
    pub groups: Vec<GroupDefinition>,

    /// Event groups.
    #[serde(default)]
    pub event_groups: Vec<EventGroupDefinition>,
}

fn default_metric_name() -> String {
    DEFAULT_METRIC_NAME.to_string()
}

fn default_timestamp_format() -> String {
    DEFAULT_TIMESTAMP_FORMAT.to_string()
}

fn default_subscription_interval() -> Duration {
    Duration::from_millis(100)
}

fn default_channel_capacity() -> usize {
    DEFAULT_CHANNEL_CAPACITY
}

impl ListenerConfig {
    /// Creates a configuration with defaults and no points.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            name: default_metric_name(),
            timestamp: TimestampSource::default(),
            timestamp_format: default_timestamp_format(),
            optional_fields: Vec::new(),
            subscription_interval: default_subscription_interval(),
            connect_fail_behavior: ConnectFailBehavior::default(),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            nodes: Vec::new(),
            groups: Vec::new(),
            event_groups: Vec::new(),
        }
    }

    /// Sets the measurement name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the timestamp source.
    pub fn with_timestamp(mut self, source: TimestampSource) -> Self {
        self.timestamp = source;
        self
    }

    /// Sets the connect failure policy.
    pub fn with_connect_fail_behavior(mut self, behavior: ConnectFailBehavior) -> Self {
        self.connect_fail_behavior = behavior;
        self
    }

    /// Enables an optional field.
    pub fn with_optional_field(mut self, field: OptionalField) -> Self {
        if !self.optional_fields.contains(&field) {
            self.optional_fields.push(field);
        }
        self
    }

    /// Adds a root point.
    pub fn with_node(mut self, point: PointDefinition) -> Self {
        self.nodes.push(point);
        self
    }

    /// Adds a group.
    pub fn with_group(mut self, group: GroupDefinition) -> Self {
        self.groups.push(group);
        self
    }

    /// Adds an event group.
    pub fn with_event_group(mut self, group: EventGroupDefinition) -> Self {
        self.event_groups.push(group);
        self
    }

    /// Returns `true` if the optional field is enabled.
    pub fn has_optional_field(&self, field: OptionalField) -> bool {
        self.optional_fields.contains(&field)
    }

    /// Validates the configuration.
    ///
    /// Point-level checks happen when the mapping is built.
    pub fn validate(&self) -> OpcUaResult<()> {
        let err = |e: ConfigurationError| Err(OpcUaError::configuration(e));

        if self.endpoint.trim().is_empty() {
            return err(ConfigurationError::missing_field("endpoint"));
        }
        if self.name.is_empty() {
            return err(ConfigurationError::invalid_value("name", "metric name is empty"));
        }
        if StrftimeItems::new(&self.timestamp_format).any(|item| matches!(item, Item::Error)) {
            return err(ConfigurationError::invalid_value(
                "timestamp_format",
                format!("'{}' is not a valid format string", self.timestamp_format),
            ));
        }
        if self.channel_capacity == 0 {
            return err(ConfigurationError::invalid_value(
                "channel_capacity",
                "must be greater than 0",
            ));
        }
        if self.subscription_interval.is_zero() {
            return err(ConfigurationError::invalid_value(
                "subscription_interval",
                "must be greater than 0",
            ));
        }
        if self.groups.is_empty() && self.nodes.is_empty() && self.event_groups.is_empty() {
            return err(ConfigurationError::invalid_value(
                "nodes",
                "no groups or root nodes or event groups provided to gather from",
            ));
        }
        if self.groups.iter().any(|g| g.nodes.is_empty()) {
            return err(ConfigurationError::invalid_value(
                "groups",
                "group has no nodes to collect from",
            ));
        }
        for group in &self.event_groups {
            group.validate().map_err(OpcUaError::configuration)?;
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[&[&str]]) -> Vec<Vec<String>> {
        items
            .iter()
            .map(|p| p.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_defaults_from_json() {
        let config: ListenerConfig = serde_json::from_str(
            r#"{
                "endpoint": "opc.tcp://localhost:4840",
                "nodes": [{"name": "temp", "namespace": "3", "identifier_type": "s", "identifier": "Temperature"}]
            }"#,
        )
        .unwrap();

        assert_eq!(config.name, DEFAULT_METRIC_NAME);
        assert_eq!(config.timestamp, TimestampSource::Gather);
        assert_eq!(config.timestamp_format, DEFAULT_TIMESTAMP_FORMAT);
        assert_eq!(config.subscription_interval, Duration::from_millis(100));
        assert_eq!(config.connect_fail_behavior, ConnectFailBehavior::Error);
        assert_eq!(config.channel_capacity, 100);
        assert_eq!(config.nodes[0].node_id_string(), "ns=3;s=Temperature");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_enum_parsing() {
        let config: ListenerConfig = serde_json::from_str(
            r#"{
                "endpoint": "opc.tcp://x:4840",
                "timestamp": "source",
                "connect_fail_behavior": "ignore",
                "optional_fields": ["DataType"],
                "subscription_interval": "2s",
                "nodes": [{"name": "a", "namespace": "1", "identifier_type": "i", "identifier": "1"}]
            }"#,
        )
        .unwrap();

        assert_eq!(config.timestamp, TimestampSource::Source);
        assert_eq!(config.connect_fail_behavior, ConnectFailBehavior::Ignore);
        assert!(config.has_optional_field(OptionalField::DataType));
        assert_eq!(config.subscription_interval, Duration::from_secs(2));
    }

    #[test]
    fn test_empty_timestamp_means_gather() {
        let source: TimestampSource = serde_json::from_str(r#""""#).unwrap();
        assert_eq!(source, TimestampSource::Gather);
        assert!(serde_json::from_str::<TimestampSource>(r#""device""#).is_err());
    }

    #[test]
    fn test_legacy_tags_to_map() {
        let map = legacy_tags_to_map(&pairs(&[&["a", "1"], &["b", "2"]])).unwrap();
        assert_eq!(map.get("a").map(String::as_str), Some("1"));
        assert_eq!(map.len(), 2);

        let err = legacy_tags_to_map(&pairs(&[&["a"]])).unwrap_err();
        assert!(err.to_string().contains("tag 1 needs 2 values, has 1"));

        let err = legacy_tags_to_map(&pairs(&[&["a", "1"], &["", "2"]])).unwrap_err();
        assert_eq!(err.to_string(), "tag 2 has empty name");

        let err = legacy_tags_to_map(&pairs(&[&["a", ""]])).unwrap_err();
        assert_eq!(err.to_string(), "tag 1 has empty value");

        let err = legacy_tags_to_map(&pairs(&[&["a", "1"], &["a", "2"]])).unwrap_err();
        assert_eq!(err.to_string(), "tag 2 has duplicate key: a");
    }

    #[test]
    fn test_tag_map_wins_over_legacy_list() {
        let group: GroupDefinition = serde_json::from_str(
            r#"{
                "name": "g",
                "default_tags": {"site": "north"},
                "tags": [["site", "south"], ["line", "1"]],
                "nodes": []
            }"#,
        )
        .unwrap();

        assert_eq!(group.tags.len(), 1);
        assert_eq!(group.tags.get("site").map(String::as_str), Some("north"));
    }

    #[test]
    fn test_legacy_list_used_when_alone() {
        let point: PointDefinition = serde_json::from_str(
            r#"{"name": "p", "namespace": "1", "identifier_type": "i", "identifier": "5",
                "tags": [["unit", "C"]]}"#,
        )
        .unwrap();
        assert_eq!(point.tags.get("unit").map(String::as_str), Some("C"));

        let bad = serde_json::from_str::<PointDefinition>(
            r#"{"name": "p", "tags": [["unit"]]}"#,
        );
        assert!(bad.is_err());
    }

    #[test]
    fn test_validate_rules() {
        let base = ListenerConfig::new("opc.tcp://x:4840");
        assert!(base.validate().is_err(), "nothing to gather from");

        let ok = base.clone().with_node(PointDefinition::new("a", "1", "i", "1"));
        assert!(ok.validate().is_ok());

        assert!(ok.clone().with_name("").validate().is_err());
        assert!(ok
            .clone()
            .with_group(GroupDefinition::new("empty"))
            .validate()
            .is_err());

        let mut no_endpoint = ok.clone();
        no_endpoint.endpoint.clear();
        assert!(no_endpoint.validate().is_err());

        let mut zero_capacity = ok.clone();
        zero_capacity.channel_capacity = 0;
        assert!(zero_capacity.validate().is_err());

        let mut bad_format = ok;
        bad_format.timestamp_format = "%Y-%Q".to_string();
        let err = bad_format.validate().unwrap_err();
        assert!(err.to_string().contains("timestamp_format"));
    }

    #[test]
    fn test_event_group_validation() {
        let event_type = NodeId::numeric(0, 2041);
        let group = EventGroupDefinition::new(event_type.clone(), Duration::from_secs(1));
        assert!(group.validate().is_err());

        let group = group.with_node(NodeId::numeric(0, 2253));
        assert!(group.validate().is_err(), "fields required");

        let group = group.with_field("Severity");
        assert!(group.validate().is_ok());

        let zero = EventGroupDefinition::new(event_type, Duration::ZERO)
            .with_node(NodeId::numeric(0, 2253))
            .with_field("Severity");
        assert!(zero.validate().is_err());
    }

    #[test]
    fn test_event_group_legacy_names() {
        let group: EventGroupDefinition = serde_json::from_str(
            r#"{
                "streaming_interval": "1s",
                "streaming_event_type": "i=2041",
                "streaming_node_ids": ["i=2253"],
                "streaming_source_names": ["Boiler1"],
                "streaming_fields": ["Severity", "Message"]
            }"#,
        )
        .unwrap();

        assert_eq!(group.event_type, NodeId::numeric(0, 2041));
        assert_eq!(group.fields, vec!["Severity", "Message"]);
        assert_eq!(group.source_names, vec!["Boiler1"]);
    }
}
