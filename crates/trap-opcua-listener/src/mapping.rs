// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Point mapping.
//!
//! Turns configured root points and groups into an ordered table of
//! [`PointMapping`]s. Root points come first, then groups in declared order,
//! with each group's points in declared order. The position of a mapping in
//! the table is the client handle of its monitored item.
//!
//! Building is all-or-nothing: the first invalid or duplicate point aborts
//! the whole table.

use std::collections::HashSet;
use std::fmt;

use crate::config::{GroupDefinition, ListenerConfig, PointDefinition, TagMap};
use crate::error::{ConfigurationError, OpcUaError, OpcUaResult};

// =============================================================================
// PointMapping
// =============================================================================

/// Resolved association between a point and the measurement it produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointMapping {
    /// Measurement name.
    pub measurement: String,
    /// Field name.
    pub field_name: String,
    /// Identifier text, `ns=<n>;<t>=<id>`.
    pub id: String,
    /// Group tags merged with point tags.
    pub tags: TagMap,
}

impl PointMapping {
    /// Returns the tags as `k1=v1, k2=v2`, sorted by key.
    pub fn tag_string(&self) -> String {
        self.tags
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Returns the composite key used for duplicate detection.
    pub fn metric_key(&self) -> MetricKey {
        MetricKey {
            measurement: self.measurement.clone(),
            field_name: self.field_name.clone(),
            tags: self.tags.clone(),
        }
    }
}

impl fmt::Display for PointMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{} ({})", self.measurement, self.field_name, self.id)
    }
}

/// Measurement name, field name and tag set.
///
/// Two mappings with equal keys would produce indistinguishable series.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetricKey {
    /// Measurement name.
    pub measurement: String,
    /// Field name.
    pub field_name: String,
    /// Merged tags.
    pub tags: TagMap,
}

// =============================================================================
// MappingTable
// =============================================================================

/// Ordered mapping table with the resolved point definitions alongside.
#[derive(Debug, Clone, Default)]
pub struct MappingTable {
    mappings: Vec<PointMapping>,
    points: Vec<PointDefinition>,
}

impl MappingTable {
    /// Builds the table from a listener configuration.
    pub fn from_config(config: &ListenerConfig) -> OpcUaResult<Self> {
        Self::build(&config.name, &config.nodes, &config.groups)
    }

    /// Builds the table from root points and groups.
    ///
    /// Root points use `metric_name` and no group tags. A group with an
    /// empty name also uses `metric_name`.
    pub fn build(
        metric_name: &str,
        root: &[PointDefinition],
        groups: &[GroupDefinition],
    ) -> OpcUaResult<Self> {
        let capacity = root.len() + groups.iter().map(|g| g.nodes.len()).sum::<usize>();
        let mut builder = TableBuilder::with_capacity(capacity);

        let no_tags = TagMap::new();
        for point in root {
            builder.add(metric_name, point.clone(), &no_tags)?;
        }

        for group in groups {
            let measurement = if group.name.is_empty() {
                metric_name
            } else {
                group.name.as_str()
            };
            for point in &group.nodes {
                builder.add(measurement, inherit_group_defaults(group, point), &group.tags)?;
            }
        }

        let table = builder.finish();
        tracing::debug!(mappings = table.len(), "Point mapping built");
        Ok(table)
    }

    /// Returns the number of mappings.
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    /// Returns `true` if there are no mappings.
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Returns the mapping at `index`.
    pub fn get(&self, index: usize) -> Option<&PointMapping> {
        self.mappings.get(index)
    }

    /// Returns the resolved point definition at `index`.
    pub fn point(&self, index: usize) -> Option<&PointDefinition> {
        self.points.get(index)
    }

    /// Returns all mappings in order.
    pub fn mappings(&self) -> &[PointMapping] {
        &self.mappings
    }

    /// Iterates over `(mapping, point)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&PointMapping, &PointDefinition)> {
        self.mappings.iter().zip(self.points.iter())
    }
}

struct TableBuilder {
    mappings: Vec<PointMapping>,
    points: Vec<PointDefinition>,
    seen: HashSet<MetricKey>,
}

impl TableBuilder {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            mappings: Vec::with_capacity(capacity),
            points: Vec::with_capacity(capacity),
            seen: HashSet::with_capacity(capacity),
        }
    }

    fn add(
        &mut self,
        measurement: &str,
        point: PointDefinition,
        group_tags: &TagMap,
    ) -> OpcUaResult<()> {
        validate_point(&point).map_err(OpcUaError::configuration)?;

        let mut tags = group_tags.clone();
        tags.extend(point.tags.iter().map(|(k, v)| (k.clone(), v.clone())));

        let mapping = PointMapping {
            measurement: measurement.to_string(),
            field_name: point.name.clone(),
            id: point.node_id_string(),
            tags,
        };

        let key = mapping.metric_key();
        if self.seen.contains(&key) {
            return Err(OpcUaError::configuration(ConfigurationError::duplicate_point(
                key.field_name,
                key.measurement,
                mapping.tag_string(),
            )));
        }
        self.seen.insert(key);

        self.mappings.push(mapping);
        self.points.push(point);
        Ok(())
    }

    fn finish(self) -> MappingTable {
        MappingTable {
            mappings: self.mappings,
            points: self.points,
        }
    }
}

/// Fills in the group's namespace, identifier type and sampling interval
/// where the point leaves them unset.
fn inherit_group_defaults(group: &GroupDefinition, point: &PointDefinition) -> PointDefinition {
    let mut point = point.clone();
    if point.namespace.is_empty() {
        point.namespace = group.namespace.clone();
    }
    if point.identifier_type.is_empty() {
        point.identifier_type = group.identifier_type.clone();
    }
    if point.monitoring_params.sampling_interval.is_zero() {
        point.monitoring_params.sampling_interval = group.sampling_interval;
    }
    point
}

/// Structural checks on a single point.
fn validate_point(point: &PointDefinition) -> Result<(), ConfigurationError> {
    if point.name.is_empty() {
        return Err(ConfigurationError::invalid_point(format!(
            "empty field name not allowed for node {:?}",
            point.node_id_string()
        )));
    }
    if point.namespace.is_empty() {
        return Err(ConfigurationError::invalid_point(
            "empty node namespace not allowed",
        ));
    }
    if point.identifier.is_empty() {
        return Err(ConfigurationError::invalid_point(
            "empty node identifier not allowed",
        ));
    }
    match point.identifier_type.as_str() {
        "i" => {
            if point.identifier.parse::<i64>().is_err() {
                return Err(ConfigurationError::invalid_point(format!(
                    "identifier type {:?} does not match the type of identifier {:?}",
                    point.identifier_type, point.identifier
                )));
            }
        }
        "s" | "g" | "b" => {}
        other => {
            return Err(ConfigurationError::invalid_point(format!(
                "invalid identifier type {:?} in {:?}",
                other, point.name
            )));
        }
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn point(name: &str, id: &str) -> PointDefinition {
        PointDefinition::new(name, "3", "s", id)
    }

    #[test]
    fn test_order_root_then_groups() {
        let groups = vec![
            GroupDefinition::new("g1")
                .with_defaults("2", "i")
                .with_point(PointDefinition::new("b", "", "", "1"))
                .with_point(PointDefinition::new("c", "", "", "2")),
            GroupDefinition::new("g2")
                .with_defaults("2", "s")
                .with_point(PointDefinition::new("d", "", "", "X")),
        ];
        let table = MappingTable::build("opcua", &[point("a", "A")], &groups).unwrap();

        let fields: Vec<_> = table.mappings().iter().map(|m| m.field_name.as_str()).collect();
        assert_eq!(fields, vec!["a", "b", "c", "d"]);
        assert_eq!(table.get(0).unwrap().measurement, "opcua");
        assert_eq!(table.get(1).unwrap().measurement, "g1");
        assert_eq!(table.get(1).unwrap().id, "ns=2;i=1");
        assert_eq!(table.get(3).unwrap().id, "ns=2;s=X");
    }

    #[test]
    fn test_group_inheritance_point_wins() {
        let group = GroupDefinition::new("")
            .with_defaults("2", "i")
            .with_sampling_interval(Duration::from_millis(500))
            .with_point(PointDefinition::new("own", "4", "s", "Speed"))
            .with_point(PointDefinition::new("inherited", "", "", "7"));
        let table = MappingTable::build("opcua", &[], &[group]).unwrap();

        assert_eq!(table.get(0).unwrap().measurement, "opcua");
        assert_eq!(table.get(0).unwrap().id, "ns=4;s=Speed");
        assert_eq!(table.get(1).unwrap().id, "ns=2;i=7");
        assert_eq!(
            table.point(1).unwrap().monitoring_params.sampling_interval,
            Duration::from_millis(500)
        );
    }

    #[test]
    fn test_tag_merge_node_overrides_group() {
        let group = GroupDefinition::new("g")
            .with_defaults("1", "i")
            .with_tag("a", "1")
            .with_point(
                PointDefinition::new("p", "", "", "5")
                    .with_tag("a", "2")
                    .with_tag("b", "3"),
            );
        let table = MappingTable::build("opcua", &[], &[group]).unwrap();
        let tags = &table.get(0).unwrap().tags;

        assert_eq!(tags.len(), 2);
        assert_eq!(tags.get("a").map(String::as_str), Some("2"));
        assert_eq!(tags.get("b").map(String::as_str), Some("3"));
    }

    #[test]
    fn test_duplicate_rejected_regardless_of_tag_order() {
        let first = point("temp", "A").with_tag("x", "1").with_tag("y", "2");
        let second = point("temp", "B").with_tag("y", "2").with_tag("x", "1");

        let err = MappingTable::build("opcua", &[first, second], &[]).unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"name "temp" is duplicated (metric name "opcua", tags "x=1, y=2")"#
        );
    }

    #[test]
    fn test_differing_tag_values_accepted() {
        let first = point("temp", "A").with_tag("line", "1");
        let second = point("temp", "B").with_tag("line", "2");
        let table = MappingTable::build("opcua", &[first, second], &[]).unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_tag_value_with_separator_not_a_duplicate() {
        let first = point("temp", "A").with_tag("a", "1").with_tag("b", "2");
        let second = point("temp", "B").with_tag("a", "1, b=2");
        assert_eq!(first.tags.len(), 2);

        let table = MappingTable::build("opcua", &[first, second], &[]).unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_same_field_in_different_measurements_accepted() {
        let group = GroupDefinition::new("other")
            .with_defaults("3", "s")
            .with_point(PointDefinition::new("temp", "", "", "B"));
        let table = MappingTable::build("opcua", &[point("temp", "A")], &[group]).unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_structural_rejections() {
        let cases = [
            (PointDefinition::new("", "3", "s", "A"), "empty field name"),
            (PointDefinition::new("a", "", "s", "A"), "empty node namespace"),
            (PointDefinition::new("a", "3", "s", ""), "empty node identifier"),
            (PointDefinition::new("a", "3", "i", "abc"), "does not match"),
            (PointDefinition::new("a", "3", "x", "A"), "invalid identifier type"),
        ];
        for (p, expected) in cases {
            let err = MappingTable::build("opcua", &[p], &[]).unwrap_err();
            assert!(err.to_string().contains(expected), "{} vs {}", err, expected);
        }
    }

    #[test]
    fn test_non_numeric_types_accept_any_identifier() {
        let points = vec![
            PointDefinition::new("s", "1", "s", "any thing"),
            PointDefinition::new("g", "1", "g", "not-a-guid"),
            PointDefinition::new("b", "1", "b", "???"),
            PointDefinition::new("i", "1", "i", "-5"),
        ];
        let table = MappingTable::build("opcua", &points, &[]).unwrap();
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn test_one_bad_point_rejects_all() {
        let points = vec![point("ok", "A"), PointDefinition::new("bad", "", "s", "B")];
        assert!(MappingTable::build("opcua", &points, &[]).is_err());
    }

    #[test]
    fn test_tag_string_sorted() {
        let mapping = PointMapping {
            measurement: "m".into(),
            field_name: "f".into(),
            id: "ns=1;i=1".into(),
            tags: [("z", "9"), ("a", "1")]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        };
        assert_eq!(mapping.tag_string(), "a=1, z=9");
        assert_eq!(mapping.to_string(), "m.f (ns=1;i=1)");
    }
}
