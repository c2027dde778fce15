// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Event filters for event streaming.
//!
//! Every configured event group expands into one [`EventNodeMapping`] per
//! notifier node. Each mapping gets an [`EventFilter`] that selects the
//! configured fields of the event type and, when a source-name allow-list is
//! set, restricts events to those sources with an `InList` where clause.

use std::time::Duration;

use crate::config::EventGroupDefinition;
use crate::error::ConfigurationError;
use crate::types::{AttributeId, EncodedNodeId, NodeId, NodeIdEncoding, QualifiedName, Variant};

/// Browse name of the standard event field holding the source name.
pub const SOURCE_NAME_FIELD: &str = "SourceName";

// =============================================================================
// EventNodeMapping
// =============================================================================

/// One monitored notifier node of an event group.
#[derive(Debug, Clone, PartialEq)]
pub struct EventNodeMapping {
    /// Notifier node.
    pub node_id: NodeId,
    /// Event type whose fields are selected.
    pub event_type: NodeId,
    /// Encoding used for the event type in operands.
    pub event_type_encoding: NodeIdEncoding,
    /// Selected fields, in output order.
    pub fields: Vec<String>,
    /// Source-name allow-list.
    pub source_names: Vec<String>,
    /// Sampling interval.
    pub sampling_interval: Duration,
    /// Queue size override.
    pub queue_size: Option<u32>,
}

/// Expands event groups into one mapping per notifier node.
pub fn build_event_mappings(groups: &[EventGroupDefinition]) -> Vec<EventNodeMapping> {
    groups
        .iter()
        .flat_map(|group| {
            let encoding = group
                .event_type_encoding
                .unwrap_or_else(|| group.event_type.default_encoding());
            group.node_ids.iter().map(move |node_id| EventNodeMapping {
                node_id: node_id.clone(),
                event_type: group.event_type.clone(),
                event_type_encoding: encoding,
                fields: group.fields.clone(),
                source_names: group.source_names.clone(),
                sampling_interval: group.sampling_interval,
                queue_size: group.queue_size,
            })
        })
        .collect()
}

// =============================================================================
// Filter model
// =============================================================================

/// Operand selecting an attribute of an event field.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleAttributeOperand {
    /// Event type the browse path is relative to.
    pub type_definition: EncodedNodeId,
    /// Browse path to the field.
    pub browse_path: Vec<QualifiedName>,
    /// Attribute to read.
    pub attribute: AttributeId,
}

impl SimpleAttributeOperand {
    /// Selects the value of `field` on `type_definition`.
    pub fn field_value(type_definition: EncodedNodeId, field: &str) -> Self {
        Self {
            type_definition,
            browse_path: vec![QualifiedName::new(0, field)],
            attribute: AttributeId::Value,
        }
    }
}

/// Operand of a content filter element.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOperand {
    /// Event field reference.
    SimpleAttribute(SimpleAttributeOperand),
    /// Literal value.
    Literal(Variant),
}

/// Content filter operators used by the listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOperator {
    /// First operand equals any of the remaining operands.
    InList,
}

impl FilterOperator {
    /// Returns the protocol enumeration value.
    pub const fn value(&self) -> u32 {
        match self {
            Self::InList => 9,
        }
    }
}

/// One element of a where clause.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentFilterElement {
    /// Operator.
    pub operator: FilterOperator,
    /// Operands.
    pub operands: Vec<FilterOperand>,
}

/// Where clause. An empty clause matches every event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentFilter {
    /// Elements.
    pub elements: Vec<ContentFilterElement>,
}

impl ContentFilter {
    /// Returns `true` if the clause matches every event.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// Select and where clauses for an event monitored item.
#[derive(Debug, Clone, PartialEq)]
pub struct EventFilter {
    /// One clause per selected field, in field order.
    pub select_clauses: Vec<SimpleAttributeOperand>,
    /// Where clause.
    pub where_clause: ContentFilter,
}

// =============================================================================
// Builder
// =============================================================================

/// Builds the event filter for one notifier node.
pub fn build_event_filter(mapping: &EventNodeMapping) -> Result<EventFilter, ConfigurationError> {
    let type_definition = EncodedNodeId::resolve(&mapping.event_type, mapping.event_type_encoding)?;

    Ok(EventFilter {
        select_clauses: select_clauses(&type_definition, &mapping.fields),
        where_clause: where_clause(&type_definition, &mapping.source_names),
    })
}

fn select_clauses(type_definition: &EncodedNodeId, fields: &[String]) -> Vec<SimpleAttributeOperand> {
    fields
        .iter()
        .map(|field| SimpleAttributeOperand::field_value(type_definition.clone(), field))
        .collect()
}

fn where_clause(type_definition: &EncodedNodeId, source_names: &[String]) -> ContentFilter {
    if source_names.is_empty() {
        return ContentFilter::default();
    }

    let mut operands = Vec::with_capacity(source_names.len() + 1);
    operands.push(FilterOperand::SimpleAttribute(
        SimpleAttributeOperand::field_value(type_definition.clone(), SOURCE_NAME_FIELD),
    ));
    operands.extend(
        source_names
            .iter()
            .map(|name| FilterOperand::Literal(Variant::String(name.clone()))),
    );

    ContentFilter {
        elements: vec![ContentFilterElement {
            operator: FilterOperator::InList,
            operands,
        }],
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn group() -> EventGroupDefinition {
        EventGroupDefinition::new(NodeId::numeric(0, 2041), Duration::from_secs(1))
            .with_node(NodeId::numeric(0, 2253))
            .with_node(NodeId::string(2, "Boiler"))
            .with_field("Severity")
            .with_field("Message")
    }

    #[test]
    fn test_one_mapping_per_node() {
        let mappings = build_event_mappings(&[group()]);
        assert_eq!(mappings.len(), 2);
        assert_eq!(mappings[1].node_id, NodeId::string(2, "Boiler"));
        assert_eq!(mappings[0].event_type_encoding, NodeIdEncoding::FourByte);
    }

    #[test]
    fn test_select_clauses_follow_fields() {
        let mapping = &build_event_mappings(&[group()])[0];
        let filter = build_event_filter(mapping).unwrap();

        assert_eq!(filter.select_clauses.len(), 2);
        let names: Vec<_> = filter
            .select_clauses
            .iter()
            .map(|c| c.browse_path[0].name.as_str())
            .collect();
        assert_eq!(names, vec!["Severity", "Message"]);
        assert!(filter
            .select_clauses
            .iter()
            .all(|c| c.attribute == AttributeId::Value
                && c.type_definition == EncodedNodeId::FourByte { namespace: 0, id: 2041 }));
    }

    #[test]
    fn test_empty_where_without_sources() {
        let mapping = &build_event_mappings(&[group()])[0];
        let filter = build_event_filter(mapping).unwrap();
        assert!(filter.where_clause.is_empty());
    }

    #[test]
    fn test_in_list_where_with_sources() {
        let g = group().with_source_name("Boiler1").with_source_name("Boiler2");
        let mapping = &build_event_mappings(&[g])[0];
        let filter = build_event_filter(mapping).unwrap();

        assert_eq!(filter.where_clause.elements.len(), 1);
        let element = &filter.where_clause.elements[0];
        assert_eq!(element.operator, FilterOperator::InList);
        assert_eq!(element.operands.len(), 3);

        match &element.operands[0] {
            FilterOperand::SimpleAttribute(op) => {
                assert_eq!(op.browse_path[0].name, SOURCE_NAME_FIELD);
            }
            other => panic!("unexpected operand {:?}", other),
        }
        assert_eq!(
            element.operands[2],
            FilterOperand::Literal(Variant::String("Boiler2".into()))
        );
    }

    #[test]
    fn test_two_byte_range_enforced() {
        let g = EventGroupDefinition::new(NodeId::numeric(0, 2041), Duration::from_secs(1))
            .with_event_type_encoding(NodeIdEncoding::TwoByte)
            .with_node(NodeId::numeric(0, 2253))
            .with_field("Severity");
        let mapping = &build_event_mappings(&[g])[0];

        let err = build_event_filter(mapping).unwrap_err();
        assert!(err
            .to_string()
            .contains("twoByte EventType requires a value in the range 0-255, got 2041"));
    }

    #[test]
    fn test_unclassifiable_event_type() {
        let g = EventGroupDefinition::new(NodeId::string(1, "MyEvent"), Duration::from_secs(1))
            .with_event_type_encoding(NodeIdEncoding::Guid)
            .with_node(NodeId::numeric(0, 2253))
            .with_field("Severity");
        let mapping = &build_event_mappings(&[g])[0];
        assert!(build_event_filter(mapping).is_err());
    }
}
