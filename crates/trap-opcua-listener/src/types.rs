// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! OPC UA value types used by the listener.
//!
//! This module defines the protocol-level vocabulary shared by the mapping,
//! request translation and notification processing layers: node identifiers
//! and their binary encodings, status codes, built-in type names and the
//! [`Variant`] value carried by notifications.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Write as _;
use std::str::FromStr;
use trap_core::FieldValue;
use uuid::Uuid;

use crate::error::{ConfigurationError, OpcUaError};

// =============================================================================
// NodeId
// =============================================================================

/// OPC UA Node Identifier.
///
/// Serialized in configuration as its text form, e.g. `ns=2;s=Line1.Temp`.
///
/// # Examples
///
/// ```
/// use trap_opcua_listener::types::NodeId;
///
/// let node: NodeId = "ns=3;s=Temperature".parse().unwrap();
/// assert_eq!(node, NodeId::string(3, "Temperature"));
/// assert_eq!(node.to_string(), "ns=3;s=Temperature");
///
/// // Namespace 0 is omitted from the text form.
/// assert_eq!(NodeId::numeric(0, 2041).to_string(), "i=2041");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodeId {
    /// Namespace index (0 = OPC UA standard namespace).
    pub namespace_index: u16,

    /// The node identifier.
    pub identifier: NodeIdentifier,
}

impl NodeId {
    /// Creates a numeric node ID.
    #[inline]
    pub fn numeric(namespace_index: u16, value: u32) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::Numeric(value),
        }
    }

    /// Creates a string node ID.
    #[inline]
    pub fn string(namespace_index: u16, value: impl Into<String>) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::String(value.into()),
        }
    }

    /// Creates a GUID node ID.
    #[inline]
    pub fn guid(namespace_index: u16, value: Uuid) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::Guid(value),
        }
    }

    /// Creates an opaque (byte string) node ID.
    #[inline]
    pub fn opaque(namespace_index: u16, value: Vec<u8>) -> Self {
        Self {
            namespace_index,
            identifier: NodeIdentifier::Opaque(value),
        }
    }

    /// Returns the numeric value if this is a numeric node ID.
    pub fn as_numeric(&self) -> Option<u32> {
        match self.identifier {
            NodeIdentifier::Numeric(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the OPC UA text form.
    pub fn to_opc_string(&self) -> String {
        if self.namespace_index == 0 {
            self.identifier.to_string()
        } else {
            format!("ns={};{}", self.namespace_index, self.identifier)
        }
    }

    /// Returns the most compact binary encoding able to carry this node ID.
    ///
    /// Numeric identifiers in namespace 0 up to 255 use the two-byte form;
    /// namespaces up to 255 with identifiers up to 65535 use the four-byte
    /// form.
    pub fn default_encoding(&self) -> NodeIdEncoding {
        match self.identifier {
            NodeIdentifier::Numeric(v) if self.namespace_index == 0 && v <= 0xFF => {
                NodeIdEncoding::TwoByte
            }
            NodeIdentifier::Numeric(v) if self.namespace_index <= 0xFF && v <= 0xFFFF => {
                NodeIdEncoding::FourByte
            }
            NodeIdentifier::Numeric(_) => NodeIdEncoding::Numeric,
            NodeIdentifier::String(_) => NodeIdEncoding::String,
            NodeIdentifier::Guid(_) => NodeIdEncoding::Guid,
            NodeIdentifier::Opaque(_) => NodeIdEncoding::ByteString,
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_opc_string())
    }
}

impl FromStr for NodeId {
    type Err = OpcUaError;

    /// Parses a NodeId from OPC UA string format.
    ///
    /// Supported formats:
    /// - `ns=2;i=1001` (numeric)
    /// - `ns=2;s=MyNode` (string)
    /// - `ns=2;g=550e8400-e29b-41d4-a716-446655440000` (GUID)
    /// - `ns=2;b=SGVsbG8=` (opaque, base64 encoded)
    /// - `i=1001`, `s=MyNode` (namespace 0)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = |reason: String| {
            OpcUaError::configuration(ConfigurationError::invalid_node_id(s, reason))
        };

        let (namespace_index, identifier_part) = match s.strip_prefix("ns=") {
            Some(rest) => {
                let (ns_str, id_part) = rest
                    .split_once(';')
                    .ok_or_else(|| invalid("Missing identifier after namespace".to_string()))?;
                let ns: u16 = ns_str
                    .parse()
                    .map_err(|_| invalid("Invalid namespace index".to_string()))?;
                (ns, id_part)
            }
            None => (0, s),
        };

        let identifier = if let Some(id) = identifier_part.strip_prefix("i=") {
            NodeIdentifier::Numeric(
                id.parse()
                    .map_err(|_| invalid("Invalid numeric identifier".to_string()))?,
            )
        } else if let Some(id) = identifier_part.strip_prefix("s=") {
            NodeIdentifier::String(id.to_string())
        } else if let Some(id) = identifier_part.strip_prefix("g=") {
            NodeIdentifier::Guid(
                Uuid::parse_str(id).map_err(|e| invalid(format!("Invalid GUID: {}", e)))?,
            )
        } else if let Some(id) = identifier_part.strip_prefix("b=") {
            NodeIdentifier::Opaque(
                BASE64
                    .decode(id)
                    .map_err(|e| invalid(format!("Invalid base64: {}", e)))?,
            )
        } else {
            return Err(invalid(
                "Unknown identifier type. Expected i=, s=, g=, or b=".to_string(),
            ));
        };

        Ok(Self {
            namespace_index,
            identifier,
        })
    }
}

impl TryFrom<String> for NodeId {
    type Error = OpcUaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<NodeId> for String {
    fn from(node: NodeId) -> Self {
        node.to_opc_string()
    }
}

// =============================================================================
// NodeIdentifier
// =============================================================================

/// OPC UA node identifier types.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeIdentifier {
    /// Numeric identifier.
    Numeric(u32),

    /// String identifier.
    String(String),

    /// GUID identifier.
    Guid(Uuid),

    /// Opaque identifier (application-specific byte array).
    Opaque(Vec<u8>),
}

impl NodeIdentifier {
    /// Returns the identifier type prefix for OPC UA string format.
    pub const fn type_prefix(&self) -> char {
        match self {
            Self::Numeric(_) => 'i',
            Self::String(_) => 's',
            Self::Guid(_) => 'g',
            Self::Opaque(_) => 'b',
        }
    }
}

impl fmt::Display for NodeIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(v) => write!(f, "i={}", v),
            Self::String(v) => write!(f, "s={}", v),
            Self::Guid(v) => write!(f, "g={}", v),
            Self::Opaque(v) => write!(f, "b={}", BASE64.encode(v)),
        }
    }
}

// =============================================================================
// NodeIdEncoding / EncodedNodeId
// =============================================================================

/// Binary encodings of a node identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeIdEncoding {
    /// Namespace 0, identifier 0-255.
    TwoByte,
    /// Namespace 0-255, identifier 0-65535.
    FourByte,
    /// Full numeric form.
    Numeric,
    /// String identifier.
    String,
    /// GUID identifier.
    Guid,
    /// Opaque identifier.
    ByteString,
}

impl fmt::Display for NodeIdEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TwoByte => "two_byte",
            Self::FourByte => "four_byte",
            Self::Numeric => "numeric",
            Self::String => "string",
            Self::Guid => "guid",
            Self::ByteString => "byte_string",
        };
        f.write_str(name)
    }
}

/// A node identifier committed to a specific binary encoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EncodedNodeId {
    /// Two-byte form.
    TwoByte(u8),
    /// Four-byte form.
    FourByte {
        /// Namespace index.
        namespace: u8,
        /// Identifier.
        id: u16,
    },
    /// Full numeric form.
    Numeric {
        /// Namespace index.
        namespace: u16,
        /// Identifier.
        id: u32,
    },
    /// String form.
    String {
        /// Namespace index.
        namespace: u16,
        /// Identifier.
        id: String,
    },
    /// GUID form.
    Guid {
        /// Namespace index.
        namespace: u16,
        /// Identifier.
        id: Uuid,
    },
    /// Byte string form.
    ByteString {
        /// Namespace index.
        namespace: u16,
        /// Identifier.
        id: Vec<u8>,
    },
}

impl EncodedNodeId {
    /// Commits `node` to `encoding`.
    ///
    /// Fails if the identifier kind does not fit the encoding, or if a compact
    /// numeric encoding cannot represent the namespace or identifier.
    pub fn resolve(node: &NodeId, encoding: NodeIdEncoding) -> Result<Self, ConfigurationError> {
        let ns = node.namespace_index;
        match (encoding, &node.identifier) {
            (NodeIdEncoding::TwoByte, NodeIdentifier::Numeric(id)) => {
                if ns != 0 {
                    return Err(ConfigurationError::invalid_event_filter(format!(
                        "twoByte EventType requires namespace 0, got {}",
                        ns
                    )));
                }
                u8::try_from(*id).map(Self::TwoByte).map_err(|_| {
                    ConfigurationError::invalid_event_filter(format!(
                        "twoByte EventType requires a value in the range 0-255, got {}",
                        id
                    ))
                })
            }
            (NodeIdEncoding::FourByte, NodeIdentifier::Numeric(id)) => {
                let namespace = u8::try_from(ns).map_err(|_| {
                    ConfigurationError::invalid_event_filter(format!(
                        "fourByte EventType requires a namespace in the range 0-255, got {}",
                        ns
                    ))
                })?;
                let id = u16::try_from(*id).map_err(|_| {
                    ConfigurationError::invalid_event_filter(format!(
                        "fourByte EventType requires a value in the range 0-65535, got {}",
                        id
                    ))
                })?;
                Ok(Self::FourByte { namespace, id })
            }
            (NodeIdEncoding::Numeric, NodeIdentifier::Numeric(id)) => Ok(Self::Numeric {
                namespace: ns,
                id: *id,
            }),
            (NodeIdEncoding::String, NodeIdentifier::String(id)) => Ok(Self::String {
                namespace: ns,
                id: id.clone(),
            }),
            (NodeIdEncoding::Guid, NodeIdentifier::Guid(id)) => Ok(Self::Guid {
                namespace: ns,
                id: *id,
            }),
            (NodeIdEncoding::ByteString, NodeIdentifier::Opaque(id)) => Ok(Self::ByteString {
                namespace: ns,
                id: id.clone(),
            }),
            (encoding, _) => Err(ConfigurationError::invalid_event_filter(format!(
                "unsupported NodeID type: {} cannot be encoded as {}",
                node, encoding
            ))),
        }
    }

    /// Returns the encoding in use.
    pub fn encoding(&self) -> NodeIdEncoding {
        match self {
            Self::TwoByte(_) => NodeIdEncoding::TwoByte,
            Self::FourByte { .. } => NodeIdEncoding::FourByte,
            Self::Numeric { .. } => NodeIdEncoding::Numeric,
            Self::String { .. } => NodeIdEncoding::String,
            Self::Guid { .. } => NodeIdEncoding::Guid,
            Self::ByteString { .. } => NodeIdEncoding::ByteString,
        }
    }
}

// =============================================================================
// StatusCode
// =============================================================================

/// OPC UA status code.
///
/// The top two bits carry the severity: `00` good, `01` uncertain, `10` bad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusCode(pub u32);

impl StatusCode {
    /// The operation succeeded.
    pub const GOOD: StatusCode = StatusCode(0);
    /// Generic uncertain.
    pub const UNCERTAIN: StatusCode = StatusCode(0x4000_0000);
    /// Generic bad.
    pub const BAD: StatusCode = StatusCode(0x8000_0000);
    /// The node id refers to a node that does not exist.
    pub const BAD_NODE_ID_UNKNOWN: StatusCode = StatusCode(0x8034_0000);
    /// The syntax of the node id is not valid.
    pub const BAD_NODE_ID_INVALID: StatusCode = StatusCode(0x8033_0000);
    /// The monitored item filter is not supported.
    pub const BAD_MONITORED_ITEM_FILTER_UNSUPPORTED: StatusCode = StatusCode(0x8044_0000);
    /// No communication with the data source.
    pub const BAD_NO_COMMUNICATION: StatusCode = StatusCode(0x8031_0000);
    /// Waiting for the server to obtain values.
    pub const BAD_WAITING_FOR_INITIAL_DATA: StatusCode = StatusCode(0x8032_0000);
    /// The last usable value is being returned.
    pub const UNCERTAIN_LAST_USABLE_VALUE: StatusCode = StatusCode(0x4090_0000);

    /// Returns the raw code.
    #[inline]
    pub const fn bits(&self) -> u32 {
        self.0
    }

    /// Returns `true` for good codes.
    #[inline]
    pub const fn is_good(&self) -> bool {
        self.0 & 0xC000_0000 == 0
    }

    /// Returns `true` for uncertain codes.
    #[inline]
    pub const fn is_uncertain(&self) -> bool {
        self.0 & 0xC000_0000 == 0x4000_0000
    }

    /// Returns `true` for bad codes.
    #[inline]
    pub const fn is_bad(&self) -> bool {
        self.0 & 0x8000_0000 != 0
    }

    /// Returns the symbolic name, ignoring the info bits.
    pub fn name(&self) -> &'static str {
        match self.0 & 0xFFFF_0000 {
            0x0000_0000 => "OK",
            0x002D_0000 => "GoodSubscriptionTransferred",
            0x00A5_0000 => "GoodOverload",
            0x4000_0000 => "Uncertain",
            0x408F_0000 => "UncertainNoCommunicationLastUsableValue",
            0x4090_0000 => "UncertainLastUsableValue",
            0x4091_0000 => "UncertainSubstituteValue",
            0x4092_0000 => "UncertainInitialValue",
            0x4093_0000 => "UncertainSensorNotAccurate",
            0x4094_0000 => "UncertainEngineeringUnitsExceeded",
            0x4095_0000 => "UncertainSubNormal",
            0x8000_0000 => "Bad",
            0x8001_0000 => "BadUnexpectedError",
            0x8002_0000 => "BadInternalError",
            0x8003_0000 => "BadOutOfMemory",
            0x8004_0000 => "BadResourceUnavailable",
            0x8005_0000 => "BadCommunicationError",
            0x8006_0000 => "BadEncodingError",
            0x8007_0000 => "BadDecodingError",
            0x800A_0000 => "BadTimeout",
            0x800B_0000 => "BadServiceUnsupported",
            0x800C_0000 => "BadShutdown",
            0x800D_0000 => "BadServerNotConnected",
            0x800E_0000 => "BadServerHalted",
            0x800F_0000 => "BadNothingToDo",
            0x8010_0000 => "BadTooManyOperations",
            0x8025_0000 => "BadSessionIdInvalid",
            0x8026_0000 => "BadSessionClosed",
            0x8027_0000 => "BadSessionNotActivated",
            0x8028_0000 => "BadSubscriptionIdInvalid",
            0x8031_0000 => "BadNoCommunication",
            0x8032_0000 => "BadWaitingForInitialData",
            0x8033_0000 => "BadNodeIdInvalid",
            0x8034_0000 => "BadNodeIdUnknown",
            0x8035_0000 => "BadAttributeIdInvalid",
            0x803A_0000 => "BadNotReadable",
            0x803C_0000 => "BadOutOfRange",
            0x803D_0000 => "BadNotSupported",
            0x803E_0000 => "BadNotFound",
            0x8041_0000 => "BadMonitoringModeInvalid",
            0x8042_0000 => "BadMonitoredItemIdInvalid",
            0x8043_0000 => "BadMonitoredItemFilterInvalid",
            0x8044_0000 => "BadMonitoredItemFilterUnsupported",
            0x8045_0000 => "BadFilterNotAllowed",
            0x8047_0000 => "BadEventFilterInvalid",
            0x8048_0000 => "BadContentFilterInvalid",
            0x8049_0000 => "BadFilterOperandInvalid",
            0x8089_0000 => "BadConfigurationError",
            0x808A_0000 => "BadNotConnected",
            0x808B_0000 => "BadDeviceFailure",
            0x808C_0000 => "BadSensorFailure",
            0x808D_0000 => "BadOutOfService",
            0x808E_0000 => "BadDeadbandFilterInvalid",
            0x80DB_0000 => "BadTooManyMonitoredItems",
            _ => "StatusCode",
        }
    }
}

impl fmt::Display for StatusCode {
    /// Renders `<Name> (0x<hex>)`, e.g. `OK (0x0)`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:X})", self.name(), self.0)
    }
}

impl From<u32> for StatusCode {
    fn from(code: u32) -> Self {
        Self(code)
    }
}

// =============================================================================
// BuiltinType
// =============================================================================

/// Prefix carried by qualified built-in type names.
pub const TYPE_NAME_PREFIX: &str = "TypeID";

/// OPC UA built-in data types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuiltinType {
    /// Boolean value.
    Boolean,
    /// Signed 8-bit integer.
    SByte,
    /// Unsigned 8-bit integer.
    Byte,
    /// Signed 16-bit integer.
    Int16,
    /// Unsigned 16-bit integer.
    UInt16,
    /// Signed 32-bit integer.
    Int32,
    /// Unsigned 32-bit integer.
    UInt32,
    /// Signed 64-bit integer.
    Int64,
    /// Unsigned 64-bit integer.
    UInt64,
    /// 32-bit IEEE 754 float.
    Float,
    /// 64-bit IEEE 754 double.
    Double,
    /// UTF-8 string.
    String,
    /// Date and time.
    DateTime,
    /// GUID.
    Guid,
    /// Raw byte string.
    ByteString,
    /// Node ID.
    NodeId,
    /// Status code.
    StatusCode,
    /// Qualified name.
    QualifiedName,
    /// Localized text.
    LocalizedText,
    /// Variant (can contain any type).
    Variant,
}

impl BuiltinType {
    /// Returns the OPC UA type ID.
    pub const fn type_id(&self) -> u32 {
        match self {
            Self::Boolean => 1,
            Self::SByte => 2,
            Self::Byte => 3,
            Self::Int16 => 4,
            Self::UInt16 => 5,
            Self::Int32 => 6,
            Self::UInt32 => 7,
            Self::Int64 => 8,
            Self::UInt64 => 9,
            Self::Float => 10,
            Self::Double => 11,
            Self::String => 12,
            Self::DateTime => 13,
            Self::Guid => 14,
            Self::ByteString => 15,
            Self::NodeId => 17,
            Self::StatusCode => 19,
            Self::QualifiedName => 20,
            Self::LocalizedText => 21,
            Self::Variant => 24,
        }
    }

    /// Returns the bare type name, e.g. `Double`.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Boolean => "Boolean",
            Self::SByte => "SByte",
            Self::Byte => "Byte",
            Self::Int16 => "Int16",
            Self::UInt16 => "UInt16",
            Self::Int32 => "Int32",
            Self::UInt32 => "UInt32",
            Self::Int64 => "Int64",
            Self::UInt64 => "UInt64",
            Self::Float => "Float",
            Self::Double => "Double",
            Self::String => "String",
            Self::DateTime => "DateTime",
            Self::Guid => "Guid",
            Self::ByteString => "ByteString",
            Self::NodeId => "NodeId",
            Self::StatusCode => "StatusCode",
            Self::QualifiedName => "QualifiedName",
            Self::LocalizedText => "LocalizedText",
            Self::Variant => "Variant",
        }
    }

    /// Returns the qualified type name, e.g. `TypeIDDouble`.
    pub fn qualified_name(&self) -> String {
        format!("{}{}", TYPE_NAME_PREFIX, self.name())
    }
}

impl fmt::Display for BuiltinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified_name())
    }
}

// =============================================================================
// QualifiedName / LocalizedText
// =============================================================================

/// A name qualified by a namespace index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedName {
    /// Namespace index.
    pub namespace_index: u16,
    /// Name.
    pub name: String,
}

impl QualifiedName {
    /// Creates a qualified name.
    pub fn new(namespace_index: u16, name: impl Into<String>) -> Self {
        Self {
            namespace_index,
            name: name.into(),
        }
    }
}

/// Human-readable text with an optional locale.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct LocalizedText {
    /// Locale, e.g. `en-US`.
    pub locale: String,
    /// Text.
    pub text: String,
}

impl LocalizedText {
    /// Creates localized text.
    pub fn new(locale: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            text: text.into(),
        }
    }
}

// =============================================================================
// Variant
// =============================================================================

/// Value carried by data-change and event notifications.
#[derive(Debug, Clone, PartialEq)]
pub enum Variant {
    /// Boolean value.
    Boolean(bool),
    /// Signed 8-bit integer.
    SByte(i8),
    /// Unsigned 8-bit integer.
    Byte(u8),
    /// Signed 16-bit integer.
    Int16(i16),
    /// Unsigned 16-bit integer.
    UInt16(u16),
    /// Signed 32-bit integer.
    Int32(i32),
    /// Unsigned 32-bit integer.
    UInt32(u32),
    /// Signed 64-bit integer.
    Int64(i64),
    /// Unsigned 64-bit integer.
    UInt64(u64),
    /// 32-bit float.
    Float(f32),
    /// 64-bit double.
    Double(f64),
    /// String value.
    String(String),
    /// Date/time value.
    DateTime(DateTime<Utc>),
    /// GUID value.
    Guid(Uuid),
    /// Byte string value.
    ByteString(Vec<u8>),
    /// Node ID value.
    NodeId(NodeId),
    /// Status code value.
    StatusCode(StatusCode),
    /// Qualified name value.
    QualifiedName(QualifiedName),
    /// Localized text value.
    LocalizedText(LocalizedText),
    /// Array of values.
    Array(Vec<Variant>),
}

impl Variant {
    /// Returns the built-in type of the value.
    ///
    /// Arrays report their element type; empty arrays report `Variant`.
    pub fn builtin_type(&self) -> BuiltinType {
        match self {
            Self::Boolean(_) => BuiltinType::Boolean,
            Self::SByte(_) => BuiltinType::SByte,
            Self::Byte(_) => BuiltinType::Byte,
            Self::Int16(_) => BuiltinType::Int16,
            Self::UInt16(_) => BuiltinType::UInt16,
            Self::Int32(_) => BuiltinType::Int32,
            Self::UInt32(_) => BuiltinType::UInt32,
            Self::Int64(_) => BuiltinType::Int64,
            Self::UInt64(_) => BuiltinType::UInt64,
            Self::Float(_) => BuiltinType::Float,
            Self::Double(_) => BuiltinType::Double,
            Self::String(_) => BuiltinType::String,
            Self::DateTime(_) => BuiltinType::DateTime,
            Self::Guid(_) => BuiltinType::Guid,
            Self::ByteString(_) => BuiltinType::ByteString,
            Self::NodeId(_) => BuiltinType::NodeId,
            Self::StatusCode(_) => BuiltinType::StatusCode,
            Self::QualifiedName(_) => BuiltinType::QualifiedName,
            Self::LocalizedText(_) => BuiltinType::LocalizedText,
            Self::Array(items) => items
                .first()
                .map(Variant::builtin_type)
                .unwrap_or(BuiltinType::Variant),
        }
    }

    /// Returns the localized text payload, if this is one.
    pub fn as_localized_text(&self) -> Option<&LocalizedText> {
        match self {
            Self::LocalizedText(t) => Some(t),
            _ => None,
        }
    }

    /// Converts into a measurement field value.
    ///
    /// Date/time values are rendered as RFC 3339 text; use
    /// [`Variant::to_field_value_with_format`] to pick the format.
    pub fn to_field_value(&self) -> FieldValue {
        match self {
            Self::Boolean(v) => FieldValue::Boolean(*v),
            Self::SByte(v) => FieldValue::from(*v),
            Self::Byte(v) => FieldValue::from(*v),
            Self::Int16(v) => FieldValue::from(*v),
            Self::UInt16(v) => FieldValue::from(*v),
            Self::Int32(v) => FieldValue::from(*v),
            Self::UInt32(v) => FieldValue::from(*v),
            Self::Int64(v) => FieldValue::from(*v),
            Self::UInt64(v) => FieldValue::from(*v),
            Self::Float(v) => FieldValue::from(*v),
            Self::Double(v) => FieldValue::from(*v),
            Self::String(v) => FieldValue::String(v.clone()),
            Self::DateTime(v) => {
                FieldValue::String(v.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            Self::Guid(v) => FieldValue::String(v.to_string()),
            Self::ByteString(v) => FieldValue::Bytes(v.clone()),
            Self::NodeId(v) => FieldValue::String(v.to_opc_string()),
            Self::StatusCode(v) => FieldValue::Unsigned(v.bits() as u64),
            Self::QualifiedName(v) => FieldValue::String(v.name.clone()),
            Self::LocalizedText(v) => FieldValue::String(v.text.clone()),
            Self::Array(items) => {
                FieldValue::Array(items.iter().map(Variant::to_field_value).collect())
            }
        }
    }

    /// Converts into a field value, formatting date/time values with the
    /// given chrono format string.
    ///
    /// An unusable format falls back to RFC 3339 text.
    pub fn to_field_value_with_format(&self, timestamp_format: &str) -> FieldValue {
        match self {
            Self::DateTime(v) => {
                let mut text = String::new();
                match write!(text, "{}", v.format(timestamp_format)) {
                    Ok(()) => FieldValue::String(text),
                    Err(fmt::Error) => {
                        tracing::warn!(format = timestamp_format, "Invalid timestamp format");
                        self.to_field_value()
                    }
                }
            }
            other => other.to_field_value(),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LocalizedText(t) => write!(f, "{}", t.text),
            Self::QualifiedName(q) => write!(f, "{}:{}", q.namespace_index, q.name),
            other => write!(f, "{}", other.to_field_value()),
        }
    }
}

// =============================================================================
// Protocol enums
// =============================================================================

/// Node attribute addressed by a monitored item or operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeId {
    /// The node's event notifier attribute.
    EventNotifier,
    /// The node's value attribute.
    Value,
}

impl AttributeId {
    /// Returns the attribute ID number.
    pub const fn id(&self) -> u32 {
        match self {
            Self::EventNotifier => 12,
            Self::Value => 13,
        }
    }
}

/// Which timestamps the server returns with monitored values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TimestampsToReturn {
    /// Source timestamp only.
    Source,
    /// Server timestamp only.
    Server,
    /// Both timestamps.
    #[default]
    Both,
    /// No timestamps.
    Neither,
}

/// Monitoring mode of a monitored item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MonitoringMode {
    /// Sampling and reporting disabled.
    Disabled,
    /// Sampling enabled, reporting disabled.
    Sampling,
    /// Sampling and reporting enabled.
    #[default]
    Reporting,
}

// =============================================================================
// humantime_serde helper
// =============================================================================

pub(crate) mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        humantime::format_duration(*duration)
            .to_string()
            .serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    // ===== NodeId Tests =====

    #[test]
    fn test_node_id_parse_forms() {
        assert_eq!("ns=2;i=1001".parse::<NodeId>().unwrap(), NodeId::numeric(2, 1001));
        assert_eq!("i=2041".parse::<NodeId>().unwrap(), NodeId::numeric(0, 2041));
        assert_eq!(
            "ns=3;s=Temperature".parse::<NodeId>().unwrap(),
            NodeId::string(3, "Temperature")
        );
        assert_eq!(
            "ns=1;b=AQID".parse::<NodeId>().unwrap(),
            NodeId::opaque(1, vec![1, 2, 3])
        );

        let guid: NodeId = "ns=2;g=550e8400-e29b-41d4-a716-446655440000".parse().unwrap();
        assert_eq!(guid.to_string(), "ns=2;g=550e8400-e29b-41d4-a716-446655440000");
    }

    #[test]
    fn test_node_id_parse_errors() {
        assert!("ns=x;i=1".parse::<NodeId>().is_err());
        assert!("ns=2".parse::<NodeId>().is_err());
        assert!("ns=2;i=abc".parse::<NodeId>().is_err());
        assert!("ns=2;g=not-a-guid".parse::<NodeId>().is_err());
        assert!("ns=2;x=1".parse::<NodeId>().is_err());
    }

    #[test]
    fn test_node_id_serde_as_text() {
        let node: NodeId = serde_json::from_str(r#""ns=2;s=Pump.Speed""#).unwrap();
        assert_eq!(node, NodeId::string(2, "Pump.Speed"));
        assert_eq!(serde_json::to_string(&node).unwrap(), r#""ns=2;s=Pump.Speed""#);
    }

    // ===== Encoding Tests =====

    #[test]
    fn test_default_encoding() {
        assert_eq!(NodeId::numeric(0, 2041).default_encoding(), NodeIdEncoding::FourByte);
        assert_eq!(NodeId::numeric(0, 200).default_encoding(), NodeIdEncoding::TwoByte);
        assert_eq!(NodeId::numeric(3, 70_000).default_encoding(), NodeIdEncoding::Numeric);
        assert_eq!(NodeId::numeric(300, 5).default_encoding(), NodeIdEncoding::Numeric);
        assert_eq!(NodeId::string(1, "x").default_encoding(), NodeIdEncoding::String);
    }

    #[test]
    fn test_encoded_node_id_ranges() {
        let two = EncodedNodeId::resolve(&NodeId::numeric(0, 255), NodeIdEncoding::TwoByte);
        assert_eq!(two.unwrap(), EncodedNodeId::TwoByte(255));

        let err = EncodedNodeId::resolve(&NodeId::numeric(0, 256), NodeIdEncoding::TwoByte)
            .unwrap_err();
        assert!(err.to_string().contains("range 0-255, got 256"));

        let err = EncodedNodeId::resolve(&NodeId::numeric(1, 70_000), NodeIdEncoding::FourByte)
            .unwrap_err();
        assert!(err.to_string().contains("0-65535"));

        let err = EncodedNodeId::resolve(&NodeId::string(1, "x"), NodeIdEncoding::Numeric)
            .unwrap_err();
        assert!(err.to_string().contains("unsupported NodeID type"));
    }

    // ===== StatusCode Tests =====

    #[test]
    fn test_status_code_classification() {
        assert!(StatusCode::GOOD.is_good());
        assert!(StatusCode::UNCERTAIN_LAST_USABLE_VALUE.is_uncertain());
        assert!(!StatusCode::UNCERTAIN_LAST_USABLE_VALUE.is_good());
        assert!(StatusCode::BAD_NODE_ID_UNKNOWN.is_bad());
        assert!(!StatusCode::BAD_NODE_ID_UNKNOWN.is_good());
    }

    #[test]
    fn test_status_code_display() {
        assert_eq!(StatusCode::GOOD.to_string(), "OK (0x0)");
        assert_eq!(
            StatusCode::BAD_NODE_ID_UNKNOWN.to_string(),
            "BadNodeIdUnknown (0x80340000)"
        );
        assert_eq!(StatusCode(0x8034_0400).name(), "BadNodeIdUnknown");
        assert_eq!(StatusCode(0x8FFF_0000).to_string(), "StatusCode (0x8FFF0000)");
    }

    // ===== Variant Tests =====

    #[test]
    fn test_variant_builtin_type_names() {
        assert_eq!(Variant::Double(1.0).builtin_type().qualified_name(), "TypeIDDouble");
        assert_eq!(Variant::Array(vec![Variant::Int32(1)]).builtin_type(), BuiltinType::Int32);
        assert_eq!(Variant::Array(vec![]).builtin_type(), BuiltinType::Variant);
        assert_eq!(BuiltinType::DateTime.type_id(), 13);
    }

    #[test]
    fn test_variant_field_values() {
        assert_eq!(Variant::Int16(-4).to_field_value(), FieldValue::Integer(-4));
        assert_eq!(Variant::UInt32(4).to_field_value(), FieldValue::Unsigned(4));
        assert_eq!(
            Variant::LocalizedText(LocalizedText::new("en", "Overheat")).to_field_value(),
            FieldValue::String("Overheat".into())
        );

        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        assert_eq!(
            Variant::DateTime(ts).to_field_value_with_format("%Y/%m/%d %H:%M"),
            FieldValue::String("2024/05/01 12:30".into())
        );
    }

    #[test]
    fn test_invalid_timestamp_format_falls_back() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        assert_eq!(
            Variant::DateTime(ts).to_field_value_with_format("%Y-%Q"),
            FieldValue::String("2024-05-01T12:30:00Z".into())
        );
    }
}
