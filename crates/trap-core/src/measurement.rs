// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Measurement model handed to the metrics pipeline.
//!
//! A [`Measurement`] is the unit a sink accepts: a name, a tag map, a field
//! map and a timestamp. Tags and fields are kept in ordered maps so that two
//! measurements built from the same inputs compare and serialize identically.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Tag set attached to a measurement.
pub type Tags = BTreeMap<String, String>;

/// Field set attached to a measurement.
pub type Fields = BTreeMap<String, FieldValue>;

// =============================================================================
// FieldValue
// =============================================================================

/// A single field value.
///
/// # Examples
///
/// ```
/// use trap_core::FieldValue;
///
/// let v = FieldValue::from(79.0_f64);
/// assert_eq!(v.as_f64(), Some(79.0));
/// assert_eq!(FieldValue::from("OK (0x0)").as_str(), Some("OK (0x0)"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Boolean value.
    Boolean(bool),
    /// Signed integer, widened to 64 bits.
    Integer(i64),
    /// Unsigned integer, widened to 64 bits.
    Unsigned(u64),
    /// Floating point, widened to 64 bits.
    Float(f64),
    /// UTF-8 text.
    String(String),
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// Array of values.
    Array(Vec<FieldValue>),
}

impl FieldValue {
    /// Returns the value type name.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Boolean(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Unsigned(_) => "unsigned",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Array(_) => "array",
        }
    }

    /// Returns the value as `f64` if numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(v) => Some(*v as f64),
            Self::Unsigned(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as a string slice if textual.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as `bool` if boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(v) => write!(f, "{}", v),
            Self::Integer(v) => write!(f, "{}i", v),
            Self::Unsigned(v) => write!(f, "{}u", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::String(v) => write!(f, "{:?}", v),
            Self::Bytes(v) => write!(f, "<{} bytes>", v.len()),
            Self::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

macro_rules! impl_from_field_value {
    ($($ty:ty => $variant:ident as $target:ty),* $(,)?) => {
        $(
            impl From<$ty> for FieldValue {
                #[inline]
                fn from(v: $ty) -> Self {
                    Self::$variant(v as $target)
                }
            }
        )*
    };
}

impl_from_field_value!(
    i8 => Integer as i64,
    i16 => Integer as i64,
    i32 => Integer as i64,
    i64 => Integer as i64,
    u8 => Unsigned as u64,
    u16 => Unsigned as u64,
    u32 => Unsigned as u64,
    u64 => Unsigned as u64,
    f32 => Float as f64,
    f64 => Float as f64,
);

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

// =============================================================================
// Measurement
// =============================================================================

/// A timestamped, tagged measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Measurement name.
    pub name: String,
    /// Tag set.
    pub tags: Tags,
    /// Field set.
    pub fields: Fields,
    /// Measurement time.
    pub timestamp: DateTime<Utc>,
}

impl Measurement {
    /// Creates a measurement without tags or fields.
    pub fn new(name: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            tags: Tags::new(),
            fields: Fields::new(),
            timestamp,
        }
    }

    /// Adds a tag.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Adds a field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Returns a tag value.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Returns a field value.
    pub fn field(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// Returns `true` if the measurement carries no fields.
    ///
    /// Sinks typically drop field-less measurements.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Converts the measurement into a JSON value.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name,
            "tags": self.tags,
            "fields": self.fields,
            "timestamp": self.timestamp.to_rfc3339(),
        })
    }
}

impl fmt::Display for Measurement {
    /// Line-protocol style rendering, used in logs and the CLI.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for (k, v) in &self.tags {
            write!(f, ",{}={}", k, v)?;
        }
        let mut sep = ' ';
        for (k, v) in &self.fields {
            write!(f, "{}{}={}", sep, k, v)?;
            sep = ',';
        }
        write!(
            f,
            " {}",
            self.timestamp.timestamp_nanos_opt().unwrap_or_default()
        )
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_field_value_conversions() {
        assert_eq!(FieldValue::from(5_i16), FieldValue::Integer(5));
        assert_eq!(FieldValue::from(5_u32), FieldValue::Unsigned(5));
        assert_eq!(FieldValue::from(1.5_f32), FieldValue::Float(1.5));
        assert_eq!(FieldValue::from(true).as_bool(), Some(true));
        assert_eq!(FieldValue::Integer(-3).as_f64(), Some(-3.0));
        assert!(FieldValue::from("x").as_f64().is_none());
    }

    #[test]
    fn test_measurement_builder() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let m = Measurement::new("opcua", ts)
            .with_tag("id", "ns=3;s=Temperature")
            .with_field("temp", 79.0)
            .with_field("Quality", "OK (0x0)");

        assert_eq!(m.tag("id"), Some("ns=3;s=Temperature"));
        assert_eq!(m.field("temp"), Some(&FieldValue::Float(79.0)));
        assert_eq!(m.field("Quality").and_then(FieldValue::as_str), Some("OK (0x0)"));
        assert!(!m.is_empty());
    }

    #[test]
    fn test_measurement_display() {
        let ts = Utc.timestamp_opt(1, 0).unwrap();
        let m = Measurement::new("opcua", ts)
            .with_tag("b", "2")
            .with_tag("a", "1")
            .with_field("v", 3_i32);

        assert_eq!(m.to_string(), "opcua,a=1,b=2 v=3i 1000000000");
    }

    #[test]
    fn test_measurement_json() {
        let ts = Utc.timestamp_opt(0, 0).unwrap();
        let m = Measurement::new("opcua_event", ts).with_field("Severity", 500_u16);
        let json = m.to_json();
        assert_eq!(json["name"], "opcua_event");
        assert_eq!(json["fields"]["Severity"], 500);
    }
}
