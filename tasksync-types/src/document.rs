//! Remote document field model.
//!
//! Values serialize in the Firestore REST shape (`{"stringValue": "..."}`,
//! `{"arrayValue": {"values": [...]}}`, ...), so the same types are used on
//! the wire and in the translation layer.
//!
//! Reading is lenient: a value of a type this model does not know
//! (`geoPointValue`, `referenceValue`, `bytesValue`, ...) or a known type
//! with a malformed payload becomes [`FieldValue::Unsupported`] instead of
//! failing the document, so translation can fall back to its defaults.

use crate::identity::RemoteId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Field name -> value map of one document.
pub type FieldMap = BTreeMap<String, FieldValue>;

/// A typed document field value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FieldValue {
    #[serde(rename = "nullValue")]
    Null(NullValue),
    #[serde(rename = "booleanValue")]
    Boolean(bool),
    /// The REST API encodes 64-bit integers as decimal strings.
    #[serde(rename = "integerValue", serialize_with = "int_as_string")]
    Integer(i64),
    /// Non-finite values travel as `"NaN"`, `"Infinity"`, `"-Infinity"`.
    #[serde(rename = "doubleValue", serialize_with = "double_lenient")]
    Double(f64),
    #[serde(rename = "timestampValue")]
    Timestamp(DateTime<Utc>),
    #[serde(rename = "stringValue")]
    String(String),
    #[serde(rename = "arrayValue")]
    Array(ArrayValue),
    #[serde(rename = "mapValue")]
    Map(MapValue),
    /// A value that could not be read, tagged with its wire type name.
    /// Never written back.
    #[serde(skip_serializing)]
    Unsupported(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NullValue {
    #[serde(rename = "NULL_VALUE")]
    NullValue,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArrayValue {
    #[serde(default)]
    pub values: Vec<FieldValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapValue {
    #[serde(default)]
    pub fields: FieldMap,
}

impl FieldValue {
    pub fn null() -> Self {
        Self::Null(NullValue::NullValue)
    }

    pub fn array(values: impl IntoIterator<Item = FieldValue>) -> Self {
        Self::Array(ArrayValue {
            values: values.into_iter().collect(),
        })
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[FieldValue]> {
        match self {
            Self::Array(a) => Some(&a.values),
            _ => None,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unsupported(_))
    }

    /// Reads one wire value. Never fails.
    fn from_wire(value: Value) -> Self {
        let Value::Object(entries) = value else {
            return Self::Unsupported("non-object value".into());
        };
        let Some((kind, payload)) = entries.into_iter().next() else {
            return Self::Unsupported("empty value".into());
        };
        Self::read_kind(&kind, payload).unwrap_or(Self::Unsupported(kind))
    }

    fn read_kind(kind: &str, payload: Value) -> Option<Self> {
        match kind {
            "nullValue" => Some(Self::null()),
            "booleanValue" => payload.as_bool().map(Self::Boolean),
            "integerValue" => match &payload {
                Value::String(s) => s.trim().parse().ok(),
                other => other.as_i64(),
            }
            .map(Self::Integer),
            "doubleValue" => match &payload {
                Value::String(s) => match s.as_str() {
                    "NaN" => Some(f64::NAN),
                    "Infinity" => Some(f64::INFINITY),
                    "-Infinity" => Some(f64::NEG_INFINITY),
                    other => other.trim().parse().ok(),
                },
                other => other.as_f64(),
            }
            .map(Self::Double),
            "timestampValue" => payload
                .as_str()
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|ts| Self::Timestamp(ts.with_timezone(&Utc))),
            "stringValue" => match payload {
                Value::String(s) => Some(Self::String(s)),
                _ => None,
            },
            "arrayValue" => match payload {
                Value::Object(mut body) => {
                    let values = match body.remove("values") {
                        Some(Value::Array(items)) => items.into_iter().map(Self::from_wire).collect(),
                        None | Some(Value::Null) => Vec::new(),
                        Some(_) => return None,
                    };
                    Some(Self::Array(ArrayValue { values }))
                }
                _ => None,
            },
            "mapValue" => match payload {
                Value::Object(mut body) => {
                    let fields = match body.remove("fields") {
                        Some(Value::Object(fields)) => fields
                            .into_iter()
                            .map(|(name, v)| (name, Self::from_wire(v)))
                            .collect(),
                        None | Some(Value::Null) => FieldMap::new(),
                        Some(_) => return None,
                    };
                    Some(Self::Map(MapValue { fields }))
                }
                _ => None,
            },
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        Ok(Self::from_wire(Value::deserialize(d)?))
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(ts: DateTime<Utc>) -> Self {
        Self::Timestamp(ts)
    }
}

/// A document read from the remote store.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteDocument {
    pub id: RemoteId,
    pub fields: FieldMap,
}

impl RemoteDocument {
    pub fn new(id: RemoteId, fields: FieldMap) -> Self {
        Self { id, fields }
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }
}

fn int_as_string<S: serde::Serializer>(v: &i64, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&v.to_string())
}

fn double_lenient<S: serde::Serializer>(v: &f64, s: S) -> Result<S::Ok, S::Error> {
    if v.is_nan() {
        s.serialize_str("NaN")
    } else if v.is_infinite() {
        s.serialize_str(if *v > 0.0 { "Infinity" } else { "-Infinity" })
    } else {
        s.serialize_f64(*v)
    }
}
