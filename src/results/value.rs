//! Dynamically typed result values and their text/JSON encodings.

use crate::{Error, Result};

use base64::Engine;
use chrono::{DateTime, FixedOffset, SecondsFormat};
use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

/// Text rendering used for timestamps in CSV/TSV output.
pub const TIMESTAMP_TEXT_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f %z";

/// A single cell returned by the query engine.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultValue {
    Text(String),
    Bytes(Vec<u8>),
    Int(i64),
    UInt(u64),
    Float(f64),
    Float32(f32),
    Bool(bool),
    Timestamp(DateTime<FixedOffset>),
    Null,
    /// Compound values (arrays, maps) only have a JSON form.
    Array(Vec<ResultValue>),
    Map(Vec<(String, ResultValue)>),
}

impl ResultValue {
    /// Canonical text form for delimited output.
    ///
    /// Floats always carry six fractional digits (`12.5` becomes `12.500000`).
    /// Compound values have no text form and fail with [`Error::Coercion`].
    pub fn to_text(&self) -> Result<String> {
        match self {
            ResultValue::Text(s) => Ok(s.clone()),
            ResultValue::Bytes(b) => Ok(String::from_utf8_lossy(b).into_owned()),
            ResultValue::Int(v) => Ok(v.to_string()),
            ResultValue::UInt(v) => Ok(v.to_string()),
            ResultValue::Float(v) => Ok(format!("{:.6}", v)),
            ResultValue::Float32(v) => Ok(format!("{:.6}", v)),
            ResultValue::Bool(v) => Ok(v.to_string()),
            ResultValue::Timestamp(ts) => Ok(ts.format(TIMESTAMP_TEXT_FORMAT).to_string()),
            ResultValue::Null => Ok(String::new()),
            ResultValue::Array(_) | ResultValue::Map(_) => Err(Error::Coercion {
                value: format!("{} {:?}", self.kind(), self),
            }),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ResultValue::Text(_) => "text",
            ResultValue::Bytes(_) => "bytes",
            ResultValue::Int(_) => "int",
            ResultValue::UInt(_) => "uint",
            ResultValue::Float(_) => "float",
            ResultValue::Float32(_) => "float32",
            ResultValue::Bool(_) => "bool",
            ResultValue::Timestamp(_) => "timestamp",
            ResultValue::Null => "null",
            ResultValue::Array(_) => "array",
            ResultValue::Map(_) => "map",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ResultValue::Null)
    }
}

impl Serialize for ResultValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            ResultValue::Text(s) => serializer.serialize_str(s),
            ResultValue::Bytes(b) => serializer
                .serialize_str(&base64::engine::general_purpose::STANDARD.encode(b)),
            ResultValue::Int(v) => serializer.serialize_i64(*v),
            ResultValue::UInt(v) => serializer.serialize_u64(*v),
            ResultValue::Float(v) if v.is_finite() => serializer.serialize_f64(*v),
            ResultValue::Float32(v) if v.is_finite() => serializer.serialize_f32(*v),
            ResultValue::Float(_) | ResultValue::Float32(_) => serializer.serialize_none(),
            ResultValue::Bool(v) => serializer.serialize_bool(*v),
            ResultValue::Timestamp(ts) => {
                serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            ResultValue::Null => serializer.serialize_none(),
            ResultValue::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            ResultValue::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for ResultValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(ResultValue::from)
    }
}

impl From<serde_json::Value> for ResultValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => ResultValue::Null,
            serde_json::Value::Bool(b) => ResultValue::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    ResultValue::Int(i)
                } else if let Some(u) = n.as_u64() {
                    ResultValue::UInt(u)
                } else {
                    ResultValue::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => ResultValue::Text(s),
            serde_json::Value::Array(items) => {
                ResultValue::Array(items.into_iter().map(ResultValue::from).collect())
            }
            serde_json::Value::Object(map) => ResultValue::Map(
                map.into_iter()
                    .map(|(k, v)| (k, ResultValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for ResultValue {
    fn from(value: &str) -> Self {
        ResultValue::Text(value.to_string())
    }
}

impl From<String> for ResultValue {
    fn from(value: String) -> Self {
        ResultValue::Text(value)
    }
}

impl From<i64> for ResultValue {
    fn from(value: i64) -> Self {
        ResultValue::Int(value)
    }
}

impl From<u64> for ResultValue {
    fn from(value: u64) -> Self {
        ResultValue::UInt(value)
    }
}

impl From<f64> for ResultValue {
    fn from(value: f64) -> Self {
        ResultValue::Float(value)
    }
}

impl From<bool> for ResultValue {
    fn from(value: bool) -> Self {
        ResultValue::Bool(value)
    }
}

impl From<DateTime<FixedOffset>> for ResultValue {
    fn from(value: DateTime<FixedOffset>) -> Self {
        ResultValue::Timestamp(value)
    }
}

impl<T: Into<ResultValue>> From<Option<T>> for ResultValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(ResultValue::Null)
    }
}
