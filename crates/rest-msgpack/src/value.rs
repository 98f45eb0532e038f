//! [`Value`] — the dynamic value handed to the renderer and returned by the parser.
//!
//! Shaped like the `PackValue` union of the json-pack codecs, extended with the
//! temporal and decimal types that travel as MessagePack extensions.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bigdecimal::BigDecimal;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use thiserror::Error;

use crate::extension::{Encoded, ExtensionEncoder};

/// A value that can be rendered to, or parsed from, a MessagePack body.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// MessagePack nil
    Null,
    Bool(bool),
    /// Signed integer.
    Integer(i64),
    /// Unsigned integer above `i64::MAX`. Smaller values decode as [`Value::Integer`].
    UInteger(u64),
    Float(f64),
    Str(String),
    /// Binary data (MessagePack `bin` family).
    Bytes(Vec<u8>),
    Array(Vec<Value>),
    /// Ordered key-value pairs.
    Object(Vec<(String, Value)>),
    /// Datetime carrying a UTC offset.
    DateTime(DateTime<FixedOffset>),
    /// Datetime without timezone information.
    NaiveDateTime(NaiveDateTime),
    Date(NaiveDate),
    /// Time of day.
    Time(NaiveTime),
    /// Arbitrary precision decimal.
    Decimal(BigDecimal),
    /// Any other application object. MessagePack has no representation for it.
    Opaque(Opaque),
}

impl Value {
    /// Short lowercase name of the variant, used in logs and error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Integer(_) | Value::UInteger(_) => "integer",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::DateTime(_) | Value::NaiveDateTime(_) => "datetime",
            Value::Date(_) => "date",
            Value::Time(_) => "time",
            Value::Decimal(_) => "decimal",
            Value::Opaque(opaque) => opaque.type_name(),
        }
    }

    /// Build an object from anything yielding `(key, value)` pairs.
    pub fn object<K, I>(fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Object(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Look up a field of an object by key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Object(fields) => fields.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Convert any serializable type through its JSON data model.
    ///
    /// Temporal and decimal types serialized this way arrive as plain strings;
    /// build the typed variants directly to get extension encoding.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self, JsonBridgeError> {
        Ok(Value::from(serde_json::to_value(value)?))
    }
}

/// An application object of a type the codec does not know.
///
/// Compared by identity: two `Opaque` values are equal only when they share
/// the same allocation.
#[derive(Clone)]
pub struct Opaque {
    type_name: &'static str,
    inner: Arc<dyn Any + Send + Sync>,
}

impl Opaque {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            inner: Arc::new(value),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    pub fn ptr_eq(&self, other: &Opaque) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for Opaque {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Opaque").field(&self.type_name).finish()
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v.into())
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    i32 => Integer,
    i64 => Integer,
    f64 => Float,
    String => Str,
    &str => Str,
    Vec<Value> => Array,
    DateTime<FixedOffset> => DateTime,
    NaiveDateTime => NaiveDateTime,
    NaiveDate => Date,
    NaiveTime => Time,
    BigDecimal => Decimal,
    Opaque => Opaque,
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        match i64::try_from(v) {
            Ok(i) => Value::Integer(i),
            Err(_) => Value::UInteger(v),
        }
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Integer(i)
                } else if let Some(u) = n.as_u64() {
                    Value::UInteger(u)
                } else {
                    Value::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(arr) => Value::Array(arr.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(obj) => {
                Value::Object(obj.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum JsonBridgeError {
    #[error("float {0} has no JSON representation")]
    NonFiniteFloat(f64),
    #[error("object of type {type_name} has no JSON representation")]
    Opaque { type_name: &'static str },
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Extension values become their canonical strings; binary data becomes a
/// base64 `data:` URI.
impl TryFrom<Value> for serde_json::Value {
    type Error = JsonBridgeError;

    fn try_from(v: Value) -> Result<Self, Self::Error> {
        if let Encoded::Extension(ext) = ExtensionEncoder.encode(&v) {
            return Ok(serde_json::Value::String(ext.payload));
        }
        Ok(match v {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Integer(i) => serde_json::Value::from(i),
            Value::UInteger(u) => serde_json::Value::from(u),
            Value::Float(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .ok_or(JsonBridgeError::NonFiniteFloat(f))?,
            Value::Str(s) => serde_json::Value::String(s),
            Value::Bytes(b) => serde_json::Value::String(format!(
                "data:application/octet-stream;base64,{}",
                STANDARD.encode(b)
            )),
            Value::Array(items) => serde_json::Value::Array(
                items
                    .into_iter()
                    .map(serde_json::Value::try_from)
                    .collect::<Result<_, _>>()?,
            ),
            Value::Object(fields) => serde_json::Value::Object(
                fields
                    .into_iter()
                    .map(|(k, v)| Ok((k, serde_json::Value::try_from(v)?)))
                    .collect::<Result<_, JsonBridgeError>>()?,
            ),
            Value::Opaque(opaque) => {
                return Err(JsonBridgeError::Opaque {
                    type_name: opaque.type_name(),
                })
            }
            // Claimed by the extension encoder above.
            Value::DateTime(_)
            | Value::NaiveDateTime(_)
            | Value::Date(_)
            | Value::Time(_)
            | Value::Decimal(_) => serde_json::Value::Null,
        })
    }
}
