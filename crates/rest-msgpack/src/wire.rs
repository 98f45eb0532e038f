//! Conversion between [`Value`] and the generic MessagePack value model of `rmpv`.
//!
//! The extension encoder runs on every node on the way out; the extension
//! decoder runs on every `ext` on the way in.

use std::io::Write;

use crate::error::{ParseError, RenderError};
use crate::extension::{Encoded, ExtensionDecoder, ExtensionEncoder};
use crate::Value;

pub(crate) fn to_wire(value: &Value) -> Result<rmpv::Value, RenderError> {
    match ExtensionEncoder.encode(value) {
        Encoded::Extension(ext) => Ok(ext.into_wire()),
        Encoded::Passthrough(value) => passthrough_to_wire(value),
    }
}

fn passthrough_to_wire(value: &Value) -> Result<rmpv::Value, RenderError> {
    Ok(match value {
        Value::Null => rmpv::Value::Nil,
        Value::Bool(b) => rmpv::Value::Boolean(*b),
        Value::Integer(i) => rmpv::Value::from(*i),
        Value::UInteger(u) => rmpv::Value::from(*u),
        Value::Float(f) => rmpv::Value::F64(*f),
        Value::Str(s) => rmpv::Value::String(s.as_str().into()),
        Value::Bytes(b) => rmpv::Value::Binary(b.clone()),
        Value::Array(items) => {
            rmpv::Value::Array(items.iter().map(to_wire).collect::<Result<_, _>>()?)
        }
        Value::Object(fields) => rmpv::Value::Map(
            fields
                .iter()
                .map(|(k, v)| Ok((rmpv::Value::String(k.as_str().into()), to_wire(v)?)))
                .collect::<Result<_, RenderError>>()?,
        ),
        Value::Opaque(opaque) => {
            return Err(RenderError::Unencodable {
                type_name: opaque.type_name(),
            })
        }
        // Recognized types never pass through the extension encoder.
        Value::DateTime(_)
        | Value::NaiveDateTime(_)
        | Value::Date(_)
        | Value::Time(_)
        | Value::Decimal(_) => {
            return Err(RenderError::Unencodable {
                type_name: value.kind(),
            })
        }
    })
}

/// Encode a value and append its bytes to `out`.
pub(crate) fn write_value<W: Write>(out: &mut W, value: &Value) -> Result<(), RenderError> {
    let wire = to_wire(value)?;
    rmpv::encode::write_value(out, &wire)?;
    Ok(())
}

/// Decode exactly one value spanning all of `bytes`, nested at most `max_depth` deep.
pub(crate) fn read_value(bytes: &[u8], max_depth: usize) -> Result<Value, ParseError> {
    let mut cursor = bytes;
    let wire = rmpv::decode::read_value_with_max_depth(&mut cursor, max_depth)?;
    if !cursor.is_empty() {
        return Err(ParseError::malformed(format!(
            "{} unexpected bytes after the top-level value",
            cursor.len()
        )));
    }
    from_wire(wire)
}

pub(crate) fn from_wire(wire: rmpv::Value) -> Result<Value, ParseError> {
    Ok(match wire {
        rmpv::Value::Nil => Value::Null,
        rmpv::Value::Boolean(b) => Value::Bool(b),
        rmpv::Value::Integer(n) => match (n.as_i64(), n.as_u64()) {
            (Some(i), _) => Value::Integer(i),
            (None, Some(u)) => Value::UInteger(u),
            (None, None) => return Err(ParseError::malformed(format!("integer {n} out of range"))),
        },
        rmpv::Value::F32(f) => Value::Float(f64::from(f)),
        rmpv::Value::F64(f) => Value::Float(f),
        rmpv::Value::String(s) => Value::Str(utf8(s)?),
        rmpv::Value::Binary(b) => Value::Bytes(b),
        rmpv::Value::Array(items) => {
            Value::Array(items.into_iter().map(from_wire).collect::<Result<_, _>>()?)
        }
        rmpv::Value::Map(entries) => Value::Object(
            entries
                .into_iter()
                .map(|(k, v)| match k {
                    rmpv::Value::String(key) => Ok((utf8(key)?, from_wire(v)?)),
                    other => Err(ParseError::malformed(format!(
                        "map keys must be strings, found {other}"
                    ))),
                })
                .collect::<Result<_, _>>()?,
        ),
        rmpv::Value::Ext(code, payload) => ExtensionDecoder.decode_raw(code, &payload)?,
    })
}

fn utf8(s: rmpv::Utf8String) -> Result<String, ParseError> {
    s.into_str()
        .ok_or_else(|| ParseError::malformed("string is not valid UTF-8"))
}
