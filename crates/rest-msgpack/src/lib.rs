//! MessagePack rendering and parsing for content-negotiating web frameworks.
//!
//! Generic MessagePack encoding is done by `rmpv`. This crate adds:
//! - [`MsgPackRenderer`] / [`MsgPackParser`], the framework-facing pair
//!   registered for `application/msgpack`;
//! - extension types for datetimes, dates, times and decimals
//!   (see [`extension`] for the wire table).
//!
//! ```
//! use rest_msgpack::{parse, render, Value};
//!
//! let value = Value::object([("foo", Value::Array(vec!["bar".into(), "baz".into()]))]);
//! let bytes = render(&value).unwrap();
//! assert_eq!(bytes, b"\x81\xa3foo\x92\xa3bar\xa3baz");
//! assert_eq!(parse(&bytes).unwrap(), value);
//! ```

mod error;
mod parser;
mod renderer;
mod settings;
mod value;
mod wire;

pub mod cli;
pub mod extension;

pub use error::{ParseError, ParseErrorKind, RenderError};
pub use extension::{
    DecodeError, Encoded, ExtensionDecoder, ExtensionEncoder, ExtensionTag, ExtensionValue,
};
pub use parser::{MsgPackParser, Parser};
pub use renderer::{MsgPackRenderer, Renderer};
pub use settings::{MsgPackSettings, FORMAT, MAX_DEPTH, MEDIA_TYPE};
pub use value::{JsonBridgeError, Opaque, Value};

/// Render `value` with default settings.
pub fn render(value: &Value) -> Result<Vec<u8>, RenderError> {
    MsgPackRenderer::new().render(Some(value), None)
}

/// Parse a complete body with default settings.
pub fn parse(body: &[u8]) -> Result<Value, ParseError> {
    MsgPackParser::new().parse_bytes(body)
}
