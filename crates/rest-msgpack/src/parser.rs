//! The parsing half of content negotiation.

use std::io::Read;

use tracing::{debug, warn};

use crate::error::{ParseError, ParseErrorKind};
use crate::settings::MsgPackSettings;
use crate::wire;
use crate::Value;

/// A request body parser as seen by a content-negotiating framework.
pub trait Parser {
    fn media_type(&self) -> &str;

    /// Read `stream` to the end and parse it.
    fn parse(&self, stream: &mut dyn Read, media_type: Option<&str>) -> Result<Value, ParseError>;
}

/// Parses MessagePack request bodies into [`Value`]s.
#[derive(Debug, Clone, Default)]
pub struct MsgPackParser {
    settings: MsgPackSettings,
}

impl MsgPackParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: MsgPackSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &MsgPackSettings {
        &self.settings
    }

    /// Parse a body that is already in memory.
    pub fn parse_bytes(&self, body: &[u8]) -> Result<Value, ParseError> {
        self.check_size(body.len())?;
        let result = wire::read_value(body, self.settings.max_depth);
        match &result {
            Ok(value) => debug!(bytes = body.len(), kind = value.kind(), "parsed MessagePack body"),
            Err(err) => warn!(bytes = body.len(), error = %err, "rejected MessagePack body"),
        }
        result
    }

    fn check_size(&self, len: usize) -> Result<(), ParseError> {
        match self.settings.max_body_bytes {
            Some(limit) if len > limit => Err(ParseError::new(
                ParseErrorKind::TooLarge,
                format!("body exceeds {limit} bytes"),
            )),
            _ => Ok(()),
        }
    }
}

impl Parser for MsgPackParser {
    fn media_type(&self) -> &str {
        &self.settings.media_type
    }

    fn parse(&self, stream: &mut dyn Read, media_type: Option<&str>) -> Result<Value, ParseError> {
        let mut body = Vec::new();
        match self.settings.max_body_bytes {
            // One byte past the limit is enough to know it was exceeded.
            Some(limit) => {
                Read::take(stream, (limit as u64).saturating_add(1)).read_to_end(&mut body)?
            }
            None => stream.read_to_end(&mut body)?,
        };
        debug!(
            media_type = media_type.unwrap_or_else(|| self.media_type()),
            bytes = body.len(),
            "read request body"
        );
        self.parse_bytes(&body)
    }
}
