//! Render and parse errors.

use thiserror::Error;

use crate::extension::DecodeError;

#[derive(Debug, Error)]
pub enum RenderError {
    /// The value reached the MessagePack encoder without an encoding.
    #[error("object of type {type_name} is not MessagePack serializable")]
    Unencodable { type_name: &'static str },
    #[error("MessagePack write failed: {0}")]
    Write(#[from] rmpv::encode::Error),
}

/// What went wrong while parsing a body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// The bytes are not a single well-formed MessagePack value.
    Malformed,
    /// An `ext` carried a type code this parser does not know.
    UnknownExtension,
    /// A known `ext` carried a payload that does not parse.
    InvalidExtension,
    /// The body exceeded the configured size limit.
    TooLarge,
    /// Reading the request stream failed.
    Io,
}

/// The single error surfaced by the parser.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("MessagePack parse error - {message}")]
pub struct ParseError {
    kind: ParseErrorKind,
    message: String,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::new(ParseErrorKind::Malformed, message)
    }

    pub fn kind(&self) -> ParseErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<rmpv::decode::Error> for ParseError {
    fn from(e: rmpv::decode::Error) -> Self {
        Self::malformed(e.to_string())
    }
}

impl From<std::io::Error> for ParseError {
    fn from(e: std::io::Error) -> Self {
        Self::new(ParseErrorKind::Io, e.to_string())
    }
}

impl From<DecodeError> for ParseError {
    fn from(e: DecodeError) -> Self {
        let kind = match e {
            DecodeError::UnknownTag(_) => ParseErrorKind::UnknownExtension,
            DecodeError::InvalidUtf8 { .. } | DecodeError::InvalidPayload { .. } => {
                ParseErrorKind::InvalidExtension
            }
        };
        Self::new(kind, e.to_string())
    }
}
