//! Renderer and parser settings.

use serde::{Deserialize, Serialize};

/// Media type registered for MessagePack bodies.
pub const MEDIA_TYPE: &str = "application/msgpack";
/// Format suffix used for `?format=` style negotiation.
pub const FORMAT: &str = "msgpack";
/// Default nesting limit for parsed bodies.
pub const MAX_DEPTH: usize = 128;

/// Settings shared by [`MsgPackRenderer`](crate::MsgPackRenderer) and
/// [`MsgPackParser`](crate::MsgPackParser).
///
/// Every field has a default, so hosts only spell out what they change:
///
/// ```
/// let settings: rest_msgpack::MsgPackSettings =
///     serde_json::from_str(r#"{"max_body_bytes": 1048576}"#).unwrap();
/// assert_eq!(settings.media_type, "application/msgpack");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MsgPackSettings {
    pub media_type: String,
    pub format: String,
    /// Bodies longer than this are rejected by the parser. `None` means no limit.
    pub max_body_bytes: Option<usize>,
    /// Deepest array/map nesting the parser accepts.
    pub max_depth: usize,
}

impl Default for MsgPackSettings {
    fn default() -> Self {
        Self {
            media_type: MEDIA_TYPE.to_owned(),
            format: FORMAT.to_owned(),
            max_body_bytes: None,
            max_depth: MAX_DEPTH,
        }
    }
}
