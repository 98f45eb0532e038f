//! The rendering half of content negotiation.

use tracing::debug;

use crate::error::RenderError;
use crate::settings::MsgPackSettings;
use crate::wire;
use crate::Value;

/// A response renderer as seen by a content-negotiating framework.
pub trait Renderer {
    fn media_type(&self) -> &str;

    fn format(&self) -> &str;

    /// Binary renderers carry no charset.
    fn charset(&self) -> Option<&str> {
        None
    }

    fn render_style(&self) -> &str;

    /// Render `data` for the negotiated `media_type`.
    fn render(&self, data: Option<&Value>, media_type: Option<&str>) -> Result<Vec<u8>, RenderError>;
}

/// Renders [`Value`]s as MessagePack.
#[derive(Debug, Clone, Default)]
pub struct MsgPackRenderer {
    settings: MsgPackSettings,
}

impl MsgPackRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: MsgPackSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &MsgPackSettings {
        &self.settings
    }
}

impl Renderer for MsgPackRenderer {
    fn media_type(&self) -> &str {
        &self.settings.media_type
    }

    fn format(&self) -> &str {
        &self.settings.format
    }

    fn render_style(&self) -> &str {
        "binary"
    }

    /// `None` renders to an empty body without touching the encoder.
    fn render(&self, data: Option<&Value>, media_type: Option<&str>) -> Result<Vec<u8>, RenderError> {
        let media_type = media_type.unwrap_or_else(|| self.media_type());
        let Some(data) = data else {
            debug!(media_type, "no data, rendering empty body");
            return Ok(Vec::new());
        };
        let mut out = Vec::new();
        wire::write_value(&mut out, data)?;
        debug!(media_type, kind = data.kind(), bytes = out.len(), "rendered MessagePack body");
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renderer_metadata() {
        let renderer = MsgPackRenderer::new();
        assert_eq!(renderer.media_type(), "application/msgpack");
        assert_eq!(renderer.format(), "msgpack");
        assert_eq!(renderer.charset(), None);
        assert_eq!(renderer.render_style(), "binary");
    }

    #[test]
    fn null_is_not_empty() {
        let renderer = MsgPackRenderer::new();
        assert_eq!(renderer.render(Some(&Value::Null), None).unwrap(), vec![0xc0]);
        assert!(renderer.render(None, None).unwrap().is_empty());
    }
}
