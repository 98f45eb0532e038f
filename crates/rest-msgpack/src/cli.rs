//! Logic behind the `msgpack-render` and `msgpack-parse` binaries.

use thiserror::Error;

use crate::{parse, render, JsonBridgeError, ParseError, RenderError, Value};

#[derive(Debug, Error)]
pub enum CliError {
    #[error("invalid JSON input: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Bridge(#[from] JsonBridgeError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Encode a JSON document as MessagePack.
pub fn json_to_msgpack(json: &str) -> Result<Vec<u8>, CliError> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    Ok(render(&Value::from(value))?)
}

/// Decode a MessagePack body to pretty-printed JSON.
///
/// Extension values are printed as their canonical strings.
pub fn msgpack_to_json(bytes: &[u8]) -> Result<String, CliError> {
    let value = parse(bytes)?;
    let json = serde_json::Value::try_from(value)?;
    Ok(serde_json::to_string_pretty(&json)?)
}

/// Install a stderr `tracing` subscriber honouring `RUST_LOG`, defaulting to `warn`.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();
}
