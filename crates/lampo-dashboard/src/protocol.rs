//! Browser socket protocol.
//!
//! Every frame is a JSON array whose first element is a one-letter kind:
//!
//! | Kind | Direction | Body |
//! |---|---|---|
//! | `y` | server → browser | `{hostname, version, plugin_js_files}` |
//! | `p` | server → browser | `{s: seq}` ping |
//! | `q` | browser → server | `{s: seq}` pong |
//! | `pm` | browser → server | `{name, message}` plugin message |

use lampo_types::BoardError;
use serde::Serialize;
use serde_json::{Map, Value};

pub const MSG_PING: &str = "p";
pub const MSG_PONG: &str = "q";
pub const MSG_SYSTEM: &str = "y";
pub const MSG_PLUGIN_MESSAGE: &str = "pm";

/// A decoded browser frame.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    Pong { seq: u64 },
    Plugin { name: String, message: Value },
    /// Well-formed frame of a kind this server does not act on.
    Unhandled(String),
}

#[derive(Serialize)]
struct SystemInfo<'a> {
    hostname: &'a str,
    version: &'a str,
    plugin_js_files: &'a [&'a str],
}

#[derive(Serialize)]
struct Seq {
    s: u64,
}

/// Decode one text frame from the browser.
///
/// # Errors
///
/// [`BoardError::Protocol`] when the frame is not JSON, not an array with a
/// string head, or a known kind with a malformed body.
pub fn parse_client_message(text: &str) -> Result<ClientMessage, BoardError> {
    let argv: Value = serde_json::from_str(text)
        .map_err(|e| BoardError::Protocol(format!("bad frame: {e}")))?;
    let items = argv
        .as_array()
        .ok_or_else(|| BoardError::Protocol("bad frame: not an array".to_string()))?;
    let kind = items
        .first()
        .and_then(Value::as_str)
        .ok_or_else(|| BoardError::Protocol("bad frame: missing kind".to_string()))?;

    match kind {
        MSG_PONG => {
            let body = body_of(items, kind)?;
            let seq = body.get("s").and_then(Value::as_u64).unwrap_or(0);
            Ok(ClientMessage::Pong { seq })
        }
        MSG_PLUGIN_MESSAGE => {
            let body = body_of(items, kind)?;
            let name = body
                .get("name")
                .and_then(Value::as_str)
                .ok_or_else(|| BoardError::Protocol("plugin message without a name".to_string()))?;
            let message = body.get("message").cloned().unwrap_or(Value::Null);
            Ok(ClientMessage::Plugin {
                name: name.to_string(),
                message,
            })
        }
        other => Ok(ClientMessage::Unhandled(other.to_string())),
    }
}

fn body_of<'a>(items: &'a [Value], kind: &str) -> Result<&'a Map<String, Value>, BoardError> {
    if items.len() != 2 {
        return Err(BoardError::Protocol(format!("{kind}: expected [kind, body]")));
    }
    items[1]
        .as_object()
        .ok_or_else(|| BoardError::Protocol(format!("{kind}: body is not an object")))
}

/// Greeting sent once when a browser connects.
pub fn system_frame(hostname: &str, version: &str, plugin_js_files: &[&str]) -> Result<String, BoardError> {
    let info = SystemInfo {
        hostname,
        version,
        plugin_js_files,
    };
    serde_json::to_string(&(MSG_SYSTEM, info)).map_err(|e| BoardError::Serialization(e.to_string()))
}

pub fn ping_frame(seq: u64) -> Result<String, BoardError> {
    serde_json::to_string(&(MSG_PING, Seq { s: seq })).map_err(|e| BoardError::Serialization(e.to_string()))
}
