//! rosbridge v2 wire operations.
//!
//! Only the producer side of the protocol is modelled: a relay advertises a
//! topic once and then publishes onto it.  Frames are single JSON objects
//! discriminated by their `"op"` field.  The only frame read back is the
//! bridge's [`RosbridgeStatus`] report.

use lampo_types::BoardError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One rosbridge operation sent from the relay to `rosbridge_server`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum RosbridgeOp {
    /// Declare that this client will publish `msg_type` messages on `topic`.
    Advertise {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        topic: String,
        #[serde(rename = "type")]
        msg_type: String,
        /// ROS 1 only.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        latch: Option<bool>,
        /// ROS 1 only.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        queue_size: Option<u32>,
    },
    /// Publish one message on a previously advertised topic.
    Publish { topic: String, msg: Value },
}

impl RosbridgeOp {
    /// The topic this operation targets.
    pub fn topic(&self) -> &str {
        match self {
            RosbridgeOp::Advertise { topic, .. } | RosbridgeOp::Publish { topic, .. } => topic,
        }
    }

    /// Encode as a text frame.
    pub fn to_frame(&self) -> Result<String, BoardError> {
        serde_json::to_string(self).map_err(|e| BoardError::Serialization(e.to_string()))
    }
}

/// Severity of a bridge `status` report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusLevel {
    Info,
    Warning,
    Error,
    None,
}

/// `{"op":"status", "level", "msg", "id"?}` sent by the bridge, e.g. when it
/// rejects an advertise for a message type it cannot import.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RosbridgeStatus {
    pub level: StatusLevel,
    #[serde(default)]
    pub msg: String,
    /// Id of the op the report refers to, when the bridge knows it.
    #[serde(default)]
    pub id: Option<String>,
}

impl RosbridgeStatus {
    /// Decode `text` if it is a status frame.
    pub fn parse(text: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(text).ok()?;
        if value.get("op")?.as_str()? != "status" {
            return None;
        }
        serde_json::from_value(value).ok()
    }
}
