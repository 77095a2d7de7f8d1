//! `lampo-types` – shared message schemas and errors.
//!
//! Everything that crosses a crate boundary lives here: the
//! `lampo_interfaces/TrafficLights` schema, the inbound dashboard payload
//! that feeds it, the ROS version selector, and [`BoardError`].

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Bit set in a `lights` entry when the red lamp is lit.
pub const LIGHT_RED: u8 = 1 << 0;
/// Bit set in a `lights` entry when the yellow lamp is lit.
pub const LIGHT_YELLOW: u8 = 1 << 1;
/// Bit set in a `lights` entry when the green lamp is lit.
pub const LIGHT_GREEN: u8 = 1 << 2;

// ---------------------------------------------------------------------------
// Message schemas
// ---------------------------------------------------------------------------

/// Fully-qualified ROS message type, e.g. `lampo_interfaces` + `TrafficLights`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageType {
    pub package: &'static str,
    pub name: &'static str,
}

impl MessageType {
    /// Render the type name the way the given ROS generation spells it.
    ///
    /// ROS 1 uses `pkg/Name`, ROS 2 inserts the interface kind: `pkg/msg/Name`.
    pub fn qualified(&self, version: RosVersion) -> String {
        match version {
            RosVersion::Ros1 => format!("{}/{}", self.package, self.name),
            RosVersion::Ros2 => format!("{}/msg/{}", self.package, self.name),
        }
    }
}

/// A message that can be published on a ROS topic.
pub trait RosMessage: Serialize + Send + Sync {
    const MESSAGE_TYPE: MessageType;
}

/// `lampo_interfaces/TrafficLights`: the state of every traffic light the
/// operator edited in the dashboard.
///
/// `ids` and `lights` are parallel sequences; `num` is carried as sent and is
/// never reconciled with their lengths.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficLights {
    pub num: u32,
    pub ids: Vec<u32>,
    /// One bitmask per light, see [`LIGHT_RED`], [`LIGHT_YELLOW`], [`LIGHT_GREEN`].
    pub lights: Vec<u8>,
}

impl RosMessage for TrafficLights {
    const MESSAGE_TYPE: MessageType = MessageType {
        package: "lampo_interfaces",
        name: "TrafficLights",
    };
}

impl fmt::Display for TrafficLights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "num: {}, ids: {:?}, lights: {:?}", self.num, self.ids, self.lights)
    }
}

/// Inbound plugin message sent by the browser's traffic-light viewer.
///
/// All three keys are required; any other key is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TrafficLightsPayload {
    pub num: u32,
    pub ids: Vec<u32>,
    pub lights: Vec<u8>,
}

impl TrafficLightsPayload {
    /// Validate a raw JSON plugin message against the payload schema.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::InvalidPayload`] when a key is missing or holds
    /// a value of the wrong type.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, BoardError> {
        parse_payload(value)
    }
}

impl From<TrafficLightsPayload> for TrafficLights {
    fn from(payload: TrafficLightsPayload) -> Self {
        Self {
            num: payload.num,
            ids: payload.ids,
            lights: payload.lights,
        }
    }
}

/// Deserialize any payload type, folding every failure into
/// [`BoardError::InvalidPayload`].
pub fn parse_payload<T: DeserializeOwned>(value: &serde_json::Value) -> Result<T, BoardError> {
    T::deserialize(value).map_err(|e| BoardError::InvalidPayload(e.to_string()))
}

// ---------------------------------------------------------------------------
// ROS version
// ---------------------------------------------------------------------------

/// Which ROS generation the middleware binding talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RosVersion {
    Ros1,
    Ros2,
}

impl FromStr for RosVersion {
    type Err = BoardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "ros1" => Ok(RosVersion::Ros1),
            "2" | "ros2" => Ok(RosVersion::Ros2),
            other => Err(BoardError::Config(format!("unrecognised ROS version '{other}'"))),
        }
    }
}

impl TryFrom<String> for RosVersion {
    type Error = BoardError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RosVersion> for String {
    fn from(version: RosVersion) -> Self {
        version.to_string()
    }
}

impl fmt::Display for RosVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RosVersion::Ros1 => write!(f, "1"),
            RosVersion::Ros2 => write!(f, "2"),
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error type shared by the middleware bindings, plugins and dashboard.
#[derive(Error, Debug)]
pub enum BoardError {
    #[error("Invalid Payload: {0}")]
    InvalidPayload(String),

    #[error("Publish Failed on {topic}: {details}")]
    Publish { topic: String, details: String },

    #[error("Middleware Connection Error: {0}")]
    Connection(String),

    #[error("Protocol Error: {0}")]
    Protocol(String),

    #[error("Unknown Plugin: {0}")]
    UnknownPlugin(String),

    #[error("Serialization Error: {0}")]
    Serialization(String),

    #[error("Configuration Error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payload_copies_fields_verbatim() {
        let value = json!({"num": 2, "ids": [1, 2], "lights": [LIGHT_RED, LIGHT_GREEN]});
        let msg: TrafficLights = TrafficLightsPayload::from_value(&value).unwrap().into();
        assert_eq!(msg.num, 2);
        assert_eq!(msg.ids, vec![1, 2]);
        assert_eq!(msg.lights, vec![1, 4]);
    }

    #[test]
    fn payload_ignores_unknown_keys() {
        let value = json!({"num": 1, "ids": [7], "lights": [2], "extra": "ignored"});
        let payload = TrafficLightsPayload::from_value(&value).unwrap();
        assert_eq!(payload.ids, vec![7]);
    }

    #[test]
    fn payload_missing_ids_is_invalid() {
        let value = json!({"num": 2, "lights": [1, 4]});
        let err = TrafficLightsPayload::from_value(&value).unwrap_err();
        assert!(matches!(err, BoardError::InvalidPayload(ref m) if m.contains("ids")));
    }

    #[test]
    fn payload_wrong_type_is_invalid() {
        let value = json!({"num": "two", "ids": [1, 2], "lights": [1, 4]});
        assert!(matches!(
            TrafficLightsPayload::from_value(&value),
            Err(BoardError::InvalidPayload(_))
        ));
    }

    #[test]
    fn payload_count_mismatch_is_carried_as_is() {
        let value = json!({"num": 5, "ids": [1], "lights": []});
        let msg: TrafficLights = TrafficLightsPayload::from_value(&value).unwrap().into();
        assert_eq!(msg.num, 5);
        assert_eq!(msg.ids.len(), 1);
        assert!(msg.lights.is_empty());
    }

    #[test]
    fn traffic_lights_display_lists_every_field() {
        let msg = TrafficLights {
            num: 2,
            ids: vec![1, 2],
            lights: vec![LIGHT_RED, LIGHT_GREEN],
        };
        assert_eq!(msg.to_string(), "num: 2, ids: [1, 2], lights: [1, 4]");
    }

    #[test]
    fn message_type_qualification_per_version() {
        let ty = TrafficLights::MESSAGE_TYPE;
        assert_eq!(ty.qualified(RosVersion::Ros1), "lampo_interfaces/TrafficLights");
        assert_eq!(ty.qualified(RosVersion::Ros2), "lampo_interfaces/msg/TrafficLights");
    }

    #[test]
    fn ros_version_parses_markers() {
        assert_eq!("1".parse::<RosVersion>().unwrap(), RosVersion::Ros1);
        assert_eq!(" 2 ".parse::<RosVersion>().unwrap(), RosVersion::Ros2);
        assert_eq!("ROS2".parse::<RosVersion>().unwrap(), RosVersion::Ros2);
        assert!(matches!("3".parse::<RosVersion>(), Err(BoardError::Config(_))));
    }

    #[test]
    fn board_error_display() {
        let err = BoardError::Publish {
            topic: "traf_lights".to_string(),
            details: "link closed".to_string(),
        };
        assert!(err.to_string().contains("traf_lights"));
        assert!(BoardError::UnknownPlugin("dummy".into()).to_string().contains("dummy"));
    }
}
