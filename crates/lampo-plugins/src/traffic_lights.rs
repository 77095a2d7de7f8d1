//! Traffic-lights relay.
//!
//! The browser viewer collects the state of every traffic light the operator
//! toggled and sends `{num, ids, lights}` to the `traffic_lights` plugin.
//! [`TrafficLightsPlugin`] copies those fields into a
//! `lampo_interfaces/TrafficLights` message, logs it and publishes it on
//! [`TOPIC`].

use async_trait::async_trait;
use lampo_middleware::{MiddlewareBinding, Publisher, advertise};
use lampo_types::{BoardError, TrafficLights, TrafficLightsPayload};
use serde_json::Value;
use tracing::info;

use crate::plugin::{JsAsset, Plugin};

/// Name browsers address the plugin by.
pub const PLUGIN_NAME: &str = "traffic_lights";

/// Topic every relayed message is published on.
pub const TOPIC: &str = "traf_lights";

const JS_ASSETS: &[JsAsset] = &[JsAsset {
    path: "js/viewers/lampo/TraffLightPub.js",
    source: include_str!("../assets/TraffLightPub.js"),
}];

/// Relays dashboard traffic-light edits onto [`TOPIC`].
///
/// The publisher is advertised once, in [`TrafficLightsPlugin::load`], and
/// reused for every relayed message.
pub struct TrafficLightsPlugin {
    publisher: Publisher<TrafficLights>,
}

impl TrafficLightsPlugin {
    /// Advertise [`TOPIC`] on `binding` and build the plugin around the
    /// resulting publisher.
    ///
    /// # Errors
    ///
    /// Propagates the binding's advertise failure.
    pub async fn load(binding: &dyn MiddlewareBinding) -> Result<Self, BoardError> {
        let publisher = advertise::<TrafficLights>(binding, TOPIC).await?;
        Ok(Self::with_publisher(publisher))
    }

    pub fn with_publisher(publisher: Publisher<TrafficLights>) -> Self {
        Self { publisher }
    }

    /// Copy `payload` into a [`TrafficLights`] message, log it and publish it.
    pub async fn relay(&self, payload: TrafficLightsPayload) -> Result<(), BoardError> {
        let msg = TrafficLights::from(payload);
        info!(topic = %self.publisher.topic(), "relaying {msg}");
        self.publisher.publish(&msg).await
    }
}

#[async_trait]
impl Plugin for TrafficLightsPlugin {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    fn js_assets(&self) -> &[JsAsset] {
        JS_ASSETS
    }

    async fn receive(&self, message: Value) -> Result<(), BoardError> {
        let payload = TrafficLightsPayload::from_value(&message)?;
        self.relay(payload).await
    }
}
