//! Publisher handles.
//!
//! - [`TopicPublisher`] – the untyped handle a binding hands out, bound to
//!   one topic for its whole lifetime.
//! - [`Publisher`] – typed wrapper that serialises a [`RosMessage`] before
//!   handing it to the untyped handle.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use lampo_types::{BoardError, RosMessage};
use serde_json::Value;

use crate::link::RosbridgeLink;
use crate::rosbridge::RosbridgeOp;

/// A handle bound to a single topic that can emit messages onto it.
///
/// Handles are shared read-only after creation; implementations must not
/// require exclusive access to publish.
#[async_trait]
pub trait TopicPublisher: Send + Sync {
    /// Topic this handle publishes on.
    fn topic(&self) -> &str;

    /// Emit one already-serialised message.
    async fn publish(&self, msg: Value) -> Result<(), BoardError>;
}

/// [`TopicPublisher`] that forwards every message over a [`RosbridgeLink`].
pub struct RosbridgePublisher {
    link: RosbridgeLink,
    topic: String,
}

impl RosbridgePublisher {
    pub(crate) fn new(link: RosbridgeLink, topic: impl Into<String>) -> Self {
        Self {
            link,
            topic: topic.into(),
        }
    }
}

#[async_trait]
impl TopicPublisher for RosbridgePublisher {
    fn topic(&self) -> &str {
        &self.topic
    }

    async fn publish(&self, msg: Value) -> Result<(), BoardError> {
        self.link
            .send(RosbridgeOp::Publish {
                topic: self.topic.clone(),
                msg,
            })
            .await
    }
}

/// Typed publisher for messages of schema `M`.
pub struct Publisher<M> {
    raw: Arc<dyn TopicPublisher>,
    _schema: PhantomData<fn(M)>,
}

impl<M: RosMessage> Publisher<M> {
    /// Wrap an untyped handle that was advertised for `M::MESSAGE_TYPE`.
    pub fn new(raw: Arc<dyn TopicPublisher>) -> Self {
        Self {
            raw,
            _schema: PhantomData,
        }
    }

    pub fn topic(&self) -> &str {
        self.raw.topic()
    }

    /// Serialise `msg` and publish it.
    ///
    /// # Errors
    ///
    /// [`BoardError::Serialization`] if `msg` cannot be encoded, otherwise
    /// whatever the underlying handle reports.
    pub async fn publish(&self, msg: &M) -> Result<(), BoardError> {
        let value = serde_json::to_value(msg).map_err(|e| BoardError::Serialization(e.to_string()))?;
        self.raw.publish(value).await
    }
}

impl<M> Clone for Publisher<M> {
    fn clone(&self) -> Self {
        Self {
            raw: Arc::clone(&self.raw),
            _schema: PhantomData,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lampo_types::{LIGHT_YELLOW, TrafficLights};
    use serde_json::json;

    #[tokio::test]
    async fn typed_publish_emits_rosbridge_publish_op() {
        let (link, mut rx) = RosbridgeLink::channel(4);
        let publisher: Publisher<TrafficLights> =
            Publisher::new(Arc::new(RosbridgePublisher::new(link, "traf_lights")));

        let msg = TrafficLights {
            num: 1,
            ids: vec![9],
            lights: vec![LIGHT_YELLOW],
        };
        publisher.publish(&msg).await.unwrap();

        assert_eq!(
            rx.recv().await.unwrap(),
            RosbridgeOp::Publish {
                topic: "traf_lights".to_string(),
                msg: json!({"num": 1, "ids": [9], "lights": [2]}),
            }
        );
    }

    #[tokio::test]
    async fn publish_on_closed_link_propagates_error() {
        let (link, rx) = RosbridgeLink::channel(4);
        drop(rx);
        let publisher = RosbridgePublisher::new(link, "traf_lights");
        let err = publisher.publish(json!({})).await.unwrap_err();
        assert!(matches!(err, BoardError::Publish { .. }));
    }
}
