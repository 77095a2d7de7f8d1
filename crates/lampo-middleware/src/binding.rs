//! Middleware bindings.
//!
//! A [`MiddlewareBinding`] turns a topic name and a message schema into a
//! publisher handle.  The two variants differ in how they spell message types
//! and which advertise options the bridge understands:
//!
//! | Binding | Type name | Advertise options |
//! |---|---|---|
//! | [`Ros1Binding`] | `pkg/Name` | `latch`, `queue_size` |
//! | [`Ros2Binding`] | `pkg/msg/Name` | none |
//!
//! The binding is chosen once at startup with [`select_binding`] and then
//! injected into every plugin that needs to publish.

use std::sync::Arc;

use async_trait::async_trait;
use lampo_types::{BoardError, MessageType, RosMessage, RosVersion};
use tracing::info;
use uuid::Uuid;

use crate::link::RosbridgeLink;
use crate::publisher::{Publisher, RosbridgePublisher, TopicPublisher};
use crate::rosbridge::RosbridgeOp;

/// Default per-topic outbound queue depth requested from a ROS 1 bridge.
pub const DEFAULT_QUEUE_SIZE: u32 = 10;

/// Factory for publisher handles on one ROS generation.
#[async_trait]
pub trait MiddlewareBinding: Send + Sync {
    /// ROS generation this binding speaks.
    fn version(&self) -> RosVersion;

    /// Advertise `topic` with schema `msg_type` and return a handle bound to it.
    async fn advertise_raw(
        &self,
        topic: &str,
        msg_type: MessageType,
    ) -> Result<Arc<dyn TopicPublisher>, BoardError>;
}

/// Advertise a typed publisher for `M` on `topic`.
pub async fn advertise<M: RosMessage>(
    binding: &dyn MiddlewareBinding,
    topic: &str,
) -> Result<Publisher<M>, BoardError> {
    let raw = binding.advertise_raw(topic, M::MESSAGE_TYPE).await?;
    Ok(Publisher::new(raw))
}

/// Binding for a ROS 1 `rosbridge_server`.
pub struct Ros1Binding {
    link: RosbridgeLink,
    queue_size: u32,
}

impl Ros1Binding {
    pub fn new(link: RosbridgeLink, queue_size: u32) -> Self {
        Self { link, queue_size }
    }
}

#[async_trait]
impl MiddlewareBinding for Ros1Binding {
    fn version(&self) -> RosVersion {
        RosVersion::Ros1
    }

    async fn advertise_raw(
        &self,
        topic: &str,
        msg_type: MessageType,
    ) -> Result<Arc<dyn TopicPublisher>, BoardError> {
        let type_name = msg_type.qualified(RosVersion::Ros1);
        self.link
            .send(RosbridgeOp::Advertise {
                id: Some(advertise_id(topic)),
                topic: topic.to_string(),
                msg_type: type_name.clone(),
                latch: Some(false),
                queue_size: Some(self.queue_size),
            })
            .await?;
        info!(topic = %topic, msg_type = %type_name, "advertised ROS 1 topic");
        Ok(Arc::new(RosbridgePublisher::new(self.link.clone(), topic)))
    }
}

/// Binding for a ROS 2 `rosbridge_server`.
pub struct Ros2Binding {
    link: RosbridgeLink,
}

impl Ros2Binding {
    pub fn new(link: RosbridgeLink) -> Self {
        Self { link }
    }
}

#[async_trait]
impl MiddlewareBinding for Ros2Binding {
    fn version(&self) -> RosVersion {
        RosVersion::Ros2
    }

    async fn advertise_raw(
        &self,
        topic: &str,
        msg_type: MessageType,
    ) -> Result<Arc<dyn TopicPublisher>, BoardError> {
        let type_name = msg_type.qualified(RosVersion::Ros2);
        self.link
            .send(RosbridgeOp::Advertise {
                id: Some(advertise_id(topic)),
                topic: topic.to_string(),
                msg_type: type_name.clone(),
                latch: None,
                queue_size: None,
            })
            .await?;
        info!(topic = %topic, msg_type = %type_name, "advertised ROS 2 topic");
        Ok(Arc::new(RosbridgePublisher::new(self.link.clone(), topic)))
    }
}

/// Pick the binding variant for `version`.
pub fn select_binding(
    version: RosVersion,
    link: RosbridgeLink,
    queue_size: u32,
) -> Arc<dyn MiddlewareBinding> {
    match version {
        RosVersion::Ros1 => Arc::new(Ros1Binding::new(link, queue_size)),
        RosVersion::Ros2 => Arc::new(Ros2Binding::new(link)),
    }
}

fn advertise_id(topic: &str) -> String {
    format!("advertise:{topic}:{}", Uuid::new_v4())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lampo_types::TrafficLights;

    #[tokio::test]
    async fn ros1_binding_advertises_plain_type_with_queue() {
        let (link, mut rx) = RosbridgeLink::channel(DEFAULT_QUEUE_SIZE as usize);
        let binding = select_binding(RosVersion::Ros1, link, 5);
        assert_eq!(binding.version(), RosVersion::Ros1);

        let publisher = advertise::<TrafficLights>(binding.as_ref(), "traf_lights").await.unwrap();
        assert_eq!(publisher.topic(), "traf_lights");

        match rx.recv().await.unwrap() {
            RosbridgeOp::Advertise { id, topic, msg_type, latch, queue_size } => {
                assert!(id.unwrap().starts_with("advertise:traf_lights:"));
                assert_eq!(topic, "traf_lights");
                assert_eq!(msg_type, "lampo_interfaces/TrafficLights");
                assert_eq!(latch, Some(false));
                assert_eq!(queue_size, Some(5));
            }
            other => panic!("expected advertise, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn ros2_binding_advertises_msg_qualified_type() {
        let (link, mut rx) = RosbridgeLink::channel(DEFAULT_QUEUE_SIZE as usize);
        let binding = select_binding(RosVersion::Ros2, link, DEFAULT_QUEUE_SIZE);
        assert_eq!(binding.version(), RosVersion::Ros2);

        advertise::<TrafficLights>(binding.as_ref(), "traf_lights").await.unwrap();

        match rx.recv().await.unwrap() {
            RosbridgeOp::Advertise { msg_type, latch, queue_size, .. } => {
                assert_eq!(msg_type, "lampo_interfaces/msg/TrafficLights");
                assert_eq!(latch, None);
                assert_eq!(queue_size, None);
            }
            other => panic!("expected advertise, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn advertise_on_closed_link_fails() {
        let (link, rx) = RosbridgeLink::channel(DEFAULT_QUEUE_SIZE as usize);
        drop(rx);
        let binding = Ros2Binding::new(link);
        let result = advertise::<TrafficLights>(&binding, "traf_lights").await;
        assert!(matches!(result, Err(BoardError::Publish { .. })));
    }
}
