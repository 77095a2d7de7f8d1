//! `lampo-middleware` – the path from the dashboard to ROS.
//!
//! Publishes dashboard-originated messages onto ROS topics through a
//! `rosbridge_server`, without caring about what the messages mean.
//!
//! # Modules
//!
//! - [`rosbridge`] – rosbridge v2 operations (`advertise`, `publish`) and
//!   the bridge's `status` reports.
//! - [`link`] – WebSocket connection to the bridge, or an in-process channel.
//! - [`publisher`] – untyped and typed publisher handles.
//! - [`binding`] – ROS 1 / ROS 2 bindings selected once at startup.

pub mod binding;
pub mod link;
pub mod publisher;
pub mod rosbridge;

pub use binding::{
    DEFAULT_QUEUE_SIZE, MiddlewareBinding, Ros1Binding, Ros2Binding, advertise, select_binding,
};
pub use link::RosbridgeLink;
pub use publisher::{Publisher, RosbridgePublisher, TopicPublisher};
pub use rosbridge::{RosbridgeOp, RosbridgeStatus, StatusLevel};
