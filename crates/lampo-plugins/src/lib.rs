//! `lampo-plugins` – backend plugins for the dashboard.
//!
//! - [`plugin`] – the [`Plugin`] trait and the [`PluginRegistry`] the
//!   dashboard dispatches browser messages through.
//! - [`traffic_lights`] – relays traffic-light edits onto the `traf_lights`
//!   ROS topic.
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use lampo_middleware::{RosbridgeLink, select_binding, DEFAULT_QUEUE_SIZE};
//! use lampo_plugins::{PluginRegistry, TrafficLightsPlugin};
//! use lampo_types::RosVersion;
//!
//! # async fn run() -> Result<(), lampo_types::BoardError> {
//! let link = RosbridgeLink::connect("ws://localhost:9090", DEFAULT_QUEUE_SIZE as usize).await?;
//! let binding = select_binding(RosVersion::Ros2, link, DEFAULT_QUEUE_SIZE);
//! let mut registry = PluginRegistry::new();
//! registry.register(Arc::new(TrafficLightsPlugin::load(binding.as_ref()).await?))?;
//! # let _ = registry;
//! # Ok(())
//! # }
//! ```

pub mod plugin;
pub mod traffic_lights;

use std::sync::Arc;

use lampo_middleware::MiddlewareBinding;
use lampo_types::BoardError;

pub use plugin::{JsAsset, Plugin, PluginRegistry};
pub use traffic_lights::TrafficLightsPlugin;

/// Load every built-in plugin against `binding`.
///
/// Each plugin acquires its publishers here, once, before the dashboard
/// starts accepting browsers.
pub async fn load_builtin(binding: &dyn MiddlewareBinding) -> Result<PluginRegistry, BoardError> {
    let mut registry = PluginRegistry::new();
    registry.register(Arc::new(TrafficLightsPlugin::load(binding).await?))?;
    Ok(registry)
}
