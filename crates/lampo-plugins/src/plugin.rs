//! Dashboard plugin contract and registry.
//!
//! A browser sends `["pm", {"name": ..., "message": ...}]`; the dashboard
//! looks the plugin up by `name` in the [`PluginRegistry`] and hands it the
//! raw `message`.  Plugins also ship client-side scripts that the dashboard
//! advertises to every browser on connect and serves over HTTP.

use std::sync::Arc;

use async_trait::async_trait;
use lampo_types::BoardError;
use serde_json::Value;
use tracing::debug;

/// A client-side script shipped by a plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsAsset {
    /// Path relative to the dashboard root, e.g. `js/viewers/foo.js`.
    pub path: &'static str,
    pub source: &'static str,
}

/// A backend plugin reachable from the browser by name.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Identifier browsers address plugin messages to.
    fn name(&self) -> &str;

    /// Scripts the browser must load for this plugin.
    fn js_assets(&self) -> &[JsAsset] {
        &[]
    }

    /// Handle one message a client sent to this plugin.
    async fn receive(&self, message: Value) -> Result<(), BoardError>;
}

/// Every loaded plugin, in load order.
#[derive(Default, Clone)]
pub struct PluginRegistry {
    plugins: Vec<Arc<dyn Plugin>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a plugin.
    ///
    /// # Errors
    ///
    /// [`BoardError::Config`] if a plugin with the same name is already loaded.
    pub fn register(&mut self, plugin: Arc<dyn Plugin>) -> Result<(), BoardError> {
        if self.get(plugin.name()).is_some() {
            return Err(BoardError::Config(format!(
                "plugin '{}' is already registered",
                plugin.name()
            )));
        }
        debug!(plugin = %plugin.name(), "plugin registered");
        self.plugins.push(plugin);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Plugin>> {
        self.plugins.iter().find(|p| p.name() == name)
    }

    /// Names of the registered plugins, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    /// Route `message` to the plugin called `name`.
    ///
    /// # Errors
    ///
    /// [`BoardError::UnknownPlugin`] when nothing is registered under `name`;
    /// otherwise whatever the plugin returns.
    pub async fn dispatch(&self, name: &str, message: Value) -> Result<(), BoardError> {
        let plugin = self
            .get(name)
            .ok_or_else(|| BoardError::UnknownPlugin(name.to_string()))?;
        plugin.receive(message).await
    }

    /// Script paths of every plugin, in load order.
    pub fn js_files(&self) -> Vec<&'static str> {
        self.plugins
            .iter()
            .flat_map(|p| p.js_assets().iter().map(|a| a.path))
            .collect()
    }

    /// Look up a plugin script by its path.
    pub fn js_asset(&self, path: &str) -> Option<&'static str> {
        let path = path.trim_start_matches('/');
        self.plugins
            .iter()
            .flat_map(|p| p.js_assets().iter())
            .find(|a| a.path == path)
            .map(|a| a.source)
    }
}
