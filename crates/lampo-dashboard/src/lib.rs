//! `lampo-dashboard` – the dashboard backend.
//!
//! Boots a lightweight HTTP + WebSocket server (default port `8888`) that:
//!
//! 1. **Serves** the embedded index page and every plugin's client script.
//! 2. **Greets** each browser with the host title, version and the plugin
//!    scripts it has to load.
//! 3. **Routes** `pm` plugin messages from the browser into the
//!    [`PluginRegistry`].
//! 4. **Pings** every socket and drops those with excessive latency.
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use lampo_dashboard::DashboardServer;
//! use lampo_plugins::PluginRegistry;
//!
//! #[tokio::main]
//! async fn main() {
//!     let registry = Arc::new(PluginRegistry::new());
//!     DashboardServer::new(registry)
//!         .run()
//!         .await
//!         .expect("dashboard server failed");
//! }
//! ```
//!
//! [`PluginRegistry`]: lampo_plugins::PluginRegistry

pub mod protocol;
pub mod server;
pub mod session;

pub use server::{DEFAULT_PORT, DashboardServer};
