//! Configuration – reads `~/.lampo/config.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use lampo_middleware::DEFAULT_QUEUE_SIZE;
use lampo_types::{BoardError, RosVersion};
use serde::{Deserialize, Serialize};

/// Runtime configuration for the dashboard relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// HTTP/WebSocket port browsers connect to.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Host title shown in the browser.
    #[serde(default = "default_title")]
    pub title: String,

    /// WebSocket URL of the `rosbridge_server` messages are published through.
    #[serde(default = "default_rosbridge_url")]
    pub rosbridge_url: String,

    /// ROS generation (`"1"` or `"2"`).  Usually left to `ROS_VERSION`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ros_version: Option<RosVersion>,

    /// Outbound queue depth: bounds the local rosbridge send queue and is
    /// requested from the bridge when advertising on ROS 1.
    #[serde(default = "default_queue_size")]
    pub queue_size: u32,
}

fn default_port() -> u16 {
    lampo_dashboard::DEFAULT_PORT
}
fn default_title() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .or_else(|| fs::read_to_string("/etc/hostname").ok())
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "lampo-board".to_string())
}
fn default_rosbridge_url() -> String {
    "ws://localhost:9090".to_string()
}
fn default_queue_size() -> u32 {
    DEFAULT_QUEUE_SIZE
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            title: default_title(),
            rosbridge_url: default_rosbridge_url(),
            ros_version: None,
            queue_size: default_queue_size(),
        }
    }
}

/// Return the path to `~/.lampo/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

/// Build the config path relative to the given home directory.
pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".lampo").join("config.toml")
}

/// Load the config from disk and apply environment overrides.
///
/// A missing file yields the defaults.
pub fn load() -> Result<Config, BoardError> {
    let mut cfg = load_from(&config_path())?.unwrap_or_default();
    apply_env_overrides(&mut cfg);
    Ok(cfg)
}

/// Load the config from a specific path.  Returns `None` if it does not exist.
pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, BoardError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| BoardError::Config(format!("failed to read {}: {e}", path.display())))?;
    let cfg = toml::from_str(&raw)
        .map_err(|e| BoardError::Config(format!("failed to parse {}: {e}", path.display())))?;
    Ok(Some(cfg))
}

/// Apply environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `LAMPO_PORT` | `port` |
/// | `LAMPO_TITLE` | `title` |
/// | `LAMPO_ROSBRIDGE_URL` | `rosbridge_url` |
/// | `ROS_VERSION` | `ros_version` |
///
/// `ROS_VERSION` is authoritative when present: an unrecognised value
/// clears `ros_version` rather than falling back to the file.
pub fn apply_env_overrides(cfg: &mut Config) {
    apply_overrides(cfg, |key| std::env::var(key).ok());
}

fn apply_overrides(cfg: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("LAMPO_PORT")
        && let Ok(port) = v.parse::<u16>()
    {
        cfg.port = port;
    }
    if let Some(v) = lookup("LAMPO_TITLE") {
        cfg.title = v;
    }
    if let Some(v) = lookup("LAMPO_ROSBRIDGE_URL") {
        cfg.rosbridge_url = v;
    }
    if let Some(v) = lookup("ROS_VERSION") {
        cfg.ros_version = v.parse().ok();
    }
}
