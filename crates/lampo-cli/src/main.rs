//! `lampo-board` – dashboard relay entry point.
//!
//! 1. Initialises logging (and OTLP export when configured).
//! 2. Loads `~/.lampo/config.toml` plus environment overrides.
//! 3. Resolves the ROS generation; without one the process exits with code 1.
//! 4. Connects to `rosbridge_server`, selects the matching binding and loads
//!    the plugins, each of which advertises its topics once.
//! 5. Serves the dashboard until Ctrl-C.

mod config;
mod telemetry;

use std::process::ExitCode;
use std::sync::Arc;

use lampo_dashboard::DashboardServer;
use lampo_middleware::{RosbridgeLink, select_binding};
use lampo_types::{BoardError, RosVersion};
use tracing::{error, info};

use crate::config::Config;

const ROS_NOT_DETECTED: &str =
    "ROS not detected. Please source your ROS environment\n(e.g. 'source /opt/ros/DISTRO/setup.bash')";

#[tokio::main]
async fn main() -> ExitCode {
    let _guard = telemetry::init_tracing("lampo-board");

    let cfg = match config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(path = %config::config_path().display(), error = %e, "config error");
            return ExitCode::FAILURE;
        }
    };

    let Some(version) = cfg.ros_version else {
        eprintln!("{ROS_NOT_DETECTED}");
        return ExitCode::from(1);
    };

    match run(cfg, version).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "lampo-board stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run(cfg: Config, version: RosVersion) -> Result<(), BoardError> {
    let link = RosbridgeLink::connect(&cfg.rosbridge_url, cfg.queue_size as usize).await?;
    let binding = select_binding(version, link, cfg.queue_size);
    info!(ros_version = %version, rosbridge = %cfg.rosbridge_url, "middleware binding selected");

    let registry = lampo_plugins::load_builtin(binding.as_ref()).await?;
    info!(plugins = ?registry.names(), "plugins loaded");

    let server = DashboardServer::new(Arc::new(registry))
        .with_port(cfg.port)
        .with_title(cfg.title);

    tokio::select! {
        result = server.run() => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received, shutting down");
            Ok(())
        }
    }
}
