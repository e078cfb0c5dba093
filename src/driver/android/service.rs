//! Local Appium server lifecycle
//!
//! Spawns the server for the duration of a mobile run and stops it afterwards.

use anyhow::{Context, Result};
use colored::Colorize;
use log::{info, warn};
use std::process::Stdio;
use tokio::process::{Child, Command};

use super::appium::AppiumClient;
use crate::driver::common::{self, PollConfig};
use crate::utils::binary_resolver;

/// Maximum time to wait for `GET /status` to report ready
pub const STARTUP_TIMEOUT_MS: u64 = 60_000;

/// Split `APPIUM_COMMAND` (e.g. `npx appium`) and append the listen arguments
pub fn appium_command_line(command: &str, host: &str, port: u16, base_path: &str) -> Vec<String> {
    let mut parts: Vec<String> = command.split_whitespace().map(str::to_string).collect();
    if parts.is_empty() {
        parts.push("appium".to_string());
    }
    parts.extend([
        "--address".to_string(),
        host.to_string(),
        "--port".to_string(),
        port.to_string(),
        "--base-path".to_string(),
        base_path.to_string(),
    ]);
    parts
}

/// Appium server child process, killed when dropped
pub struct AppiumService {
    child: Child,
    port: u16,
}

impl AppiumService {
    /// Spawn the server and wait until it accepts sessions
    pub async fn start(command: &str, host: &str, port: u16, base_path: &str, url: &str) -> Result<Self> {
        let argv = appium_command_line(command, host, port, base_path);
        let program = binary_resolver::find_binary(&argv[0]);

        println!(
            "  {} Starting Appium on {}:{}...",
            "⏳".yellow(),
            host,
            port
        );
        let child = Command::new(&program)
            .args(&argv[1..])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to start Appium ({})", argv.join(" ")))?;

        let mut service = Self { child, port };

        let client = AppiumClient::new(url)?;
        let ready = common::wait_until(
            || client.is_ready(),
            PollConfig {
                timeout_ms: STARTUP_TIMEOUT_MS,
                initial_interval_ms: 250,
                max_interval_ms: 1000,
                use_exponential_backoff: true,
            },
        )
        .await;

        if !ready {
            service.stop().await;
            anyhow::bail!(
                "Appium did not become ready on port {} within {}ms",
                port,
                STARTUP_TIMEOUT_MS
            );
        }

        println!("  {} Appium ready on port {}", "✓".green(), port);
        Ok(service)
    }

    /// Kill the server; failures are logged only
    pub async fn stop(&mut self) {
        match self.child.kill().await {
            Ok(()) => info!("Appium on port {} stopped", self.port),
            Err(e) => warn!("Failed to stop Appium on port {}: {}", self.port, e),
        }
    }
}
