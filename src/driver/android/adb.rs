use crate::utils::binary_resolver;
use anyhow::{Context, Result};
use log::debug;
use std::future::Future;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Represents an Android device
#[derive(Debug, Clone, PartialEq)]
pub struct Device {
    pub serial: String,
    pub state: String,
}

impl Device {
    /// Attached and authorized, as opposed to `offline` or `unauthorized`
    pub fn is_online(&self) -> bool {
        self.state == "device"
    }
}

/// Parse the output of `adb devices`
pub fn parse_devices(stdout: &str) -> Vec<Device> {
    stdout
        .lines()
        .skip(1)
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            match (parts.next(), parts.next()) {
                (Some(serial), Some(state)) => Some(Device {
                    serial: serial.to_string(),
                    state: state.to_string(),
                }),
                _ => None,
            }
        })
        .collect()
}

/// Get list of connected Android devices
pub async fn get_devices() -> Result<Vec<Device>> {
    let adb_path = binary_resolver::find_adb()?;
    let output = Command::new(adb_path)
        .args(["devices"])
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .context("Failed to execute adb devices")?;

    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.is_empty() {
        debug!("adb devices stderr:\n{}", stderr);
    }

    Ok(parse_devices(&String::from_utf8_lossy(&output.stdout)))
}

/// Serial of the first device in `device` state
pub async fn first_online_device() -> Result<Option<String>> {
    Ok(get_devices()
        .await?
        .into_iter()
        .find(Device::is_online)
        .map(|d| d.serial))
}

/// Execute a raw ADB command
pub async fn exec(serial: Option<&str>, args: &[&str]) -> Result<String> {
    let mut full_args = Vec::new();

    if let Some(s) = serial {
        full_args.push("-s");
        full_args.push(s);
    }

    full_args.extend_from_slice(args);

    let adb_path = binary_resolver::find_adb()?;
    let output = Command::new(adb_path)
        .args(&full_args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .with_context(|| format!("Failed to execute: adb {:?}", full_args))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("ADB command failed: {}", stderr.trim());
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Execute an ADB shell command
pub async fn shell(serial: Option<&str>, cmd: &[&str]) -> Result<String> {
    let mut args = vec!["shell"];
    args.extend_from_slice(cmd);
    exec(serial, &args).await
}

/// Wipe the application's data and cache with `pm clear`
///
/// The adb process is killed if it does not finish within `timeout_ms`.
pub async fn clear_app_data(serial: &str, package: &str, timeout_ms: u64) -> Result<String> {
    let cmd = ["pm", "clear", package];
    bounded_pm_clear(shell(Some(serial), &cmd), package, timeout_ms).await
}

async fn bounded_pm_clear<F>(run: F, package: &str, timeout_ms: u64) -> Result<String>
where
    F: Future<Output = Result<String>>,
{
    match tokio::time::timeout(Duration::from_millis(timeout_ms), run).await {
        Ok(result) => Ok(result?.trim().to_string()),
        Err(_) => anyhow::bail!(
            "adb shell pm clear {} timed out after {}ms",
            package,
            timeout_ms
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_devices() {
        let stdout = "List of devices attached\n\
                      emulator-5554\tdevice\n\
                      R58M12ABCDE\tunauthorized\n\
                      \n";
        let devices = parse_devices(stdout);
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].serial, "emulator-5554");
        assert!(devices[0].is_online());
        assert!(!devices[1].is_online());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pm_clear_timeout() {
        let hung = std::future::pending::<Result<String>>();
        let err = bounded_pm_clear(hung, "com.wdiodemoapp", 120_000)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "adb shell pm clear com.wdiodemoapp timed out after 120000ms"
        );
    }

    #[tokio::test]
    async fn test_pm_clear_output_and_failure() {
        let ok = bounded_pm_clear(async { Ok("Success\n".to_string()) }, "pkg", 1_000)
            .await
            .unwrap();
        assert_eq!(ok, "Success");

        let failed = bounded_pm_clear(
            async { Err(anyhow::anyhow!("ADB command failed: device offline")) },
            "pkg",
            1_000,
        )
        .await
        .unwrap_err();
        assert!(failed.to_string().contains("device offline"));
    }

    #[test]
    fn test_parse_devices_empty() {
        assert!(parse_devices("List of devices attached\n\n").is_empty());
        assert!(parse_devices("").is_empty());
    }
}
