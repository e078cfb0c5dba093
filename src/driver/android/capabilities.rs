use serde_json::{json, Map, Value};

use crate::utils::config::{AppTarget, MobileConfig};

/// Seconds Appium waits for a command before ending an idle session
pub const NEW_COMMAND_TIMEOUT_SECS: u64 = 180;

/// W3C capabilities for a UiAutomator2 session built from the run configuration
pub fn build_capabilities(config: &MobileConfig) -> Map<String, Value> {
    let mut caps = Map::new();
    let mut set = |key: &str, value: Value| {
        caps.insert(key.to_string(), value);
    };

    set("platformName", json!("Android"));
    set("appium:automationName", json!("UiAutomator2"));
    set("appium:deviceName", json!(config.device_name));
    set("appium:newCommandTimeout", json!(NEW_COMMAND_TIMEOUT_SECS));
    set("appium:autoGrantPermissions", json!(true));
    set("appium:noReset", json!(config.no_reset));
    set("appium:fullReset", json!(config.full_reset));
    set("appium:adbExecTimeout", json!(config.adb_exec_timeout_ms));
    set(
        "appium:androidInstallTimeout",
        json!(config.android_install_timeout_ms),
    );
    set(
        "appium:uiautomator2ServerLaunchTimeout",
        json!(config.uia2_server_launch_timeout_ms),
    );
    set(
        "appium:uiautomator2ServerInstallTimeout",
        json!(config.uia2_server_install_timeout_ms),
    );
    set("appium:disableWindowAnimation", json!(true));

    match &config.target {
        AppTarget::Apk(path) => set("appium:app", json!(path.display().to_string())),
        AppTarget::Installed { package, activity } => {
            set("appium:appPackage", json!(package));
            set("appium:appActivity", json!(activity));
        }
    }

    if let Some(udid) = &config.udid {
        set("appium:udid", json!(udid));
    }

    caps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::config::EnvMap;
    use std::path::Path;

    fn config(pairs: &[(&str, &str)]) -> MobileConfig {
        let env: EnvMap = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        MobileConfig::from_env_map(&env, Path::new(".")).unwrap()
    }

    #[test]
    fn test_apk_capabilities() {
        let caps = build_capabilities(&config(&[
            ("APK_PATH", "/tmp/app.apk"),
            ("ANDROID_UDID", "emulator-5554"),
        ]));
        assert_eq!(caps["platformName"], "Android");
        assert_eq!(caps["appium:automationName"], "UiAutomator2");
        assert_eq!(caps["appium:app"], "/tmp/app.apk");
        assert_eq!(caps["appium:udid"], "emulator-5554");
        assert_eq!(caps["appium:newCommandTimeout"], 180);
        assert_eq!(caps["appium:noReset"], true);
        assert_eq!(caps["appium:fullReset"], false);
        assert_eq!(caps["appium:androidInstallTimeout"], 240_000);
        assert!(!caps.contains_key("appium:appPackage"));
    }

    #[test]
    fn test_installed_app_capabilities() {
        let caps = build_capabilities(&config(&[
            ("APP_PACKAGE", "com.wdiodemoapp"),
            ("APP_ACTIVITY", ".MainActivity"),
        ]));
        assert_eq!(caps["appium:appPackage"], "com.wdiodemoapp");
        assert_eq!(caps["appium:appActivity"], ".MainActivity");
        assert!(!caps.contains_key("appium:app"));
        assert!(!caps.contains_key("appium:udid"));
    }
}
