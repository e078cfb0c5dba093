//! Run configuration, assembled once at startup from an environment snapshot

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_API_BASE_URL: &str = "https://jsonplaceholder.typicode.com";
pub const DEFAULT_WEB_BASE_URL: &str = "https://www.demoblaze.com";
pub const DEFAULT_APP_PACKAGE: &str = "com.wdiodemoapp";
pub const DEFAULT_APPIUM_PORT: u16 = 4723;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{key} must be a number, got {value:?}")]
    InvalidNumber { key: String, value: String },

    #[error("Mobile config error: set APK_PATH (recommended) OR set both APP_PACKAGE and APP_ACTIVITY before running the mobile suite.")]
    MissingAppTarget,
}

/// Snapshot of the process environment
pub type EnvMap = HashMap<String, String>;

pub fn env_snapshot() -> EnvMap {
    std::env::vars().collect()
}

fn string_or(env: &EnvMap, key: &str, default: &str) -> String {
    env.get(key)
        .filter(|v| !v.is_empty())
        .cloned()
        .unwrap_or_else(|| default.to_string())
}

fn optional(env: &EnvMap, key: &str) -> Option<String> {
    env.get(key).filter(|v| !v.is_empty()).cloned()
}

/// Unset means `default`; any value other than `"true"` means false
fn flag(env: &EnvMap, key: &str, default: bool) -> bool {
    match optional(env, key) {
        Some(v) => v == "true",
        None => default,
    }
}

fn number<T: std::str::FromStr>(env: &EnvMap, key: &str, default: T) -> Result<T, ConfigError> {
    match optional(env, key) {
        Some(v) => v.trim().parse().map_err(|_| ConfigError::InvalidNumber {
            key: key.to_string(),
            value: v,
        }),
        None => Ok(default),
    }
}

/// API smoke-test configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    /// Directory the JSON report is written to
    pub result_dir: PathBuf,
    /// Upper bound on a single request round-trip
    pub max_latency_ms: u64,
}

impl ApiConfig {
    pub fn from_env_map(env: &EnvMap, output_root: &Path) -> Self {
        Self {
            base_url: string_or(env, "API_BASE_URL", DEFAULT_API_BASE_URL),
            result_dir: output_root.join("api-testing").join("result"),
            max_latency_ms: 5000,
        }
    }
}

/// Web checkout flow configuration
#[derive(Debug, Clone)]
pub struct WebConfig {
    pub base_url: String,
    pub headless: bool,
    /// Directory holding `order-id.txt`
    pub artifacts_dir: PathBuf,
    pub screenshots_dir: PathBuf,
    pub wait_timeout_ms: u64,
}

impl WebConfig {
    pub fn from_env_map(env: &EnvMap, output_root: &Path) -> Result<Self, ConfigError> {
        let artifacts_dir = output_root.join("web-testing");
        Ok(Self {
            base_url: string_or(env, "WEB_BASE_URL", DEFAULT_WEB_BASE_URL),
            headless: flag(env, "WEB_HEADLESS", true),
            screenshots_dir: artifacts_dir.join("screenshots"),
            artifacts_dir,
            wait_timeout_ms: number(env, "WEB_WAIT_TIMEOUT", 30_000)?,
        })
    }
}

/// What the device session starts
#[derive(Debug, Clone, PartialEq)]
pub enum AppTarget {
    /// Installable package, reinstalled for every session
    Apk(PathBuf),
    /// Already installed application
    Installed { package: String, activity: String },
}

/// Appium server location
#[derive(Debug, Clone, PartialEq)]
pub struct AppiumEndpoint {
    pub host: String,
    /// Explicitly requested port, if any
    pub port: Option<u16>,
    pub path: String,
}

impl AppiumEndpoint {
    pub fn url(&self, port: u16) -> String {
        let path = if self.path.starts_with('/') {
            self.path.clone()
        } else {
            format!("/{}", self.path)
        };
        format!(
            "http://{}:{}{}",
            self.host,
            port,
            path.trim_end_matches('/')
        )
    }
}

/// Mobile suite configuration
#[derive(Debug, Clone)]
pub struct MobileConfig {
    pub target: AppTarget,
    /// Package used by `pm clear` and app termination
    pub app_package: String,
    pub udid: Option<String>,
    pub device_name: String,
    pub no_reset: bool,
    pub full_reset: bool,
    pub clear_cache: bool,
    pub clear_cache_timeout_ms: u64,
    pub adb_exec_timeout_ms: u64,
    pub android_install_timeout_ms: u64,
    pub uia2_server_launch_timeout_ms: u64,
    pub uia2_server_install_timeout_ms: u64,
    pub appium: AppiumEndpoint,
    pub appium_command: String,
    /// Launch a local Appium server for the run
    pub spawn_appium: bool,
    pub swipe_up_on_finish: bool,
    pub close_app_on_finish: bool,
    pub test_email: String,
    pub test_password: String,
    pub screenshots_dir: PathBuf,
    pub result_dir: PathBuf,
}

impl MobileConfig {
    pub fn from_env_map(env: &EnvMap, output_root: &Path) -> Result<Self, ConfigError> {
        let target = match optional(env, "APK_PATH") {
            Some(apk) => AppTarget::Apk(absolute(Path::new(&apk))),
            None => match (optional(env, "APP_PACKAGE"), optional(env, "APP_ACTIVITY")) {
                (Some(package), Some(activity)) => AppTarget::Installed { package, activity },
                _ => return Err(ConfigError::MissingAppTarget),
            },
        };

        // 0 means "pick one"
        let port = match optional(env, "APPIUM_PORT") {
            Some(_) => Some(number(env, "APPIUM_PORT", DEFAULT_APPIUM_PORT)?),
            None => None,
        }
        .filter(|p| *p != 0);

        let root = output_root.join("mobile-testing");

        Ok(Self {
            target,
            app_package: string_or(env, "APP_PACKAGE", DEFAULT_APP_PACKAGE),
            udid: optional(env, "ANDROID_UDID"),
            device_name: string_or(env, "ANDROID_DEVICE_NAME", "Android Emulator"),
            no_reset: flag(env, "NO_RESET", true),
            full_reset: flag(env, "FULL_RESET", false),
            clear_cache: flag(env, "CLEAR_CACHE", true),
            clear_cache_timeout_ms: number(env, "CLEAR_CACHE_TIMEOUT", 120_000)?,
            adb_exec_timeout_ms: number(env, "ADB_EXEC_TIMEOUT", 120_000)?,
            android_install_timeout_ms: number(env, "ANDROID_INSTALL_TIMEOUT", 240_000)?,
            uia2_server_launch_timeout_ms: number(env, "UIA2_SERVER_LAUNCH_TIMEOUT", 120_000)?,
            uia2_server_install_timeout_ms: number(env, "UIA2_SERVER_INSTALL_TIMEOUT", 120_000)?,
            appium: AppiumEndpoint {
                host: string_or(env, "APPIUM_HOST", "127.0.0.1"),
                port,
                path: string_or(env, "APPIUM_PATH", "/"),
            },
            appium_command: string_or(env, "APPIUM_COMMAND", "appium"),
            spawn_appium: flag(env, "APPIUM_SPAWN", true),
            swipe_up_on_finish: flag(env, "SWIPE_UP_ON_FINISH", true),
            close_app_on_finish: flag(env, "CLOSE_APP_ON_FINISH", true),
            test_email: string_or(env, "MOBILE_TEST_EMAIL", "test@qa.com"),
            test_password: string_or(env, "MOBILE_TEST_PASSWORD", "invalid-password"),
            screenshots_dir: root.join("screenshots"),
            result_dir: root.join("result"),
        })
    }
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> EnvMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_api_defaults() {
        let cfg = ApiConfig::from_env_map(&EnvMap::new(), Path::new("out"));
        assert_eq!(cfg.base_url, DEFAULT_API_BASE_URL);
        assert_eq!(cfg.result_dir, Path::new("out/api-testing/result"));
        assert_eq!(cfg.max_latency_ms, 5000);
    }

    #[test]
    fn test_web_overrides() {
        let cfg = WebConfig::from_env_map(
            &env(&[("WEB_BASE_URL", "http://localhost:8080"), ("WEB_HEADLESS", "false")]),
            Path::new("."),
        )
        .unwrap();
        assert_eq!(cfg.base_url, "http://localhost:8080");
        assert!(!cfg.headless);
        assert_eq!(cfg.screenshots_dir, Path::new("./web-testing/screenshots"));
    }

    #[test]
    fn test_mobile_requires_app_target() {
        let err = MobileConfig::from_env_map(&env(&[("APP_PACKAGE", "com.x")]), Path::new("."))
            .unwrap_err();
        assert_eq!(err, ConfigError::MissingAppTarget);
    }

    #[test]
    fn test_mobile_installed_target_and_flags() {
        let cfg = MobileConfig::from_env_map(
            &env(&[
                ("APP_PACKAGE", "com.wdiodemoapp"),
                ("APP_ACTIVITY", ".MainActivity"),
                ("NO_RESET", "yes"),
                ("CLEAR_CACHE", "false"),
                ("APPIUM_PORT", "4800"),
            ]),
            Path::new("."),
        )
        .unwrap();
        assert_eq!(
            cfg.target,
            AppTarget::Installed {
                package: "com.wdiodemoapp".into(),
                activity: ".MainActivity".into()
            }
        );
        // anything but "true" disables a flag
        assert!(!cfg.no_reset);
        assert!(!cfg.clear_cache);
        assert!(cfg.close_app_on_finish);
        assert_eq!(cfg.appium.port, Some(4800));
    }

    #[test]
    fn test_mobile_apk_path_is_absolute() {
        let cfg =
            MobileConfig::from_env_map(&env(&[("APK_PATH", "apps/demo.apk")]), Path::new("."))
                .unwrap();
        match cfg.target {
            AppTarget::Apk(path) => {
                assert!(path.is_absolute());
                assert!(path.ends_with("apps/demo.apk"));
            }
            other => panic!("unexpected target {:?}", other),
        }
        assert_eq!(cfg.app_package, DEFAULT_APP_PACKAGE);
    }

    #[test]
    fn test_invalid_number_is_reported() {
        let err = MobileConfig::from_env_map(
            &env(&[("APK_PATH", "/a.apk"), ("ADB_EXEC_TIMEOUT", "soon")]),
            Path::new("."),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidNumber {
                key: "ADB_EXEC_TIMEOUT".into(),
                value: "soon".into()
            }
        );
    }

    #[test]
    fn test_zero_port_means_unset() {
        let cfg = MobileConfig::from_env_map(
            &env(&[("APK_PATH", "/a.apk"), ("APPIUM_PORT", "0")]),
            Path::new("."),
        )
        .unwrap();
        assert_eq!(cfg.appium.port, None);
    }

    #[test]
    fn test_endpoint_url() {
        let ep = AppiumEndpoint {
            host: "127.0.0.1".into(),
            port: None,
            path: "/".into(),
        };
        assert_eq!(ep.url(4731), "http://127.0.0.1:4731");
        let ep = AppiumEndpoint {
            path: "wd/hub/".into(),
            ..ep
        };
        assert_eq!(ep.url(4723), "http://127.0.0.1:4723/wd/hub");
    }
}
