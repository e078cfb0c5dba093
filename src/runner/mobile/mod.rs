//! Mobile end-to-end suite against an Appium-managed Android device

#[cfg(test)]
pub(crate) mod fake;
pub mod hooks;
pub mod specs;

use anyhow::Result;
use colored::Colorize;
use log::warn;
use std::path::PathBuf;

use super::harness::Suite;
use crate::driver::android::capabilities::build_capabilities;
use crate::driver::android::service::AppiumService;
use crate::driver::android::AndroidDriver;
use crate::driver::traits::MobileDriver;
use crate::report::json::write_timestamped;
use crate::report::types::TestReport;
use crate::utils::config::{MobileConfig, DEFAULT_APPIUM_PORT};
use crate::utils::ports::{is_port_in_use, resolve_appium_port};

pub const REPORT_PREFIX: &str = "mobile-test-report";

/// Run the three specs in order with the per-test and end-of-run hooks
pub async fn run_specs<D: MobileDriver + ?Sized>(
    driver: &D,
    config: &MobileConfig,
    base_url: &str,
) -> TestReport {
    let mut suite = Suite::new("mobile");

    let result = suite
        .run(specs::LOGIN_TITLE, || {
            specs::login(driver, &config.test_email, &config.test_password)
        })
        .await;
    hooks::after_test(driver, config, result).await;

    let result = suite
        .run(specs::FORMS_TITLE, || specs::forms(driver))
        .await;
    hooks::after_test(driver, config, result).await;

    let result = suite
        .run(specs::SWIPE_TITLE, || {
            specs::swipe(driver, &config.screenshots_dir)
        })
        .await;
    hooks::after_test(driver, config, result).await;

    hooks::after(driver, config).await;

    suite.finish(base_url)
}

/// Port the Appium server listens on for this run
fn appium_port(config: &MobileConfig) -> Result<u16> {
    if config.spawn_appium {
        resolve_appium_port(config.appium.port, |p| {
            is_port_in_use(&config.appium.host, p)
        })
    } else {
        Ok(config.appium.port.unwrap_or(DEFAULT_APPIUM_PORT))
    }
}

/// Start Appium (unless attaching to an external server), run the suite and write its report
pub async fn run(config: &MobileConfig) -> Result<(TestReport, PathBuf)> {
    let port = appium_port(config)?;
    let url = config.appium.url(port);
    println!("[mobile] Appium endpoint: {}", url.cyan());

    let mut service = if config.spawn_appium {
        Some(
            AppiumService::start(
                &config.appium_command,
                &config.appium.host,
                port,
                &config.appium.path,
                &url,
            )
            .await?,
        )
    } else {
        None
    };

    hooks::before_session(config).await;

    let outcome = run_session(config, &url).await;

    if let Some(service) = service.as_mut() {
        service.stop().await;
    }

    let report = outcome?;
    let path = write_timestamped(&report, &config.result_dir, REPORT_PREFIX)?;

    let totals = report.totals();
    let verdict = if report.all_passed() {
        "PASS".green().bold()
    } else {
        "FAIL".red().bold()
    };
    println!(
        "[mobile] {} ({}/{} passed)",
        verdict, totals.passed, totals.total
    );
    println!("[mobile] Report: {}", path.display());

    Ok((report, path))
}

async fn run_session(config: &MobileConfig, url: &str) -> Result<TestReport> {
    let mut driver = AndroidDriver::start(url, build_capabilities(config)).await?;

    let report = match hooks::before(config) {
        Ok(()) => Ok(run_specs(&driver, config, url).await),
        Err(e) => Err(e),
    };

    if let Err(e) = driver.end_session().await {
        warn!("[mobile] {:#}", e);
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::selector::{a11y, edit_text_instance, text_contains, text_exact};
    use crate::report::types::TestStatus;
    use crate::utils::config::EnvMap;
    use fake::{FakeDevice, FakeElement};
    use std::path::Path;

    fn config(root: &Path) -> MobileConfig {
        let mut env = EnvMap::new();
        env.insert("APK_PATH".into(), "/tmp/app.apk".into());
        MobileConfig::from_env_map(&env, root).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_suite_continues_after_failures_and_runs_hooks() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        // only the login screen exists; forms fails, swipe falls back to the window
        let device = FakeDevice::default()
            .with(a11y("Login"), FakeElement::visible())
            .with(a11y("input-email"), FakeElement::visible())
            .with(edit_text_instance(1), FakeElement::visible())
            .with(text_exact("LOGIN"), FakeElement::visible())
            .with(text_contains("Invalid"), FakeElement::with_text("Invalid credentials"));

        let report = run_specs(&device, &config, "http://127.0.0.1:4731").await;

        let statuses: Vec<_> = report.tests.iter().map(|t| t.status).collect();
        assert_eq!(
            statuses,
            vec![TestStatus::Pass, TestStatus::Fail, TestStatus::Pass]
        );
        assert_eq!(report.tests[1].name, specs::FORMS_TITLE);
        assert_eq!(report.meta.base_url, "http://127.0.0.1:4731");
        assert_eq!(report.exit_code(), 1);

        // failure screenshot for forms only
        let shots = device.calls().iter().filter(|c| *c == "screenshot").count();
        assert_eq!(shots, 1);
        // end-of-run hook terminates the configured package
        assert_eq!(
            device.calls().last().map(String::as_str),
            Some("terminate com.wdiodemoapp")
        );
    }

    #[test]
    fn test_external_server_port_is_not_probed() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config(dir.path());
        cfg.spawn_appium = false;
        assert_eq!(appium_port(&cfg).unwrap(), DEFAULT_APPIUM_PORT);
        cfg.appium.port = Some(4800);
        assert_eq!(appium_port(&cfg).unwrap(), 4800);
    }
}
