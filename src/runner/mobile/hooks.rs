//! Session lifecycle hooks for the mobile suite
//!
//! Everything here is best-effort: failures are logged as warnings and never
//! change a test outcome.

use anyhow::{Context, Result};
use chrono::Utc;
use colored::Colorize;
use log::{debug, warn};
use std::path::{Path, PathBuf};

use crate::driver::android::adb;
use crate::driver::common::{bottom_nav_point, swipe_up_points};
use crate::driver::traits::MobileDriver;
use crate::report::types::TestCaseResult;
use crate::utils::artifacts::{ensure_dir, iso_stamp, sanitize_file_name};
use crate::utils::config::MobileConfig;

const SWIPE_UP_HOLD_MS: u64 = 150;
const SWIPE_UP_MOVE_MS: u64 = 450;

fn artifact_path(dir: &Path, base: &str, ext: &str) -> PathBuf {
    dir.join(format!("{}-{}.{}", iso_stamp(Utc::now()), base, ext))
}

/// Clear app data on the target device before the session starts
pub async fn before_session(config: &MobileConfig) {
    if !config.clear_cache {
        return;
    }

    let udid = match &config.udid {
        Some(udid) => Some(udid.clone()),
        None => adb::first_online_device().await.unwrap_or_else(|e| {
            debug!("adb devices failed: {:#}", e);
            None
        }),
    };
    let Some(udid) = udid else {
        warn!("[mobile] CLEAR_CACHE enabled but no adb device found. Skipping `pm clear`.");
        return;
    };

    match adb::clear_app_data(&udid, &config.app_package, config.clear_cache_timeout_ms).await {
        Ok(out) => println!(
            "[mobile] Cleared app data: {} on {} ({})",
            config.app_package,
            udid,
            if out.is_empty() { "OK" } else { out.as_str() }
        ),
        Err(e) => warn!(
            "[mobile] Failed to clear app data for {}. You can disable via CLEAR_CACHE=false. Error: {:#}",
            config.app_package, e
        ),
    }
}

/// Prepare the artifacts directory
pub fn before(config: &MobileConfig) -> Result<()> {
    ensure_dir(&config.screenshots_dir)
}

/// Capture a screenshot and a page-source dump for a failed test
///
/// Returns the screenshot path when one was written.
pub async fn after_test<D: MobileDriver + ?Sized>(
    driver: &D,
    config: &MobileConfig,
    result: &TestCaseResult,
) -> Option<PathBuf> {
    if result.passed() {
        return None;
    }
    if let Err(e) = ensure_dir(&config.screenshots_dir) {
        warn!("[mobile] {:#}", e);
        return None;
    }

    let base = sanitize_file_name(&result.name);
    let png = artifact_path(&config.screenshots_dir, &base, "png");
    let saved = match driver.save_screenshot(&png).await {
        Ok(()) => Some(png),
        Err(e) => {
            warn!("[mobile] Failed to save failure screenshot: {:#}", e);
            None
        }
    };

    if let Err(e) = dump_page_source(driver, &config.screenshots_dir, &base).await {
        debug!("page source dump skipped: {:#}", e);
    }

    saved
}

/// End-of-run cleanup: optional swipe up, then terminate or close the app
pub async fn after<D: MobileDriver + ?Sized>(driver: &D, config: &MobileConfig) {
    if config.swipe_up_on_finish {
        if let Err(e) = swipe_up_once(driver).await {
            warn!("[mobile] swipeUpOnce failed: {:#}", e);
        }
    }

    if config.close_app_on_finish {
        close_app(driver, &config.app_package).await;
    }
}

async fn swipe_up_once<D: MobileDriver + ?Sized>(driver: &D) -> Result<()> {
    let (width, height) = driver.window_size().await?;
    let (from, to) = swipe_up_points(width, height);
    driver
        .swipe(from, to, SWIPE_UP_HOLD_MS, SWIPE_UP_MOVE_MS)
        .await
}

async fn close_app<D: MobileDriver + ?Sized>(driver: &D, package: &str) {
    match driver.terminate_app(package).await {
        Ok(()) => {
            println!("[mobile] App terminated: {}", package);
            return;
        }
        Err(e) => warn!("[mobile] terminateApp failed: {:#}", e),
    }

    match driver.close_app().await {
        Ok(()) => println!("[mobile] App closed via closeApp()"),
        Err(e) => warn!("[mobile] closeApp failed: {:#}", e),
    }
}

/// Write the current UI hierarchy to `<dir>/<stamp>-<name>.xml`
pub async fn dump_page_source<D: MobileDriver + ?Sized>(
    driver: &D,
    dir: &Path,
    name: &str,
) -> Result<PathBuf> {
    ensure_dir(dir)?;
    let source = driver.page_source().await?;
    let path = artifact_path(dir, name, "xml");
    std::fs::write(&path, source)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("  {} Page source saved: {}", "📄".blue(), path.display());
    Ok(path)
}

/// Tap slot `index` of a `total`-slot bottom navigation bar by position
pub async fn tap_bottom_nav_index<D: MobileDriver + ?Sized>(
    driver: &D,
    index: u32,
    total: u32,
) -> Result<()> {
    let (width, height) = driver.window_size().await?;
    let (x, y) = bottom_nav_point(index, total, width, height);
    driver.tap_point(x, y).await
}
