use anyhow::{Context, Result};
use chrono::Local;
use std::path::{Path, PathBuf};

use super::types::TestReport;
use crate::utils::artifacts::{compact_stamp, ensure_dir, unique_path};

/// Write the report as `<dir>/<prefix>-<YYYYMMDD-HHMMSS>.json`
///
/// Never overwrites an earlier report: a numeric suffix is added if the name is taken.
pub fn write_timestamped(report: &TestReport, dir: &Path, prefix: &str) -> Result<PathBuf> {
    ensure_dir(dir)?;
    let stem = format!("{}-{}", prefix, compact_stamp(Local::now()));
    let path = unique_path(dir, &stem, "json");

    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(&path, json)
        .with_context(|| format!("Failed to write report to {}", path.display()))?;
    Ok(path)
}

pub fn read(path: &Path) -> Result<TestReport> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read report {}", path.display()))?;
    Ok(serde_json::from_str(&text)?)
}
