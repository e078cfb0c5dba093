//! Naming and writing of run artifacts (reports, screenshots, dumps)

use anyhow::{Context, Result};
use chrono::{DateTime, Local, SecondsFormat, Utc};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

const MAX_FILE_STEM_LEN: usize = 160;

fn unsafe_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^A-Za-z0-9_-]+").expect("static regex"))
}

/// Replace every run of characters outside `[A-Za-z0-9_-]` with `_`, capped at 160 chars
pub fn sanitize_file_name(input: &str) -> String {
    unsafe_chars()
        .replace_all(input, "_")
        .chars()
        .take(MAX_FILE_STEM_LEN)
        .collect()
}

/// ISO-8601 UTC timestamp with `:` and `.` replaced, e.g. `2024-01-31T10-20-30-123Z`
pub fn iso_stamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-")
}

/// Compact local timestamp `YYYYMMDD-HHMMSS` used in report file names
pub fn compact_stamp(at: DateTime<Local>) -> String {
    at.format("%Y%m%d-%H%M%S").to_string()
}

/// RFC 3339 UTC timestamp with millisecond precision
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn ensure_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path)
        .with_context(|| format!("Failed to create directory {}", path.display()))
}

/// First non-existing `<dir>/<stem>.<ext>`, adding `-1`, `-2`, ... on collision
pub fn unique_path(dir: &Path, stem: &str, ext: &str) -> PathBuf {
    let first = dir.join(format!("{}.{}", stem, ext));
    if !first.exists() {
        return first;
    }
    let mut n = 1;
    loop {
        let candidate = dir.join(format!("{}-{}.{}", stem, n, ext));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

/// Path relative to the current directory when possible, for display in artifacts
pub fn relative_to_cwd(path: &Path) -> PathBuf {
    std::env::current_dir()
        .ok()
        .and_then(|cwd| path.strip_prefix(cwd).ok().map(Path::to_path_buf))
        .unwrap_or_else(|| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_sanitize_collapses_runs() {
        assert_eq!(
            sanitize_file_name("should open Login screen & attempt login!"),
            "should_open_Login_screen_attempt_login_"
        );
        assert_eq!(sanitize_file_name("a--b__c"), "a--b__c");
    }

    #[test]
    fn test_sanitize_truncates() {
        let long = "x".repeat(300);
        assert_eq!(sanitize_file_name(&long).len(), 160);
    }

    #[test]
    fn test_stamps() {
        let at = Utc.with_ymd_and_hms(2024, 1, 31, 10, 20, 30).unwrap();
        assert_eq!(iso_stamp(at), "2024-01-31T10-20-30-000Z");

        let local = Local.with_ymd_and_hms(2024, 3, 5, 7, 8, 9).unwrap();
        assert_eq!(compact_stamp(local), "20240305-070809");
    }

    #[test]
    fn test_unique_path_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let first = unique_path(dir.path(), "report", "json");
        assert_eq!(first.file_name().unwrap(), "report.json");
        std::fs::write(&first, "{}").unwrap();

        let second = unique_path(dir.path(), "report", "json");
        assert_eq!(second.file_name().unwrap(), "report-1.json");
    }
}
