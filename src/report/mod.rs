pub mod json;
pub mod types;

use anyhow::Result;
use colored::Colorize;
use std::path::Path;

pub use types::{TestCaseResult, TestReport, TestStatus};

/// Print a one-line-per-test summary
pub fn print_summary(report: &TestReport) {
    for test in &report.tests {
        match test.status {
            TestStatus::Pass => println!("  {} {}", "✓".green(), test.name),
            TestStatus::Fail => {
                let message = test
                    .error
                    .as_ref()
                    .map(|e| e.message.as_str())
                    .unwrap_or("unknown error");
                println!("  {} {}", "✗".red(), test.name);
                println!("      {}", message.red());
            }
        }
    }
    let totals = report.totals();
    println!(
        "  {} passed, {} failed, {} total",
        totals.passed.to_string().green(),
        totals.failed.to_string().red(),
        totals.total
    );
}

/// Load a previously written report and print its summary
pub fn show_report(path: &Path) -> Result<i32> {
    let report = json::read(path)?;
    println!(
        "{} {} (executed {})",
        "📊".blue(),
        report.meta.base_url.cyan(),
        report.meta.executed_at
    );
    print_summary(&report);
    Ok(report.exit_code())
}

#[cfg(test)]
mod tests {
    use super::types::*;
    use super::*;
    use serde_json::json;

    fn case(name: &str, status: TestStatus) -> TestCaseResult {
        TestCaseResult {
            name: name.to_string(),
            status,
            started_at: "2024-01-01T00:00:00.000Z".into(),
            finished_at: "2024-01-01T00:00:01.000Z".into(),
            details: (status == TestStatus::Pass).then(|| json!({"status": 200})),
            error: (status == TestStatus::Fail).then(|| TestError {
                message: "Expected 200, got 500".into(),
                stack: None,
            }),
        }
    }

    #[test]
    fn test_totals_match_tests() {
        let report = TestReport::new(
            "http://x",
            "now".into(),
            vec![
                case("a", TestStatus::Pass),
                case("b", TestStatus::Fail),
                case("c", TestStatus::Pass),
            ],
        );
        let t = report.totals();
        assert_eq!(t.total, report.tests.len());
        assert_eq!(t.passed + t.failed, t.total);
        assert_eq!((t.passed, t.failed), (2, 1));
        assert_eq!(report.exit_code(), 1);

        let empty = TestReport::new("http://x", "now".into(), vec![]);
        assert_eq!(empty.exit_code(), 0);
    }

    #[test]
    fn test_serialized_shape() {
        let report = TestReport::new(
            "http://x",
            "2024-01-01T00:00:00.000Z".into(),
            vec![case("a", TestStatus::Pass), case("b", TestStatus::Fail)],
        );
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["meta"]["baseUrl"], "http://x");
        assert_eq!(value["meta"]["totals"]["failed"], 1);
        assert_eq!(value["tests"][0]["status"], "pass");
        assert_eq!(value["tests"][0]["startedAt"], "2024-01-01T00:00:00.000Z");
        assert!(value["tests"][0].get("error").is_none());
        assert_eq!(value["tests"][1]["status"], "fail");
        assert!(value["tests"][1]["error"]["stack"].is_null());
        assert!(value["tests"][1].get("details").is_none());
    }

    #[test]
    fn test_written_reports_never_collide() {
        let dir = tempfile::tempdir().unwrap();
        let report = TestReport::new("http://x", "now".into(), vec![case("a", TestStatus::Pass)]);

        let first = json::write_timestamped(&report, dir.path(), "api-test-report").unwrap();
        let second = json::write_timestamped(&report, dir.path(), "api-test-report").unwrap();
        assert_ne!(first, second);

        let name = first.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("api-test-report-"));
        assert!(name.ends_with(".json"));

        assert_eq!(json::read(&second).unwrap(), report);
        assert_eq!(show_report(&first).unwrap(), 0);
    }
}
