use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of a single test case
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Pass,
    Fail,
}

/// Error captured from a failing test body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestError {
    pub message: String,
    pub stack: Option<String>,
}

/// Result of one test invocation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TestCaseResult {
    pub name: String,
    pub status: TestStatus,
    pub started_at: String,
    pub finished_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<TestError>,
}

impl TestCaseResult {
    pub fn passed(&self) -> bool {
        self.status == TestStatus::Pass
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Totals {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReportMeta {
    pub base_url: String,
    pub executed_at: String,
    pub totals: Totals,
}

/// Aggregated results of one run, written once to disk
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestReport {
    pub meta: ReportMeta,
    pub tests: Vec<TestCaseResult>,
}

impl TestReport {
    /// Build a report; totals are always derived from `tests`
    pub fn new(base_url: &str, executed_at: String, tests: Vec<TestCaseResult>) -> Self {
        let passed = tests.iter().filter(|t| t.passed()).count();
        let totals = Totals {
            total: tests.len(),
            passed,
            failed: tests.len() - passed,
        };
        Self {
            meta: ReportMeta {
                base_url: base_url.to_string(),
                executed_at,
                totals,
            },
            tests,
        }
    }

    pub fn totals(&self) -> Totals {
        self.meta.totals
    }

    pub fn all_passed(&self) -> bool {
        self.meta.totals.failed == 0
    }

    /// Process exit code for CI gating: non-zero iff any test failed
    pub fn exit_code(&self) -> i32 {
        if self.all_passed() {
            0
        } else {
            1
        }
    }
}
