//! Fixed-sequence test harness
//!
//! A failing test is recorded as data; it never aborts the batch.

use anyhow::Result;
use colored::Colorize;
use futures::FutureExt;
use log::debug;
use serde_json::Value;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Instant;

use crate::report::types::{TestCaseResult, TestError, TestReport, TestStatus};
use crate::utils::artifacts::now_rfc3339;

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {}", s)
    } else {
        "panicked".to_string()
    }
}

/// Execute `body` once and capture its outcome
///
/// `Ok(details)` becomes a pass carrying `details`; an error or a panic becomes
/// a fail carrying `{ message, stack }`.
pub async fn run_test<F, Fut>(name: &str, body: F) -> TestCaseResult
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Value>>,
{
    let started_at = now_rfc3339();
    let start = Instant::now();

    let outcome = AssertUnwindSafe(async move { body().await })
        .catch_unwind()
        .await;

    let (status, details, error) = match outcome {
        Ok(Ok(details)) => (TestStatus::Pass, Some(details), None),
        Ok(Err(e)) => (
            TestStatus::Fail,
            None,
            Some(TestError {
                message: format!("{:#}", e),
                stack: Some(format!("{:?}", e)),
            }),
        ),
        Err(payload) => (
            TestStatus::Fail,
            None,
            Some(TestError {
                message: panic_message(payload),
                stack: None,
            }),
        ),
    };

    debug!("{} finished in {}ms", name, start.elapsed().as_millis());

    TestCaseResult {
        name: name.to_string(),
        status,
        started_at,
        finished_at: now_rfc3339(),
        details,
        error,
    }
}

/// Ordered collection of test results for one run
pub struct Suite {
    label: String,
    executed_at: String,
    tests: Vec<TestCaseResult>,
}

impl Suite {
    /// `label` prefixes console output, e.g. `api-testing`
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            executed_at: now_rfc3339(),
            tests: Vec::new(),
        }
    }

    /// Run a test and append its result
    pub async fn run<F, Fut>(&mut self, name: &str, body: F) -> &TestCaseResult
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value>>,
    {
        let result = run_test(name, body).await;
        match result.status {
            TestStatus::Pass => println!("[{}] {} {}", self.label, "✓".green(), name),
            TestStatus::Fail => println!("[{}] {} {}", self.label, "✗".red(), name),
        }
        self.tests.push(result);
        let last = self.tests.len() - 1;
        &self.tests[last]
    }

    pub fn finish(self, base_url: &str) -> TestReport {
        TestReport::new(base_url, self.executed_at, self.tests)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use serde_json::json;

    #[tokio::test]
    async fn test_ok_body_passes_with_details() {
        let result = run_test("ok", || async { Ok(json!({"status": 200})) }).await;
        assert_eq!(result.status, TestStatus::Pass);
        assert_eq!(result.details, Some(json!({"status": 200})));
        assert!(result.error.is_none());
        assert!(result.started_at <= result.finished_at);
    }

    #[tokio::test]
    async fn test_error_body_fails_with_message_and_stack() {
        let result = run_test("err", || async {
            Err::<Value, _>(anyhow::anyhow!("Expected 200, got 500")).context("GET /posts/1")
        })
        .await;
        assert_eq!(result.status, TestStatus::Fail);
        assert!(result.details.is_none());
        let error = result.error.unwrap();
        assert_eq!(error.message, "GET /posts/1: Expected 200, got 500");
        assert!(error.stack.unwrap().contains("Caused by"));
    }

    #[tokio::test]
    async fn test_panicking_body_is_captured() {
        let result = run_test("boom", || async {
            let v: Vec<u8> = Vec::new();
            let _ = v[3];
            Ok(Value::Null)
        })
        .await;
        assert_eq!(result.status, TestStatus::Fail);
        assert!(result.error.unwrap().message.starts_with("panicked"));
    }

    #[tokio::test]
    async fn test_suite_keeps_order_and_continues_after_failure() {
        let mut suite = Suite::new("unit");
        suite.run("one", || async { Ok(Value::Null) }).await;
        suite
            .run("two", || async { Err(anyhow::anyhow!("nope")) })
            .await;
        suite.run("three", || async { Ok(Value::Null) }).await;

        let report = suite.finish("http://x");
        let names: Vec<_> = report.tests.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["one", "two", "three"]);
        assert_eq!(report.totals().failed, 1);
        assert_eq!(report.exit_code(), 1);
    }
}
