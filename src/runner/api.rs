//! API smoke tests against a JSONPlaceholder-compatible REST service
//!
//! Positive and negative cases, each asserting status code, latency, body
//! shape and echoed values.

use anyhow::{ensure, Context, Result};
use colored::Colorize;
use log::info;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, StatusCode};
use serde_json::{json, Map, Value};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use super::harness::Suite;
use crate::report::json::write_timestamped;
use crate::report::types::TestReport;
use crate::utils::config::ApiConfig;

pub const REPORT_PREFIX: &str = "api-test-report";

/// Response of a single request, with the body parsed when it is JSON
#[derive(Debug)]
pub struct HttpOutcome {
    pub status: StatusCode,
    pub elapsed_ms: u64,
    pub text: String,
    pub json: Option<Value>,
}

/// Send a request and read the whole body
///
/// The body is parsed only when the content type is `application/json`;
/// a malformed JSON body yields `json: None`.
pub async fn http_json(
    client: &Client,
    method: Method,
    url: &str,
    body: Option<&Value>,
) -> Result<HttpOutcome> {
    let start = Instant::now();
    let mut request = client.request(method.clone(), url);
    if let Some(body) = body {
        request = request
            .header(CONTENT_TYPE, "application/json; charset=UTF-8")
            .body(body.to_string());
    }
    let response = request
        .send()
        .await
        .with_context(|| format!("{} {} failed", method, url))?;
    let elapsed_ms = start.elapsed().as_millis() as u64;

    let status = response.status();
    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.contains("application/json"))
        .unwrap_or(false);
    let text = response.text().await?;
    let json = if is_json {
        serde_json::from_str(&text).ok()
    } else {
        None
    };

    Ok(HttpOutcome {
        status,
        elapsed_ms,
        text,
        json,
    })
}

fn expect_status(outcome: &HttpOutcome, expected: u16) -> Result<()> {
    ensure!(
        outcome.status.as_u16() == expected,
        "Expected {}, got {}",
        expected,
        outcome.status.as_u16()
    );
    Ok(())
}

fn expect_fast(outcome: &HttpOutcome, max_latency_ms: u64) -> Result<()> {
    ensure!(
        outcome.elapsed_ms < max_latency_ms,
        "Response too slow: {}ms",
        outcome.elapsed_ms
    );
    Ok(())
}

fn expect_object(outcome: &HttpOutcome) -> Result<&Map<String, Value>> {
    outcome
        .json
        .as_ref()
        .and_then(Value::as_object)
        .ok_or_else(|| anyhow::anyhow!("Expected JSON object body"))
}

/// Runs the fixed test list against one base URL
pub struct ApiSuite<'a> {
    client: &'a Client,
    base_url: String,
    max_latency_ms: u64,
}

impl<'a> ApiSuite<'a> {
    pub fn new(client: &'a Client, config: &ApiConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_latency_ms: config.max_latency_ms,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_post_one(&self) -> Result<Value> {
        let res = http_json(self.client, Method::GET, &self.url("/posts/1"), None).await?;
        expect_status(&res, 200)?;
        expect_fast(&res, self.max_latency_ms)?;
        let post = expect_object(&res)?;
        let id = post.get("id").cloned().unwrap_or(Value::Null);
        ensure!(id.as_f64() == Some(1.0), "Expected id=1, got {}", id);
        ensure!(
            post.get("title").map_or(false, Value::is_string),
            "Expected title as string"
        );
        ensure!(
            post.get("body").map_or(false, Value::is_string),
            "Expected body as string"
        );
        ensure!(
            post.get("userId").map_or(false, Value::is_number),
            "Expected userId as number"
        );
        Ok(json!({
            "status": res.status.as_u16(),
            "elapsedMs": res.elapsed_ms,
            "sample": res.json,
        }))
    }

    async fn create_post(&self) -> Result<Value> {
        let payload = json!({ "title": "qa-assessment", "body": "hello", "userId": 1 });
        let res = http_json(self.client, Method::POST, &self.url("/posts"), Some(&payload)).await?;
        expect_status(&res, 201)?;
        expect_fast(&res, self.max_latency_ms)?;
        let post = expect_object(&res)?;
        ensure!(
            post.get("id").map_or(false, Value::is_number),
            "Expected response to contain numeric id"
        );
        for field in ["title", "body", "userId"] {
            ensure!(
                post.get(field) == payload.get(field),
                "Expected {} echoed back",
                field
            );
        }
        Ok(json!({
            "status": res.status.as_u16(),
            "elapsedMs": res.elapsed_ms,
            "sample": res.json,
        }))
    }

    async fn expect_not_found(&self, path: &str) -> Result<Value> {
        let res = http_json(self.client, Method::GET, &self.url(path), None).await?;
        expect_status(&res, 404)?;
        expect_fast(&res, self.max_latency_ms)?;
        Ok(json!({ "status": res.status.as_u16(), "elapsedMs": res.elapsed_ms }))
    }

    /// Run every test in order and build the report
    pub async fn run(&self) -> TestReport {
        let mut suite = Suite::new("api-testing");

        suite
            .run("GET /posts/1 returns 200 + expected schema", || {
                self.get_post_one()
            })
            .await;
        suite
            .run("POST /posts returns 201 + includes id", || self.create_post())
            .await;
        suite
            .run("GET /this-route-does-not-exist returns 404", || {
                self.expect_not_found("/this-route-does-not-exist")
            })
            .await;
        // non-numeric id
        suite
            .run("GET /posts/abc returns 404", || {
                self.expect_not_found("/posts/abc")
            })
            .await;

        suite.finish(&self.base_url)
    }
}

pub fn build_client() -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .context("Failed to create HTTP client")
}

/// Run the API suite and write its report
pub async fn run(config: &ApiConfig) -> Result<(TestReport, PathBuf)> {
    println!("[api-testing] Running against: {}", config.base_url.cyan());

    let client = build_client()?;
    let report = ApiSuite::new(&client, config).run().await;
    let path = write_timestamped(&report, &config.result_dir, REPORT_PREFIX)?;
    info!("report written to {}", path.display());

    let totals = report.totals();
    if totals.failed > 0 {
        eprintln!(
            "[api-testing] {} ({} failed)",
            "FAIL".red().bold(),
            totals.failed
        );
        eprintln!("[api-testing] Report: {}", path.display());
    } else {
        println!(
            "[api-testing] {} ({}/{})",
            "PASS".green().bold(),
            totals.passed,
            totals.total
        );
        println!("[api-testing] Report: {}", path.display());
    }

    Ok((report, path))
}
