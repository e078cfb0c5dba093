//! Appium HTTP client (W3C WebDriver protocol)
//!
//! Covers the session, element, gesture and app-management endpoints the
//! mobile suite drives.

use anyhow::{Context, Result};
use base64::Engine;
use log::{debug, warn};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::driver::traits::Rect;

/// W3C key under which element references are returned
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// HTTP timeout per request; session creation installs and launches the app
pub const REQUEST_TIMEOUT_SECS: u64 = 180;

/// Extra attempts for session creation after a connection failure
pub const SESSION_RETRIES: u32 = 2;

#[derive(Debug, Error)]
pub enum WebDriverError {
    /// Error payload returned by the server
    #[error("{error}: {message}")]
    Command {
        status: u16,
        error: String,
        message: String,
    },

    #[error("No active Appium session")]
    NoSession,

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("Unexpected response from Appium: {0}")]
    Decode(String),
}

impl WebDriverError {
    pub fn is_no_such_element(&self) -> bool {
        matches!(self, WebDriverError::Command { error, .. } if error == "no such element")
    }

    fn is_connection(&self) -> bool {
        matches!(self, WebDriverError::Http(e) if e.is_connect() || e.is_timeout())
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    value: T,
}

#[derive(Debug, Deserialize)]
struct ErrorValue {
    error: String,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct SessionValue {
    #[serde(rename = "sessionId")]
    session_id: String,
}

#[derive(Debug, Deserialize)]
struct StatusValue {
    #[serde(default)]
    ready: bool,
}

/// Appium client bound to one server and at most one session
pub struct AppiumClient {
    /// Server URL including the base path (e.g. "http://127.0.0.1:4723")
    base_url: String,
    client: reqwest::Client,
    session_id: Option<String>,
}

impl AppiumClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            session_id: None,
        })
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T, WebDriverError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("{} {}", method, url);

        let mut req = self.client.request(method, &url);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let resp = req.send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(match serde_json::from_str::<Envelope<ErrorValue>>(&text) {
                Ok(env) => WebDriverError::Command {
                    status: status.as_u16(),
                    error: env.value.error,
                    message: env.value.message,
                },
                Err(_) => WebDriverError::Command {
                    status: status.as_u16(),
                    error: "unknown error".to_string(),
                    message: text,
                },
            });
        }

        serde_json::from_str::<Envelope<T>>(&text)
            .map(|env| env.value)
            .map_err(|e| WebDriverError::Decode(format!("{} ({})", e, text)))
    }

    fn session_path(&self, suffix: &str) -> Result<String, WebDriverError> {
        let id = self.session_id.as_deref().ok_or(WebDriverError::NoSession)?;
        Ok(format!("/session/{}{}", id, suffix))
    }

    async fn session_cmd<T: DeserializeOwned>(
        &self,
        method: Method,
        suffix: &str,
        body: Option<Value>,
    ) -> Result<T, WebDriverError> {
        let path = self.session_path(suffix)?;
        self.request(method, &path, body).await
    }

    /// Whether the server reports itself ready to create sessions
    pub async fn is_ready(&self) -> bool {
        match self.request::<StatusValue>(Method::GET, "/status", None).await {
            Ok(status) => status.ready,
            Err(e) => {
                debug!("Appium status not ready: {}", e);
                false
            }
        }
    }

    /// Start a session, retrying when the server cannot be reached
    pub async fn create_session(&mut self, capabilities: Map<String, Value>) -> Result<String> {
        let body = json!({
            "capabilities": {
                "alwaysMatch": Value::Object(capabilities),
                "firstMatch": [{}],
            }
        });

        let mut attempt = 0;
        let session = loop {
            match self
                .request::<SessionValue>(Method::POST, "/session", Some(body.clone()))
                .await
            {
                Ok(session) => break session,
                Err(e) if e.is_connection() && attempt < SESSION_RETRIES => {
                    attempt += 1;
                    warn!(
                        "Session request failed ({}), retrying ({}/{})",
                        e, attempt, SESSION_RETRIES
                    );
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
                Err(e) => return Err(e).context("Failed to create Appium session"),
            }
        };

        self.session_id = Some(session.session_id.clone());
        Ok(session.session_id)
    }

    /// End the session; a client without a session is a no-op
    pub async fn delete_session(&mut self) -> Result<()> {
        if self.session_id.is_none() {
            return Ok(());
        }
        let result = self.session_cmd::<Value>(Method::DELETE, "", None).await;
        self.session_id = None;
        result.context("Failed to delete Appium session")?;
        Ok(())
    }

    /// Element id for the first match, `None` when nothing matches
    pub async fn find_element(
        &self,
        using: &str,
        value: &str,
    ) -> Result<Option<String>, WebDriverError> {
        let body = json!({ "using": using, "value": value });
        match self
            .session_cmd::<Map<String, Value>>(Method::POST, "/element", Some(body))
            .await
        {
            Ok(reference) => reference
                .get(ELEMENT_KEY)
                .or_else(|| reference.get("ELEMENT"))
                .and_then(Value::as_str)
                .map(|id| Some(id.to_string()))
                .ok_or_else(|| WebDriverError::Decode(format!("{:?}", reference))),
            Err(e) if e.is_no_such_element() => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn is_displayed(&self, element: &str) -> Result<bool, WebDriverError> {
        self.session_cmd(Method::GET, &format!("/element/{}/displayed", element), None)
            .await
    }

    pub async fn click(&self, element: &str) -> Result<(), WebDriverError> {
        self.session_cmd::<Value>(
            Method::POST,
            &format!("/element/{}/click", element),
            Some(json!({})),
        )
        .await?;
        Ok(())
    }

    pub async fn clear(&self, element: &str) -> Result<(), WebDriverError> {
        self.session_cmd::<Value>(
            Method::POST,
            &format!("/element/{}/clear", element),
            Some(json!({})),
        )
        .await?;
        Ok(())
    }

    pub async fn send_keys(&self, element: &str, text: &str) -> Result<(), WebDriverError> {
        self.session_cmd::<Value>(
            Method::POST,
            &format!("/element/{}/value", element),
            Some(json!({ "text": text })),
        )
        .await?;
        Ok(())
    }

    pub async fn text(&self, element: &str) -> Result<String, WebDriverError> {
        self.session_cmd(Method::GET, &format!("/element/{}/text", element), None)
            .await
    }

    pub async fn rect(&self, element: &str) -> Result<Rect, WebDriverError> {
        let r: RectValue = self
            .session_cmd(Method::GET, &format!("/element/{}/rect", element), None)
            .await?;
        Ok(r.into())
    }

    pub async fn window_rect(&self) -> Result<Rect, WebDriverError> {
        let r: RectValue = self.session_cmd(Method::GET, "/window/rect", None).await?;
        Ok(r.into())
    }

    /// Perform a W3C action sequence, then release all input state
    pub async fn perform_actions(&self, actions: Value) -> Result<(), WebDriverError> {
        self.session_cmd::<Value>(Method::POST, "/actions", Some(actions))
            .await?;
        self.session_cmd::<Value>(Method::DELETE, "/actions", None)
            .await?;
        Ok(())
    }

    pub async fn source(&self) -> Result<String, WebDriverError> {
        self.session_cmd(Method::GET, "/source", None).await
    }

    /// Screenshot as PNG bytes
    pub async fn screenshot(&self) -> Result<Vec<u8>> {
        let encoded: String = self.session_cmd(Method::GET, "/screenshot", None).await?;
        base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .context("Failed to decode screenshot")
    }

    pub async fn screenshot_to_file(&self, path: &Path) -> Result<()> {
        let png = self.screenshot().await?;
        std::fs::write(path, png)
            .with_context(|| format!("Failed to write screenshot {}", path.display()))?;
        Ok(())
    }

    /// Returns whether the app was running
    pub async fn terminate_app(&self, app_id: &str) -> Result<bool, WebDriverError> {
        let value: Value = self
            .session_cmd(
                Method::POST,
                "/appium/device/terminate_app",
                Some(json!({ "appId": app_id })),
            )
            .await?;
        Ok(value.as_bool().unwrap_or(true))
    }

    pub async fn close_app(&self) -> Result<(), WebDriverError> {
        self.session_cmd::<Value>(Method::POST, "/appium/app/close", Some(json!({})))
            .await?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct RectValue {
    #[serde(default)]
    x: f64,
    #[serde(default)]
    y: f64,
    width: f64,
    height: f64,
}

impl From<RectValue> for Rect {
    fn from(r: RectValue) -> Self {
        Rect {
            x: r.x,
            y: r.y,
            width: r.width,
            height: r.height,
        }
    }
}
