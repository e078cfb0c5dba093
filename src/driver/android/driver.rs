use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::path::Path;

use super::appium::AppiumClient;
use crate::driver::selector::Selector;
use crate::driver::traits::{ElementDriver, MobileDriver, Rect};

/// Press duration for a single tap
const TAP_HOLD_MS: u64 = 80;

/// Touch pointer action sequence: press at `from`, hold, move to `to`, release
pub fn swipe_actions(from: (i32, i32), to: (i32, i32), hold_ms: u64, move_ms: u64) -> Value {
    json!({
        "actions": [{
            "type": "pointer",
            "id": "finger1",
            "parameters": { "pointerType": "touch" },
            "actions": [
                { "type": "pointerMove", "duration": 0, "origin": "viewport", "x": from.0, "y": from.1 },
                { "type": "pointerDown", "button": 0 },
                { "type": "pause", "duration": hold_ms },
                { "type": "pointerMove", "duration": move_ms, "origin": "viewport", "x": to.0, "y": to.1 },
                { "type": "pointerUp", "button": 0 },
            ],
        }]
    })
}

/// Touch pointer action sequence for a single tap
pub fn tap_actions(x: i32, y: i32) -> Value {
    json!({
        "actions": [{
            "type": "pointer",
            "id": "finger1",
            "parameters": { "pointerType": "touch" },
            "actions": [
                { "type": "pointerMove", "duration": 0, "origin": "viewport", "x": x, "y": y },
                { "type": "pointerDown", "button": 0 },
                { "type": "pause", "duration": TAP_HOLD_MS },
                { "type": "pointerUp", "button": 0 },
            ],
        }]
    })
}

/// Android device driven through an Appium UiAutomator2 session
pub struct AndroidDriver {
    client: AppiumClient,
}

impl AndroidDriver {
    /// Create a session on the server at `base_url`
    pub async fn start(base_url: &str, capabilities: Map<String, Value>) -> Result<Self> {
        let mut client = AppiumClient::new(base_url)?;
        let session_id = client.create_session(capabilities).await?;
        log::info!("Appium session {} started", session_id);
        Ok(Self { client })
    }

    /// Delete the Appium session
    pub async fn end_session(&mut self) -> Result<()> {
        self.client.delete_session().await
    }
}

#[async_trait]
impl ElementDriver for AndroidDriver {
    type Element = String;

    async fn find_element(&self, selector: &Selector) -> Result<Option<String>> {
        let (using, value) = selector.strategy();
        self.client
            .find_element(using, value)
            .await
            .with_context(|| format!("Lookup failed for {}", selector))
    }

    async fn is_displayed(&self, element: &String) -> Result<bool> {
        Ok(self.client.is_displayed(element).await?)
    }

    async fn click(&self, element: &String) -> Result<()> {
        Ok(self.client.click(element).await?)
    }
}

#[async_trait]
impl MobileDriver for AndroidDriver {
    async fn set_value(&self, element: &String, text: &str) -> Result<()> {
        self.client.clear(element).await?;
        self.client.send_keys(element, text).await?;
        Ok(())
    }

    async fn element_text(&self, element: &String) -> Result<String> {
        Ok(self.client.text(element).await?)
    }

    async fn element_rect(&self, element: &String) -> Result<Rect> {
        Ok(self.client.rect(element).await?)
    }

    async fn window_size(&self) -> Result<(u32, u32)> {
        let rect = self.client.window_rect().await?;
        Ok((rect.width as u32, rect.height as u32))
    }

    async fn swipe(
        &self,
        from: (i32, i32),
        to: (i32, i32),
        hold_ms: u64,
        move_ms: u64,
    ) -> Result<()> {
        self.client
            .perform_actions(swipe_actions(from, to, hold_ms, move_ms))
            .await
            .context("Swipe failed")?;
        Ok(())
    }

    async fn tap_point(&self, x: i32, y: i32) -> Result<()> {
        self.client
            .perform_actions(tap_actions(x, y))
            .await
            .with_context(|| format!("Tap at ({}, {}) failed", x, y))?;
        Ok(())
    }

    async fn page_source(&self) -> Result<String> {
        Ok(self.client.source().await?)
    }

    async fn save_screenshot(&self, path: &Path) -> Result<()> {
        self.client.screenshot_to_file(path).await
    }

    async fn terminate_app(&self, app_id: &str) -> Result<()> {
        self.client.terminate_app(app_id).await?;
        Ok(())
    }

    async fn close_app(&self) -> Result<()> {
        Ok(self.client.close_app().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swipe_actions_shape() {
        let value = swipe_actions((864, 1200), (216, 1200), 150, 450);
        let steps = value["actions"][0]["actions"].as_array().unwrap();
        let kinds: Vec<_> = steps.iter().map(|s| s["type"].as_str().unwrap()).collect();
        assert_eq!(
            kinds,
            vec!["pointerMove", "pointerDown", "pause", "pointerMove", "pointerUp"]
        );
        assert_eq!(steps[0]["x"], 864);
        assert_eq!(steps[2]["duration"], 150);
        assert_eq!(steps[3]["duration"], 450);
        assert_eq!(steps[3]["x"], 216);
        assert_eq!(value["actions"][0]["parameters"]["pointerType"], "touch");
    }

    #[test]
    fn test_tap_actions_stay_in_place() {
        let value = tap_actions(540, 2256);
        let steps = value["actions"][0]["actions"].as_array().unwrap();
        assert_eq!(steps.len(), 4);
        assert_eq!((steps[0]["x"].clone(), steps[0]["y"].clone()), (json!(540), json!(2256)));
        assert_eq!(steps[3]["type"], "pointerUp");
    }
}
