//! Scripted in-memory device for mobile runner tests

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Mutex;

use crate::driver::selector::Selector;
use crate::driver::traits::{ElementDriver, MobileDriver, Rect};

#[derive(Debug, Clone)]
pub struct FakeElement {
    pub displayed: bool,
    pub text: String,
    pub rect: Rect,
}

impl FakeElement {
    pub fn visible() -> Self {
        Self {
            displayed: true,
            text: String::new(),
            rect: Rect {
                x: 0.0,
                y: 200.0,
                width: 1000.0,
                height: 800.0,
            },
        }
    }

    pub fn with_text(text: &str) -> Self {
        Self {
            text: text.to_string(),
            ..Self::visible()
        }
    }
}

/// Elements are keyed by the selector's display form
#[derive(Default)]
pub struct FakeDevice {
    pub elements: HashMap<String, FakeElement>,
    /// Successive page sources; the last one repeats
    pub sources: Mutex<VecDeque<String>>,
    pub fail_source: bool,
    pub fail_terminate: bool,
    pub fail_swipe: bool,
    pub calls: Mutex<Vec<String>>,
}

impl FakeDevice {
    pub fn with(mut self, selector: Selector, element: FakeElement) -> Self {
        self.elements.insert(selector.to_string(), element);
        self
    }

    pub fn with_sources(self, sources: &[&str]) -> Self {
        *self.sources.lock().unwrap() = sources.iter().map(|s| s.to_string()).collect();
        self
    }

    fn log(&self, entry: String) {
        self.calls.lock().unwrap().push(entry);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn called(&self, entry: &str) -> bool {
        self.calls().iter().any(|c| c == entry)
    }
}

#[async_trait]
impl ElementDriver for FakeDevice {
    type Element = String;

    async fn find_element(&self, selector: &Selector) -> Result<Option<String>> {
        let key = selector.to_string();
        Ok(self.elements.contains_key(&key).then_some(key))
    }

    async fn is_displayed(&self, element: &String) -> Result<bool> {
        Ok(self.elements.get(element).map_or(false, |e| e.displayed))
    }

    async fn click(&self, element: &String) -> Result<()> {
        self.log(format!("click {}", element));
        Ok(())
    }
}

#[async_trait]
impl MobileDriver for FakeDevice {
    async fn set_value(&self, element: &String, text: &str) -> Result<()> {
        self.log(format!("set {}={}", element, text));
        Ok(())
    }

    async fn element_text(&self, element: &String) -> Result<String> {
        Ok(self
            .elements
            .get(element)
            .map(|e| e.text.clone())
            .unwrap_or_default())
    }

    async fn element_rect(&self, element: &String) -> Result<Rect> {
        Ok(self
            .elements
            .get(element)
            .map(|e| e.rect)
            .unwrap_or_default())
    }

    async fn window_size(&self) -> Result<(u32, u32)> {
        Ok((1080, 2400))
    }

    async fn swipe(
        &self,
        from: (i32, i32),
        to: (i32, i32),
        hold_ms: u64,
        move_ms: u64,
    ) -> Result<()> {
        if self.fail_swipe {
            bail!("swipe rejected");
        }
        self.log(format!(
            "swipe {:?}->{:?} {}/{}",
            from, to, hold_ms, move_ms
        ));
        Ok(())
    }

    async fn tap_point(&self, x: i32, y: i32) -> Result<()> {
        self.log(format!("tap {},{}", x, y));
        Ok(())
    }

    async fn page_source(&self) -> Result<String> {
        if self.fail_source {
            bail!("source unavailable");
        }
        let mut sources = self.sources.lock().unwrap();
        let source = if sources.len() > 1 {
            sources.pop_front()
        } else {
            sources.front().cloned()
        };
        Ok(source.unwrap_or_else(|| "<hierarchy/>".to_string()))
    }

    async fn save_screenshot(&self, path: &Path) -> Result<()> {
        std::fs::write(path, b"png")?;
        self.log("screenshot".to_string());
        Ok(())
    }

    async fn terminate_app(&self, app_id: &str) -> Result<()> {
        if self.fail_terminate {
            bail!("terminate not supported");
        }
        self.log(format!("terminate {}", app_id));
        Ok(())
    }

    async fn close_app(&self) -> Result<()> {
        self.log("close".to_string());
        Ok(())
    }
}
