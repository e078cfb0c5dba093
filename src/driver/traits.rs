use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;

use super::selector::Selector;

/// Element bounding box as reported by the device
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Minimal capability set the polling locator needs from a UI driver.
///
/// Element handles are opaque to callers; they are only ever passed back into
/// the same driver.
#[async_trait]
pub trait ElementDriver: Send + Sync {
    type Element: Send + Sync;

    /// Resolve a selector to zero-or-one element
    ///
    /// Returns `Ok(None)` when nothing matches. Transport or protocol failures
    /// are returned as errors.
    async fn find_element(&self, selector: &Selector) -> Result<Option<Self::Element>>;

    /// Whether the element is currently displayed
    async fn is_displayed(&self, element: &Self::Element) -> Result<bool>;

    /// Activate (tap/click) the element
    async fn click(&self, element: &Self::Element) -> Result<()>;
}

/// Device session operations used by the mobile suite and its lifecycle hooks
#[async_trait]
pub trait MobileDriver: ElementDriver {
    /// Clear the element and type `text` into it
    async fn set_value(&self, element: &Self::Element, text: &str) -> Result<()>;

    /// Visible text of the element
    async fn element_text(&self, element: &Self::Element) -> Result<String>;

    /// Bounding box of the element
    async fn element_rect(&self, element: &Self::Element) -> Result<Rect>;

    /// Window size as (width, height)
    async fn window_size(&self) -> Result<(u32, u32)>;

    /// Single-finger drag from one point to another
    ///
    /// # Arguments
    /// * `hold_ms` - Pause after touching down before moving
    /// * `move_ms` - Duration of the move
    async fn swipe(&self, from: (i32, i32), to: (i32, i32), hold_ms: u64, move_ms: u64)
        -> Result<()>;

    /// Single tap at a screen coordinate
    async fn tap_point(&self, x: i32, y: i32) -> Result<()>;

    /// Current UI hierarchy as XML
    async fn page_source(&self) -> Result<String>;

    /// Save a PNG screenshot of the device screen
    async fn save_screenshot(&self, path: &Path) -> Result<()>;

    /// Terminate the application with the given package id
    async fn terminate_app(&self, app_id: &str) -> Result<()>;

    /// Close the application under test (fallback for `terminate_app`)
    async fn close_app(&self) -> Result<()>;
}

/// Browser page operations used by the web checkout flow
///
/// Selectors are handed to the automation library unchanged.
#[async_trait]
pub trait BrowserPage: Send + Sync {
    /// Accept every native dialog (alert/confirm/prompt) raised from now on
    async fn accept_dialogs(&self) -> Result<()>;

    /// Navigate and wait for `DOMContentLoaded`
    async fn goto(&self, url: &str) -> Result<()>;

    /// Wait until the selector resolves to a visible element
    async fn wait_for_selector(&self, selector: &str, timeout_ms: u64) -> Result<()>;

    /// Inner text of the first element matching the selector
    async fn inner_text(&self, selector: &str) -> Result<String>;

    /// Click the first element matching the selector
    async fn click(&self, selector: &str) -> Result<()>;

    /// Fill an input matching the selector
    async fn fill(&self, selector: &str, value: &str) -> Result<()>;

    /// Save a screenshot
    async fn screenshot(&self, path: &Path, full_page: bool) -> Result<()>;

    /// Close page, context and browser
    async fn close(&self) -> Result<()>;
}
