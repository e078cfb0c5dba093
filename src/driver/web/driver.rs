//! Browser page backed by Playwright
//!
//! One Chromium browser, one context and one page per checkout run.

use anyhow::{Context, Result};
use async_trait::async_trait;
use colored::Colorize;
use playwright::api::{Browser, BrowserContext, DocumentLoadState, Page};
use playwright::Playwright;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::driver::traits::BrowserPage;

/// Replaces the native dialogs with accepting stubs on every document
const ACCEPT_DIALOGS_SCRIPT: &str = r#"
(() => {
  window.alert = () => {};
  window.confirm = () => true;
  window.prompt = (_message, value) => (value === undefined ? '' : value);
})();
"#;

pub struct PlaywrightPage {
    // keeps the driver process alive for the lifetime of the page
    _playwright: Playwright,
    browser: Browser,
    context: BrowserContext,
    page: Mutex<Page>,
}

impl PlaywrightPage {
    /// Launch Chromium and open a fresh page
    pub async fn launch(headless: bool) -> Result<Self> {
        let playwright = Playwright::initialize()
            .await
            .context("Failed to initialize Playwright")?;

        let browser = launch_chromium_browser(&playwright, headless).await?;
        let context = browser.context_builder().build().await?;
        let page = context.new_page().await?;

        Ok(Self {
            _playwright: playwright,
            browser,
            context,
            page: Mutex::new(page),
        })
    }
}

#[async_trait]
impl BrowserPage for PlaywrightPage {
    async fn accept_dialogs(&self) -> Result<()> {
        // context-level so documents opened later are covered as well
        self.context
            .add_init_script(ACCEPT_DIALOGS_SCRIPT)
            .await
            .context("Failed to install dialog handler")?;
        Ok(())
    }

    async fn goto(&self, url: &str) -> Result<()> {
        let page = self.page.lock().await;
        page.goto_builder(url)
            .wait_until(DocumentLoadState::DomContentLoaded)
            .goto()
            .await
            .context("Failed to navigate to URL")?;
        Ok(())
    }

    async fn wait_for_selector(&self, selector: &str, timeout_ms: u64) -> Result<()> {
        let page = self.page.lock().await;
        page.wait_for_selector_builder(selector)
            .timeout(timeout_ms as f64)
            .wait_for_selector()
            .await
            .with_context(|| format!("Timed out after {}ms waiting for {}", timeout_ms, selector))?;
        Ok(())
    }

    async fn inner_text(&self, selector: &str) -> Result<String> {
        let page = self.page.lock().await;
        let element = page
            .query_selector(selector)
            .await?
            .with_context(|| format!("No element matches {}", selector))?;
        Ok(element.inner_text().await?)
    }

    async fn click(&self, selector: &str) -> Result<()> {
        let page = self.page.lock().await;
        page.click_builder(selector)
            .click()
            .await
            .with_context(|| format!("Failed to click {}", selector))?;
        Ok(())
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<()> {
        let page = self.page.lock().await;
        page.fill_builder(selector, value)
            .fill()
            .await
            .with_context(|| format!("Failed to fill {}", selector))?;
        Ok(())
    }

    async fn screenshot(&self, path: &Path, full_page: bool) -> Result<()> {
        let page = self.page.lock().await;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        page.screenshot_builder()
            .full_page(full_page)
            .path(path.to_path_buf())
            .screenshot()
            .await?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        {
            let page = self.page.lock().await;
            page.close(None).await?;
        }
        self.context.close().await?;
        self.browser.close().await?;
        Ok(())
    }
}

/// Launch Chromium, preferring an explicitly configured or installed browser
async fn launch_chromium_browser(playwright: &Playwright, headless: bool) -> Result<Browser> {
    let chromium = playwright.chromium();
    let mut launcher = chromium.launcher().headless(headless);

    let env_path = std::env::var("PLAYWRIGHT_CHROMIUM_EXECUTABLE_PATH")
        .ok()
        .map(PathBuf::from);

    let executable = env_path.or_else(find_system_browser);
    match executable {
        Some(ref path) => {
            println!("{} Using browser: {}", "🌐".blue(), path.display());
            launcher = launcher.executable(path);
        }
        None => {
            println!(
                "{} No browser executable found. Attempting default launch...",
                "ℹ".blue()
            );
        }
    }

    let args: Vec<String> = [
        "--no-sandbox",
        "--disable-setuid-sandbox",
        "--disable-dev-shm-usage",
        "--disable-gpu",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    launcher = launcher.args(&args);

    launcher
        .launch()
        .await
        .context("Failed to launch Chromium")
}

fn find_system_browser() -> Option<PathBuf> {
    let common_paths = [
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
    ];

    common_paths
        .iter()
        .map(Path::new)
        .find(|p| p.exists())
        .map(Path::to_path_buf)
}
