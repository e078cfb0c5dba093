//! Web checkout flow: home → product → cart → order → confirmation

use anyhow::{bail, Context, Result};
use colored::Colorize;
use log::{info, warn};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use crate::driver::traits::BrowserPage;
use crate::driver::web::PlaywrightPage;
use crate::utils::artifacts::{ensure_dir, relative_to_cwd};
use crate::utils::config::WebConfig;

const FIRST_PRODUCT_LINK: &str = "#tbodyid .card-title a";
const PRODUCT_NAME: &str = ".name";
const ADD_TO_CART: &str = "a:has-text('Add to cart')";
const CART_LINK: &str = "#cartur";
const CART_ROWS: &str = "#tbodyid tr";
const CART_BODY: &str = "#tbodyid";
const PLACE_ORDER: &str = "button:has-text('Place Order')";
const ORDER_MODAL: &str = "#orderModal .modal-body";
const PURCHASE: &str = "#orderModal button:has-text('Purchase')";
const CONFIRMATION: &str = ".sweet-alert.showSweetAlert.visible";
const CONFIRM_OK: &str = "button.confirm:has-text('OK')";

const ADD_TO_CART_SETTLE_MS: u64 = 1_500;

/// Order form values, in fill order
const ORDER_FORM: [(&str, &str); 6] = [
    ("#name", "QA Candidate"),
    ("#country", "Indonesia"),
    ("#city", "Jakarta"),
    ("#card", "4111111111111111"),
    ("#month", "01"),
    ("#year", "2030"),
];

fn order_id_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)Id:\s*(\d+)").expect("static regex"))
}

/// Order id from the purchase confirmation text, e.g. `"Id: 12345\nAmount: 790 USD"`
pub fn extract_order_id(text: &str) -> Option<String> {
    order_id_pattern()
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Artifacts of a completed checkout
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutOutcome {
    pub order_id: String,
    pub product: String,
    pub screenshot: PathBuf,
    pub order_file: PathBuf,
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Write `order-id.txt` with the order id, product name and screenshot path
pub fn write_order_file(
    dir: &Path,
    order_id: &str,
    product: &str,
    screenshot: &Path,
) -> Result<PathBuf> {
    ensure_dir(dir)?;
    let path = dir.join("order-id.txt");
    let contents = format!(
        "Order ID: {}\nProduct: {}\nScreenshot: {}\n",
        order_id,
        product,
        relative_to_cwd(screenshot).display()
    );
    std::fs::write(&path, contents)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

async fn checkout_steps(page: &dyn BrowserPage, config: &WebConfig) -> Result<CheckoutOutcome> {
    let wait = config.wait_timeout_ms;

    page.accept_dialogs().await?;
    page.goto(&config.base_url)
        .await
        .with_context(|| format!("Failed to open {}", config.base_url))?;

    page.wait_for_selector(FIRST_PRODUCT_LINK, wait).await?;
    let listed = page.inner_text(FIRST_PRODUCT_LINK).await?.trim().to_string();
    info!("first product: {}", listed);
    page.click(FIRST_PRODUCT_LINK).await?;

    page.wait_for_selector(PRODUCT_NAME, wait).await?;
    let detail = page.inner_text(PRODUCT_NAME).await?.trim().to_string();
    if !contains_ignore_case(&detail, &listed) {
        bail!(
            "Product detail mismatch. Home=\"{}\" Detail=\"{}\"",
            listed,
            detail
        );
    }

    page.click(ADD_TO_CART).await?;
    // add-to-cart is async on the page; the alert is accepted meanwhile
    tokio::time::sleep(Duration::from_millis(ADD_TO_CART_SETTLE_MS)).await;

    page.click(CART_LINK).await?;
    page.wait_for_selector(CART_ROWS, wait).await?;
    let cart = page.inner_text(CART_BODY).await?;
    if !contains_ignore_case(&cart, &listed) {
        bail!("Expected product \"{}\" in cart, but not found.", listed);
    }

    page.click(PLACE_ORDER).await?;
    page.wait_for_selector(ORDER_MODAL, wait).await?;
    for (selector, value) in ORDER_FORM {
        page.fill(selector, value).await?;
    }
    page.click(PURCHASE).await?;

    page.wait_for_selector(CONFIRMATION, wait).await?;
    let confirmation = page.inner_text(CONFIRMATION).await?;
    let order_id = match extract_order_id(&confirmation) {
        Some(id) => id,
        None => bail!("Order ID not found in confirmation text:\n{}", confirmation),
    };

    ensure_dir(&config.screenshots_dir)?;
    let screenshot = config
        .screenshots_dir
        .join(format!("order-confirmation-{}.png", order_id));
    page.screenshot(&screenshot, true).await?;

    let order_file = write_order_file(&config.artifacts_dir, &order_id, &detail, &screenshot)?;

    page.click(CONFIRM_OK).await?;

    Ok(CheckoutOutcome {
        order_id,
        product: detail,
        screenshot,
        order_file,
    })
}

/// Drive the checkout on `page`; the page is closed whatever the outcome
pub async fn run_checkout(page: &dyn BrowserPage, config: &WebConfig) -> Result<CheckoutOutcome> {
    let outcome = checkout_steps(page, config).await;
    if let Err(e) = page.close().await {
        warn!("Failed to close browser: {:#}", e);
    }
    outcome
}

/// Launch a browser and run the checkout against it
pub async fn run(config: &WebConfig) -> Result<CheckoutOutcome> {
    println!("[web-testing] Running against: {}", config.base_url.cyan());
    let page = PlaywrightPage::launch(config.headless).await?;
    let outcome = run_checkout(&page, config).await?;

    println!("[web-testing] {} Order ID: {}", "✓".green(), outcome.order_id);
    println!(
        "[web-testing] Screenshot: {}",
        relative_to_cwd(&outcome.screenshot).display()
    );
    println!(
        "[web-testing] Saved: {}",
        relative_to_cwd(&outcome.order_file).display()
    );
    Ok(outcome)
}
