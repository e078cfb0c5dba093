//! Mobile UI scenarios for the WebdriverIO native demo app
//!
//! Selector lists are ordered by preference; ids differ between app builds.

use anyhow::{bail, ensure, Result};
use log::{debug, info};
use serde_json::{json, Value};
use std::path::Path;

use super::hooks::{dump_page_source, tap_bottom_nav_index};
use crate::driver::common::swipe_left_points;
use crate::driver::locator::{
    dismiss_ok_if_present, find_first_displayed, tap_first_displayed, PollOptions,
    DISMISS_TIMEOUT_MS,
};
use crate::driver::selector::{
    a11y, desc_contains, desc_exact, edit_text_instance, text_contains, text_exact,
};
use crate::driver::traits::{MobileDriver, Rect};

pub const LOGIN_TITLE: &str = "should open Login screen and attempt login";
pub const FORMS_TITLE: &str = "should interact with form elements";
pub const SWIPE_TITLE: &str = "should navigate to Swipe screen and perform a swipe";

const FORM_TEXT: &str = "Hello QA";
const DROPDOWN_OPTION: &str = "webdriver.io is awesome";

const SWIPE_HOLD_MS: u64 = 200;
const SWIPE_MOVE_MS: u64 = 400;

/// Position of the Swipe tab in the icon-only bottom bar
/// (Home, Webview, Login, Forms, Swipe, Drag)
const SWIPE_NAV_INDEX: u32 = 4;
const NAV_SLOTS: u32 = 6;

/// Open the Login tab and submit the credentials; any result message passes
pub async fn login<D: MobileDriver + ?Sized>(
    driver: &D,
    email: &str,
    password: &str,
) -> Result<Value> {
    dismiss_ok_if_present(driver, DISMISS_TIMEOUT_MS).await;

    tap_first_displayed(
        driver,
        &[
            a11y("Login"),
            text_exact("Login"),
            desc_exact("Login"),
            desc_contains("Login"),
        ],
        PollOptions::with_timeout(30_000),
    )
    .await?;

    // "Login" sub-tab, as opposed to "Sign up", when the screen has one
    if let Err(e) = tap_first_displayed(
        driver,
        &[text_exact("Login"), desc_exact("Login"), desc_contains("Login")],
        PollOptions::with_timeout(5_000),
    )
    .await
    {
        debug!("login sub-tab not tapped: {:#}", e);
    }

    let email_field = find_first_displayed(
        driver,
        &[a11y("input-email"), edit_text_instance(0)],
        PollOptions::default(),
    )
    .await?;
    driver.set_value(&email_field, email).await?;

    let password_field = find_first_displayed(
        driver,
        &[a11y("input-password"), edit_text_instance(1)],
        PollOptions::default(),
    )
    .await?;
    driver.set_value(&password_field, password).await?;

    tap_first_displayed(
        driver,
        &[
            a11y("button-LOGIN"),
            a11y("button-Login"),
            text_exact("LOGIN"),
            text_exact("Login"),
            desc_exact("LOGIN"),
            desc_exact("Login"),
        ],
        PollOptions::with_timeout(30_000),
    )
    .await?;

    let message = find_first_displayed(
        driver,
        &[
            a11y("You are logged in!"),
            text_contains("logged in"),
            text_contains("Logged in"),
            text_contains("Invalid"),
            text_contains("invalid"),
            text_contains("error"),
            text_contains("Error"),
            text_contains("Please"),
        ],
        PollOptions::with_timeout(30_000),
    )
    .await?;
    ensure!(
        driver.is_displayed(&message).await?,
        "Expected login result message to be displayed"
    );
    let text = driver.element_text(&message).await.unwrap_or_default();
    info!("login result: {}", text);

    dismiss_ok_if_present(driver, 5_000).await;

    Ok(json!({ "message": text }))
}

/// Fill the Forms screen; optional controls are exercised only when present
pub async fn forms<D: MobileDriver + ?Sized>(driver: &D) -> Result<Value> {
    dismiss_ok_if_present(driver, DISMISS_TIMEOUT_MS).await;

    tap_first_displayed(driver, &[a11y("Forms")], PollOptions::with_timeout(30_000)).await?;

    let input = find_first_displayed(
        driver,
        &[a11y("text-input")],
        PollOptions::with_timeout(30_000),
    )
    .await?;
    driver.set_value(&input, FORM_TEXT).await?;

    if let Some(result) = driver.find_element(&a11y("input-text-result")).await? {
        let echoed = driver.element_text(&result).await?;
        ensure!(
            echoed.contains(FORM_TEXT),
            "Expected \"{}\" to contain \"{}\"",
            echoed,
            FORM_TEXT
        );
    }

    let mut exercised = Vec::new();

    if let Some(switch) = driver.find_element(&a11y("switch")).await? {
        driver.click(&switch).await?;
        exercised.push("switch");
    }

    if let Some(dropdown) = driver.find_element(&a11y("Dropdown")).await? {
        driver.click(&dropdown).await?;
        exercised.push("dropdown");
        if let Some(option) = driver.find_element(&a11y(DROPDOWN_OPTION)).await? {
            driver.click(&option).await?;
            exercised.push("dropdown-option");
        }
    }

    if let Some(button) = driver.find_element(&a11y("button-Active")).await? {
        driver.click(&button).await?;
        exercised.push("button-Active");
        // some builds confirm with an alert
        dismiss_ok_if_present(driver, 5_000).await;
    }

    Ok(json!({ "text": FORM_TEXT, "exercised": exercised }))
}

/// Open the Swipe screen and swipe its carousel right-to-left
///
/// `artifacts_dir` receives a page-source dump when the tab cannot be found.
pub async fn swipe<D: MobileDriver + ?Sized>(driver: &D, artifacts_dir: &Path) -> Result<Value> {
    dismiss_ok_if_present(driver, DISMISS_TIMEOUT_MS).await;

    let tab = tap_first_displayed(
        driver,
        &[
            a11y("Swipe"),
            text_exact("Swipe"),
            desc_exact("Swipe"),
            text_contains("Swipe"),
            desc_contains("Swipe"),
        ],
        PollOptions::with_timeout(30_000),
    )
    .await;
    if let Err(e) = tab {
        debug!("swipe tab not found: {:#}", e);
        // icon-only bottom bar in some builds
        if let Err(e) = dump_page_source(driver, artifacts_dir, "swipe-tab-not-found").await {
            debug!("page source dump failed: {:#}", e);
        }
        tap_bottom_nav_index(driver, SWIPE_NAV_INDEX, NAV_SLOTS).await?;
    }

    if let Err(e) = find_first_displayed(
        driver,
        &[text_contains("Swipe"), desc_contains("Swipe")],
        PollOptions::with_timeout(10_000),
    )
    .await
    {
        debug!("swipe screen not confirmed: {}", e);
    }

    let Some(screen) = driver.find_element(&a11y("Swipe-screen")).await? else {
        let (width, height) = driver.window_size().await?;
        let area = Rect {
            x: 0.0,
            y: 0.0,
            width: width as f64,
            height: height as f64,
        };
        let (from, to) = swipe_left_points(area);
        driver.swipe(from, to, SWIPE_HOLD_MS, SWIPE_MOVE_MS).await?;
        return Ok(json!({ "target": "window" }));
    };

    let rect = driver.element_rect(&screen).await?;
    let (from, to) = swipe_left_points(rect);

    let before = driver.page_source().await.unwrap_or_default();
    driver.swipe(from, to, SWIPE_HOLD_MS, SWIPE_MOVE_MS).await?;
    let after = driver.page_source().await.unwrap_or_default();

    if !before.is_empty() && !after.is_empty() && before == after {
        bail!("Swipe did not change UI (page source identical before/after).");
    }

    Ok(json!({ "target": "Swipe-screen" }))
}
