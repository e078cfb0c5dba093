//! Polling element locator
//!
//! Tolerates UI variability across app versions by trying an ordered list of
//! alternative selectors until one resolves to a displayed element.

use log::debug;
use thiserror::Error;
use tokio::time::{sleep, Duration, Instant};

use super::selector::{a11y, desc_contains, desc_exact, text_exact, Selector};
use super::traits::ElementDriver;

pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_INTERVAL_MS: u64 = 500;

pub const DISMISS_TIMEOUT_MS: u64 = 1_500;
const DISMISS_INTERVAL_MS: u64 = 150;

#[derive(Debug, Error)]
pub enum LocatorError {
    #[error("No selectors given")]
    NoSelectors,

    #[error("{}", not_found_message(.timeout_ms, .selectors, .last_error))]
    NotFound {
        timeout_ms: u64,
        selectors: Vec<String>,
        last_error: Option<String>,
    },
}

fn not_found_message(timeout_ms: &u64, selectors: &[String], last_error: &Option<String>) -> String {
    let hint = selectors
        .iter()
        .map(|s| format!("- {}", s))
        .collect::<Vec<_>>()
        .join("\n");
    let mut msg = format!(
        "Element not found/displayed within {}ms. Tried selectors:\n{}",
        timeout_ms, hint
    );
    if let Some(err) = last_error {
        msg.push_str(&format!("\nLast error: {}", err));
    }
    msg
}

/// Timeout and poll interval for a locator call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    pub timeout_ms: u64,
    pub interval_ms: u64,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            interval_ms: DEFAULT_INTERVAL_MS,
        }
    }
}

impl PollOptions {
    pub fn with_timeout(timeout_ms: u64) -> Self {
        Self {
            timeout_ms,
            ..Self::default()
        }
    }
}

/// Outcome of a single pass over the candidate list
enum Probe<E> {
    Matched(E),
    Missed,
}

/// Try every selector once, in order
async fn probe_once<D: ElementDriver + ?Sized>(
    driver: &D,
    selectors: &[Selector],
    last_error: &mut Option<String>,
) -> Probe<D::Element> {
    for sel in selectors {
        match driver.find_element(sel).await {
            Ok(Some(el)) => match driver.is_displayed(&el).await {
                Ok(true) => return Probe::Matched(el),
                Ok(false) => {}
                Err(e) => {
                    debug!("visibility check failed for {}: {:#}", sel, e);
                    *last_error = Some(format!("{:#}", e));
                }
            },
            Ok(None) => {}
            Err(e) => {
                debug!("lookup failed for {}: {:#}", sel, e);
                *last_error = Some(format!("{:#}", e));
            }
        }
    }
    Probe::Missed
}

/// Find the first selector (in list order) that resolves to a displayed element
///
/// At least one full pass is made even with a zero timeout. Lookup errors are
/// treated as "try the next selector" and only surface in the `NotFound`
/// message.
pub async fn find_first_displayed<D: ElementDriver + ?Sized>(
    driver: &D,
    selectors: &[Selector],
    opts: PollOptions,
) -> Result<D::Element, LocatorError> {
    if selectors.is_empty() {
        return Err(LocatorError::NoSelectors);
    }

    let deadline = Instant::now() + Duration::from_millis(opts.timeout_ms);
    let mut last_error = None;

    loop {
        if let Probe::Matched(el) = probe_once(driver, selectors, &mut last_error).await {
            return Ok(el);
        }
        if Instant::now() >= deadline {
            break;
        }
        sleep(Duration::from_millis(opts.interval_ms)).await;
    }

    Err(LocatorError::NotFound {
        timeout_ms: opts.timeout_ms,
        selectors: selectors.iter().map(|s| s.to_string()).collect(),
        last_error,
    })
}

/// Locate via [`find_first_displayed`] and tap the result
pub async fn tap_first_displayed<D: ElementDriver + ?Sized>(
    driver: &D,
    selectors: &[Selector],
    opts: PollOptions,
) -> anyhow::Result<D::Element> {
    let el = find_first_displayed(driver, selectors, opts).await?;
    driver.click(&el).await?;
    Ok(el)
}

/// Affirmative buttons of common alert dialogs
pub fn ok_button_selectors() -> Vec<Selector> {
    vec![
        a11y("OK"),
        a11y("Ok"),
        text_exact("OK"),
        text_exact("Ok"),
        text_exact("Okay"),
        desc_exact("OK"),
        desc_exact("Ok"),
        desc_contains("OK"),
        desc_contains("Ok"),
    ]
}

/// Best-effort dismissal of an optional "OK" dialog
///
/// Returns `true` iff a button was tapped. Never fails.
pub async fn dismiss_ok_if_present<D: ElementDriver + ?Sized>(driver: &D, timeout_ms: u64) -> bool {
    let selectors = ok_button_selectors();
    let deadline = Instant::now() + Duration::from_millis(timeout_ms);
    let mut last_error = None;

    loop {
        if let Probe::Matched(el) = probe_once(driver, &selectors, &mut last_error).await {
            match driver.click(&el).await {
                Ok(()) => return true,
                Err(e) => debug!("dismiss tap failed: {:#}", e),
            }
        }
        if Instant::now() >= deadline {
            return false;
        }
        sleep(Duration::from_millis(DISMISS_INTERVAL_MS)).await;
    }
}
