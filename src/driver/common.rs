//! Common utilities shared across drivers
//!
//! Polling with backoff and the screen geometry used by touch gestures.

use std::future::Future;
use tokio::time::{Duration, Instant};

use super::traits::Rect;

// ============================================================================
// Polling Utilities
// ============================================================================

/// Configuration for polling operations
#[derive(Clone)]
pub struct PollConfig {
    pub timeout_ms: u64,
    pub initial_interval_ms: u64,
    pub max_interval_ms: u64,
    pub use_exponential_backoff: bool,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 10000,
            initial_interval_ms: 100,
            max_interval_ms: 500,
            use_exponential_backoff: true,
        }
    }
}

/// Generic polling function with optional exponential backoff
///
/// Calls `check_fn` repeatedly until it returns `true` or timeout is reached.
/// Returns `true` if condition was met, `false` if timed out.
pub async fn wait_until<F, Fut>(check_fn: F, config: PollConfig) -> bool
where
    F: Fn() -> Fut,
    Fut: Future<Output = bool>,
{
    let start = Instant::now();
    let timeout = Duration::from_millis(config.timeout_ms);
    let mut interval = config.initial_interval_ms;

    while start.elapsed() < timeout {
        if check_fn().await {
            return true;
        }

        tokio::time::sleep(Duration::from_millis(interval)).await;

        if config.use_exponential_backoff {
            interval = (interval * 3 / 2).min(config.max_interval_ms);
        }
    }

    false
}

// ============================================================================
// Gesture Geometry
// ============================================================================

/// Vertical swipe from 85% to 25% of the screen height at the horizontal center
pub fn swipe_up_points(width: u32, height: u32) -> ((i32, i32), (i32, i32)) {
    let x = (width as f64 * 0.5).floor() as i32;
    let start_y = (height as f64 * 0.85).floor() as i32;
    let end_y = (height as f64 * 0.25).floor() as i32;
    ((x, start_y), (x, end_y))
}

/// Right-to-left swipe across a region, from 80% to 20% of its width at mid height
pub fn swipe_left_points(area: Rect) -> ((i32, i32), (i32, i32)) {
    let start_x = (area.x + area.width * 0.8).floor() as i32;
    let end_x = (area.x + area.width * 0.2).floor() as i32;
    let y = (area.y + area.height * 0.5).floor() as i32;
    ((start_x, y), (end_x, y))
}

/// Center of bottom navigation slot `index` out of `total`, at 94% of the height
pub fn bottom_nav_point(index: u32, total: u32, width: u32, height: u32) -> (i32, i32) {
    let total = total.max(1);
    let x = ((width as f64 * (index as f64 + 0.5)) / total as f64).floor() as i32;
    let y = (height as f64 * 0.94).floor() as i32;
    (x, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_swipe_up_points() {
        assert_eq!(swipe_up_points(1080, 1920), ((540, 1632), (540, 480)));
    }

    #[test]
    fn test_swipe_left_points_respect_offset() {
        let area = Rect {
            x: 100.0,
            y: 200.0,
            width: 1000.0,
            height: 400.0,
        };
        assert_eq!(swipe_left_points(area), ((900, 400), (300, 400)));
    }

    #[test]
    fn test_bottom_nav_point() {
        assert_eq!(bottom_nav_point(4, 6, 1200, 2000), (900, 1880));
        assert_eq!(bottom_nav_point(0, 0, 100, 100), (50, 94));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_until_stops_on_success() {
        let calls = AtomicU32::new(0);
        let ok = wait_until(
            || async { calls.fetch_add(1, Ordering::SeqCst) >= 2 },
            PollConfig::default(),
        )
        .await;
        assert!(ok);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_until_times_out() {
        let config = PollConfig {
            timeout_ms: 1000,
            ..PollConfig::default()
        };
        assert!(!wait_until(|| async { false }, config).await);
    }
}
