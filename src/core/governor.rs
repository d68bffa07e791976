//! Fixed-window request governor.
//!
//! Every outbound call awaits [`RateGovernor::admit`]. Once `max_requests`
//! have been admitted inside the current window, callers wait until the
//! window has fully elapsed, then the counter resets. Bursts at window
//! boundaries are accepted, matching the upstream API's own accounting.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

pub const DEFAULT_MAX_REQUESTS: u32 = 500;
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: DEFAULT_MAX_REQUESTS,
            window: DEFAULT_WINDOW,
        }
    }
}

impl RateLimitConfig {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests: max_requests.max(1),
            window,
        }
    }
}

#[derive(Debug)]
struct Window {
    started_at: Instant,
    admitted: u32,
}

/// 共用的限流器，以 `Arc` 傳給每個呼叫端
#[derive(Debug)]
pub struct RateGovernor {
    config: RateLimitConfig,
    window: Mutex<Window>,
}

impl RateGovernor {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            window: Mutex::new(Window {
                started_at: Instant::now(),
                admitted: 0,
            }),
        }
    }

    /// Waits until a request may be sent, then counts it.
    ///
    /// The window lock is held while sleeping so that every other caller
    /// queues behind the one that hit the cap.
    pub async fn admit(&self) {
        let mut window = self.window.lock().await;

        let elapsed = window.started_at.elapsed();
        if elapsed >= self.config.window {
            window.started_at = Instant::now();
            window.admitted = 0;
        } else if window.admitted >= self.config.max_requests {
            let wait = self.config.window - elapsed;
            tracing::info!(
                "⏳ Rate limit of {} requests reached, sleeping for {:.2} seconds",
                self.config.max_requests,
                wait.as_secs_f64()
            );
            tokio::time::sleep(wait).await;
            window.started_at = Instant::now();
            window.admitted = 0;
        }

        window.admitted += 1;
    }

    /// 目前視窗內已放行的請求數
    pub async fn admitted_in_window(&self) -> u32 {
        self.window.lock().await.admitted
    }
}

impl Default for RateGovernor {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_admits_up_to_cap_without_waiting() {
        let governor = RateGovernor::new(RateLimitConfig::new(5, Duration::from_secs(60)));
        let start = Instant::now();

        for _ in 0..5 {
            governor.admit().await;
        }

        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(governor.admitted_in_window().await, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_over_cap_waits_for_window_boundary() {
        let governor = RateGovernor::new(RateLimitConfig::new(500, Duration::from_secs(60)));
        let window_start = Instant::now();

        for _ in 0..500 {
            governor.admit().await;
        }
        assert!(window_start.elapsed() < Duration::from_secs(1));

        governor.admit().await;
        assert!(window_start.elapsed() >= Duration::from_secs(60));
        assert_eq!(governor.admitted_in_window().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_elapsed_window_resets_without_waiting() {
        let governor = RateGovernor::new(RateLimitConfig::new(2, Duration::from_secs(10)));
        governor.admit().await;
        governor.admit().await;

        tokio::time::advance(Duration::from_secs(11)).await;
        let before = Instant::now();
        governor.admit().await;

        assert_eq!(before.elapsed(), Duration::ZERO);
        assert_eq!(governor.admitted_in_window().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_share_one_window() {
        let governor = Arc::new(RateGovernor::new(RateLimitConfig::new(
            3,
            Duration::from_secs(60),
        )));
        let start = Instant::now();

        let handles: Vec<_> = (0..7)
            .map(|_| {
                let governor = Arc::clone(&governor);
                tokio::spawn(async move {
                    governor.admit().await;
                    start.elapsed()
                })
            })
            .collect();

        let mut admitted_at = Vec::new();
        for handle in handles {
            admitted_at.push(handle.await.unwrap());
        }
        admitted_at.sort();

        assert!(admitted_at[..3].iter().all(|t| *t < Duration::from_secs(60)));
        assert!(admitted_at[3..6]
            .iter()
            .all(|t| *t >= Duration::from_secs(60) && *t < Duration::from_secs(120)));
        assert!(admitted_at[6] >= Duration::from_secs(120));
    }

    #[test]
    fn test_config_clamps_zero_cap() {
        let config = RateLimitConfig::new(0, Duration::from_secs(1));
        assert_eq!(config.max_requests, 1);
        assert_eq!(RateLimitConfig::default().max_requests, 500);
    }
}
