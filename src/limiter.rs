// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Fixed-window rate limiter for contact form submissions.
//!
//! Each client address gets a counter that resets once its window has
//! elapsed. Windows start on the first request from a key, so bursts across
//! a window boundary are possible.

use crate::config::RateLimitConfig;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

/// Result of a rate limit check.
#[derive(Debug, Clone)]
pub enum RateLimitResult {
    /// Request is allowed
    Allowed {
        /// Remaining requests in current window
        remaining: u32,
        /// Time until window resets
        reset_in: Duration,
    },
    /// Request is rate limited
    Limited {
        /// Time until the window resets
        retry_after: Duration,
    },
}

impl RateLimitResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitResult::Allowed { .. })
    }
}

/// Request count within the current window.
#[derive(Debug)]
struct WindowEntry {
    count: u32,
    reset_at: Instant,
}

/// Thread-safe fixed-window rate limiter keyed by client address.
pub struct RateLimiter {
    config: RateLimitConfig,
    windows: Arc<RwLock<HashMap<String, WindowEntry>>>,
}

impl RateLimiter {
    /// Create a new rate limiter with the given configuration.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Count a request from `key` and decide whether it may proceed.
    ///
    /// The lookup, comparison and increment happen under one write lock.
    /// A rejected request does not advance the counter.
    pub async fn check(&self, key: &str) -> RateLimitResult {
        let now = Instant::now();
        let window = self.config.window_duration();
        let max = self.config.max_requests;

        let mut windows = self.windows.write().await;

        if let Some(entry) = windows.get_mut(key) {
            if now <= entry.reset_at {
                let reset_in = entry.reset_at.saturating_duration_since(now);
                if entry.count >= max {
                    debug!(client = %key, count = entry.count, ?reset_in, "Rate limit exceeded");
                    return RateLimitResult::Limited {
                        retry_after: reset_in,
                    };
                }
                entry.count += 1;
                return RateLimitResult::Allowed {
                    remaining: max.saturating_sub(entry.count),
                    reset_in,
                };
            }
        }

        // First request, or the previous window has expired.
        windows.insert(
            key.to_string(),
            WindowEntry {
                count: 1,
                reset_at: now + window,
            },
        );
        RateLimitResult::Allowed {
            remaining: max.saturating_sub(1),
            reset_in: window,
        }
    }

    /// Drop windows that have expired (should be called periodically).
    pub async fn cleanup(&self) -> usize {
        let now = Instant::now();
        let mut windows = self.windows.write().await;
        let before = windows.len();
        windows.retain(|_, entry| now <= entry.reset_at);
        let purged = before - windows.len();
        if purged > 0 {
            debug!(purged, remaining = windows.len(), "Purged expired rate limit windows");
        }
        purged
    }

    /// Number of client addresses currently tracked.
    pub async fn tracked_keys(&self) -> usize {
        self.windows.read().await.len()
    }
}
