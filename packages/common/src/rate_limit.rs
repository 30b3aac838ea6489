use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::info;

/// Outcome of counting one request against a limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { remaining: u32 },
    /// Over the limit; retry once the current window has elapsed.
    Limited { retry_after: Duration },
}

/// Keyed fixed-window request counter.
///
/// Implementations backed by a shared store (e.g. Redis `INCR` + `EXPIRE`)
/// are required when more than one server instance handles requests, since
/// each instance would otherwise count independently.
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Count one request for `key` and decide whether it may proceed.
    async fn hit(&self, key: &str, limit: u32, window: Duration) -> RateDecision;
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Process-local [`RateLimitStore`].
///
/// Only correct for single-instance deployments.
#[derive(Debug, Default)]
pub struct InMemoryRateLimiter {
    windows: DashMap<String, Window>,
}

impl InMemoryRateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    fn hit_at(&self, key: &str, limit: u32, window: Duration, now: Instant) -> RateDecision {
        let mut entry = self.windows.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });

        let elapsed = now.duration_since(entry.started);
        if elapsed >= window {
            *entry = Window {
                started: now,
                count: 0,
            };
        }

        if entry.count >= limit {
            let retry_after = window.saturating_sub(now.duration_since(entry.started));
            return RateDecision::Limited { retry_after };
        }

        entry.count += 1;
        RateDecision::Allowed {
            remaining: limit - entry.count,
        }
    }

    /// Remove windows that started more than `max_age` ago.
    pub fn cleanup_stale(&self, max_age: Duration) {
        let now = Instant::now();
        self.windows
            .retain(|_, w| now.duration_since(w.started) < max_age);
    }

    /// Number of keys currently tracked.
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

#[async_trait]
impl RateLimitStore for InMemoryRateLimiter {
    async fn hit(&self, key: &str, limit: u32, window: Duration) -> RateDecision {
        self.hit_at(key, limit, window, Instant::now())
    }
}

/// Spawn a background task that periodically drops expired windows.
pub fn spawn_cleanup_task(
    limiter: Arc<InMemoryRateLimiter>,
    cleanup_interval: Duration,
    max_age: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(cleanup_interval);

        loop {
            interval.tick().await;
            let before = limiter.len();
            limiter.cleanup_stale(max_age);
            let removed = before.saturating_sub(limiter.len());
            if removed > 0 {
                info!(removed, "Cleaned up expired rate limit windows");
            }
        }
    })
}
