use std::{sync::Arc, time::Duration};

use dashmap::DashMap;
use tokio::time::{Instant, sleep};

/// Host-keyed throttle for keyless ("community") explorer access.
///
/// Entries map a host name to the instant its last request finished. They live as long as the
/// limiter and are never evicted or reset. Clones share the same map, so every explorer source
/// handed a clone of one limiter shares backpressure per host, regardless of chain or instance.
///
/// This is a best-effort throttle: two callers that compute their wait before either records a
/// request can still fire close together.
#[derive(Clone, Debug)]
pub struct ExplorerRateLimiter {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    window: Duration,
    last_queried: DashMap<String, Instant>,
}

impl ExplorerRateLimiter {
    /// Creates a limiter that spaces requests to one host at least `window` apart.
    pub fn new(window: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                window,
                last_queried: DashMap::new(),
            }),
        }
    }

    /// Time left before `host` may be queried again.
    pub fn wait_time(&self, host: &str) -> Duration {
        let Some(last) = self.inner.last_queried.get(host).map(|entry| *entry) else {
            return Duration::ZERO;
        };
        self.inner.window.saturating_sub(last.elapsed())
    }

    /// Suspends until `host` is outside its throttle window. Returns the time waited.
    pub async fn await_turn(&self, host: &str) -> Duration {
        let wait = self.wait_time(host);
        if !wait.is_zero() {
            tracing::debug!(
                host,
                wait_ms = wait.as_millis() as u64,
                "Throttling keyless explorer request"
            );
            scout_observability::record_explorer_throttle_wait(host, wait);
            sleep(wait).await;
        }
        wait
    }

    /// Records that a request to `host` just completed.
    pub fn mark_queried(&self, host: &str) {
        self.inner
            .last_queried
            .insert(host.to_string(), Instant::now());
    }

    /// Waits for `host`'s turn and returns a guard that records the query when dropped.
    ///
    /// The guard marks the host whether the request succeeded, failed or was abandoned, so a
    /// failing request still consumes its slot.
    pub async fn acquire<'a>(&'a self, host: &'a str) -> ThrottleTurn<'a> {
        self.await_turn(host).await;
        ThrottleTurn {
            limiter: self,
            host,
        }
    }

    /// Number of hosts queried at least once.
    pub fn tracked_hosts(&self) -> usize {
        self.inner.last_queried.len()
    }
}

#[must_use = "the host is marked as queried when the turn is dropped"]
pub struct ThrottleTurn<'a> {
    limiter: &'a ExplorerRateLimiter,
    host: &'a str,
}

impl Drop for ThrottleTurn<'_> {
    fn drop(&mut self) {
        self.limiter.mark_queried(self.host);
    }
}
