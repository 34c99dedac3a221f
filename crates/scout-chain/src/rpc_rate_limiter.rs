use std::{fmt, num::NonZeroU32, time::Duration};

use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use tokio::time::Instant;

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Requests-per-second cap for one JSON-RPC endpoint, backed by `governor`.
///
/// Zero or absent means unlimited. The quota allows a burst of one second's worth of calls.
pub(crate) struct RpcRateLimiter {
    limiter: Option<(NonZeroU32, DirectLimiter)>,
}

impl RpcRateLimiter {
    pub(crate) fn new(requests_per_second: Option<u32>) -> Self {
        let limiter = requests_per_second
            .and_then(NonZeroU32::new)
            .map(|rps| (rps, RateLimiter::direct(Quota::per_second(rps).allow_burst(rps))));
        Self { limiter }
    }

    pub(crate) fn is_limited(&self) -> bool {
        self.limiter.is_some()
    }

    /// Waits for a free slot and returns how long that took.
    pub(crate) async fn acquire(&self, endpoint: &str) -> Duration {
        let Some((rps, limiter)) = &self.limiter else {
            return Duration::ZERO;
        };
        let started = Instant::now();
        limiter.until_ready().await;
        let waited = started.elapsed();
        if !waited.is_zero() {
            tracing::trace!(
                endpoint,
                requests_per_second = rps.get(),
                waited_ms = waited.as_millis() as u64,
                "RPC call held back by rate limit"
            );
        }
        waited
    }
}

impl fmt::Debug for RpcRateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RpcRateLimiter")
            .field(
                "requests_per_second",
                &self.limiter.as_ref().map(|(rps, _)| rps.get()),
            )
            .finish()
    }
}
