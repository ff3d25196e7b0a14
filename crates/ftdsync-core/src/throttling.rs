use std::num::NonZeroU32;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};
use tracing::trace;

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Process-wide request gate: at most `limit` dispatches per rolling `window`.
///
/// Cells are spaced `window / limit` apart with no burst allowance, so no
/// window of that length ever admits more than `limit` requests.
#[derive(Clone)]
pub struct RequestThrottle {
    limiter: Arc<DirectRateLimiter>,
    waiting: Arc<AtomicUsize>,
    limit: u32,
}

impl RequestThrottle {
    pub fn new(window: Duration, limit: u32) -> Self {
        Self {
            limiter: Arc::new(RateLimiter::direct(quota_from_window(window, limit))),
            waiting: Arc::new(AtomicUsize::new(0)),
            limit: limit.max(1),
        }
    }

    pub fn per_second(limit: u32) -> Self {
        Self::new(Duration::from_secs(1), limit)
    }

    /// Waits until the next request may be dispatched.
    pub async fn acquire(&self) {
        if self.limiter.check().is_ok() {
            return;
        }

        let waiting = self.waiting.fetch_add(1, Ordering::Relaxed) + 1;
        trace!(waiting, "request throttled");
        self.limiter.until_ready().await;
        self.waiting.fetch_sub(1, Ordering::Relaxed);
    }

    /// Callers currently parked in [`acquire`](Self::acquire).
    pub fn waiting(&self) -> usize {
        self.waiting.load(Ordering::Relaxed)
    }

    pub const fn limit(&self) -> u32 {
        self.limit
    }
}

fn quota_from_window(window: Duration, limit: u32) -> Quota {
    let safe_limit = NonZeroU32::new(limit.max(1)).unwrap_or(NonZeroU32::MIN);

    let period = (window / safe_limit.get()).max(Duration::from_millis(1));
    Quota::with_period(period)
        .unwrap_or_else(|| Quota::per_second(safe_limit))
        .allow_burst(NonZeroU32::MIN)
}
