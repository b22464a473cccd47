//! Injectable time source.
//!
//! The executor's breaker cooldowns, cache TTLs and backoff scheduling all
//! read "now" through this trait rather than calling `Instant::now()` or
//! `Utc::now()` directly, so tests can advance time deterministically
//! instead of sleeping for real.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

/// A source of the current time, abstracted so tests can fake it.
pub trait Clock: Send + Sync {
    /// A monotonic instant, used for breaker cooldowns and TTL math.
    fn now(&self) -> Instant;

    /// A wall-clock timestamp, used for Provenance and event timestamps.
    fn now_utc(&self) -> DateTime<Utc>;
}

/// The real system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A fake clock for tests: starts at a fixed instant and only moves when
/// told to via [`FakeClock::advance`].
pub struct FakeClock {
    epoch: Instant,
    epoch_utc: DateTime<Utc>,
    offset_ms: AtomicI64,
}

impl FakeClock {
    /// Create a fake clock anchored at the given UTC instant.
    pub fn new(epoch_utc: DateTime<Utc>) -> Self {
        Self {
            epoch: Instant::now(),
            epoch_utc,
            offset_ms: AtomicI64::new(0),
        }
    }

    /// Advance the fake clock by `duration`.
    pub fn advance(&self, duration: Duration) {
        self.offset_ms
            .fetch_add(duration.as_millis() as i64, Ordering::SeqCst);
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.epoch + Duration::from_millis(self.offset_ms.load(Ordering::SeqCst) as u64)
    }

    fn now_utc(&self) -> DateTime<Utc> {
        self.epoch_utc + chrono::Duration::milliseconds(self.offset_ms.load(Ordering::SeqCst))
    }
}
