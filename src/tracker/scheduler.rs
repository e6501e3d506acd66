//! Tick scheduling and loop-instance generations.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval, Interval, MissedTickBehavior};

/// Process-wide generation counter for loop instances.
///
/// Advancing the counter invalidates every outstanding token, which is how
/// supersession is implemented: a tick holding a stale token becomes a
/// no-op instead of delivering to the host.
pub struct GenerationCounter {
    current: Arc<AtomicU64>,
}

impl GenerationCounter {
    pub fn new() -> Self {
        Self {
            current: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Invalidate all outstanding tokens and stamp a new one.
    pub fn advance(&self) -> GenerationToken {
        let stamp = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        GenerationToken {
            current: Arc::clone(&self.current),
            stamp,
        }
    }
}

impl Default for GenerationCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// A stamp tying work to one loop instance.
#[derive(Clone)]
pub struct GenerationToken {
    current: Arc<AtomicU64>,
    stamp: u64,
}

impl GenerationToken {
    /// Whether this token's loop instance is still the live one.
    pub fn is_current(&self) -> bool {
        self.current.load(Ordering::SeqCst) == self.stamp
    }
}

/// Repeating tick source for the detection loop.
///
/// Backed by a tokio interval at the configured cadence, the crate's
/// stand-in for the host's frame-presentation pacing. Missed ticks are
/// skipped rather than bursted, so a slow tick never causes a backlog.
pub struct TickScheduler {
    interval: Interval,
}

impl TickScheduler {
    pub fn new(tick_hz: u32) -> Self {
        let period = Duration::from_secs_f64(1.0 / f64::from(tick_hz.max(1)));
        let mut interval = interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self { interval }
    }

    /// Wait for the next tick.
    pub async fn tick(&mut self) {
        self.interval.tick().await;
    }
}
