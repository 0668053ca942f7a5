use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Monotonic millisecond clock for operation timestamps.
///
/// Timestamps are informational: the server's append order is the only
/// ordering that affects chain resolution. The clock still never repeats and
/// never runs backwards within one client, so timestamps stay usable for
/// diagnostics. When the wall clock stalls or jumps back, the clock advances
/// by one millisecond per tick instead.
#[derive(Debug, Default)]
pub struct WriteClock {
    last: AtomicU64,
}

impl WriteClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next timestamp: `max(wall_clock_ms, previous + 1)`.
    pub fn tick(&self) -> u64 {
        let wall = Self::wall_ms();
        let mut prev = self.last.load(Ordering::Relaxed);
        loop {
            let next = wall.max(prev + 1);
            match self.last.compare_exchange_weak(
                prev,
                next,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return next,
                Err(observed) => prev = observed,
            }
        }
    }

    fn wall_ms() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}
