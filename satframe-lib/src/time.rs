//! Mission elapsed time sources used to timestamp space packets.
use std::cell::Cell;
use std::time::Instant;

/// Source of mission elapsed time in milliseconds. Values must never decrease.
pub trait TimeSource {
    fn now_ms(&self) -> u64;
}

impl<T> TimeSource for &T
where
    T: TimeSource + ?Sized,
{
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}

/// Manually advanced millisecond counter starting at 0.
///
/// # Examples
/// ```
/// use satframe::time::{TickClock, TimeSource};
///
/// let clock = TickClock::new();
/// for _ in 0..100 {
///     clock.tick();
/// }
/// assert_eq!(clock.now_ms(), 100);
/// ```
#[derive(Debug, Default, Clone)]
pub struct TickClock {
    ms: Cell<u64>,
}

impl TickClock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance by a single millisecond.
    pub fn tick(&self) {
        self.advance(1);
    }

    pub fn advance(&self, ms: u64) {
        self.ms.set(self.ms.get().saturating_add(ms));
    }

    pub fn reset(&self) {
        self.ms.set(0);
    }
}

impl TimeSource for TickClock {
    fn now_ms(&self) -> u64 {
        self.ms.get()
    }
}

/// Milliseconds elapsed since the clock was created.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    start: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl MonotonicClock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TimeSource for MonotonicClock {
    fn now_ms(&self) -> u64 {
        u64::try_from(self.start.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}
