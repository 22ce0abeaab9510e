//! Sliding-window rate counter implementation.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, trace};

use crate::error::{RateCountError, Result};

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// A thread-safe counter reporting the average number of tokens per slot
/// over the last `windows` closed slots.
///
/// Time is cut into slots of `resolution` length, numbered from the Unix
/// epoch. Tokens passed to [`increment`](Self::increment) accumulate in the
/// slot containing the current instant. [`rate`](Self::rate) averages the
/// `windows` slots that closed before it, so the still-open slot never
/// contributes and a fresh counter under-reports until `windows` slots have
/// elapsed.
///
/// There is no background task. Every call reads the wall clock while
/// holding the lock and ages out stale slots before doing its work.
///
/// For example, `RateCounter::new(Duration::from_secs(1), 5)` reports tokens
/// per second averaged over the last five seconds, and
/// `RateCounter::new(Duration::from_secs(10), 5)` reports tokens per ten
/// seconds averaged over the last fifty.
#[derive(Debug)]
pub struct RateCounter {
    /// Slot buffer and the absolute slot it was last rotated to
    state: Mutex<Slots>,
    /// Width of one slot
    resolution: Duration,
    /// Number of closed slots averaged by `rate`
    windows: usize,
}

/// Ring buffer of `windows + 1` per-slot accumulators.
///
/// `values[head]` is the open slot. Walking forward from `head + 1` visits
/// the closed slots oldest first.
#[derive(Debug)]
struct Slots {
    values: Box<[i64]>,
    head: usize,
    /// Absolute slot number of `values[head]`
    position: i64,
}

impl Slots {
    fn new(windows: usize) -> Self {
        Self {
            values: vec![0; windows + 1].into_boxed_slice(),
            head: windows,
            position: 0,
        }
    }

    /// Advance the open slot to `now_slot`, zeroing every slot that fell out
    /// of the window on the way.
    fn rotate(&mut self, now_slot: i64) {
        if now_slot == self.position {
            return;
        }

        let windows = self.values.len() - 1;
        // A regressed clock wraps to a huge gap and clears everything.
        let delta = now_slot.wrapping_sub(self.position) as u64;

        if delta > windows as u64 {
            if now_slot < self.position {
                debug!(
                    from = self.position,
                    to = now_slot,
                    "Clock moved backwards, clearing all slots"
                );
            } else {
                trace!(from = self.position, to = now_slot, "Window expired, clearing all slots");
            }
            self.values.fill(0);
            self.position = now_slot;
            return;
        }

        trace!(from = self.position, to = now_slot, "Rotating slots");
        let len = self.values.len();
        for _ in 0..delta {
            self.head = (self.head + 1) % len;
            self.values[self.head] = 0;
        }
        self.position = now_slot;
    }

    /// Slot totals wrap on overflow rather than panic.
    fn add(&mut self, amount: i64) {
        let slot = &mut self.values[self.head];
        *slot = slot.wrapping_add(amount);
    }

    /// Sum of the closed slots, excluding the open one.
    fn closed_sum(&self) -> i64 {
        self.values
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != self.head)
            .map(|(_, v)| *v)
            .fold(0i64, i64::wrapping_add)
    }

    /// Slot values oldest first, the open slot last.
    #[cfg(test)]
    fn ordered(&self) -> Vec<i64> {
        let len = self.values.len();
        (1..=len).map(|k| self.values[(self.head + k) % len]).collect()
    }
}

impl RateCounter {
    /// Create a counter averaging the last `windows` slots of `resolution`
    /// each.
    ///
    /// Fails with [`RateCountError::ZeroResolution`] or
    /// [`RateCountError::ZeroWindows`] when either argument is zero.
    pub fn new(resolution: Duration, windows: usize) -> Result<Self> {
        if resolution.is_zero() {
            return Err(RateCountError::ZeroResolution);
        }
        if windows == 0 {
            return Err(RateCountError::ZeroWindows);
        }

        debug!(
            resolution = ?resolution,
            windows = windows,
            "Creating rate counter"
        );

        Ok(Self {
            state: Mutex::new(Slots::new(windows)),
            resolution,
            windows,
        })
    }

    /// Create a non-averaged counter, equivalent to `new(resolution, 1)`.
    pub fn simple(resolution: Duration) -> Result<Self> {
        Self::new(resolution, 1)
    }

    /// Add `amount` tokens to the current slot.
    ///
    /// Negative amounts are accepted and subtract from the slot.
    pub fn increment(&self, amount: i64) {
        self.rotated().add(amount);
    }

    /// Average tokens per slot over the last `windows` closed slots.
    ///
    /// Integer division truncates; scale amounts before incrementing when
    /// finer granularity is needed.
    pub fn rate(&self) -> i64 {
        let sum = self.rotated().closed_sum();
        sum / self.windows as i64
    }

    /// [`rate`](Self::rate) divided by `divisor`, for unit conversion.
    ///
    /// ```
    /// use std::time::Duration;
    /// use ratecount::{RateCounter, units::KIB};
    ///
    /// let counter = RateCounter::simple(Duration::from_secs(1)).unwrap();
    /// assert_eq!(counter.rate_per(KIB).unwrap(), 0);
    /// assert!(counter.rate_per(0).is_err());
    /// ```
    ///
    /// Fails with [`RateCountError::ZeroDivisor`] when `divisor` is zero.
    pub fn rate_per(&self, divisor: i64) -> Result<i64> {
        if divisor == 0 {
            return Err(RateCountError::ZeroDivisor);
        }
        Ok(self.rate().wrapping_div(divisor))
    }

    /// Get the width of one slot.
    pub fn resolution(&self) -> Duration {
        self.resolution
    }

    /// Get the number of averaged windows.
    pub fn windows(&self) -> usize {
        self.windows
    }

    /// Get the total time covered by the averaged windows, saturating at
    /// [`Duration::MAX`].
    pub fn span(&self) -> Duration {
        span_of(self.resolution, self.windows)
    }

    /// Sum of every slot, open one included, without rotating.
    #[cfg(test)]
    pub(crate) fn buffered(&self) -> i64 {
        self.state.lock().values.iter().fold(0i64, |acc, v| acc.wrapping_add(*v))
    }

    /// Lock the slots and bring them up to date with the wall clock.
    fn rotated(&self) -> MutexGuard<'_, Slots> {
        let mut slots = self.state.lock();
        slots.rotate(self.now_slot());
        slots
    }

    /// Absolute slot number of the current instant.
    fn now_slot(&self) -> i64 {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        (nanos / self.resolution.as_nanos()) as i64
    }
}

/// `resolution * windows` without truncating `windows` or overflowing.
fn span_of(resolution: Duration, windows: usize) -> Duration {
    let nanos = resolution.as_nanos().saturating_mul(windows as u128);
    match u64::try_from(nanos / NANOS_PER_SEC) {
        Ok(secs) => Duration::new(secs, (nanos % NANOS_PER_SEC) as u32),
        Err(_) => Duration::MAX,
    }
}
