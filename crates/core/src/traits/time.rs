//! Monotonic millisecond clock driven by a periodic hardware tick.
//!
//! The [`TimeBase`] counter is the kernel's only notion of time. The tick
//! interrupt is its sole writer; the scheduler and modem engine only read it.

use core::sync::atomic::{AtomicU32, Ordering};

/// Platform-agnostic millisecond time source.
///
/// Implemented by [`TimeBase`] and by references to any time source, so a
/// scheduler can either own its clock or borrow a `static` one.
///
/// # Example
///
/// ```
/// use rover_kernel_core::traits::{TimeBase, TimeSource};
///
/// fn is_due<T: TimeSource>(time: &T, exec_time: u32) -> bool {
///     exec_time <= time.now_ms()
/// }
///
/// let time = TimeBase::new(100);
/// time.tick();
/// assert!(is_due(&time, 100));
/// assert!(!is_due(&time, 101));
/// ```
pub trait TimeSource {
    /// Returns milliseconds elapsed since startup.
    fn now_ms(&self) -> u32;

    /// Returns elapsed milliseconds since a reference point.
    ///
    /// Uses wrapping subtraction so the result stays meaningful across a
    /// counter wrap.
    fn elapsed_since(&self, reference_ms: u32) -> u32 {
        self.now_ms().wrapping_sub(reference_ms)
    }
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn now_ms(&self) -> u32 {
        (**self).now_ms()
    }
}

/// Millisecond counter advanced by the periodic tick handler.
///
/// Single writer (the tick interrupt), many readers. The increment is a plain
/// load/store pair rather than a read-modify-write so it also works on cores
/// without atomic RMW instructions; this is only sound because nothing else
/// ever writes the counter.
///
/// The counter wraps after roughly 49.7 days.
#[derive(Debug)]
pub struct TimeBase {
    ms_since_startup: AtomicU32,
    tick_period_ms: u32,
}

impl TimeBase {
    /// Default hardware tick period.
    pub const DEFAULT_TICK_MS: u32 = 100;

    /// Creates a time base at 0 ms with the given tick period.
    pub const fn new(tick_period_ms: u32) -> Self {
        Self {
            ms_since_startup: AtomicU32::new(0),
            tick_period_ms,
        }
    }

    /// Tick period in milliseconds.
    pub const fn tick_period_ms(&self) -> u32 {
        self.tick_period_ms
    }

    /// Advances the clock by one tick period.
    ///
    /// Call from the periodic timer interrupt only.
    pub fn tick(&self) {
        self.advance(self.tick_period_ms);
    }

    /// Advances the clock by an arbitrary amount.
    ///
    /// Same single-writer rule as [`tick`](Self::tick); used by simulations
    /// and host tests to step time precisely.
    pub fn advance(&self, ms: u32) {
        let now = self.ms_since_startup.load(Ordering::Relaxed);
        self.ms_since_startup
            .store(now.wrapping_add(ms), Ordering::Release);
    }
}

impl Default for TimeBase {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TICK_MS)
    }
}

impl TimeSource for TimeBase {
    fn now_ms(&self) -> u32 {
        self.ms_since_startup.load(Ordering::Acquire)
    }
}
