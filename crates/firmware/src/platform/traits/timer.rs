//! Timer interface trait

/// Free-running hardware timer
///
/// Backs the kernel tick when no Embassy time driver is present: the tick
/// driver converts elapsed timer time into [`TimeBase`] ticks.
///
/// [`TimeBase`]: rover_kernel_core::traits::TimeBase
pub trait TimerInterface {
    /// Monotonic microseconds since the timer started
    fn now_us(&self) -> u64;

    /// Monotonic milliseconds since the timer started
    fn now_ms(&self) -> u64 {
        self.now_us() / 1000
    }
}
