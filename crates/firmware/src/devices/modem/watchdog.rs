//! Command watchdog on the kernel time base
//!
//! The engine arms the watchdog when a command goes out and disarms it when
//! the exchange resolves. Expiry is detected by the tick handler through
//! [`service_watchdog`], which checks and fires inside the engine lock.

use rover_kernel_core::modem::{ModemEngine, ModemLink, ModemState, Watchdog};
use rover_kernel_core::traits::{SharedState, TimeSource};

/// Deadline-based [`Watchdog`]
#[derive(Debug)]
pub struct DeadlineWatchdog<T> {
    time: T,
    deadline_ms: Option<u32>,
    expirations: u32,
}

impl<T: TimeSource> DeadlineWatchdog<T> {
    pub const fn new(time: T) -> Self {
        Self {
            time,
            deadline_ms: None,
            expirations: 0,
        }
    }

    /// Deadline of the running countdown
    pub fn deadline_ms(&self) -> Option<u32> {
        self.deadline_ms
    }

    /// Whether the countdown has run out at `now_ms`
    ///
    /// Compares with wrapping arithmetic so a deadline past the counter wrap
    /// still expires on time.
    pub fn is_expired(&self, now_ms: u32) -> bool {
        self.deadline_ms
            .is_some_and(|deadline| now_ms.wrapping_sub(deadline) as i32 >= 0)
    }

    /// Countdowns that ran out
    pub fn expirations(&self) -> u32 {
        self.expirations
    }
}

impl<T: TimeSource> Watchdog for DeadlineWatchdog<T> {
    fn arm(&mut self, timeout_ms: u32) {
        self.deadline_ms = Some(self.time.now_ms().wrapping_add(timeout_ms));
    }

    fn disarm(&mut self) {
        if self.is_expired(self.time.now_ms()) {
            self.expirations = self.expirations.wrapping_add(1);
        }
        self.deadline_ms = None;
    }
}

/// Tick hook: fire the engine's watchdog timeout once per expiry.
///
/// Returns whether the timeout fired.
pub fn service_watchdog<L, T, S>(
    engine: &ModemEngine<L, DeadlineWatchdog<T>, S>,
    now_ms: u32,
) -> bool
where
    L: ModemLink,
    T: TimeSource,
    S: SharedState<ModemState<L, DeadlineWatchdog<T>>>,
{
    let fired = engine.on_watchdog_timeout_if(|watchdog| watchdog.is_expired(now_ms));
    if fired {
        crate::log_debug!("Modem watchdog expired at {} ms, forcing parse", now_ms);
    }
    fired
}
