//! Kernel time base and tick sources.
//!
//! [`TIME_BASE`] is the one clock every kernel component reads. It is
//! advanced either by the Embassy [`tick_task`] or, on boards without an
//! Embassy time driver, by polling a [`TickDriver`] over a hardware timer.

use rover_kernel_core::traits::TimeBase;

use super::traits::TimerInterface;

/// Global kernel clock
///
/// Only the tick source writes it.
pub static TIME_BASE: TimeBase = TimeBase::new(TimeBase::DEFAULT_TICK_MS);

/// Converts free-running timer time into time base ticks.
///
/// Each [`poll`](Self::poll) issues every tick period that elapsed since the
/// previous one, so a late poll catches up rather than drifting.
pub struct TickDriver<T: TimerInterface> {
    timer: T,
    last_tick_ms: u64,
}

impl<T: TimerInterface> TickDriver<T> {
    /// Start counting from the timer's current time.
    pub fn new(timer: T) -> Self {
        let last_tick_ms = timer.now_ms();
        Self {
            timer,
            last_tick_ms,
        }
    }

    /// Advance `time` by the ticks that elapsed; returns how many.
    pub fn poll(&mut self, time: &TimeBase) -> u32 {
        let period = u64::from(time.tick_period_ms());
        if period == 0 {
            return 0;
        }

        let now = self.timer.now_ms();
        let mut ticks = 0;
        while now.saturating_sub(self.last_tick_ms) >= period {
            time.tick();
            self.last_tick_ms += period;
            ticks += 1;
        }
        ticks
    }

    pub fn timer_mut(&mut self) -> &mut T {
        &mut self.timer
    }
}

/// Periodic tick task
///
/// Advances [`TIME_BASE`] once per tick period, then runs `on_tick` with the
/// new time. Boards pass a hook that services the modem watchdog.
///
/// ```ignore
/// static HOOK: fn(u32) = |now| service_watchdog(&WATCHDOG_ALARM, &MODEM, now);
/// spawner.spawn(tick_task(&HOOK)).unwrap();
/// ```
#[cfg(feature = "embassy")]
#[embassy_executor::task]
pub async fn tick_task(on_tick: &'static (dyn Fn(u32) + Sync)) {
    use embassy_time::{Duration, Ticker};
    use rover_kernel_core::traits::TimeSource;

    let period = u64::from(TIME_BASE.tick_period_ms());
    crate::log_info!("Tick task started ({} ms)", period);

    let mut ticker = Ticker::every(Duration::from_millis(period));
    loop {
        ticker.next().await;
        TIME_BASE.tick();
        on_tick(TIME_BASE.now_ms());
    }
}
