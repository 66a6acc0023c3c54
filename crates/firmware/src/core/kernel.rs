//! Kernel main loop
//!
//! One pump cycle runs every due task to completion. On target the loop
//! then sleeps until the next task is due or an interrupt signals new work.

use rover_kernel_core::scheduler::{PumpReport, Scheduler, SchedulerState};
use rover_kernel_core::traits::{SharedState, TimeSource};

#[cfg(feature = "embassy")]
use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, signal::Signal};

/// Longest sleep when the queue is empty
pub const IDLE_WAIT_MS: u32 = 1_000;

/// Raised by interrupt handlers after queueing a task
#[cfg(feature = "embassy")]
pub static KERNEL_WAKE: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Run one pump cycle and log anything abnormal.
pub fn run_pump_cycle<'a, S, T>(scheduler: &Scheduler<'a, S, T>) -> PumpReport
where
    S: SharedState<SchedulerState<'a>>,
    T: TimeSource,
{
    let report = scheduler.pump();

    if report.dropped > 0 {
        crate::log_warn!(
            "Pump dropped {} task(s) for unregistered modules",
            report.dropped
        );
    }
    if report.requeue_failed > 0 {
        crate::log_error!(
            "Pump lost {} periodic task(s): out of memory",
            report.requeue_failed
        );
    }
    if !report.is_idle() {
        crate::log_trace!(
            "Pump: executed={} requeued={}",
            report.executed,
            report.requeued
        );
    }

    report
}

/// Milliseconds the loop may sleep before the next task is due.
pub fn sleep_budget_ms<'a, S, T>(scheduler: &Scheduler<'a, S, T>) -> u32
where
    S: SharedState<SchedulerState<'a>>,
    T: TimeSource,
{
    match scheduler.next_due_ms() {
        Some(due) => {
            // Due times in the past show up as a huge wrapped distance
            let wait = due.wrapping_sub(scheduler.now_ms());
            if wait as i32 <= 0 {
                0
            } else {
                wait.min(IDLE_WAIT_MS)
            }
        }
        None => IDLE_WAIT_MS,
    }
}

/// Pump forever, sleeping between cycles.
///
/// Wakes early when [`KERNEL_WAKE`] is signalled, so tasks queued from
/// interrupt context are served without waiting for the next due time.
#[cfg(feature = "embassy")]
pub async fn run_main_loop<'a, S, T>(scheduler: &Scheduler<'a, S, T>) -> !
where
    S: SharedState<SchedulerState<'a>>,
    T: TimeSource,
{
    use embassy_futures::select::select;
    use embassy_time::{Duration, Timer};

    crate::log_info!("Kernel main loop started");
    loop {
        run_pump_cycle(scheduler);

        let wait = sleep_budget_ms(scheduler);
        if wait == 0 {
            embassy_futures::yield_now().await;
            continue;
        }
        select(
            Timer::after(Duration::from_millis(u64::from(wait))),
            KERNEL_WAKE.wait(),
        )
        .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;
    use rover_kernel_core::scheduler::{KernelModule, TaskContext, TaskMessage, TaskOutcome};
    use rover_kernel_core::traits::{MockState, TimeBase};

    #[derive(Default)]
    struct Counter(Cell<u32>);

    impl KernelModule for Counter {
        fn on_task(&self, _msg: TaskMessage<'_>, _tasks: &dyn TaskContext) -> TaskOutcome {
            self.0.set(self.0.get() + 1);
            TaskOutcome::Done
        }
    }

    #[test]
    fn test_pump_cycle_reports_drops() {
        let time = TimeBase::new(100);
        let counter = Counter::default();
        let scheduler = Scheduler::new(MockState::new(SchedulerState::new()), &time);
        scheduler.register_module(1, &counter).unwrap();

        scheduler.schedule(1, 0, 0, false, 0).unwrap();
        scheduler.schedule(9, 0, 0, false, 0).unwrap();

        let report = run_pump_cycle(&scheduler);
        assert_eq!(report.executed, 1);
        assert_eq!(report.dropped, 1);
        assert_eq!(counter.0.get(), 1);
    }

    #[test]
    fn test_sleep_budget() {
        let time = TimeBase::new(100);
        let scheduler = Scheduler::new(MockState::new(SchedulerState::new()), &time);
        assert_eq!(sleep_budget_ms(&scheduler), IDLE_WAIT_MS);

        scheduler.schedule(1, 0, -300, false, 0).unwrap();
        assert_eq!(sleep_budget_ms(&scheduler), 300);

        time.advance(500);
        assert_eq!(sleep_budget_ms(&scheduler), 0);

        scheduler.drop_all().unwrap();
        scheduler.schedule(1, 0, -60_000, false, 0).unwrap();
        assert_eq!(sleep_budget_ms(&scheduler), IDLE_WAIT_MS);
    }
}
