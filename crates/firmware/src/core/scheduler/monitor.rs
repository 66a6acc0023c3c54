//! Scheduler health monitor
//!
//! Periodically summarizes the kernel's state:
//! - Queue depth and the next due time
//! - Per-module dispatch counts and last outcome
//! - Modem counters (timeouts, overflows, lost deferred tasks)
//!
//! Meant to be scheduled as a periodic task or called from a slow timer.

use heapless::Vec;
use rover_kernel_core::modem::ModemStats;
use rover_kernel_core::scheduler::{
    ModuleEntry, ModuleId, Scheduler, SchedulerState, TaskOutcome, MAX_MODULES,
};
use rover_kernel_core::traits::{SharedState, TimeSource};

use crate::core::logging::outcome_label;

/// Queue depth warning threshold (tasks)
const QUEUE_DEPTH_WARNING: usize = 64;

/// What one monitor pass observed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorSummary {
    /// Tasks waiting in the queue
    pub pending: usize,
    /// Registered modules
    pub modules: usize,
    /// Modules whose last task did not succeed
    pub unhealthy_modules: usize,
}

/// Collect scheduler (and optionally modem) statistics and log them.
pub fn collect_and_report_stats<'a, S, T>(
    scheduler: &Scheduler<'a, S, T>,
    modem: Option<ModemStats>,
) -> MonitorSummary
where
    S: SharedState<SchedulerState<'a>>,
    T: TimeSource,
{
    let now = scheduler.now_ms();
    // Copy out under the lock, log after releasing it
    let (pending, modules) = scheduler.inspect(|state| {
        let mut modules: Vec<(ModuleId, ModuleEntry<'a>), MAX_MODULES> = Vec::new();
        for (id, entry) in state.registry().iter() {
            // Capacity matches the registry
            let _ = modules.push((id, *entry));
        }
        (state.queue().len(), modules)
    });

    let summary = MonitorSummary {
        pending,
        modules: modules.len(),
        unhealthy_modules: modules
            .iter()
            .filter(|(_, entry)| entry.last_outcome.is_some_and(|o| !o.is_success()))
            .count(),
    };

    log_scheduler_summary(now, &summary, scheduler.next_due_ms());
    check_warnings(&summary);
    report_module_stats(&modules);
    if let Some(stats) = modem {
        report_modem_stats(&stats);
    }

    summary
}

/// Log scheduler summary
#[allow(unused_variables)]
fn log_scheduler_summary(now_ms: u32, summary: &MonitorSummary, next_due: Option<u32>) {
    crate::log_info!(
        "Scheduler: uptime={}ms pending={} modules={} next_due={}ms",
        now_ms,
        summary.pending,
        summary.modules,
        next_due.unwrap_or(0)
    );
}

/// Check for warning conditions
#[allow(unused_variables)]
fn check_warnings(summary: &MonitorSummary) {
    if summary.pending >= QUEUE_DEPTH_WARNING {
        crate::log_warn!("Task queue depth high: {}", summary.pending);
    }
    if summary.unhealthy_modules > 0 {
        crate::log_warn!("{} module(s) reporting failures", summary.unhealthy_modules);
    }
}

/// Report per-module statistics
#[allow(unused_variables)]
fn report_module_stats(modules: &[(ModuleId, ModuleEntry<'_>)]) {
    for (id, entry) in modules {
        let outcome = entry.last_outcome.map_or("-", outcome_label);
        let code = match entry.last_outcome {
            Some(TaskOutcome::Failed(code)) => code,
            _ => 0,
        };
        crate::log_info!(
            "  module {} '{}': dispatched={} last_op={} last={} code={}",
            id,
            entry.module.name(),
            entry.dispatch_count,
            entry.last_op.unwrap_or(0),
            outcome,
            code
        );
    }
}

/// Report modem counters, warning on anything that indicates lost data
#[allow(unused_variables)]
fn report_modem_stats(stats: &ModemStats) {
    crate::log_info!(
        "Modem: commands={} frames={} timeouts={} forced_parses={}",
        stats.commands_sent,
        stats.frames_parsed,
        stats.timeouts,
        stats.forced_parses
    );
    if stats.line_overflows > 0 || stats.payload_truncated > 0 {
        crate::log_warn!(
            "Modem: line_overflows={} payload_truncated={}",
            stats.line_overflows,
            stats.payload_truncated
        );
    }
    if stats.deferred_failed > 0 {
        crate::log_error!("Modem: {} receive tasks lost", stats.deferred_failed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;
    use rover_kernel_core::scheduler::{KernelModule, TaskContext, TaskMessage};
    use rover_kernel_core::traits::{MockState, TimeBase};

    struct Flaky;

    impl KernelModule for Flaky {
        fn on_task(&self, msg: TaskMessage<'_>, _tasks: &dyn TaskContext) -> TaskOutcome {
            if msg.op_code == 0 {
                TaskOutcome::Done
            } else {
                TaskOutcome::Failed(msg.op_code)
            }
        }

        fn name(&self) -> &'static str {
            "flaky"
        }
    }

    #[test]
    fn test_collect_and_report_stats() {
        let time = TimeBase::new(100);
        let good = Flaky;
        let bad = Flaky;
        let scheduler = Scheduler::new(MockState::new(SchedulerState::new()), &time);
        scheduler.register_module(1, &good).unwrap();
        scheduler.register_module(2, &bad).unwrap();

        scheduler.schedule(1, 0, 0, false, 0).unwrap();
        scheduler.schedule(2, 7, 0, false, 0).unwrap();
        scheduler.schedule(2, 0, -1_000, false, 0).unwrap();
        scheduler.pump();

        let summary = collect_and_report_stats(&scheduler, Some(ModemStats::default()));
        assert_eq!(
            summary,
            MonitorSummary {
                pending: 1,
                modules: 2,
                unhealthy_modules: 1,
            }
        );
    }

    /// `MockState` that records whether a closure is running
    struct FlaggedState<'f, T> {
        inner: MockState<T>,
        held: &'f Cell<bool>,
    }

    impl<T> SharedState<T> for FlaggedState<'_, T> {
        fn with<F, R>(&self, f: F) -> R
        where
            F: FnOnce(&T) -> R,
        {
            self.held.set(true);
            let result = self.inner.with(f);
            self.held.set(false);
            result
        }

        fn with_mut<F, R>(&self, f: F) -> R
        where
            F: FnOnce(&mut T) -> R,
        {
            self.held.set(true);
            let result = self.inner.with_mut(f);
            self.held.set(false);
            result
        }
    }

    /// Notes whether its name was read while the scheduler lock was held
    struct Named<'f> {
        held: &'f Cell<bool>,
        named_under_lock: Cell<bool>,
    }

    impl KernelModule for Named<'_> {
        fn on_task(&self, _msg: TaskMessage<'_>, _tasks: &dyn TaskContext) -> TaskOutcome {
            TaskOutcome::Done
        }

        fn name(&self) -> &'static str {
            if self.held.get() {
                self.named_under_lock.set(true);
            }
            "named"
        }
    }

    #[test]
    fn test_module_report_runs_outside_lock() {
        let held = Cell::new(false);
        let time = TimeBase::new(100);
        let module = Named {
            held: &held,
            named_under_lock: Cell::new(false),
        };
        let scheduler = Scheduler::new(
            FlaggedState {
                inner: MockState::new(SchedulerState::new()),
                held: &held,
            },
            &time,
        );
        scheduler.register_module(3, &module).unwrap();

        let summary = collect_and_report_stats(&scheduler, None);
        assert_eq!(summary.modules, 1);
        assert!(!module.named_under_lock.get());
    }

    #[test]
    fn test_report_empty_scheduler() {
        let time = TimeBase::new(100);
        let scheduler = Scheduler::new(MockState::new(SchedulerState::new()), &time);

        // Should handle an empty registry gracefully
        let summary = collect_and_report_stats(&scheduler, None);
        assert_eq!(summary, MonitorSummary::default());
    }

    #[test]
    fn test_modem_warnings_do_not_panic() {
        let stats = ModemStats {
            line_overflows: 2,
            deferred_failed: 1,
            ..ModemStats::default()
        };
        report_modem_stats(&stats);
        check_warnings(&MonitorSummary {
            pending: QUEUE_DEPTH_WARNING,
            modules: 0,
            unhealthy_modules: 3,
        });
    }
}
