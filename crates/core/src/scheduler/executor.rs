//! The scheduler: schedule, append, pump, remove
//!
//! All mutable scheduler state lives in one [`SchedulerState`] value behind a
//! [`SharedState`] lock. Every public operation takes the lock only for the
//! queue or registry mutation itself; module callbacks always run with the
//! lock released, so a callback (or an interrupt firing during one) can
//! schedule new work.

use super::error::SchedulerError;
use super::queue::TaskQueue;
use super::registry::{EventSink, KernelModule, ModuleEntry, ModuleRegistry, TaskContext};
use super::types::{
    time_reached, ModuleId, OpCode, ProcessId, PumpReport, TaskEntry, TaskMessage,
};
use crate::traits::{SharedState, TimeSource};

/// Lock-protected scheduler state
#[derive(Debug)]
pub struct SchedulerState<'a> {
    queue: TaskQueue,
    registry: ModuleRegistry<'a>,
    next_pid: ProcessId,
}

impl<'a> SchedulerState<'a> {
    /// Empty queue, empty registry
    pub const fn new() -> Self {
        Self {
            queue: TaskQueue::new(),
            registry: ModuleRegistry::new(),
            next_pid: 1,
        }
    }

    /// Pending tasks
    pub fn queue(&self) -> &TaskQueue {
        &self.queue
    }

    /// Registered modules
    pub fn registry(&self) -> &ModuleRegistry<'a> {
        &self.registry
    }

    /// Hand out the next process id; 0 is never used.
    fn allocate_pid(&mut self) -> ProcessId {
        let pid = self.next_pid;
        self.next_pid = match self.next_pid.wrapping_add(1) {
            0 => 1,
            next => next,
        };
        pid
    }
}

impl Default for SchedulerState<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Cooperative run-to-completion scheduler
///
/// `S` provides mutual exclusion against interrupt handlers (a critical
/// section on target, `MockState` in tests); `T` is the millisecond clock.
pub struct Scheduler<'a, S, T>
where
    S: SharedState<SchedulerState<'a>>,
    T: TimeSource,
{
    state: S,
    time: T,
    events: Option<&'a dyn EventSink>,
}

impl<'a, S, T> Scheduler<'a, S, T>
where
    S: SharedState<SchedulerState<'a>>,
    T: TimeSource,
{
    /// Create a scheduler over existing state and a clock.
    pub const fn new(state: S, time: T) -> Self {
        Self {
            state,
            time,
            events: None,
        }
    }

    /// Report every dispatched task to `sink`.
    pub fn with_event_sink(mut self, sink: &'a dyn EventSink) -> Self {
        self.events = Some(sink);
        self
    }

    /// Current time in ms since startup
    pub fn now_ms(&self) -> u32 {
        self.time.now_ms()
    }

    /// Register a module callback; registering the same id again replaces it.
    pub fn register_module(
        &self,
        module_id: ModuleId,
        module: &'a dyn KernelModule,
    ) -> Result<(), SchedulerError> {
        self.state
            .with_mut(|state| state.registry.register(module_id, module))
    }

    /// Remove a module callback. Its queued tasks are dropped when they come due.
    pub fn unregister_module(&self, module_id: ModuleId) -> bool {
        self.state
            .with_mut(|state| state.registry.unregister(module_id))
    }

    /// Queue a task.
    ///
    /// `time <= 0` schedules at now + |time| ms; `time > 0` is an absolute
    /// time in ms since startup. Periodic tasks run `repeats` times in total
    /// (`repeats <= 0` runs forever).
    ///
    /// Safe to call from interrupt context: the queue is only touched inside
    /// the state lock.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::OutOfMemory` if the queue cannot grow.
    pub fn schedule(
        &self,
        module_id: ModuleId,
        op_code: OpCode,
        time: i32,
        periodic: bool,
        repeats: i32,
    ) -> Result<ProcessId, SchedulerError> {
        self.schedule_with_args(module_id, op_code, time, periodic, repeats, &[])
    }

    /// Queue a task with its argument bytes under a single lock.
    ///
    /// Unlike `schedule` followed by `append_args`, no other producer can
    /// insert in between and take over the "last inserted" handle.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::OutOfMemory` if the queue or the argument
    /// buffer cannot grow; nothing is queued in that case.
    pub fn schedule_with_args(
        &self,
        module_id: ModuleId,
        op_code: OpCode,
        time: i32,
        periodic: bool,
        repeats: i32,
        args: &[u8],
    ) -> Result<ProcessId, SchedulerError> {
        let now = self.time.now_ms();
        self.state.with_mut(|state| {
            let pid = state.allocate_pid();
            let mut entry =
                TaskEntry::from_request(module_id, op_code, time, periodic, repeats, now, pid);
            if !args.is_empty() {
                entry
                    .args
                    .try_reserve_exact(args.len())
                    .map_err(|_| SchedulerError::OutOfMemory)?;
                entry.args.extend_from_slice(args);
            }
            state.queue.insert_sorted(entry)?;
            Ok(pid)
        })
    }

    /// Append bytes to the argument buffer of the task scheduled last.
    ///
    /// Returns `Ok(false)` when no task is pending attachment.
    pub fn append_args(&self, bytes: &[u8]) -> Result<bool, SchedulerError> {
        self.state.with_mut(|state| state.queue.append_args(bytes))
    }

    /// Remove the first queued task matching module, op code and argument bytes.
    pub fn remove_task(&self, module_id: ModuleId, op_code: OpCode, args: &[u8]) -> bool {
        self.state
            .with_mut(|state| state.queue.remove_matching(module_id, op_code, args))
    }

    /// Remove the queued task with the given process id.
    pub fn remove_task_by_pid(&self, process_id: ProcessId) -> bool {
        self.state
            .with_mut(|state| state.queue.remove_by_process_id(process_id))
    }

    /// Number of queued tasks
    pub fn pending_tasks(&self) -> usize {
        self.state.with(|state| state.queue.len())
    }

    /// Whether a task with this process id is still queued
    pub fn is_pending(&self, process_id: ProcessId) -> bool {
        self.state.with(|state| state.queue.contains(process_id))
    }

    /// Execution time of the earliest queued task
    pub fn next_due_ms(&self) -> Option<u32> {
        self.state
            .with(|state| state.queue.peek_earliest().map(|entry| entry.exec_time))
    }

    /// Registry slot for a module (copied out of the lock)
    pub fn module_entry(&self, module_id: ModuleId) -> Option<ModuleEntry<'a>> {
        self.state
            .with(|state| state.registry.entry(module_id).copied())
    }

    /// Run `f` against the locked state, for diagnostics.
    ///
    /// `f` must not call back into the scheduler.
    pub fn inspect<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&SchedulerState<'a>) -> R,
    {
        self.state.with(f)
    }

    /// Free every queued task.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::QueueCorrupted` if the queue's bookkeeping
    /// was inconsistent; the queue is empty afterwards regardless.
    pub fn drop_all(&self) -> Result<usize, SchedulerError> {
        self.state.with_mut(|state| state.queue.drop_all())
    }

    /// Run every task whose execution time has come.
    ///
    /// Main-loop context only. Periodic tasks get their next execution time
    /// (pop time + period) before the callback runs and are re-queued after
    /// it returns. Tasks addressed to an unregistered module are dropped.
    pub fn pump(&self) -> PumpReport {
        let mut report = PumpReport::default();

        loop {
            let now = self.time.now_ms();
            let popped = self.state.with_mut(|state| {
                let due = state
                    .queue
                    .peek_earliest()
                    .is_some_and(|entry| time_reached(entry.exec_time, now));
                if !due {
                    return None;
                }
                let entry = state.queue.pop_earliest()?;
                let module = state.registry.module(entry.module_id);
                Some((entry, module))
            });

            let Some((mut entry, module)) = popped else {
                break;
            };

            let Some(module) = module else {
                report.dropped = report.dropped.saturating_add(1);
                continue;
            };

            let repeat = entry.will_repeat();
            if repeat {
                entry.exec_time = now.wrapping_add(entry.period as u32);
                if entry.repeats_remaining > 0 {
                    entry.repeats_remaining -= 1;
                }
            }

            let msg = TaskMessage {
                module_id: entry.module_id,
                op_code: entry.op_code,
                process_id: entry.process_id,
                args: &entry.args,
                now_ms: now,
            };
            let outcome = module.on_task(msg, self);

            self.state.with_mut(|state| {
                state
                    .registry
                    .record_outcome(entry.module_id, entry.op_code, outcome)
            });
            if let Some(events) = self.events {
                events.emit_event(entry.module_id, entry.op_code, outcome);
            }
            report.executed = report.executed.saturating_add(1);

            if repeat {
                match self.state.with_mut(|state| state.queue.requeue(entry)) {
                    Ok(()) => report.requeued = report.requeued.saturating_add(1),
                    Err(_) => report.requeue_failed = report.requeue_failed.saturating_add(1),
                }
            }
        }

        report
    }
}

impl<'a, S, T> TaskContext for Scheduler<'a, S, T>
where
    S: SharedState<SchedulerState<'a>>,
    T: TimeSource,
{
    fn now_ms(&self) -> u32 {
        Scheduler::now_ms(self)
    }

    fn schedule(
        &self,
        module_id: ModuleId,
        op_code: OpCode,
        time: i32,
        periodic: bool,
        repeats: i32,
    ) -> Result<ProcessId, SchedulerError> {
        Scheduler::schedule(self, module_id, op_code, time, periodic, repeats)
    }

    fn schedule_with_args(
        &self,
        module_id: ModuleId,
        op_code: OpCode,
        time: i32,
        periodic: bool,
        repeats: i32,
        args: &[u8],
    ) -> Result<ProcessId, SchedulerError> {
        Scheduler::schedule_with_args(self, module_id, op_code, time, periodic, repeats, args)
    }

    fn append_args(&self, bytes: &[u8]) -> Result<bool, SchedulerError> {
        Scheduler::append_args(self, bytes)
    }

    fn remove_task(&self, module_id: ModuleId, op_code: OpCode, args: &[u8]) -> bool {
        Scheduler::remove_task(self, module_id, op_code, args)
    }

    fn remove_task_by_pid(&self, process_id: ProcessId) -> bool {
        Scheduler::remove_task_by_pid(self, process_id)
    }
}
