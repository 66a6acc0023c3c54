//! Core types for the task scheduler
//!
//! This module defines the values that flow through the scheduler:
//! - Task entries (deferred units of work held by the queue)
//! - Task messages (the per-call view handed to a module callback)
//! - Task outcomes (what a callback reports back)
//! - Pump reports (what one pump cycle did)

use alloc::vec::Vec;

/// Kernel module identifier
pub type ModuleId = u8;

/// Operation code, interpreted by the target module
pub type OpCode = u8;

/// Identifier assigned to each scheduled task, usable for removal
pub type ProcessId = u16;

/// Number of slots in the module registry
pub const MAX_MODULES: usize = 16;

/// Well-known module ids used by the rover subsystems
pub mod module_ids {
    use super::ModuleId;

    /// The scheduler's own housekeeping
    pub const SCHEDULER: ModuleId = 0;
    /// Motor engines with encoder feedback
    pub const ENGINES: ModuleId = 1;
    /// IR radar scanner
    pub const RADAR: ModuleId = 2;
    /// IMU sensor fusion
    pub const IMU: ModuleId = 3;
    /// WiFi modem
    pub const MODEM: ModuleId = 4;
    /// Event log sink
    pub const EVENT_LOG: ModuleId = 5;
}

/// A deferred unit of work
///
/// Invariants maintained by the scheduler:
/// - `period == 0` for one-shot tasks, `period > 0` for periodic tasks
/// - `repeats_remaining < 0` means infinite; it is decremented after each
///   periodic firing and the task is not re-queued once it reads 0
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskEntry {
    /// Target kernel module
    pub module_id: ModuleId,
    /// Operation within the module
    pub op_code: OpCode,
    /// Opaque payload, decoded by the module
    pub args: Vec<u8>,
    /// Absolute time (ms since startup) at which the task becomes eligible
    pub exec_time: u32,
    /// Re-insertion interval in ms (0 = one-shot)
    pub period: i32,
    /// Remaining re-runs (negative = infinite)
    pub repeats_remaining: i32,
    /// Identifier for removal by exact match
    pub process_id: ProcessId,
}

impl TaskEntry {
    /// Build an entry from a schedule request.
    ///
    /// `time <= 0` means "now + |time| ms", `time > 0` is an absolute time.
    /// For periodic tasks the period is `|time|` for relative requests and
    /// the distance from `now_ms` to the absolute time otherwise, never less
    /// than 1 ms. A request for `repeats` runs is stored as `repeats - 1`
    /// remaining re-runs since the first execution counts as one; `repeats
    /// <= 0` means run forever.
    pub fn from_request(
        module_id: ModuleId,
        op_code: OpCode,
        time: i32,
        periodic: bool,
        repeats: i32,
        now_ms: u32,
        process_id: ProcessId,
    ) -> Self {
        let exec_time = resolve_exec_time(time, now_ms);

        let (period, repeats_remaining) = if periodic {
            let period = if time <= 0 {
                time.unsigned_abs()
            } else {
                exec_time.saturating_sub(now_ms)
            };
            let period = period.clamp(1, i32::MAX as u32) as i32;
            let repeats_remaining = if repeats <= 0 { -1 } else { repeats - 1 };
            (period, repeats_remaining)
        } else {
            (0, 0)
        };

        Self {
            module_id,
            op_code,
            args: Vec::new(),
            exec_time,
            period,
            repeats_remaining,
            process_id,
        }
    }

    /// Whether the task re-inserts itself after running
    #[inline]
    pub fn is_periodic(&self) -> bool {
        self.period != 0
    }

    /// Whether the task will be re-queued after its next firing
    #[inline]
    pub fn will_repeat(&self) -> bool {
        self.is_periodic() && self.repeats_remaining != 0
    }

    /// Exact match on module, op code and argument bytes
    pub fn matches(&self, module_id: ModuleId, op_code: OpCode, args: &[u8]) -> bool {
        self.module_id == module_id && self.op_code == op_code && self.args.as_slice() == args
    }
}

/// Convert a schedule `time` argument into an absolute execution time.
#[inline]
pub fn resolve_exec_time(time: i32, now_ms: u32) -> u32 {
    if time <= 0 {
        now_ms.wrapping_add(time.unsigned_abs())
    } else {
        time as u32
    }
}

/// Whether `time` is at or before `reference` on the wrapping millisecond clock.
///
/// Valid while the two are less than 2^31 ms (about 24.8 days) apart.
#[inline]
pub fn time_reached(time: u32, reference: u32) -> bool {
    reference.wrapping_sub(time) as i32 >= 0
}

/// Per-call message handed to a module callback
///
/// Borrowed from the task entry the pump owns for the duration of the call,
/// so a callback can never observe another task's arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskMessage<'m> {
    /// Module the task was addressed to
    pub module_id: ModuleId,
    /// Operation within the module
    pub op_code: OpCode,
    /// Process id of the task being run
    pub process_id: ProcessId,
    /// Argument bytes
    pub args: &'m [u8],
    /// Pump time at which the task was popped
    pub now_ms: u32,
}

/// Result reported by a module callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Work completed
    Done,
    /// Module-local error code
    Failed(u8),
    /// A peripheral stopped responding
    Hung,
}

impl TaskOutcome {
    /// Whether the outcome is `Done`
    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Done)
    }
}

/// Summary of one [`pump`](super::Scheduler::pump) cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpReport {
    /// Tasks dispatched to a registered module
    pub executed: u16,
    /// Tasks discarded because their module was never registered
    pub dropped: u16,
    /// Periodic tasks put back in the queue
    pub requeued: u16,
    /// Periodic tasks lost because re-insertion ran out of memory
    pub requeue_failed: u16,
}

impl PumpReport {
    /// Whether the cycle did anything at all
    pub fn is_idle(&self) -> bool {
        self.executed == 0 && self.dropped == 0
    }
}
