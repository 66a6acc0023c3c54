//! Kernel Event Log
//!
//! Fixed-capacity ring of task dispatch events, fed by the scheduler through
//! [`EventSink`]. Uses heapless `HistoryBuf` so no allocation happens on the
//! dispatch path.
//!
//! ## Features
//!
//! - Capacity of [`EVENT_LOG_SIZE`] events, oldest evicted first
//! - Overflow tracking for diagnostics
//! - Failures and hangs are also logged as they happen

use heapless::{HistoryBuf, Vec};
use rover_kernel_core::scheduler::{EventSink, ModuleId, OpCode, TaskOutcome};
use rover_kernel_core::traits::SharedState;

/// Ring capacity in events
pub const EVENT_LOG_SIZE: usize = 32;

/// One dispatched task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelEvent {
    pub module_id: ModuleId,
    pub op_code: OpCode,
    pub outcome: TaskOutcome,
}

/// Ring storage behind an [`EventLog`]
pub struct EventRing {
    buffer: HistoryBuf<KernelEvent, EVENT_LOG_SIZE>,
    overflow_count: u32,
}

impl EventRing {
    /// Empty ring
    pub const fn new() -> Self {
        Self {
            buffer: HistoryBuf::new(),
            overflow_count: 0,
        }
    }

    fn push(&mut self, event: KernelEvent) {
        if self.buffer.len() == EVENT_LOG_SIZE {
            self.overflow_count = self.overflow_count.saturating_add(1);
        }
        self.buffer.write(event);
    }
}

impl Default for EventRing {
    fn default() -> Self {
        Self::new()
    }
}

/// Event sink recording every dispatch
///
/// `S` is the lock around the ring: `EmbassyState` on target, `MockState`
/// in tests.
pub struct EventLog<S: SharedState<EventRing>> {
    ring: S,
}

impl<S: SharedState<EventRing>> EventLog<S> {
    /// Log over existing ring storage
    pub const fn new(ring: S) -> Self {
        Self { ring }
    }

    /// Number of events held
    pub fn len(&self) -> usize {
        self.ring.with(|ring| ring.buffer.len())
    }

    /// Whether no event is held
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Events lost to eviction
    pub fn overflow_count(&self) -> u32 {
        self.ring.with(|ring| ring.overflow_count)
    }

    /// Most recent event
    pub fn latest(&self) -> Option<KernelEvent> {
        self.ring.with(|ring| ring.buffer.recent().copied())
    }

    /// Copy of the held events, oldest first
    pub fn snapshot(&self) -> Vec<KernelEvent, EVENT_LOG_SIZE> {
        self.ring.with(|ring| {
            let mut events = Vec::new();
            for event in ring.buffer.oldest_ordered() {
                let _ = events.push(*event);
            }
            events
        })
    }

    /// Remove and return held events, oldest first.
    ///
    /// The overflow count survives.
    pub fn drain(&self) -> Vec<KernelEvent, EVENT_LOG_SIZE> {
        let events = self.snapshot();
        self.ring.with_mut(|ring| ring.buffer.clear());
        events
    }

    /// Events reported by `module_id` that did not succeed
    pub fn failures_for(&self, module_id: ModuleId) -> usize {
        self.ring.with(|ring| {
            ring.buffer
                .oldest_ordered()
                .filter(|e| e.module_id == module_id && !e.outcome.is_success())
                .count()
        })
    }
}

impl<S: SharedState<EventRing>> EventSink for EventLog<S> {
    #[allow(unused_variables)]
    fn emit_event(&self, module_id: ModuleId, op_code: OpCode, outcome: TaskOutcome) {
        match outcome {
            TaskOutcome::Done => {}
            TaskOutcome::Failed(code) => crate::log_warn!(
                "Module {} op {}: {} (code {})",
                module_id,
                op_code,
                crate::core::logging::outcome_label(outcome),
                code
            ),
            TaskOutcome::Hung => crate::log_error!(
                "Module {} op {}: peripheral hung",
                module_id,
                op_code
            ),
        }

        self.ring.with_mut(|ring| {
            ring.push(KernelEvent {
                module_id,
                op_code,
                outcome,
            })
        });
    }
}
