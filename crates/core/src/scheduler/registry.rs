//! Module callback registry
//!
//! Fixed-size table mapping a module id to the module's callback, together
//! with the per-module bookkeeping the pump maintains (last op code, last
//! outcome, dispatch count).

use super::error::SchedulerError;
use super::types::{ModuleId, OpCode, ProcessId, TaskMessage, TaskOutcome, MAX_MODULES};

/// A kernel subsystem that handles its own operation codes.
///
/// `on_task` runs from the main loop only, one task at a time. It receives
/// the task's message by value and a [`TaskContext`] through which it may
/// schedule follow-up work (including re-scheduling itself).
pub trait KernelModule {
    /// Handle one dispatched task.
    fn on_task(&self, msg: TaskMessage<'_>, tasks: &dyn TaskContext) -> TaskOutcome;

    /// Short name for diagnostics
    fn name(&self) -> &'static str {
        "module"
    }
}

/// Scheduler services available to module callbacks and interrupt handlers.
///
/// Implemented by [`Scheduler`](super::Scheduler); every method takes the
/// scheduler lock for the duration of the queue mutation only.
pub trait TaskContext {
    /// Current time in ms since startup
    fn now_ms(&self) -> u32;

    /// Queue a task; see [`Scheduler::schedule`](super::Scheduler::schedule).
    fn schedule(
        &self,
        module_id: ModuleId,
        op_code: OpCode,
        time: i32,
        periodic: bool,
        repeats: i32,
    ) -> Result<ProcessId, SchedulerError>;

    /// Queue a task together with its argument bytes in one step.
    fn schedule_with_args(
        &self,
        module_id: ModuleId,
        op_code: OpCode,
        time: i32,
        periodic: bool,
        repeats: i32,
        args: &[u8],
    ) -> Result<ProcessId, SchedulerError>;

    /// Append bytes to the task scheduled last.
    fn append_args(&self, bytes: &[u8]) -> Result<bool, SchedulerError>;

    /// Remove the first task matching module, op code and arguments.
    fn remove_task(&self, module_id: ModuleId, op_code: OpCode, args: &[u8]) -> bool;

    /// Remove the task with the given process id.
    fn remove_task_by_pid(&self, process_id: ProcessId) -> bool;
}

/// Optional collaborator notified after every dispatched task
pub trait EventSink {
    /// Report how a task ended.
    fn emit_event(&self, module_id: ModuleId, op_code: OpCode, outcome: TaskOutcome);
}

/// Registry slot for one module
#[derive(Clone, Copy)]
pub struct ModuleEntry<'a> {
    /// Registered callback
    pub module: &'a dyn KernelModule,
    /// Op code of the most recent dispatch
    pub last_op: Option<OpCode>,
    /// Outcome of the most recent dispatch
    pub last_outcome: Option<TaskOutcome>,
    /// Number of tasks dispatched to this module
    pub dispatch_count: u32,
}

impl<'a> ModuleEntry<'a> {
    fn new(module: &'a dyn KernelModule) -> Self {
        Self {
            module,
            last_op: None,
            last_outcome: None,
            dispatch_count: 0,
        }
    }
}

impl core::fmt::Debug for ModuleEntry<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ModuleEntry")
            .field("name", &self.module.name())
            .field("last_op", &self.last_op)
            .field("last_outcome", &self.last_outcome)
            .field("dispatch_count", &self.dispatch_count)
            .finish()
    }
}

/// Module id to callback table
#[derive(Debug)]
pub struct ModuleRegistry<'a> {
    entries: [Option<ModuleEntry<'a>>; MAX_MODULES],
}

impl<'a> ModuleRegistry<'a> {
    /// Empty registry
    pub const fn new() -> Self {
        Self {
            entries: [None; MAX_MODULES],
        }
    }

    /// Register a module under `module_id`.
    ///
    /// Registering an id again replaces the callback and resets its
    /// bookkeeping.
    ///
    /// # Errors
    ///
    /// Returns `SchedulerError::InvalidModule` if the id is outside the table.
    pub fn register(
        &mut self,
        module_id: ModuleId,
        module: &'a dyn KernelModule,
    ) -> Result<(), SchedulerError> {
        let slot = self
            .entries
            .get_mut(module_id as usize)
            .ok_or(SchedulerError::InvalidModule(module_id))?;
        *slot = Some(ModuleEntry::new(module));
        Ok(())
    }

    /// Remove a module; returns whether one was registered.
    pub fn unregister(&mut self, module_id: ModuleId) -> bool {
        self.entries
            .get_mut(module_id as usize)
            .and_then(Option::take)
            .is_some()
    }

    /// Callback registered under `module_id`
    pub fn module(&self, module_id: ModuleId) -> Option<&'a dyn KernelModule> {
        self.entry(module_id).map(|entry| entry.module)
    }

    /// Slot for `module_id`, including bookkeeping
    pub fn entry(&self, module_id: ModuleId) -> Option<&ModuleEntry<'a>> {
        self.entries.get(module_id as usize)?.as_ref()
    }

    /// Whether `module_id` has a callback
    pub fn is_registered(&self, module_id: ModuleId) -> bool {
        self.entry(module_id).is_some()
    }

    /// Store the result of a dispatch in the module's slot.
    pub fn record_outcome(&mut self, module_id: ModuleId, op_code: OpCode, outcome: TaskOutcome) {
        if let Some(Some(entry)) = self.entries.get_mut(module_id as usize) {
            entry.last_op = Some(op_code);
            entry.last_outcome = Some(outcome);
            entry.dispatch_count = entry.dispatch_count.wrapping_add(1);
        }
    }

    /// Registered modules in id order
    pub fn iter(&self) -> impl Iterator<Item = (ModuleId, &ModuleEntry<'a>)> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(id, entry)| entry.as_ref().map(|entry| (id as ModuleId, entry)))
    }

    /// Number of registered modules
    pub fn count(&self) -> usize {
        self.iter().count()
    }
}

impl Default for ModuleRegistry<'_> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str);

    impl KernelModule for Named {
        fn on_task(&self, _msg: TaskMessage<'_>, _tasks: &dyn TaskContext) -> TaskOutcome {
            TaskOutcome::Done
        }

        fn name(&self) -> &'static str {
            self.0
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let radar = Named("radar");
        let mut registry = ModuleRegistry::new();

        assert!(registry.module(2).is_none());
        registry.register(2, &radar).unwrap();

        assert!(registry.is_registered(2));
        assert_eq!(registry.module(2).map(|m| m.name()), Some("radar"));
        assert_eq!(registry.count(), 1);
    }

    #[test]
    fn test_register_out_of_range() {
        let radar = Named("radar");
        let mut registry = ModuleRegistry::new();

        assert_eq!(
            registry.register(MAX_MODULES as ModuleId, &radar),
            Err(SchedulerError::InvalidModule(MAX_MODULES as ModuleId))
        );
        assert!(registry.module(200).is_none());
    }

    #[test]
    fn test_last_writer_wins() {
        let first = Named("first");
        let second = Named("second");
        let mut registry = ModuleRegistry::new();

        registry.register(4, &first).unwrap();
        registry.record_outcome(4, 1, TaskOutcome::Done);
        registry.register(4, &second).unwrap();

        let entry = registry.entry(4).unwrap();
        assert_eq!(entry.module.name(), "second");
        assert_eq!(entry.dispatch_count, 0);
        assert_eq!(entry.last_outcome, None);
    }

    #[test]
    fn test_record_outcome_updates_bookkeeping() {
        let engines = Named("engines");
        let mut registry = ModuleRegistry::new();
        registry.register(1, &engines).unwrap();

        registry.record_outcome(1, 3, TaskOutcome::Done);
        registry.record_outcome(1, 5, TaskOutcome::Failed(2));

        let entry = registry.entry(1).unwrap();
        assert_eq!(entry.last_op, Some(5));
        assert_eq!(entry.last_outcome, Some(TaskOutcome::Failed(2)));
        assert_eq!(entry.dispatch_count, 2);

        // Unregistered ids are ignored
        registry.record_outcome(9, 1, TaskOutcome::Hung);
        assert!(registry.entry(9).is_none());
    }

    #[test]
    fn test_unregister() {
        let imu = Named("imu");
        let mut registry = ModuleRegistry::new();
        registry.register(3, &imu).unwrap();

        assert!(registry.unregister(3));
        assert!(!registry.unregister(3));
        assert!(!registry.unregister(250));
        assert_eq!(registry.count(), 0);
    }

    #[test]
    fn test_iter_in_id_order() {
        let a = Named("a");
        let b = Named("b");
        let mut registry = ModuleRegistry::new();
        registry.register(7, &b).unwrap();
        registry.register(1, &a).unwrap();

        let mut iter = registry.iter();
        assert_eq!(iter.next().map(|(id, e)| (id, e.module.name())), Some((1, "a")));
        assert_eq!(iter.next().map(|(id, e)| (id, e.module.name())), Some((7, "b")));
        assert!(iter.next().is_none());
    }
}
