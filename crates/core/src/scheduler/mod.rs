//! Cooperative run-to-completion task scheduler
//!
//! Deferred work is described by [`TaskEntry`] values held in a time-ordered
//! [`TaskQueue`]. The main loop calls [`Scheduler::pump`] once per iteration;
//! every task whose execution time has come is popped and dispatched to the
//! [`KernelModule`] registered under its module id.
//!
//! # Components
//!
//! - [`types`]: Task entries, messages, outcomes and pump reports
//! - [`queue`]: Arena-backed sorted task list
//! - [`registry`]: Module id to callback table
//! - [`executor`]: The scheduler itself (schedule, append, pump, remove)
//! - [`error`]: Scheduler error type
//!
//! # Example
//!
//! ```
//! use rover_kernel_core::scheduler::{
//!     KernelModule, Scheduler, SchedulerState, TaskContext, TaskMessage, TaskOutcome,
//! };
//! use rover_kernel_core::traits::{MockState, TimeBase};
//!
//! struct Blinker;
//!
//! impl KernelModule for Blinker {
//!     fn on_task(&self, msg: TaskMessage<'_>, _tasks: &dyn TaskContext) -> TaskOutcome {
//!         assert_eq!(msg.op_code, 1);
//!         TaskOutcome::Done
//!     }
//! }
//!
//! let time = TimeBase::new(100);
//! let blinker = Blinker;
//! let scheduler = Scheduler::new(MockState::new(SchedulerState::new()), &time);
//! scheduler.register_module(2, &blinker).unwrap();
//!
//! scheduler.schedule(2, 1, -500, false, 0).unwrap();
//! time.advance(500);
//! assert_eq!(scheduler.pump().executed, 1);
//! ```

pub mod error;
pub mod executor;
pub mod queue;
pub mod registry;
pub mod types;

pub use error::SchedulerError;
pub use executor::{Scheduler, SchedulerState};
pub use queue::{TaskHandle, TaskQueue};
pub use registry::{EventSink, KernelModule, ModuleEntry, ModuleRegistry, TaskContext};
pub use types::*;
