//! Firmware-side kernel services
//!
//! Logging, the event log sink, critical-section state and the main loop.
//! The scheduler and traits re-export `rover_kernel_core` so firmware code
//! can reach everything through `crate::core`.

pub mod event_log;
pub mod kernel;
pub mod logging;
pub mod scheduler;
pub mod traits;

pub use event_log::{EventLog, EventRing, KernelEvent, EVENT_LOG_SIZE};
pub use kernel::{run_pump_cycle, sleep_budget_ms};
pub use rover_kernel_core::modem;
