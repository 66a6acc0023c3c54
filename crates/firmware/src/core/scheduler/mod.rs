//! Task scheduler
//!
//! The scheduler itself lives in `rover_kernel_core`; this module re-exports
//! it and adds the firmware-side health monitor.

pub mod monitor;

pub use monitor::{collect_and_report_stats, MonitorSummary};
pub use rover_kernel_core::scheduler::*;
