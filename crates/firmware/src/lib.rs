#![cfg_attr(not(test), no_std)]

//! rover_kernel_firmware - platform glue for the rover kernel
//!
//! Binds the hardware-independent scheduler and modem engine in
//! `rover_kernel_core` to a board.
//!
//! # Design Principles
//!
//! - **Platform traits**: UART and timer access behind traits, mocked on host
//! - **Critical sections**: `EmbassyState` guards state shared with interrupts
//! - **Logging**: `log_*!` macros over defmt, println in host tests
//! - **Embassy glue**: tick task and main loop behind the `embassy` feature

// Platform abstraction layer (UART, timer, time base)
pub mod platform;

// Modem adapters over platform peripherals
pub mod devices;

// Kernel services: logging, event log, scheduler monitor, main loop
pub mod core;

// Build-time configuration
pub mod parameters;

// Note: Logging macros (log_info!, log_warn!, log_error!, log_debug!, log_trace!)
// are exported at crate root via #[macro_export] in core::logging
