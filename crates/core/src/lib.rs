//! rover_kernel_core - Pure no_std kernel logic for the rover controller
//!
//! This crate contains the cooperative task scheduler and the WiFi modem
//! protocol engine. Both are platform-agnostic and can be tested on host
//! without any feature flags or Embassy dependencies.
//!
//! # Design Principles
//!
//! - **Zero cfg**: No `#[cfg(feature = ...)]` directives allowed
//! - **Pure no_std**: Only `core` and `alloc` (task argument payloads are heap-backed)
//! - **Trait abstractions**: Clock, critical sections, serial link and watchdog
//!   are injected via traits
//!
//! # Modules
//!
//! - [`traits`]: Platform-agnostic trait abstractions (TimeSource, SharedState)
//! - [`scheduler`]: Time-ordered task queue, module registry and the pump
//! - [`modem`]: AT-command engine, response parser and socket table

#![no_std]

extern crate alloc;

pub mod modem;
pub mod scheduler;
pub mod traits;
