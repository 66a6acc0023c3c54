//! Core traits for platform-agnostic kernel functionality.
//!
//! This module provides trait abstractions that decouple the scheduler and
//! the modem engine from platform-specific implementations (Embassy, etc.).
//!
//! # Design
//!
//! - Trait definitions are pure and have no feature gates
//! - Mock implementations are always available for host testing
//! - Platform implementations (Embassy critical sections, hardware tick
//!   interrupt) live in the firmware crate

pub mod sync;
pub mod time;

pub use sync::{MockState, SharedState};
pub use time::{TimeBase, TimeSource};
