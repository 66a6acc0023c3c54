//! Device drivers
//!
//! Adapters that bind kernel protocol engines to platform peripherals.

pub mod modem;
