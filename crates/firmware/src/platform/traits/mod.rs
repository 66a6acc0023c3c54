//! Platform abstraction traits
//!
//! Peripheral interfaces the kernel needs from a board: a UART for the WiFi
//! modem and a free-running timer for the tick.

pub mod timer;
pub mod uart;

pub use timer::TimerInterface;
pub use uart::{UartInterface, UartIrqControl};
