//! WiFi modem on a UART
//!
//! Binds the kernel's [`ModemEngine`] to a board UART and the kernel tick:
//!
//! - [`UartModemLink`]: the engine's byte link over any UART
//! - [`DeadlineWatchdog`]: command timeouts measured on the time base
//! - [`bring_up`]: reset, join and listen sequence at boot
//!
//! [`ModemEngine`]: rover_kernel_core::modem::ModemEngine

pub mod bring_up;
pub mod uart_link;
pub mod watchdog;

pub use bring_up::bring_up;
pub use uart_link::UartModemLink;
pub use watchdog::{service_watchdog, DeadlineWatchdog};
