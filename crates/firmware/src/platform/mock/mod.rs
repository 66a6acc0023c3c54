//! Mock platform implementation for testing
//!
//! Host-side stand-ins for the board peripherals, available under
//! `#[cfg(test)]` or with the `mock` feature.
//!
//! # Example
//!
//! ```
//! use rover_kernel_firmware::platform::mock::MockUart;
//! use rover_kernel_firmware::platform::traits::UartInterface;
//!
//! let mut uart = MockUart::new();
//! uart.write(b"AT\r\n").unwrap();
//! assert_eq!(uart.tx_buffer(), b"AT\r\n");
//! ```

#![cfg(any(test, feature = "mock"))]

mod timer;
mod uart;

pub use timer::MockTimer;
pub use uart::MockUart;
