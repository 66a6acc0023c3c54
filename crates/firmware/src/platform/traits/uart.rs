//! UART interface traits
//!
//! The WiFi modem hangs off a UART. Boards provide byte I/O through
//! [`UartInterface`] and receive interrupt control through [`UartIrqControl`].

use crate::platform::Result;

/// Byte-level UART access
///
/// One owner per peripheral. On target the owner is the modem state, which
/// only runs inside a critical section.
pub trait UartInterface {
    /// Write `data`, returning the number of bytes accepted.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Uart` if the write operation fails.
    fn write(&mut self, data: &[u8]) -> Result<usize>;

    /// Read up to `buffer.len()` bytes without blocking.
    ///
    /// Returns the number of bytes actually read, zero when the receive FIFO
    /// is empty.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Uart(UartError::Overrun)` when received bytes
    /// were lost.
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize>;

    /// Whether at least one byte can be read without blocking
    fn available(&self) -> bool;
}

/// Receive interrupt control
///
/// The modem engine parses responses from the UART receive interrupt and
/// needs to switch it on and off, or re-trigger it after a watchdog expiry.
pub trait UartIrqControl {
    /// Enable or disable the receive interrupt
    fn set_rx_interrupt(&mut self, enabled: bool);

    /// Mark the receive interrupt pending so its handler runs again
    fn pend_rx_interrupt(&mut self);
}
