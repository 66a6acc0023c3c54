//! Mock UART implementation for testing

extern crate alloc;

use alloc::vec::Vec;

use crate::platform::{
    error::UartError,
    traits::{UartInterface, UartIrqControl},
    PlatformError, Result,
};

/// Mock UART with in-memory FIFOs
///
/// Also records receive interrupt state so tests can check how the modem
/// engine drives it.
#[derive(Debug, Default)]
pub struct MockUart {
    tx_buffer: Vec<u8>,
    rx_buffer: Vec<u8>,
    rx_irq_enabled: bool,
    rx_irq_pended: u32,
    fail_writes: bool,
    overrun_pending: bool,
}

impl MockUart {
    /// Create a new mock UART
    pub fn new() -> Self {
        Self::default()
    }

    /// Get transmitted data (for test verification)
    pub fn tx_buffer(&self) -> &[u8] {
        &self.tx_buffer
    }

    /// Clear transmit buffer
    pub fn clear_tx_buffer(&mut self) {
        self.tx_buffer.clear();
    }

    /// Inject receive data (for test setup)
    pub fn inject_rx_data(&mut self, data: &[u8]) {
        self.rx_buffer.extend_from_slice(data);
    }

    /// Make writes fail with `UartError::WriteFailed`
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Make the next read report `UartError::Overrun`
    pub fn inject_overrun(&mut self) {
        self.overrun_pending = true;
    }

    pub fn rx_irq_enabled(&self) -> bool {
        self.rx_irq_enabled
    }

    /// Times the receive interrupt was pended by software
    pub fn rx_irq_pended(&self) -> u32 {
        self.rx_irq_pended
    }
}

impl UartInterface for MockUart {
    fn write(&mut self, data: &[u8]) -> Result<usize> {
        if self.fail_writes {
            return Err(PlatformError::Uart(UartError::WriteFailed));
        }
        self.tx_buffer.extend_from_slice(data);
        Ok(data.len())
    }

    fn read(&mut self, buffer: &mut [u8]) -> Result<usize> {
        if core::mem::take(&mut self.overrun_pending) {
            return Err(PlatformError::Uart(UartError::Overrun));
        }

        let to_read = core::cmp::min(buffer.len(), self.rx_buffer.len());

        buffer[..to_read].copy_from_slice(&self.rx_buffer[..to_read]);
        self.rx_buffer.drain(..to_read);

        Ok(to_read)
    }

    fn available(&self) -> bool {
        !self.rx_buffer.is_empty()
    }
}

impl UartIrqControl for MockUart {
    fn set_rx_interrupt(&mut self, enabled: bool) {
        self.rx_irq_enabled = enabled;
    }

    fn pend_rx_interrupt(&mut self) {
        self.rx_irq_pended += 1;
    }
}
