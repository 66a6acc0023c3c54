//! UART-backed modem link

use rover_kernel_core::modem::{ModemError, ModemLink};

use crate::platform::traits::{UartInterface, UartIrqControl};

/// Scratch size used when flushing stale input
const DISCARD_CHUNK: usize = 32;

/// [`ModemLink`] over a platform UART
///
/// Receive errors (overruns) are counted and read as "no byte"; the
/// parser recovers on the next line or the command watchdog fires.
pub struct UartModemLink<U> {
    uart: U,
    rx_errors: u32,
}

impl<U: UartInterface + UartIrqControl> UartModemLink<U> {
    pub const fn new(uart: U) -> Self {
        Self { uart, rx_errors: 0 }
    }

    pub fn uart(&self) -> &U {
        &self.uart
    }

    pub fn uart_mut(&mut self) -> &mut U {
        &mut self.uart
    }

    /// Receive errors seen so far
    pub fn rx_errors(&self) -> u32 {
        self.rx_errors
    }

    pub fn into_inner(self) -> U {
        self.uart
    }
}

impl<U: UartInterface + UartIrqControl> ModemLink for UartModemLink<U> {
    fn write(&mut self, bytes: &[u8]) -> Result<usize, ModemError> {
        let written = self.uart.write(bytes).map_err(|e| {
            crate::log_error!("Modem UART write failed");
            ModemError::from(e)
        })?;
        if written < bytes.len() {
            crate::log_warn!("Modem UART short write: {} of {}", written, bytes.len());
            return Err(ModemError::Link);
        }
        Ok(written)
    }

    fn read_byte(&mut self) -> Option<u8> {
        let mut byte = [0u8; 1];
        match self.uart.read(&mut byte) {
            Ok(1) => Some(byte[0]),
            Ok(_) => None,
            Err(_) => {
                self.rx_errors = self.rx_errors.wrapping_add(1);
                None
            }
        }
    }

    fn discard_input(&mut self) {
        let mut scratch = [0u8; DISCARD_CHUNK];
        while self.uart.available() {
            match self.uart.read(&mut scratch) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
        }
    }

    fn set_rx_interrupt(&mut self, enabled: bool) {
        self.uart.set_rx_interrupt(enabled);
    }

    fn pend_rx_interrupt(&mut self) {
        self.uart.pend_rx_interrupt();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::MockUart;

    fn link() -> UartModemLink<MockUart> {
        UartModemLink::new(MockUart::new())
    }

    #[test]
    fn test_write_passes_through() {
        let mut link = link();
        assert_eq!(link.write(b"AT\r\n"), Ok(4));
        assert_eq!(link.uart().tx_buffer(), b"AT\r\n");
    }

    #[test]
    fn test_write_failure_maps_to_link_error() {
        let mut link = link();
        link.uart_mut().set_fail_writes(true);
        assert_eq!(link.write(b"AT"), Err(ModemError::Link));
    }

    #[test]
    fn test_read_byte_by_byte() {
        let mut link = link();
        link.uart_mut().inject_rx_data(b"OK");
        assert_eq!(link.read_byte(), Some(b'O'));
        assert_eq!(link.read_byte(), Some(b'K'));
        assert_eq!(link.read_byte(), None);
        assert_eq!(link.rx_errors(), 0);
    }

    #[test]
    fn test_overrun_counts_and_reads_nothing() {
        let mut link = link();
        link.uart_mut().inject_rx_data(b"OK");
        link.uart_mut().inject_overrun();

        assert_eq!(link.read_byte(), None);
        assert_eq!(link.rx_errors(), 1);
        assert_eq!(link.read_byte(), Some(b'O'));
    }

    #[test]
    fn test_discard_input_empties_fifo() {
        let mut link = link();
        link.uart_mut().inject_rx_data(&[b'x'; 100]);
        link.discard_input();
        assert!(!link.uart().available());
    }

    #[test]
    fn test_irq_control_forwarded() {
        let mut link = link();
        link.set_rx_interrupt(true);
        link.pend_rx_interrupt();
        assert!(link.uart().rx_irq_enabled());
        assert_eq!(link.uart().rx_irq_pended(), 1);
    }
}
