//! Scripted modem link and watchdog for host testing
//!
//! [`MockLink`] records everything written and can answer commands with
//! canned replies; the replies sit in the receive queue until the test runs
//! the receive interrupt handler.

use alloc::collections::VecDeque;
use alloc::vec::Vec;

use super::engine::{ModemLink, Watchdog};
use super::error::ModemError;

/// Scripted serial link
#[derive(Debug, Default)]
pub struct MockLink {
    tx: Vec<u8>,
    rx: VecDeque<u8>,
    replies: Vec<(Vec<u8>, Vec<u8>)>,
    rx_enabled: bool,
    pend_count: u32,
    fail_writes: bool,
}

impl MockLink {
    /// Idle link with nothing scripted
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes as if the chip had sent them.
    pub fn inject(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes.iter().copied());
    }

    /// Answer the next write that starts with `command` by injecting `reply`.
    ///
    /// Each script entry fires once, in registration order.
    pub fn respond_to(&mut self, command: &[u8], reply: &[u8]) {
        self.replies.push((command.to_vec(), reply.to_vec()));
    }

    /// Make every write fail.
    pub fn fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Bytes written so far
    pub fn tx(&self) -> &[u8] {
        &self.tx
    }

    /// Forget written bytes.
    pub fn clear_tx(&mut self) {
        self.tx.clear();
    }

    /// Whether the receive interrupt is enabled
    pub fn rx_enabled(&self) -> bool {
        self.rx_enabled
    }

    /// Bytes waiting to be read
    pub fn pending_rx(&self) -> usize {
        self.rx.len()
    }

    /// Times the receive interrupt was pended by software
    pub fn pend_count(&self) -> u32 {
        self.pend_count
    }
}

impl ModemLink for MockLink {
    fn write(&mut self, bytes: &[u8]) -> Result<usize, ModemError> {
        if self.fail_writes {
            return Err(ModemError::Link);
        }
        self.tx.extend_from_slice(bytes);

        if let Some(index) = self
            .replies
            .iter()
            .position(|(command, _)| bytes.starts_with(command))
        {
            let (_, reply) = self.replies.remove(index);
            self.rx.extend(reply);
        }
        Ok(bytes.len())
    }

    fn read_byte(&mut self) -> Option<u8> {
        self.rx.pop_front()
    }

    fn discard_input(&mut self) {
        self.rx.clear();
    }

    fn set_rx_interrupt(&mut self, enabled: bool) {
        self.rx_enabled = enabled;
    }

    fn pend_rx_interrupt(&mut self) {
        self.pend_count += 1;
    }
}

/// Watchdog that only records its state
#[derive(Debug, Default)]
pub struct MockWatchdog {
    armed: Option<u32>,
    arm_count: u32,
}

impl MockWatchdog {
    /// Disarmed watchdog
    pub fn new() -> Self {
        Self::default()
    }

    /// Timeout of the running countdown
    pub fn armed(&self) -> Option<u32> {
        self.armed
    }

    /// Times the watchdog was armed
    pub fn arm_count(&self) -> u32 {
        self.arm_count
    }
}

impl Watchdog for MockWatchdog {
    fn arm(&mut self, timeout_ms: u32) {
        self.armed = Some(timeout_ms);
        self.arm_count += 1;
    }

    fn disarm(&mut self) {
        self.armed = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_reply_fires_once() {
        let mut link = MockLink::new();
        link.respond_to(b"AT+CIPMUX", b"OK\r\n");

        link.write(b"AT+CIPMUX=1").unwrap();
        link.write(b"AT+CIPMUX=1").unwrap();
        assert_eq!(link.pending_rx(), 4);
        assert_eq!(link.tx(), b"AT+CIPMUX=1AT+CIPMUX=1");
    }

    #[test]
    fn test_read_in_order() {
        let mut link = MockLink::new();
        link.inject(b"ab");
        assert_eq!(link.read_byte(), Some(b'a'));
        assert_eq!(link.read_byte(), Some(b'b'));
        assert_eq!(link.read_byte(), None);
    }

    #[test]
    fn test_watchdog_records() {
        let mut watchdog = MockWatchdog::new();
        watchdog.arm(300);
        assert_eq!(watchdog.armed(), Some(300));
        watchdog.disarm();
        assert_eq!(watchdog.armed(), None);
        assert_eq!(watchdog.arm_count(), 1);
    }
}
