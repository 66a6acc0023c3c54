//! Modem response status flags and token vocabulary

use bitflags::bitflags;

bitflags! {
    /// Tokens seen in the responses to the current command
    ///
    /// Parsing ORs the flags of every token found; the receive interrupt
    /// accumulates them until the command reaches a terminal state.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ModemStatus: u32 {
        /// Generic success terminator
        const OK = 1 << 0;
        /// Generic error terminator (also forced by the watchdog)
        const ERROR = 1 << 1;
        /// Command failed (join, send)
        const FAIL = 1 << 2;
        /// Chip busy processing a previous command
        const BUSY = 1 << 3;
        /// Chip finished booting
        const READY = 1 << 4;
        /// Joined the access point
        const WIFI_CONNECTED = 1 << 5;
        /// Lost the access point
        const WIFI_DISCONNECTED = 1 << 6;
        /// Payload transmitted
        const SEND_OK = 1 << 7;
        /// Generic success reply of some configuration commands
        const SUCCESS = 1 << 8;
        /// Chip waits for payload bytes
        const DATA_PROMPT = 1 << 9;
        /// A socket was opened
        const CONNECT = 1 << 10;
        /// A socket was closed
        const CLOSED = 1 << 11;
        /// An IP address literal was parsed
        const IP_ADDRESS = 1 << 12;
        /// Inbound socket data was stored
        const IPD = 1 << 13;
        /// The watchdog aborted the exchange
        const TIMEOUT = 1 << 14;
    }
}

impl ModemStatus {
    /// Flags that end any command exchange
    pub const TERMINAL: ModemStatus = ModemStatus::OK.union(ModemStatus::ERROR);

    /// Flags that mean the exchange did not succeed
    pub const FAILURE: ModemStatus = ModemStatus::ERROR
        .union(ModemStatus::FAIL)
        .union(ModemStatus::TIMEOUT);

    /// Whether the exchange ended badly
    pub fn is_failure(&self) -> bool {
        self.intersects(Self::FAILURE)
    }

    /// Whether `OK` arrived and nothing went wrong
    pub fn succeeded(&self) -> bool {
        self.contains(Self::OK) && !self.is_failure()
    }
}

/// Plain substring tokens, in scan order.
///
/// `,CONNECT`, `,CLOSED`, `ip:"` and `+IPD,` carry side effects and are
/// handled by the parser itself.
pub(crate) const TOKENS: &[(&[u8], ModemStatus)] = &[
    (b"OK", ModemStatus::OK),
    (b"ERROR", ModemStatus::ERROR),
    (b"FAIL", ModemStatus::FAIL),
    (b"busy", ModemStatus::BUSY),
    (b"ready", ModemStatus::READY),
    (b"READY", ModemStatus::READY),
    (b"WIFI CONNECTED", ModemStatus::WIFI_CONNECTED),
    (b"WIFI DISCONNECT", ModemStatus::WIFI_DISCONNECTED),
    (b"SEND OK", ModemStatus::SEND_OK),
    (b"SUCCESS", ModemStatus::SUCCESS),
    (b"> ", ModemStatus::DATA_PROMPT),
];

pub(crate) const CONNECT_TOKEN: &[u8] = b",CONNECT";
pub(crate) const CLOSED_TOKEN: &[u8] = b",CLOSED";
pub(crate) const IP_TOKEN: &[u8] = b"ip:\"";
pub(crate) const IPD_TOKEN: &[u8] = b"+IPD,";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_flags() {
        assert!(ModemStatus::TERMINAL.contains(ModemStatus::OK));
        assert!(ModemStatus::TERMINAL.contains(ModemStatus::ERROR));
        assert!(!ModemStatus::TERMINAL.contains(ModemStatus::SEND_OK));
    }

    #[test]
    fn test_succeeded() {
        assert!(ModemStatus::OK.succeeded());
        assert!((ModemStatus::OK | ModemStatus::CONNECT).succeeded());
        assert!(!(ModemStatus::OK | ModemStatus::TIMEOUT).succeeded());
        assert!(!ModemStatus::empty().succeeded());
        assert!(ModemStatus::FAIL.is_failure());
    }

    #[test]
    fn test_bits_round_trip_through_word() {
        let status = ModemStatus::ERROR | ModemStatus::TIMEOUT;
        assert_eq!(ModemStatus::from_bits_truncate(status.bits()), status);
    }
}
