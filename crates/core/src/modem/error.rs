//! Modem Error Types

use core::fmt;

use crate::scheduler::SchedulerError;

/// Errors returned by the modem engine and command helpers
///
/// Protocol-level failures (ERROR/FAIL/timeout replies) are not errors here;
/// they come back as [`ModemStatus`](super::ModemStatus) bits for the caller
/// to interpret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModemError {
    /// The serial link rejected a write
    Link,
    /// Formatted command exceeds the command buffer
    CommandTooLong,
    /// Socket id outside the chip's range or not open
    InvalidSocket(u8),
    /// Payload larger than one send accepts
    PayloadTooLarge(usize),
    /// Deferring work to the scheduler failed
    Scheduler(SchedulerError),
}

impl fmt::Display for ModemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModemError::Link => write!(f, "Modem link write failed"),
            ModemError::CommandTooLong => write!(f, "AT command too long"),
            ModemError::InvalidSocket(id) => write!(f, "Invalid socket {}", id),
            ModemError::PayloadTooLarge(len) => write!(f, "Payload too large: {} bytes", len),
            ModemError::Scheduler(e) => write!(f, "Scheduler error: {}", e),
        }
    }
}

impl From<SchedulerError> for ModemError {
    fn from(e: SchedulerError) -> Self {
        ModemError::Scheduler(e)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use std::format;

    use super::*;

    #[test]
    fn test_modem_error_display() {
        assert_eq!(format!("{}", ModemError::Link), "Modem link write failed");
        assert_eq!(format!("{}", ModemError::InvalidSocket(7)), "Invalid socket 7");
        assert_eq!(
            format!("{}", ModemError::PayloadTooLarge(4096)),
            "Payload too large: 4096 bytes"
        );
        assert_eq!(
            format!("{}", ModemError::from(SchedulerError::OutOfMemory)),
            "Scheduler error: Task queue out of memory"
        );
    }
}
