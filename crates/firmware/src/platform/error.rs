//! Platform error types
//!
//! This module defines error types for platform operations.

use core::fmt;

use rover_kernel_core::modem::ModemError;

/// Result type for platform operations
pub type Result<T> = core::result::Result<T, PlatformError>;

/// Platform-level errors
///
/// All platform implementations map their HAL-specific errors to these variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformError {
    /// UART operation failed
    Uart(UartError),
    /// Modem bring-up failed
    InitializationFailed,
    /// Invalid configuration provided
    InvalidConfig,
}

/// UART-specific errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UartError {
    /// Write operation failed
    WriteFailed,
    /// Received bytes were lost
    Overrun,
}

impl fmt::Display for PlatformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlatformError::Uart(e) => write!(f, "UART error: {:?}", e),
            PlatformError::InitializationFailed => write!(f, "Modem initialization failed"),
            PlatformError::InvalidConfig => write!(f, "Invalid configuration"),
        }
    }
}

impl From<UartError> for PlatformError {
    fn from(error: UartError) -> Self {
        PlatformError::Uart(error)
    }
}

// The modem engine only distinguishes "the link failed"
impl From<PlatformError> for ModemError {
    fn from(_: PlatformError) -> Self {
        ModemError::Link
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            format!("{}", PlatformError::Uart(UartError::Overrun)),
            "UART error: Overrun"
        );
        assert_eq!(
            format!("{}", PlatformError::InvalidConfig),
            "Invalid configuration"
        );
    }

    #[test]
    fn test_into_modem_error() {
        let err: ModemError = PlatformError::from(UartError::WriteFailed).into();
        assert_eq!(err, ModemError::Link);
    }
}
