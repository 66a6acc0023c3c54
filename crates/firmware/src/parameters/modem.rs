//! Modem Parameter Definitions
//!
//! Network settings for the AT-command WiFi modem.
//!
//! # Parameters
//!
//! - `ssid` - access point name (max 32 chars)
//! - `password` - WPA2 passphrase (max 63 chars)
//! - `server_port` - TCP port the modem listens on in server mode
//! - `command_timeout_ms` - default watchdog timeout for one command
//!
//! Defaults come from the build environment (`WIFI_SSID`, `WIFI_PASSWORD`,
//! `MODEM_SERVER_PORT`, `MODEM_TIMEOUT_MS`); values that do not parse or do
//! not fit fall back to the constants below.

use heapless::String;

use crate::platform::{PlatformError, Result};

/// Maximum SSID length (IEEE 802.11 standard)
pub const MAX_SSID_LEN: usize = 32;

/// Maximum WiFi password length (WPA2 standard)
pub const MAX_PASSWORD_LEN: usize = 63;

/// Fallback listening port
pub const DEFAULT_SERVER_PORT: u16 = 333;

/// Fallback command timeout
pub const DEFAULT_TIMEOUT_MS: u32 = 2_000;

/// Modem network configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModemParams {
    pub ssid: String<MAX_SSID_LEN>,
    pub password: String<MAX_PASSWORD_LEN>,
    pub server_port: u16,
    pub command_timeout_ms: u32,
}

impl ModemParams {
    /// Parameters from the build-time environment
    pub fn from_env() -> Self {
        Self::from_values(
            env!("WIFI_SSID"),
            env!("WIFI_PASSWORD"),
            env!("MODEM_SERVER_PORT"),
            env!("MODEM_TIMEOUT_MS"),
        )
    }

    /// Parse raw setting strings, falling back per field.
    pub fn from_values(ssid: &str, password: &str, port: &str, timeout_ms: &str) -> Self {
        let ssid = String::try_from(ssid).unwrap_or_else(|_| {
            crate::log_warn!("SSID longer than {} bytes, ignored", MAX_SSID_LEN);
            String::new()
        });
        let password = String::try_from(password).unwrap_or_else(|_| {
            crate::log_warn!("Password longer than {} bytes, ignored", MAX_PASSWORD_LEN);
            String::new()
        });

        let server_port = port
            .trim()
            .parse::<u16>()
            .ok()
            .filter(|p| *p != 0)
            .unwrap_or(DEFAULT_SERVER_PORT);
        let command_timeout_ms = timeout_ms
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|t| *t != 0)
            .unwrap_or(DEFAULT_TIMEOUT_MS);

        Self {
            ssid,
            password,
            server_port,
            command_timeout_ms,
        }
    }

    /// Whether there is an access point to join
    pub fn has_credentials(&self) -> bool {
        !self.ssid.is_empty()
    }

    /// Reject settings the modem cannot use.
    ///
    /// Quotes would break the `AT+CWJAP_CUR="ssid","password"` framing.
    pub fn validate(&self) -> Result<()> {
        if !self.has_credentials() {
            return Err(PlatformError::InvalidConfig);
        }
        if self.ssid.contains('"') || self.password.contains('"') {
            return Err(PlatformError::InvalidConfig);
        }
        Ok(())
    }
}

impl Default for ModemParams {
    fn default() -> Self {
        Self::from_values("", "", "", "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_values() {
        let params = ModemParams::from_values("rover-net", "secret", "8080", "1500");
        assert_eq!(params.ssid.as_str(), "rover-net");
        assert_eq!(params.password.as_str(), "secret");
        assert_eq!(params.server_port, 8080);
        assert_eq!(params.command_timeout_ms, 1500);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_fallbacks() {
        let params = ModemParams::from_values("", "", "not-a-port", "0");
        assert_eq!(params.server_port, DEFAULT_SERVER_PORT);
        assert_eq!(params.command_timeout_ms, DEFAULT_TIMEOUT_MS);
        assert!(!params.has_credentials());
        assert_eq!(params.validate(), Err(PlatformError::InvalidConfig));
    }

    #[test]
    fn test_oversized_ssid_is_dropped() {
        let long = "x".repeat(MAX_SSID_LEN + 1);
        let params = ModemParams::from_values(&long, "pw", "1", "1");
        assert!(params.ssid.is_empty());
        assert_eq!(params.password.as_str(), "pw");
    }

    #[test]
    fn test_quote_rejected() {
        let params = ModemParams::from_values("bad\"ssid", "pw", "80", "100");
        assert_eq!(params.validate(), Err(PlatformError::InvalidConfig));
    }

    #[test]
    fn test_from_env_parses() {
        // Whatever the build environment holds, the numbers are usable
        let params = ModemParams::from_env();
        assert_ne!(params.server_port, 0);
        assert_ne!(params.command_timeout_ms, 0);
    }
}
