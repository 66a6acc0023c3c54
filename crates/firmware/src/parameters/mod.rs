//! Runtime configuration
//!
//! Build-time defaults for the WiFi modem, injected by `build.rs` from the
//! environment.

pub mod modem;

pub use modem::ModemParams;
