//! Platform abstraction layer
//!
//! Board peripherals the kernel depends on, behind traits, plus the global
//! time base. Board crates implement the traits; host tests use `mock`.

pub mod error;
pub mod time;
pub mod traits;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use error::{PlatformError, Result};
pub use time::{TickDriver, TIME_BASE};
pub use traits::{TimerInterface, UartInterface, UartIrqControl};
