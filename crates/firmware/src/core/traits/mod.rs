//! Core traits bound to firmware implementations.
//!
//! The kernel crate defines the abstractions; this module supplies the
//! critical-section backed state used on target.
//!
//! ```text
//!            rover_kernel_core                      firmware
//!  ┌──────────────────────────────┐    ┌──────────────────────────────┐
//!  │ TimeSource   (TimeBase)      │───▶│ platform::time::TIME_BASE    │
//!  │ SharedState<T>               │───▶│ EmbassyState<T>              │
//!  │ MockState<T> (host tests)    │    │                              │
//!  └──────────────────────────────┘    └──────────────────────────────┘
//! ```

pub mod sync;

#[cfg(feature = "embassy")]
pub use sync::EmbassyState;
pub use sync::{MockState, SharedState};
pub use rover_kernel_core::traits::{TimeBase, TimeSource};
