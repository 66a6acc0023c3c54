//! Critical-section backed shared state.
//!
//! Scheduler and modem state are touched from both the main loop and
//! interrupt handlers. On target every access runs inside a critical
//! section; host tests use the core crate's `MockState` instead.

pub use rover_kernel_core::traits::{MockState, SharedState};

#[cfg(feature = "embassy")]
use embassy_sync::blocking_mutex::{raw::CriticalSectionRawMutex, Mutex};

/// Shared state guarded by Embassy's critical-section mutex.
///
/// `const fn new` allows it to live in a `static`, which is how interrupt
/// handlers reach the scheduler and modem engine.
#[cfg(feature = "embassy")]
pub struct EmbassyState<T> {
    inner: Mutex<CriticalSectionRawMutex, core::cell::RefCell<T>>,
}

#[cfg(feature = "embassy")]
impl<T> EmbassyState<T> {
    /// Wraps `value`.
    pub const fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(core::cell::RefCell::new(value)),
        }
    }
}

#[cfg(feature = "embassy")]
impl<T> SharedState<T> for EmbassyState<T> {
    fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        self.inner.lock(|cell| f(&cell.borrow()))
    }

    fn with_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R,
    {
        self.inner.lock(|cell| f(&mut cell.borrow_mut()))
    }
}
