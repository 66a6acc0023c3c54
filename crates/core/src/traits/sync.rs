//! Synchronized state abstraction for structures shared with interrupt handlers.
//!
//! The task queue, the module registry and the modem line buffer are touched
//! from both the main loop and interrupt context. Every access goes through
//! [`SharedState`], whose firmware implementation masks interrupts for the
//! duration of the closure. Host tests use [`MockState`].

/// Platform-agnostic synchronized state access.
///
/// Implementations:
/// - `EmbassyState<T>` (firmware crate): critical-section mutex, interrupts
///   masked while the closure runs
/// - [`MockState<T>`]: `RefCell` for single-threaded host testing
///
/// Closures must be short and must not call back into code that locks the
/// same state; the scheduler releases its lock before invoking any module
/// callback for that reason.
///
/// # Example
///
/// ```
/// use rover_kernel_core::traits::{MockState, SharedState};
///
/// fn bump<S: SharedState<u32>>(state: &S) -> u32 {
///     state.with_mut(|v| {
///         *v += 1;
///         *v
///     })
/// }
///
/// let state = MockState::new(41);
/// assert_eq!(bump(&state), 42);
/// ```
pub trait SharedState<T> {
    /// Access state immutably.
    fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R;

    /// Access state mutably.
    fn with_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R;
}

/// Mock synchronized state using `RefCell` for single-threaded testing.
///
/// # Panics
///
/// Panics if borrowing rules are violated (e.g. a re-entrant `with_mut`
/// from inside another `with_mut`). That is a locking bug in the caller.
#[derive(Debug, Default)]
pub struct MockState<T> {
    inner: core::cell::RefCell<T>,
}

impl<T> MockState<T> {
    /// Creates a new `MockState` wrapping the given value.
    pub const fn new(value: T) -> Self {
        Self {
            inner: core::cell::RefCell::new(value),
        }
    }

    /// Consumes the wrapper and returns the inner value.
    pub fn into_inner(self) -> T {
        self.inner.into_inner()
    }
}

impl<T> SharedState<T> for MockState<T> {
    fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        f(&self.inner.borrow())
    }

    fn with_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R,
    {
        f(&mut self.inner.borrow_mut())
    }
}
