//! Logging abstraction
//!
//! Unified logging macros for every build of the kernel:
//! - Target with the `defmt` feature: forwards to `defmt`
//! - Host tests: `println!` / `eprintln!`
//! - Anything else: no-op
//!
//! Arguments must be `defmt::Format` as well as `Display`, so log plain
//! integers and `&str` labels rather than kernel types.

/// Log informational message
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::info!($($arg)*);

        #[cfg(all(not(feature = "defmt"), test))]
        println!("[INFO] {}", format!($($arg)*));
    }};
}

/// Log warning message
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::warn!($($arg)*);

        #[cfg(all(not(feature = "defmt"), test))]
        println!("[WARN] {}", format!($($arg)*));
    }};
}

/// Log error message
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::error!($($arg)*);

        #[cfg(all(not(feature = "defmt"), test))]
        eprintln!("[ERROR] {}", format!($($arg)*));
    }};
}

/// Log debug message
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::debug!($($arg)*);

        #[cfg(all(not(feature = "defmt"), test))]
        println!("[DEBUG] {}", format!($($arg)*));
    }};
}

/// Log trace message
#[macro_export]
macro_rules! log_trace {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::trace!($($arg)*);

        #[cfg(all(not(feature = "defmt"), test))]
        println!("[TRACE] {}", format!($($arg)*));
    }};
}

/// Short label for a task outcome, usable as a log argument
pub fn outcome_label(outcome: rover_kernel_core::scheduler::TaskOutcome) -> &'static str {
    use rover_kernel_core::scheduler::TaskOutcome;

    match outcome {
        TaskOutcome::Done => "done",
        TaskOutcome::Failed(_) => "failed",
        TaskOutcome::Hung => "hung",
    }
}
