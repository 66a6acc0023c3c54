//! Scheduler Error Types

use core::fmt;

/// Errors returned by the task queue and scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerError {
    /// Heap exhausted while allocating a queue slot or growing task arguments
    OutOfMemory,
    /// Module id outside the registry table
    InvalidModule(u8),
    /// Traversal count disagreed with the size counter while dropping the queue
    QueueCorrupted {
        /// Size counter before the drop
        expected: usize,
        /// Nodes actually reachable from the head
        found: usize,
    },
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulerError::OutOfMemory => write!(f, "Task queue out of memory"),
            SchedulerError::InvalidModule(id) => write!(f, "Invalid module id {}", id),
            SchedulerError::QueueCorrupted { expected, found } => write!(
                f,
                "Task queue corrupted: size counter {} but {} nodes reachable",
                expected, found
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use std::format;

    use super::*;

    #[test]
    fn test_scheduler_error_display() {
        assert_eq!(
            format!("{}", SchedulerError::OutOfMemory),
            "Task queue out of memory"
        );
        assert_eq!(
            format!("{}", SchedulerError::InvalidModule(42)),
            "Invalid module id 42"
        );
        assert_eq!(
            format!(
                "{}",
                SchedulerError::QueueCorrupted {
                    expected: 3,
                    found: 2
                }
            ),
            "Task queue corrupted: size counter 3 but 2 nodes reachable"
        );
    }
}
