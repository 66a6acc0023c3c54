//! Mock Timer implementation for testing

use crate::platform::traits::TimerInterface;

/// Mock timer with simulated time, stepped by tests
#[derive(Debug, Default)]
pub struct MockTimer {
    now_us: u64,
}

impl MockTimer {
    /// Create a new mock timer at t = 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Step simulated time forward.
    pub fn advance_ms(&mut self, ms: u32) {
        self.now_us = self.now_us.wrapping_add(u64::from(ms) * 1000);
    }
}

impl TimerInterface for MockTimer {
    fn now_us(&self) -> u64 {
        self.now_us
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_ms() {
        let mut timer = MockTimer::new();
        timer.advance_ms(250);
        assert_eq!(timer.now_ms(), 250);
    }
}
