use std::time::Duration;

/// Fixed-interval retry policy
///
/// Intervals do not grow between attempts. A budget of zero attempts is
/// treated as a single attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    interval: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }

    /// Budget for asserting that no further activity happens
    pub fn no_activity() -> Self {
        Self::new(12, Duration::from_secs(10))
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Number of invocations the executor will make at most
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Upper bound on the time spent waiting between attempts
    pub fn total_wait(&self) -> Duration {
        self.interval * (self.max_attempts() - 1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(100, Duration::from_secs(10))
    }
}
