use std::time::Duration;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Decides how long to wait before the next status poll.
pub trait PollStrategy: Send + Sync {
    /// `attempt` counts the non-terminal polls seen so far, starting at 0.
    fn next_poll_delay(&self, attempt: u32) -> Duration;
}

/// Constant delay between polls, with no cap on the number of polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedInterval {
    pub interval: Duration,
}

impl FixedInterval {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Default for FixedInterval {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl PollStrategy for FixedInterval {
    fn next_poll_delay(&self, _attempt: u32) -> Duration {
        self.interval
    }
}
