//! Fixed-interval polling.

use crate::error::{Result, RunwayVizError};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Outcome of one poll attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStep<T> {
    /// The operation reached a terminal state.
    Ready(T),
    /// Not done yet; poll again after the interval.
    Pending,
}

/// How often and how many times to poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    /// Wait between two consecutive attempts.
    pub interval: Duration,
    /// Maximum number of attempts.
    pub max_attempts: u32,
}

impl PollSchedule {
    /// Creates a schedule.
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    /// Upper bound on the time spent sleeping between attempts.
    pub fn ceiling(&self) -> Duration {
        self.interval * self.max_attempts.max(1).saturating_sub(1)
    }
}

impl Default for PollSchedule {
    /// 3 seconds apart, at most 100 times (about 5 minutes).
    fn default() -> Self {
        Self::new(Duration::from_secs(3), 100)
    }
}

/// Calls `poll` until it yields [`PollStep::Ready`], fails, or runs out of
/// attempts.
///
/// `poll` receives the 1-based attempt number. Between pending attempts the
/// task sleeps for `schedule.interval`; nothing is held across the sleep.
/// Exhaustion yields [`RunwayVizError::Timeout`]. A `max_attempts` of zero is
/// treated as one.
pub async fn poll_with_interval<T, F, Fut>(schedule: PollSchedule, mut poll: F) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<PollStep<T>>>,
{
    let max_attempts = schedule.max_attempts.max(1);
    let start = Instant::now();

    for attempt in 1..=max_attempts {
        if let PollStep::Ready(value) = poll(attempt).await? {
            return Ok(value);
        }
        if attempt < max_attempts {
            tokio::time::sleep(schedule.interval).await;
        }
    }

    Err(RunwayVizError::Timeout {
        attempts: max_attempts,
        waited: start.elapsed(),
    })
}
