use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, error::Elapsed, timeout_at};

/// Default idle deadline for every read and write.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Per-connection idle deadline.
///
/// The deadline is rearmed before each I/O operation and every suspension
/// point is wrapped in [`IdleTimer::guard`]. The timer lives inside the
/// connection's own future, so once the connection is gone there is nothing
/// left that could fire against it.
#[derive(Debug, Clone)]
pub struct IdleTimer {
    timeout: Duration,
    deadline: Instant,
}

impl IdleTimer {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            deadline: Instant::now() + timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Pushes the deadline to `timeout` from now.
    pub fn rearm(&mut self) {
        self.deadline = Instant::now() + self.timeout;
    }

    /// Runs `fut` until it completes or the current deadline passes.
    pub async fn guard<F: Future>(&self, fut: F) -> Result<F::Output, Elapsed> {
        timeout_at(self.deadline, fut).await
    }
}

impl Default for IdleTimer {
    fn default() -> Self {
        Self::new(DEFAULT_IDLE_TIMEOUT)
    }
}
