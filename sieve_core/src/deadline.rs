//! Racing asynchronous work against a timer.
//!
//! [`with_deadline`] races a single operation; [`Deadline`] is one clock
//! shared by a whole batch of operations that all have to finish before the
//! same instant.

use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, Sleep};

/// The timer won the race.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("deadline of {0:?} elapsed")]
pub struct TimedOut(pub Duration);

impl From<TimedOut> for crate::error::RenderError {
    fn from(err: TimedOut) -> Self {
        crate::error::RenderError::Timeout(err.0)
    }
}

/// Run `operation` against a timer of `limit`.
///
/// If the operation settles first its output (including an error it
/// returned) is passed through and the timer is dropped. If the timer fires
/// first the operation future is dropped, which cancels it at its next
/// suspension point, and `TimedOut` is returned without waiting for any
/// cleanup.
pub async fn with_deadline<F, T>(limit: Duration, operation: F) -> Result<T, TimedOut>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(limit, operation)
        .await
        .map_err(|_| TimedOut(limit))
}

/// A fixed instant that several concurrent operations race against.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
    budget: Duration,
}

impl Deadline {
    pub fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now() + budget,
            budget,
        }
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Time left before the deadline, zero once it has passed.
    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    /// A timer that completes at the shared instant. Every call anchors to
    /// the same instant, so any number of timers behave as one clock.
    pub fn sleep(&self) -> Sleep {
        tokio::time::sleep_until(self.at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_operation_wins() {
        let out = with_deadline(Duration::from_secs(5), async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            Ok::<_, String>(42)
        })
        .await;
        assert_eq!(out, Ok(Ok(42)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_operation_error_passes_through() {
        let out = with_deadline(Duration::from_secs(5), async { Err::<u8, _>("boom") }).await;
        assert_eq!(out, Ok(Err("boom")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_wins_and_cancels() {
        let finished = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&finished);
        let out = with_deadline(Duration::from_secs(2), async move {
            tokio::time::sleep(Duration::from_secs(10)).await;
            flag.store(true, Ordering::SeqCst);
        })
        .await;
        assert_eq!(out, Err(TimedOut(Duration::from_secs(2))));

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert!(!finished.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shared_deadline_remaining() {
        let deadline = Deadline::after(Duration::from_secs(20));
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(deadline.remaining(), Duration::from_secs(15));

        deadline.sleep().await;
        assert_eq!(deadline.remaining(), Duration::ZERO);
        assert_eq!(deadline.budget(), Duration::from_secs(20));
    }
}
