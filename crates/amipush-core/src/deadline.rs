//! Shared deadline for one publish invocation
//!
//! The whole workflow runs under a single time budget. Upload, import and
//! registration calls are all raced against the same instant, and the import
//! poll loop also checks it between status queries. The embedded
//! cancellation token lets an operator interrupt (Ctrl-C) reach every stage
//! through the same handle.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{Phase, PublishError, PublishResult};

#[derive(Debug, Clone)]
pub struct Deadline {
    at: Instant,
    token: CancellationToken,
}

impl Deadline {
    /// Deadline `timeout` from now
    pub fn after(timeout: Duration) -> Self {
        Self::with_token(timeout, CancellationToken::new())
    }

    pub fn with_token(timeout: Duration, token: CancellationToken) -> Self {
        Self {
            at: Instant::now() + timeout,
            token,
        }
    }

    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    pub fn is_elapsed(&self) -> bool {
        Instant::now() >= self.at
    }

    /// Run `fut` unless the deadline passes or the token is cancelled first.
    pub async fn run<F>(&self, phase: Phase, fut: F) -> PublishResult<F::Output>
    where
        F: Future,
    {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(PublishError::Cancelled { phase }),
            res = tokio::time::timeout_at(self.at, fut) => {
                res.map_err(|_| PublishError::DeadlineExceeded { phase })
            }
        }
    }

    /// Sleep for `duration`, waking early only on cancellation.
    pub async fn sleep(&self, phase: Phase, duration: Duration) -> PublishResult<()> {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(PublishError::Cancelled { phase }),
            _ = tokio::time::sleep(duration) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_run_completes_within_deadline() {
        let deadline = Deadline::after(Duration::from_secs(10));
        let value = deadline
            .run(Phase::Upload, async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                7
            })
            .await
            .unwrap();
        assert_eq!(value, 7);
        assert!(!deadline.is_elapsed());
        assert_eq!(deadline.remaining(), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_reports_deadline_exceeded() {
        let deadline = Deadline::after(Duration::from_secs(10));
        let err = deadline
            .run(Phase::Register, async {
                tokio::time::sleep(Duration::from_secs(30)).await;
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PublishError::DeadlineExceeded {
                phase: Phase::Register
            }
        ));
        assert!(deadline.is_elapsed());
        assert_eq!(deadline.remaining(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_wins() {
        let token = CancellationToken::new();
        let deadline = Deadline::with_token(Duration::from_secs(600), token.clone());
        token.cancel();

        let err = deadline
            .run(Phase::Upload, std::future::pending::<()>())
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::Cancelled { phase: Phase::Upload }));

        let err = deadline
            .sleep(Phase::Import, Duration::from_secs(60))
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::Cancelled { phase: Phase::Import }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_clones_share_the_same_budget() {
        let deadline = Deadline::after(Duration::from_secs(120));
        let clone = deadline.clone();
        tokio::time::sleep(Duration::from_secs(100)).await;
        assert_eq!(clone.remaining(), Duration::from_secs(20));
        assert_eq!(deadline.remaining(), clone.remaining());
    }
}
