use crate::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Per-call context handed to every backend operation.
///
/// The only thing it carries today is an optional deadline. When present it
/// bounds the whole remote round trip (connect, write, read); when absent the
/// backend's own transport timeouts are the only bound.
#[derive(Clone, Copy, Debug, Default)]
pub struct Context {
    deadline: Option<Instant>,
}

impl Context {
    /// A context without a deadline.
    pub fn background() -> Self {
        Self { deadline: None }
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, `None` when there is no deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|deadline| deadline <= Instant::now())
    }

    /// Drive `fut` to completion within the deadline.
    ///
    /// An already expired context fails with [`Error::Timeout`] without
    /// polling `fut`, so no I/O is started. On expiry mid-flight the future
    /// is dropped, which cancels the in-flight request.
    pub async fn run<F, T>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match self.deadline {
            None => fut.await,
            Some(deadline) => {
                if deadline <= Instant::now() {
                    tracing::debug!("deadline already elapsed, skipping call");
                    return Err(Error::Timeout);
                }
                tokio::time::timeout_at(deadline, fut)
                    .await
                    .map_err(|_| Error::Timeout)?
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn test_background_has_no_deadline() {
        let ctx = Context::background();
        assert!(ctx.deadline().is_none());
        assert!(ctx.remaining().is_none());
        assert!(!ctx.is_expired());
    }

    #[tokio::test]
    async fn test_expired_context_never_polls() {
        let ctx = Context::with_deadline(Instant::now() - Duration::from_millis(1));
        let polled = Arc::new(AtomicBool::new(false));
        let flag = polled.clone();

        let result = ctx
            .run(async move {
                flag.store(true, Ordering::SeqCst);
                Ok(())
            })
            .await;

        assert!(matches!(result, Err(Error::Timeout)));
        assert!(!polled.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_cuts_slow_future() {
        let ctx = Context::with_timeout(Duration::from_millis(50));

        let result = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok(42)
            })
            .await;

        assert!(matches!(result, Err(Error::Timeout)));
    }

    #[tokio::test]
    async fn test_fast_future_completes_within_deadline() {
        let ctx = Context::with_timeout(Duration::from_secs(5));
        let value = ctx.run(async { Ok("done") }).await.unwrap();
        assert_eq!(value, "done");
        assert!(ctx.remaining().unwrap() <= Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_inner_error_passes_through() {
        let ctx = Context::with_timeout(Duration::from_secs(5));
        let result: Result<()> = ctx.run(async { Err(Error::NotFound) }).await;
        assert!(matches!(result, Err(Error::NotFound)));
    }
}
