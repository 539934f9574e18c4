use crate::error::OciError;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Per-call cancellation and deadline.
///
/// Cloning shares the cancellation token, so cancelling a clone cancels every
/// call using it.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an existing token, e.g. a child of a shutdown token.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Deadline `timeout` from now, spanning every attempt and backoff sleep.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    #[must_use]
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Fail if the context is already cancelled or past its deadline.
    pub(crate) fn check(&self, started: Instant) -> Result<(), OciError> {
        if self.cancel.is_cancelled() {
            return Err(OciError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                Err(OciError::DeadlineExceeded(started.elapsed()))
            }
            _ => Ok(()),
        }
    }

    /// Drive `fut` unless the context is cancelled or the deadline passes first.
    pub(crate) async fn guard<T, F>(&self, started: Instant, fut: F) -> Result<T, OciError>
    where
        F: Future<Output = Result<T, OciError>>,
    {
        let deadline = async {
            match self.deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(OciError::Cancelled),
            () = deadline => Err(OciError::DeadlineExceeded(started.elapsed())),
            result = fut => result,
        }
    }

    /// Sleep for `delay`, cut short by cancellation or the deadline.
    pub(crate) async fn sleep(&self, started: Instant, delay: Duration) -> Result<(), OciError> {
        self.guard(started, async {
            tokio::time::sleep(delay).await;
            Ok(())
        })
        .await
    }
}
