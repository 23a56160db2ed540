// cardhopper/src/cancel.rs

//! Cooperative cancellation with a recorded cause.
//!
//! A [`CancelContext`] is a cheap, cloneable handle around a
//! [`CancellationToken`]. Whoever cancels it first decides the [`Cause`];
//! later cancellations do not overwrite it. Child contexts are cancelled
//! together with their parent and report the parent's cause.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use derive_more::Display;
use tokio_util::sync::CancellationToken;

/// Why a context was cancelled.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum Cause {
    /// Plain [`CancelContext::cancel`]
    #[display(fmt = "context canceled")]
    Canceled,
    /// The context's timeout elapsed
    #[display(fmt = "context deadline exceeded")]
    DeadlineExceeded,
    /// Caller-supplied reason
    #[display(fmt = "{}", _0)]
    Custom(String),
}

/// Cancellation handle passed to every blocking operation.
#[derive(Debug, Clone)]
pub struct CancelContext {
    token: CancellationToken,
    cause: Arc<OnceLock<Cause>>,
    parent: Option<Box<CancelContext>>,
}

impl Default for CancelContext {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelContext {
    /// Live root context.
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            cause: Arc::new(OnceLock::new()),
            parent: None,
        }
    }

    /// Derive a context that is cancelled whenever `self` is, but can also
    /// be cancelled on its own without affecting `self`.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            cause: Arc::new(OnceLock::new()),
            parent: Some(Box::new(self.clone())),
        }
    }

    /// Derive a child context that cancels itself with
    /// [`Cause::DeadlineExceeded`] once `timeout` elapses.
    ///
    /// Must be called from within a tokio runtime.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let child = self.child();
        let timer = child.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = timer.token.cancelled() => {}
                _ = tokio::time::sleep(timeout) => {
                    timer.cancel_with_cause(Cause::DeadlineExceeded);
                }
            }
        });
        child
    }

    /// Cancel with [`Cause::Canceled`].
    pub fn cancel(&self) {
        self.cancel_with_cause(Cause::Canceled);
    }

    /// Cancel with `cause`, unless already cancelled.
    pub fn cancel_with_cause(&self, cause: Cause) {
        let _ = self.cause.set(cause);
        self.token.cancel();
    }

    /// True once this context or an ancestor was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// The cause of cancellation, or `None` while the context is live.
    pub fn cause(&self) -> Option<Cause> {
        if !self.is_cancelled() {
            return None;
        }
        if let Some(cause) = self.cause.get() {
            return Some(cause.clone());
        }
        match &self.parent {
            Some(parent) => parent.cause(),
            None => Some(Cause::Canceled),
        }
    }

    /// Wait until the context is cancelled.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    /// Error value describing this context's cancellation.
    pub fn err(&self) -> crate::Error {
        crate::Error::Cancelled(self.cause().unwrap_or(Cause::Canceled))
    }

    /// Drive `fut` to completion unless the context is cancelled first, in
    /// which case `fut` is dropped and the cancellation error returned.
    pub async fn run<T, F>(&self, fut: F) -> crate::Result<T>
    where
        F: std::future::Future<Output = crate::Result<T>>,
    {
        tokio::select! {
            biased;
            _ = self.cancelled() => Err(self.err()),
            res = fut => res,
        }
    }

    /// `Err` with the cancellation cause if the context is already cancelled.
    pub fn check(&self) -> crate::Result<()> {
        if self.is_cancelled() {
            return Err(self.err());
        }
        Ok(())
    }
}
