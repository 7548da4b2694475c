//! Run deadline threaded through every outbound call
//!
//! A [`Deadline`] is an instant plus a cancellation token. Wrapping a call in
//! [`Deadline::run`] drops the call's future (aborting it) as soon as either
//! fires, and reports the abort as [`Error::Timeout`] or [`Error::Cancelled`].

use crate::error::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct Deadline {
    at: Instant,
    token: CancellationToken,
}

impl Deadline {
    /// Deadline `timeout` from now with a fresh token
    pub fn after(timeout: Duration) -> Self {
        Self::with_token(timeout, CancellationToken::new())
    }

    /// Deadline `timeout` from now, also cancelled by `token`
    pub fn with_token(timeout: Duration, token: CancellationToken) -> Self {
        Self {
            at: Instant::now() + timeout,
            token,
        }
    }

    /// A tighter deadline: the earlier of this one and `timeout` from now
    ///
    /// Cancelling `self` also cancels the child.
    pub fn child(&self, timeout: Duration) -> Self {
        Self {
            at: self.at.min(Instant::now() + timeout),
            token: self.token.child_token(),
        }
    }

    /// Abort every call running under this deadline
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Time left before expiry
    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    /// Run `call`, aborting it on expiry or cancellation
    pub async fn run<T, F>(&self, operation: &str, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(Error::cancelled(operation)),
            result = tokio::time::timeout_at(self.at, call) => {
                result.unwrap_or_else(|_| Err(Error::timeout(operation)))
            }
        }
    }
}
