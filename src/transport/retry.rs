//! Retry hook at the transport seam.
//!
//! The mapping layer never retries. Wrap a transport in [`Retrying`] to
//! retry transport-level failures according to a [`RetryPolicy`].

use std::time::Duration;

use super::Transport;
use crate::lazy::Filter;
use crate::model::{Document, NodeId, ReleaseStatus};
use crate::{Error, Result};

/// Decides whether a failed call is tried again.
pub trait RetryPolicy {
    /// Delay before the next attempt, or `None` to give up.
    /// `attempt` is the 1-based number of the attempt that just failed.
    fn retry_after(&self, attempt: u32, error: &Error) -> Option<Duration>;
}

/// Never retry.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRetry;

impl RetryPolicy for NoRetry {
    fn retry_after(&self, _attempt: u32, _error: &Error) -> Option<Duration> {
        None
    }
}

/// Retry [`Error::Transport`] failures up to `max_attempts` in total,
/// waiting `delay` between attempts.
#[derive(Debug, Clone, Copy)]
pub struct FixedRetry {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl FixedRetry {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self { max_attempts, delay }
    }
}

impl RetryPolicy for FixedRetry {
    fn retry_after(&self, attempt: u32, error: &Error) -> Option<Duration> {
        (error.is_transport() && attempt < self.max_attempts).then_some(self.delay)
    }
}

/// A transport that retries the calls of another one.
#[derive(Debug, Clone)]
pub struct Retrying<T, P> {
    inner: T,
    policy: P,
}

impl<T: Transport, P: RetryPolicy> Retrying<T, P> {
    pub fn new(inner: T, policy: P) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    fn run<R>(&self, op: &'static str, mut call: impl FnMut() -> Result<R>) -> Result<R> {
        let mut attempt = 1;
        loop {
            match call() {
                Ok(value) => return Ok(value),
                Err(err) => match self.policy.retry_after(attempt, &err) {
                    Some(delay) => {
                        tracing::warn!(op, attempt, error = %err, "transport call failed, retrying");
                        if !delay.is_zero() {
                            std::thread::sleep(delay);
                        }
                        attempt += 1;
                    }
                    None => return Err(err),
                },
            }
        }
    }
}

impl<T: Transport, P: RetryPolicy> Transport for Retrying<T, P> {
    fn get_by_id(&self, id: &NodeId, scope: ReleaseStatus) -> Result<Option<Document>> {
        self.run("get_by_id", || self.inner.get_by_id(id, scope))
    }

    fn filter(
        &self,
        type_uri: &str,
        filter: &Filter,
        space: Option<&str>,
        scope: ReleaseStatus,
    ) -> Result<Vec<Document>> {
        self.run("filter", || self.inner.filter(type_uri, filter, space, scope))
    }

    fn create(&self, type_uri: &str, document: Document, space: &str) -> Result<Document> {
        self.run("create", || self.inner.create(type_uri, document.clone(), space))
    }

    fn update(&self, id: &NodeId, document: Document) -> Result<Document> {
        self.run("update", || self.inner.update(id, document.clone()))
    }
}
