//! The capability a run drives: something that executes one request.
use barrage_core::Outcome;
use std::convert::Infallible;
use std::error::Error as StdError;
use std::future::Future;

/// Identifies a single attempt within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestContext {
    /// Index of the worker issuing the request, `0..concurrency`.
    pub worker: usize,
    /// Per-worker sequence number, starting at zero.
    pub attempt: u64,
}

/// Executes exactly one logical request against a target and classifies it.
///
/// Each worker owns its issuer, so calls on one instance never overlap. The
/// engine measures latency around `execute` and enforces the configured
/// request timeout, so implementations only decide what counts as a success,
/// an overload signal, or an error.
pub trait Issuer: Send + 'static {
    fn execute(&mut self, ctx: &RequestContext) -> impl Future<Output = Outcome> + Send;
}

/// Produces one [`Issuer`] per worker before the run starts.
///
/// A failed `connect` is fatal: the run is aborted before any worker issues a
/// request.
pub trait IssuerFactory: Send + Sync {
    type Issuer: Issuer;
    type Error: StdError + Send + Sync + 'static;

    fn connect(
        &self,
        worker: usize,
    ) -> impl Future<Output = Result<Self::Issuer, Self::Error>> + Send;
}

/// Hands every worker a clone of the same issuer, e.g. one pooled HTTP client.
#[derive(Debug, Clone)]
pub struct Shared<I>(pub I);

impl<I> IssuerFactory for Shared<I>
where
    I: Issuer + Clone + Sync,
{
    type Issuer = I;
    type Error = Infallible;

    async fn connect(&self, _worker: usize) -> Result<I, Infallible> {
        Ok(self.0.clone())
    }
}
