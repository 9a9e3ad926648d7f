use crate::ConfigError;
#[cfg(feature = "serde")]
use serde::Serialize;
#[allow(unused_imports)]
#[cfg(feature = "serde")]
use serde_with::{serde_as, DurationMilliSecondsWithFrac};
use std::num::{NonZeroU32, NonZeroUsize};
use std::time::Duration;

/// Configuration for a single load run.
///
/// Built once, validated on construction, and never mutated afterwards. The
/// `target` is an opaque descriptor: the engine only logs and reports it, the
/// issuer decides what it means.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", cfg_eval::cfg_eval, serde_as)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct RunConfig {
    name: String,
    concurrency: NonZeroUsize,
    #[cfg_attr(feature = "serde", serde_as(as = "DurationMilliSecondsWithFrac<f64>"))]
    duration: Duration,
    target: String,
    #[cfg_attr(
        feature = "serde",
        serde_as(as = "Option<DurationMilliSecondsWithFrac<f64>>")
    )]
    request_timeout: Option<Duration>,
    rate_limit: Option<NonZeroU32>,
    #[cfg_attr(
        feature = "serde",
        serde_as(as = "Option<DurationMilliSecondsWithFrac<f64>>")
    )]
    error_backoff: Option<Duration>,
}

impl RunConfig {
    pub fn new(
        name: &str,
        target: &str,
        concurrency: usize,
        duration: Duration,
    ) -> Result<Self, ConfigError> {
        let concurrency = NonZeroUsize::new(concurrency).ok_or(ConfigError::ZeroConcurrency)?;
        if target.trim().is_empty() {
            return Err(ConfigError::EmptyTarget);
        }

        Ok(Self {
            name: name.to_string(),
            concurrency,
            duration,
            target: target.to_string(),
            request_timeout: None,
            rate_limit: None,
            error_backoff: None,
        })
    }

    /// Upper bound on a single request. Requests exceeding it count as errors.
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Result<Self, ConfigError> {
        if timeout == Some(Duration::ZERO) {
            return Err(ConfigError::ZeroTimeout);
        }
        self.request_timeout = timeout;
        Ok(self)
    }

    /// Global requests-per-second cap shared by every worker.
    pub fn with_rate_limit(mut self, rate_limit: Option<NonZeroU32>) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    /// Pause a worker takes after a failed request before issuing the next one.
    pub fn with_error_backoff(mut self, backoff: Option<Duration>) -> Self {
        self.error_backoff = backoff.filter(|b| !b.is_zero());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn concurrency(&self) -> NonZeroUsize {
        self.concurrency
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }

    pub fn rate_limit(&self) -> Option<NonZeroU32> {
        self.rate_limit
    }

    pub fn error_backoff(&self) -> Option<Duration> {
        self.error_backoff
    }
}
