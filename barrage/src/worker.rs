use crate::aggregator::Aggregator;
use crate::deadline::Deadline;
use crate::issuer::{Issuer, RequestContext};
use barrage_core::{Attempt, Outcome, RunConfig};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

/// Per-run knobs every worker reads.
pub(crate) struct WorkerSettings {
    timeout: Option<Duration>,
    error_backoff: Option<Duration>,
    limiter: Option<DefaultDirectRateLimiter>,
}

impl WorkerSettings {
    pub fn from_config(config: &RunConfig) -> Self {
        Self {
            timeout: config.request_timeout(),
            error_backoff: config.error_backoff(),
            limiter: config.rate_limit().map(rate_limiter),
        }
    }
}

/// Issue requests until the deadline expires. Returns the number of attempts
/// recorded.
pub(crate) async fn run_worker<I: Issuer>(
    worker: usize,
    mut issuer: I,
    deadline: Deadline,
    aggregator: Arc<Aggregator>,
    settings: Arc<WorkerSettings>,
) -> u64 {
    let mut attempts = 0;

    loop {
        if deadline.is_expired() {
            break;
        }

        if let Some(limiter) = &settings.limiter {
            tokio::select! {
                biased;
                _ = deadline.expired() => break,
                _ = limiter.until_ready() => {}
            }
            if deadline.is_expired() {
                break;
            }
        }

        let ctx = RequestContext {
            worker,
            attempt: attempts,
        };
        let attempt = issue(&mut issuer, &ctx, settings.timeout).await;
        aggregator.record(attempt.outcome, attempt.latency);
        attempts += 1;

        if attempt.outcome == Outcome::Error {
            if let Some(backoff) = settings.error_backoff {
                tokio::select! {
                    _ = deadline.expired() => break,
                    _ = tokio::time::sleep(backoff) => {}
                }
            }
        }

        // NOTE: An issuer that never awaits would otherwise starve its siblings.
        tokio::task::yield_now().await;
    }

    debug!(worker, attempts, "Worker stopped");
    attempts
}

/// Execute one request, timing it and applying the optional timeout.
pub(crate) async fn issue<I: Issuer>(
    issuer: &mut I,
    ctx: &RequestContext,
    timeout: Option<Duration>,
) -> Attempt {
    let start = Instant::now();
    let outcome = match timeout {
        Some(limit) => match tokio::time::timeout(limit, issuer.execute(ctx)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                trace!(worker = ctx.worker, "Request timed out after {limit:?}");
                Outcome::Error
            }
        },
        None => issuer.execute(ctx).await,
    };
    Attempt::new(outcome, start.elapsed())
}

fn rate_limiter(rate: NonZeroU32) -> DefaultDirectRateLimiter {
    RateLimiter::direct(Quota::per_second(rate).allow_burst(NonZeroU32::MIN))
}
