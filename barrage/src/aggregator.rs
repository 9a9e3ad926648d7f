//! Shared accumulation of request outcomes.
use barrage_core::{Counters, Outcome};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Concurrent accumulator for a single run.
///
/// Counters are plain atomics so that recording an outcome never waits on
/// another worker. Latency samples go into a mutex-guarded vector; the lock is
/// only held for the push itself.
pub struct Aggregator {
    total: AtomicU64,
    success: AtomicU64,
    throttled: AtomicU64,
    errors: AtomicU64,
    samples: Mutex<Vec<Duration>>,
    #[cfg(feature = "metrics")]
    metrics: metrics_support::OutcomeMetrics,
}

impl Aggregator {
    pub fn new(run_name: &str) -> Self {
        #[cfg(not(feature = "metrics"))]
        let _ = run_name;

        Self {
            total: AtomicU64::new(0),
            success: AtomicU64::new(0),
            throttled: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            samples: Mutex::new(Vec::new()),
            #[cfg(feature = "metrics")]
            metrics: metrics_support::OutcomeMetrics::new(run_name),
        }
    }

    /// Record one attempt. Bumps exactly one outcome counter plus the total,
    /// and keeps the latency if the outcome is countable.
    pub fn record(&self, outcome: Outcome, latency: Duration) {
        let bucket = match outcome {
            Outcome::Success => &self.success,
            Outcome::Throttled => &self.throttled,
            Outcome::Error => &self.errors,
        };
        bucket.fetch_add(1, Ordering::Relaxed);
        self.total.fetch_add(1, Ordering::Relaxed);

        if outcome.is_countable() {
            self.samples
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(latency);
        }

        #[cfg(feature = "metrics")]
        self.metrics.record(outcome, latency);
    }

    /// Current counter values. Only guaranteed to balance once every writer
    /// has been joined.
    pub fn counters(&self) -> Counters {
        Counters {
            total: self.total.load(Ordering::Relaxed),
            success: self.success.load(Ordering::Relaxed),
            throttled: self.throttled.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }

    /// Take the final counters and samples. Call after all workers joined.
    pub fn finish(&self) -> (Counters, Vec<Duration>) {
        let samples = std::mem::take(
            &mut *self
                .samples
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        (self.counters(), samples)
    }
}

#[cfg(feature = "metrics")]
mod metrics_support {
    use barrage_core::Outcome;
    use metrics::{Counter, Histogram, Unit};
    use std::time::Duration;

    pub(super) const REQUESTS: &str = "barrage_requests_total";
    pub(super) const LATENCY: &str = "barrage_request_latency_seconds";

    pub(super) struct OutcomeMetrics {
        success: Counter,
        throttled: Counter,
        error: Counter,
        latency: Histogram,
    }

    impl OutcomeMetrics {
        pub fn new(run_name: &str) -> Self {
            metrics::describe_counter!(REQUESTS, Unit::Count, "Requests issued, by outcome");
            metrics::describe_histogram!(LATENCY, Unit::Seconds, "Latency of every request");

            let run = run_name.to_string();
            Self {
                success: metrics::counter!(REQUESTS, "run" => run.clone(), "outcome" => "success"),
                throttled: metrics::counter!(REQUESTS, "run" => run.clone(), "outcome" => "throttled"),
                error: metrics::counter!(REQUESTS, "run" => run.clone(), "outcome" => "error"),
                latency: metrics::histogram!(LATENCY, "run" => run),
            }
        }

        pub fn record(&self, outcome: Outcome, latency: Duration) {
            match outcome {
                Outcome::Success => self.success.increment(1),
                Outcome::Throttled => self.throttled.increment(1),
                Outcome::Error => self.error.increment(1),
            }
            self.latency.record(latency.as_secs_f64());
        }
    }
}
