//! Run orchestration: connect, spawn, join, report.
use crate::aggregator::Aggregator;
use crate::deadline::Deadline;
use crate::error::RunError;
use crate::issuer::IssuerFactory;
use crate::report::Report;
use crate::worker::{run_worker, WorkerSettings};
use barrage_core::RunConfig;
use std::future::{self, Future};
use std::sync::Arc;
use tokio::time::Instant;
#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, trace, warn, Instrument};

/// Drive `factory`'s issuers for the configured duration and report.
pub async fn run<F>(config: &RunConfig, factory: &F) -> Result<Report, RunError>
where
    F: IssuerFactory,
{
    run_until(config, factory, future::pending()).await
}

/// Like [`run`], but expires the deadline early once `interrupt` completes.
///
/// Requests already in flight when the interrupt fires are allowed to finish
/// and are included in the report.
#[instrument(name = "run", skip_all, fields(run = config.name(), url = config.target()))]
pub async fn run_until<F, S>(config: &RunConfig, factory: &F, interrupt: S) -> Result<Report, RunError>
where
    F: IssuerFactory,
    S: Future<Output = ()> + Send + 'static,
{
    let concurrency = config.concurrency().get();

    let mut issuers = Vec::with_capacity(concurrency);
    for worker in 0..concurrency {
        match factory.connect(worker).await {
            Ok(issuer) => issuers.push(issuer),
            Err(err) => {
                warn!("Worker {worker} failed to connect: {err}");
                return Err(RunError::Setup {
                    worker,
                    source: Box::new(err),
                });
            }
        }
    }

    info!(
        "Running {concurrency} workers for {}",
        humantime::format_duration(config.duration())
    );

    let aggregator = Arc::new(Aggregator::new(config.name()));
    let settings = Arc::new(WorkerSettings::from_config(config));
    // Taken before arming so elapsed never undercounts the configured duration.
    let start = Instant::now();
    let deadline = Deadline::arm(config.duration());

    let watcher = {
        let deadline = deadline.clone();
        tokio::spawn(
            async move {
                tokio::select! {
                    _ = interrupt => {
                        warn!("Interrupted, draining in-flight requests");
                        deadline.cancel();
                    }
                    _ = deadline.expired() => {}
                }
            }
            .in_current_span(),
        )
    };

    let handles: Vec<_> = issuers
        .into_iter()
        .enumerate()
        .map(|(worker, issuer)| {
            tokio::spawn(
                run_worker(
                    worker,
                    issuer,
                    deadline.clone(),
                    aggregator.clone(),
                    settings.clone(),
                )
                .in_current_span(),
            )
        })
        .collect();

    let mut attempts = 0;
    let mut failure = None;
    for handle in handles {
        match handle.await {
            Ok(count) => attempts += count,
            Err(err) => {
                error!("Worker task failed: {err}");
                // Stop the remaining workers, but still join them.
                deadline.cancel();
                failure.get_or_insert(err);
            }
        }
    }
    let elapsed = start.elapsed();
    watcher.abort();

    if let Some(err) = failure {
        return Err(RunError::WorkerPanicked(err));
    }

    let (counters, samples) = aggregator.finish();
    debug_assert_eq!(attempts, counters.total);
    debug_assert!(counters.is_balanced());

    let report = Report::new(counters, samples, elapsed);
    info!(
        "Run complete: {} requests in {:.2?} ({:.2} req/s)",
        counters.total, elapsed, report.rps
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issuer::{Issuer, RequestContext, Shared};
    use barrage_core::Outcome;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use thiserror::Error;

    #[derive(Clone)]
    struct Immediate;

    impl Issuer for Immediate {
        async fn execute(&mut self, _ctx: &RequestContext) -> Outcome {
            Outcome::Success
        }
    }

    #[derive(Clone)]
    struct AlwaysFails;

    impl Issuer for AlwaysFails {
        async fn execute(&mut self, _ctx: &RequestContext) -> Outcome {
            Outcome::Error
        }
    }

    #[derive(Clone)]
    struct Sleepy(Duration);

    impl Issuer for Sleepy {
        async fn execute(&mut self, _ctx: &RequestContext) -> Outcome {
            tokio::time::sleep(self.0).await;
            Outcome::Success
        }
    }

    /// Counts successes per worker so the aggregate can be checked against them.
    #[derive(Clone)]
    struct Tally(Arc<Mutex<HashMap<usize, u64>>>);

    impl Issuer for Tally {
        async fn execute(&mut self, ctx: &RequestContext) -> Outcome {
            *self.0.lock().unwrap().entry(ctx.worker).or_default() += 1;
            Outcome::Success
        }
    }

    #[derive(Debug, Error)]
    #[error("connection refused")]
    struct Refused;

    struct RefusesWorker {
        refuse: usize,
        connects: AtomicUsize,
        executed: Arc<AtomicUsize>,
    }

    struct Counting(Arc<AtomicUsize>);

    impl Issuer for Counting {
        async fn execute(&mut self, _ctx: &RequestContext) -> Outcome {
            self.0.fetch_add(1, Ordering::Relaxed);
            Outcome::Success
        }
    }

    impl IssuerFactory for RefusesWorker {
        type Issuer = Counting;
        type Error = Refused;

        async fn connect(&self, worker: usize) -> Result<Counting, Refused> {
            self.connects.fetch_add(1, Ordering::Relaxed);
            if worker == self.refuse {
                Err(Refused)
            } else {
                Ok(Counting(self.executed.clone()))
            }
        }
    }

    fn config(concurrency: usize, duration: Duration) -> RunConfig {
        RunConfig::new("test", "memory", concurrency, duration).unwrap()
    }

    #[tracing_test::traced_test]
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    #[ntest::timeout(5_000)]
    async fn success_counter_matches_per_worker_totals() {
        let per_worker = Arc::new(Mutex::new(HashMap::new()));
        let report = run(
            &config(8, Duration::from_millis(200)),
            &Shared(Tally(per_worker.clone())),
        )
        .await
        .unwrap();

        let issued: u64 = per_worker.lock().unwrap().values().sum();
        assert!(issued > 0);
        assert_eq!(report.counters.success, issued);
        assert_eq!(report.counters.total, issued);
        assert!(report.counters.is_balanced());
        assert_eq!(report.latency.unwrap().samples as u64, issued);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_bounds_the_run() {
        let report = run(
            &config(4, Duration::from_millis(100)),
            &Shared(Sleepy(Duration::from_millis(1))),
        )
        .await
        .unwrap();

        assert!(report.elapsed >= Duration::from_millis(100));
        // At most one in-flight request per worker past expiry.
        assert!(report.elapsed <= Duration::from_millis(101));
        assert!(report.counters.total >= 4 * 99);
        assert!(report.counters.total <= 4 * 101);
    }

    #[tokio::test]
    #[ntest::timeout(5_000)]
    async fn zero_latency_issuer_still_stops() {
        let report = run(&config(4, Duration::from_millis(50)), &Shared(Immediate))
            .await
            .unwrap();
        assert!(report.elapsed >= Duration::from_millis(50));
        assert!(report.counters.total > 0);
        assert!(report.counters.is_balanced());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    #[ntest::timeout(10_000)]
    async fn elapsed_covers_the_duration_on_every_run() {
        let duration = Duration::from_millis(2);
        for _ in 0..100 {
            let report = run(&config(4, duration), &Shared(Immediate)).await.unwrap();
            assert!(report.elapsed >= duration, "{:?}", report.elapsed);
        }
    }

    #[tracing_test::traced_test]
    #[tokio::test]
    #[ntest::timeout(5_000)]
    async fn always_failing_issuer_reports_no_data() {
        let report = run(&config(3, Duration::from_millis(50)), &Shared(AlwaysFails))
            .await
            .unwrap();

        assert_eq!(report.counters.success, 0);
        assert_eq!(report.counters.errors, report.counters.total);
        assert!(report.latency.is_none());
        assert_eq!(report.error_rate, 1.);
        assert!(report.to_string().contains("No successful requests."));
    }

    #[tokio::test]
    async fn zero_duration_issues_nothing() {
        let report = run(&config(4, Duration::ZERO), &Shared(Immediate))
            .await
            .unwrap();
        assert_eq!(report.counters.total, 0);
        assert!(report.latency.is_none());
    }

    #[tracing_test::traced_test]
    #[tokio::test]
    async fn setup_failure_aborts_before_any_request() {
        let executed = Arc::new(AtomicUsize::new(0));
        let factory = RefusesWorker {
            refuse: 2,
            connects: AtomicUsize::new(0),
            executed: executed.clone(),
        };

        let err = run(&config(5, Duration::from_millis(50)), &factory)
            .await
            .unwrap_err();

        assert!(matches!(err, RunError::Setup { worker: 2, .. }));
        assert_eq!(factory.connects.load(Ordering::Relaxed), 3);
        assert_eq!(executed.load(Ordering::Relaxed), 0);
        assert!(logs_contain("Worker 2 failed to connect"));
    }

    #[tokio::test]
    #[ntest::timeout(5_000)]
    async fn interrupt_expires_the_run_early() {
        let report = run_until(
            &config(2, Duration::from_secs(3600)),
            &Shared(Sleepy(Duration::from_millis(5))),
            tokio::time::sleep(Duration::from_millis(100)),
        )
        .await
        .unwrap();

        assert!(report.elapsed < Duration::from_secs(2));
        assert!(report.counters.total > 0);
        assert!(report.counters.is_balanced());
    }

    #[tokio::test(start_paused = true)]
    async fn request_timeout_is_enforced() {
        let config = config(2, Duration::from_millis(100))
            .with_request_timeout(Some(Duration::from_millis(10)))
            .unwrap();
        let report = run(&config, &Shared(Sleepy(Duration::from_secs(1))))
            .await
            .unwrap();

        assert_eq!(report.counters.success, 0);
        assert_eq!(report.counters.errors, report.counters.total);
        assert_eq!(report.counters.total, 2 * 10);
    }

    #[tokio::test]
    #[ntest::timeout(10_000)]
    async fn rate_limit_caps_throughput() {
        let config = config(4, Duration::from_millis(500))
            .with_rate_limit(std::num::NonZeroU32::new(20));
        let report = run(&config, &Shared(Immediate)).await.unwrap();

        // 20 req/s over half a second, plus the initial permit.
        assert!(report.counters.total <= 12, "{}", report.counters.total);
        assert!(report.counters.total >= 5, "{}", report.counters.total);
    }
}
