mod utils;
use utils::*;

use barrage::prelude::*;
use barrage_runtime::issuers::{HttpFactory, StatusPolicy, UrlSource};
use std::num::NonZeroU32;
use std::time::Duration;

fn config(target: &str, concurrency: usize, duration: Duration) -> RunConfig {
    RunConfig::new("integration", target, concurrency, duration).unwrap()
}

fn factory(urls: UrlSource, policy: StatusPolicy, config: &RunConfig) -> HttpFactory {
    HttpFactory::new(urls, policy, config.request_timeout(), 16).unwrap()
}

#[tokio::test]
#[ntest::timeout(10_000)]
async fn overload_statuses_are_throttled() {
    let addr = init().await;
    let url = format!("http://{addr}/status/503/delay/ms/1");
    let config = config(&url, 4, Duration::from_millis(300));

    let report = run(
        &config,
        &factory(UrlSource::Fixed(url.clone()), StatusPolicy::Strict, &config),
    )
    .await
    .unwrap();

    assert!(report.counters.total > 0);
    assert_eq!(report.counters.throttled, report.counters.total);
    assert_eq!(report.counters.success, 0);
    assert!(report.latency.is_none());
    assert_eq!(report.throttle_rate, 1.);
}

#[tokio::test]
#[ntest::timeout(10_000)]
async fn read_through_counts_missing_vehicles() {
    let addr = init().await;
    let urls = UrlSource::Numbered {
        prefix: format!("http://{addr}/tracking/bench-veh-"),
        count: 1000,
    };
    let config = config(&addr.to_string(), 4, Duration::from_millis(300));

    let report = run(&config, &factory(urls, StatusPolicy::ReadThrough, &config))
        .await
        .unwrap();

    assert!(report.counters.total > 0);
    assert_eq!(report.counters.errors, 0);
    assert_eq!(report.counters.success, report.counters.total);
    let latency = report.latency.unwrap();
    assert_eq!(latency.samples as u64, report.counters.success);
    assert!(latency.p50 <= latency.p99);
    assert!(latency.min <= latency.p50 && latency.p99 <= latency.max);
}

#[tokio::test]
#[ntest::timeout(10_000)]
async fn strict_policy_rejects_missing_vehicles() {
    let addr = init().await;
    let urls = UrlSource::Numbered {
        prefix: format!("http://{addr}/tracking/bench-veh-"),
        count: 1000,
    };
    let config = config(&addr.to_string(), 4, Duration::from_millis(300));

    let report = run(&config, &factory(urls, StatusPolicy::Strict, &config))
        .await
        .unwrap();

    assert!(report.counters.total > 20);
    assert!(report.counters.success > 0);
    assert!(report.counters.errors > 0);
    assert!(report.counters.is_balanced());
}

#[tokio::test]
#[ntest::timeout(10_000)]
async fn server_side_limit_shows_up_as_throttling() {
    let addr = init().await;
    let url = format!("http://{addr}/limited/20/delay/ms/0/server/saturate");
    let config = config(&url, 8, Duration::from_secs(1));

    let report = run(
        &config,
        &factory(UrlSource::Fixed(url.clone()), StatusPolicy::Strict, &config),
    )
    .await
    .unwrap();

    assert!(report.counters.throttled > 0);
    // Initial burst plus one second of replenishment.
    assert!(report.counters.success <= 45, "{}", report.counters.success);
    assert!(report.counters.is_balanced());
}

#[tokio::test]
#[ntest::timeout(10_000)]
async fn client_rate_limit_stays_under_server_limit() {
    let addr = init().await;
    let url = format!("http://{addr}/limited/100/delay/ms/0/server/polite");
    let config = config(&url, 8, Duration::from_secs(1)).with_rate_limit(NonZeroU32::new(10));

    let report = run(
        &config,
        &factory(UrlSource::Fixed(url.clone()), StatusPolicy::Strict, &config),
    )
    .await
    .unwrap();

    assert_eq!(report.counters.throttled, 0);
    assert!(report.counters.total <= 12, "{}", report.counters.total);
    assert!(report.counters.total >= 5, "{}", report.counters.total);
}

#[tokio::test]
#[ntest::timeout(10_000)]
async fn slow_responses_time_out() {
    let addr = init().await;
    let url = format!("http://{addr}/status/200/delay/ms/500");
    let config = config(&url, 2, Duration::from_millis(300))
        .with_request_timeout(Some(Duration::from_millis(50)))
        .unwrap();

    let report = run(
        &config,
        &factory(UrlSource::Fixed(url.clone()), StatusPolicy::Strict, &config),
    )
    .await
    .unwrap();

    assert!(report.counters.total >= 2);
    assert_eq!(report.counters.errors, report.counters.total);
    assert!(report.latency.is_none());
    assert!(report.to_string().contains("No successful requests."));
}

#[tokio::test]
#[ntest::timeout(10_000)]
async fn unreachable_target_is_all_errors() {
    let _ = init().await;
    // Nothing listens on port 1.
    let url = "http://127.0.0.1:1/";
    let config = config(url, 2, Duration::from_millis(100));

    let report = run(
        &config,
        &factory(UrlSource::Fixed(url.to_string()), StatusPolicy::Lenient, &config),
    )
    .await
    .unwrap();

    assert!(report.counters.total > 0);
    assert_eq!(report.counters.errors, report.counters.total);
    assert_eq!(report.error_rate, 1.);
}
