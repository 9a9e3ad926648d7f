mod utils;
use utils::*;

use barrage_runtime::cli::{Cli, Format};
use barrage_runtime::output;
use barrage_runtime::presets::{self, Interrupt};
use clap::Parser;

#[tokio::test]
#[ntest::timeout(10_000)]
async fn get_preset_end_to_end() {
    let addr = init().await;
    let url = format!("http://{addr}/status/200/delay/ms/1");
    let cli = Cli::try_parse_from([
        "barrage", "-c", "2", "-d", "200ms", "get", "--url", url.as_str(),
    ])
    .unwrap();

    let phases = presets::execute(&cli, Interrupt::never()).await.unwrap();
    assert_eq!(phases.len(), 1);
    let report = &phases[0].report;
    assert!(report.counters.total > 0);
    assert_eq!(report.counters.success, report.counters.total);
    assert_eq!(phases[0].target, url);

    let json = output::render(&phases, Format::Json).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value[0]["title"], "Results");
    assert!(value[0]["report"]["latency"]["p99"].as_f64().unwrap() > 0.);
}

#[tokio::test]
#[ntest::timeout(10_000)]
async fn tracking_preset_reads_through_404s() {
    let addr = init().await;
    let base = format!("http://{addr}");
    let cli = Cli::try_parse_from([
        "barrage", "tracking", "--addr", base.as_str(), "-c", "4", "-d", "200ms",
    ])
    .unwrap();

    let phases = presets::execute(&cli, Interrupt::never()).await.unwrap();
    let report = &phases[0].report;
    assert!(report.counters.total > 0);
    assert_eq!(report.counters.errors, 0);

    let text = output::render(&phases, Format::Text).unwrap();
    assert!(text.starts_with("--- Read Load Test Results ---"));
}

#[tokio::test]
#[ntest::timeout(10_000)]
async fn frontend_runs_both_phases() {
    let addr = init().await;
    let pages = format!("http://{addr}/status/200/delay/ms/0");
    let api = format!("http://{addr}/status/204/delay/ms/0");
    let cli = Cli::try_parse_from([
        "barrage",
        "frontend",
        "--frontend-url",
        pages.as_str(),
        "--api-url",
        api.as_str(),
        "-c",
        "2",
        "-d",
        "100ms",
    ])
    .unwrap();

    let phases = presets::execute(&cli, Interrupt::never()).await.unwrap();
    assert_eq!(phases.len(), 2);
    assert_eq!(phases[0].target, pages);
    assert_eq!(phases[1].target, api);
    for phase in &phases {
        assert!(phase.report.counters.total > 0);
        assert_eq!(phase.report.counters.success, phase.report.counters.total);
    }
}

#[tokio::test]
#[ntest::timeout(10_000)]
async fn gateway_target_comes_from_the_environment() {
    let addr = init().await;
    let staging = format!("http://{addr}/status/200/delay/ms/0");
    let cli = Cli::try_parse_from(["barrage", "gateway", "-c", "2", "-d", "100ms"]).unwrap();

    let env = |var: &str| (var == "TARGET_URL").then(|| staging.clone());
    let phases = presets::execute_with(&cli, Interrupt::never(), env).await.unwrap();

    assert_eq!(phases.len(), 1);
    assert_eq!(phases[0].target, staging);
    let report = &phases[0].report;
    assert!(report.counters.total > 0);
    assert_eq!(report.counters.success, report.counters.total);
}

#[tokio::test]
#[ntest::timeout(10_000)]
async fn frontend_flag_beats_environment() {
    let addr = init().await;
    let pages = format!("http://{addr}/status/200/delay/ms/0");
    let api = format!("http://{addr}/status/204/delay/ms/0");
    let cli = Cli::try_parse_from([
        "barrage",
        "frontend",
        "--frontend-url",
        pages.as_str(),
        "-c",
        "2",
        "-d",
        "100ms",
    ])
    .unwrap();

    let env = |var: &str| match var {
        "FRONTEND_URL" => Some("http://127.0.0.1:1/".to_string()),
        "API_URL" => Some(api.clone()),
        _ => None,
    };
    let phases = presets::execute_with(&cli, Interrupt::never(), env).await.unwrap();

    assert_eq!(phases.len(), 2);
    assert_eq!(phases[0].target, pages);
    assert_eq!(phases[1].target, api);
    for phase in &phases {
        assert_eq!(phase.report.counters.success, phase.report.counters.total);
    }
}

#[tokio::test]
async fn invalid_url_fails_before_running() {
    let _ = init().await;
    let cli = Cli::try_parse_from(["barrage", "get", "--url", "not a url"]).unwrap();
    assert!(presets::execute(&cli, Interrupt::never()).await.is_err());
}
