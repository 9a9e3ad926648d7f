//! One preset per benchmark: default knobs, target resolution and the
//! issuer each run drives.
use crate::cli::{Cli, Command, FrontendArgs, RunArgs};
use crate::issuers::{GrpcFactory, HttpFactory, StatusPolicy, UrlSource};
use anyhow::Context;
use barrage::{
    resolve_target_with, ConfigError, IssuerFactory, Report, RunConfig, RunError, DEFAULT_CONCURRENCY,
    DEFAULT_DURATION,
};
use serde::Serialize;
use std::future;
use std::time::Duration;
use tokio::sync::watch;
#[allow(unused)]
use tracing::{debug, info, warn};

pub const DEFAULT_FRONTEND_URL: &str = "http://localhost:3002";
pub const DEFAULT_API_URL: &str = "http://localhost/api/tracking/vehicle-123";

/// Knobs a preset uses unless overridden on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Defaults {
    pub concurrency: usize,
    pub duration: Duration,
    pub timeout: Option<Duration>,
    pub error_backoff: Option<Duration>,
    /// Idle connections kept per host by HTTP presets.
    pub pool_size: usize,
}

impl Defaults {
    const fn new(concurrency: usize, duration: Duration) -> Self {
        Self {
            concurrency,
            duration,
            timeout: None,
            error_backoff: None,
            pool_size: 100,
        }
    }

    const fn timeout(self, timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..self
        }
    }

    const fn error_backoff(self, backoff: Duration) -> Self {
        Self {
            error_backoff: Some(backoff),
            ..self
        }
    }

    const fn pool_size(self, pool_size: usize) -> Self {
        Self { pool_size, ..self }
    }

    /// Merge command-line overrides on top of these defaults.
    pub fn config(&self, name: &str, target: &str, args: &RunArgs) -> Result<RunConfig, ConfigError> {
        Ok(RunConfig::new(
            name,
            target,
            args.concurrency.unwrap_or(self.concurrency),
            args.duration.unwrap_or(self.duration),
        )?
        .with_request_timeout(args.timeout.or(self.timeout))?
        .with_rate_limit(args.rate)
        .with_error_backoff(self.error_backoff))
    }
}

pub const INGEST: Defaults = Defaults::new(10, Duration::from_secs(10));
pub const FRONTEND_PAGES: Defaults = Defaults::new(50, Duration::from_secs(10))
    .timeout(Duration::from_secs(5))
    .pool_size(200);
pub const FRONTEND_API: Defaults = Defaults::new(100, Duration::from_secs(15))
    .timeout(Duration::from_secs(5))
    .pool_size(200);
pub const GATEWAY: Defaults =
    Defaults::new(50, Duration::from_secs(10)).timeout(Duration::from_secs(2));
pub const TRACKING: Defaults = Defaults::new(50, Duration::from_secs(10))
    .timeout(Duration::from_secs(2))
    .error_backoff(Duration::from_millis(10));
pub const ROUTE: Defaults =
    Defaults::new(100, Duration::from_secs(15)).timeout(Duration::from_secs(5));
pub const GET: Defaults =
    Defaults::new(DEFAULT_CONCURRENCY, DEFAULT_DURATION).timeout(Duration::from_secs(5));

/// Completes once the user asks to stop, e.g. with Ctrl-C.
#[derive(Debug, Clone)]
pub struct Interrupt(watch::Receiver<bool>);

impl Interrupt {
    pub fn on_ctrl_c() -> Self {
        let (tx, rx) = watch::channel(false);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = tx.send(true);
            }
        });
        Self(rx)
    }

    /// Never fires.
    pub fn never() -> Self {
        let (_, rx) = watch::channel(false);
        Self(rx)
    }

    pub fn is_triggered(&self) -> bool {
        *self.0.borrow()
    }

    pub async fn triggered(mut self) {
        // A closed channel without a trigger means there is nothing to wait for.
        if self.0.wait_for(|hit| *hit).await.is_err() {
            future::pending::<()>().await;
        }
    }
}

/// The result of one run within a preset.
#[derive(Debug, Clone, Serialize)]
pub struct Phase {
    pub title: String,
    pub target: String,
    pub report: Report,
}

pub async fn run_phase<F>(
    title: &str,
    config: &RunConfig,
    factory: &F,
    interrupt: &Interrupt,
) -> Result<Phase, RunError>
where
    F: IssuerFactory,
{
    let report = barrage::run_until(config, factory, interrupt.clone().triggered()).await?;
    Ok(Phase {
        title: title.to_string(),
        target: config.target().to_string(),
        report,
    })
}

/// Run the selected preset to completion.
pub async fn execute(cli: &Cli, interrupt: Interrupt) -> anyhow::Result<Vec<Phase>> {
    execute_with(cli, interrupt, |var| std::env::var(var).ok()).await
}

/// [`execute`] with target overrides read through `env` instead of the
/// process environment.
pub async fn execute_with<L>(cli: &Cli, interrupt: Interrupt, env: L) -> anyhow::Result<Vec<Phase>>
where
    L: Fn(&str) -> Option<String>,
{
    let args = &cli.run;
    let phases = match &cli.command {
        Command::Ingest(ingest) => {
            let config = INGEST.config("ingest", &ingest.addr, args)?;
            let factory = GrpcFactory::new(&ingest.addr, &ingest.method, config.request_timeout())?;
            vec![run_phase("Ingestion Load Test Results", &config, &factory, &interrupt).await?]
        }
        Command::Frontend(frontend) => run_frontend(frontend, args, &interrupt, &env).await?,
        Command::Gateway(gateway) => {
            let target = resolve_target_with(
                gateway.target_url.as_deref(),
                "TARGET_URL",
                DEFAULT_API_URL,
                &env,
            );
            info!("Gateway target {} (from {})", target.value, target.source);
            let config = GATEWAY.config("gateway", &target.value, args)?;
            let factory = http_factory(
                UrlSource::Fixed(target.value),
                StatusPolicy::Strict,
                &config,
                &GATEWAY,
            )?;
            vec![run_phase("Stress Test Results", &config, &factory, &interrupt).await?]
        }
        Command::Tracking(tracking) => {
            let config = TRACKING.config("tracking", &tracking.addr, args)?;
            let urls = UrlSource::Numbered {
                prefix: format!("{}/tracking/bench-veh-", tracking.addr.trim_end_matches('/')),
                count: tracking.vehicles,
            };
            let factory = http_factory(urls, StatusPolicy::ReadThrough, &config, &TRACKING)?;
            vec![run_phase("Read Load Test Results", &config, &factory, &interrupt).await?]
        }
        Command::Route(route) => run_route(route, args, &interrupt).await?,
        Command::Get(get) => {
            let config = GET.config("get", &get.url, args)?;
            let factory = http_factory(UrlSource::Fixed(get.url.clone()), get.policy, &config, &GET)?;
            vec![run_phase("Results", &config, &factory, &interrupt).await?]
        }
    };
    Ok(phases)
}

async fn run_frontend<L>(
    frontend: &FrontendArgs,
    args: &RunArgs,
    interrupt: &Interrupt,
    env: &L,
) -> anyhow::Result<Vec<Phase>>
where
    L: Fn(&str) -> Option<String>,
{
    let pages = resolve_target_with(
        frontend.frontend_url.as_deref(),
        "FRONTEND_URL",
        DEFAULT_FRONTEND_URL,
        env,
    );
    let api = resolve_target_with(frontend.api_url.as_deref(), "API_URL", DEFAULT_API_URL, env);
    info!("Frontend target {} (from {})", pages.value, pages.source);
    info!("API target {} (from {})", api.value, api.source);

    let mut phases = Vec::with_capacity(2);

    let config = FRONTEND_PAGES.config("frontend-pages", &pages.value, args)?;
    let factory = http_factory(
        UrlSource::Fixed(pages.value),
        StatusPolicy::Lenient,
        &config,
        &FRONTEND_PAGES,
    )?;
    phases.push(run_phase("Frontend Static Assets", &config, &factory, interrupt).await?);

    if interrupt.is_triggered() {
        warn!("Skipping the API polling phase");
        return Ok(phases);
    }

    let config = FRONTEND_API.config("frontend-api", &api.value, args)?;
    let factory = http_factory(
        UrlSource::Fixed(api.value),
        StatusPolicy::Lenient,
        &config,
        &FRONTEND_API,
    )?;
    phases.push(run_phase("API Polling Storm", &config, &factory, interrupt).await?);

    Ok(phases)
}

#[cfg(feature = "kafka")]
async fn run_route(
    route: &crate::cli::RouteArgs,
    args: &RunArgs,
    interrupt: &Interrupt,
) -> anyhow::Result<Vec<Phase>> {
    let config = ROUTE.config("route", &format!("{}/{}", route.brokers, route.topic), args)?;
    let factory = crate::issuers::KafkaFactory::new(
        &route.brokers,
        &route.topic,
        route.vehicles,
        config.request_timeout(),
    );
    Ok(vec![
        run_phase("Route Request Storm Results", &config, &factory, interrupt).await?,
    ])
}

#[cfg(not(feature = "kafka"))]
async fn run_route(
    _route: &crate::cli::RouteArgs,
    _args: &RunArgs,
    _interrupt: &Interrupt,
) -> anyhow::Result<Vec<Phase>> {
    anyhow::bail!("built without Kafka support, rebuild with `--features kafka`")
}

fn http_factory(
    urls: UrlSource,
    policy: StatusPolicy,
    config: &RunConfig,
    defaults: &Defaults,
) -> anyhow::Result<HttpFactory> {
    HttpFactory::new(urls, policy, config.request_timeout(), defaults.pool_size)
        .with_context(|| format!("Failed to prepare HTTP client for {}", config.target()))
}
