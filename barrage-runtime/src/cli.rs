use crate::issuers::{grpc, StatusPolicy};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "barrage", version, about = "Fixed-concurrency load generator")]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every preset. Unset values fall back to the preset's
/// defaults.
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Number of concurrent workers.
    #[arg(short, long, global = true)]
    pub concurrency: Option<usize>,

    /// How long to issue requests for, e.g. `30s` or `2m`.
    #[arg(short, long, global = true, value_parser = humantime::parse_duration)]
    pub duration: Option<Duration>,

    /// Per-request timeout.
    #[arg(long, global = true, value_parser = humantime::parse_duration)]
    pub timeout: Option<Duration>,

    /// Cap on requests per second across all workers.
    #[arg(long, global = true)]
    pub rate: Option<NonZeroU32>,

    #[arg(long, global = true, value_enum, default_value_t = Format::Text)]
    pub format: Format,

    /// Serve Prometheus metrics on this address while running.
    #[arg(long, global = true)]
    pub prometheus: Option<SocketAddr>,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Format {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Unary gRPC location pings against the ingestion service.
    Ingest(IngestArgs),
    /// Static frontend page loads followed by an API polling storm.
    Frontend(FrontendArgs),
    /// Hammer a single URL behind the gateway and count overload responses.
    Gateway(GatewayArgs),
    /// Random vehicle lookups against the tracking read endpoint.
    Tracking(TrackingArgs),
    /// Publish route requests to Kafka. Needs the `kafka` feature.
    Route(RouteArgs),
    /// GET an arbitrary URL.
    Get(GetArgs),
}

#[derive(Args, Debug)]
pub struct IngestArgs {
    #[arg(long, default_value = "localhost:50051")]
    pub addr: String,

    /// Full path of the unary method to call.
    #[arg(long, default_value = grpc::DEFAULT_METHOD)]
    pub method: String,
}

#[derive(Args, Debug)]
pub struct FrontendArgs {
    /// Defaults to `$FRONTEND_URL`, then `http://localhost:3002`.
    #[arg(long)]
    pub frontend_url: Option<String>,

    /// Defaults to `$API_URL`, then `http://localhost/api/tracking/vehicle-123`.
    #[arg(long)]
    pub api_url: Option<String>,
}

#[derive(Args, Debug)]
pub struct GatewayArgs {
    /// Defaults to `$TARGET_URL`, then `http://localhost/api/tracking/vehicle-123`.
    #[arg(long)]
    pub target_url: Option<String>,
}

#[derive(Args, Debug)]
pub struct TrackingArgs {
    #[arg(long, default_value = "http://localhost:3000")]
    pub addr: String,

    /// Vehicle ids are drawn from `bench-veh-0..vehicles`.
    #[arg(long, default_value_t = 1000)]
    pub vehicles: u32,
}

#[derive(Args, Debug)]
pub struct RouteArgs {
    #[arg(long, default_value = "localhost:9092")]
    pub brokers: String,

    #[arg(long, default_value = "route-requests")]
    pub topic: String,

    /// Number of distinct vehicles, which controls lock contention downstream.
    #[arg(long, default_value_t = 50)]
    pub vehicles: u32,
}

#[derive(Args, Debug)]
pub struct GetArgs {
    #[arg(long)]
    pub url: String,

    #[arg(long, value_enum, default_value_t = StatusPolicy::Strict)]
    pub policy: StatusPolicy,
}
