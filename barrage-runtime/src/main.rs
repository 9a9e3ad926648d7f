use anyhow::Context;
use barrage_runtime::cli::Cli;
use barrage_runtime::presets::{self, Interrupt};
use barrage_runtime::{logging, output};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.run.verbose);

    if let Some(addr) = cli.run.prometheus {
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .with_context(|| format!("Failed to start Prometheus exporter on {addr}"))?;
        info!("Serving metrics on http://{addr}/metrics");
    }

    let phases = presets::execute(&cli, Interrupt::on_ctrl_c()).await?;
    output::print(&phases, cli.run.format)
}
