use tracing_subscriber::{EnvFilter, FmtSubscriber};

const DEFAULT_FILTER: &str = "barrage=info,barrage_runtime=info";
const VERBOSE_FILTER: &str = "barrage=debug,barrage_runtime=debug";

/// Install the global subscriber. `RUST_LOG` takes precedence over the
/// built-in filter. Logs go to stderr so stdout only carries reports.
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            VERBOSE_FILTER
        } else {
            DEFAULT_FILTER
        })
    });

    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
