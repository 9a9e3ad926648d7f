use std::net::SocketAddr;
use std::sync::OnceLock;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Install logging once per test binary and start a fresh mock service.
#[allow(unused)]
pub async fn init() -> SocketAddr {
    static ONCE_LOCK: OnceLock<()> = OnceLock::new();

    ONCE_LOCK.get_or_init(|| {
        let _ = FmtSubscriber::builder()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new("barrage=debug,mock_service=info")),
            )
            .with_test_writer()
            .try_init();
    });

    mock_service::spawn().await.unwrap()
}
