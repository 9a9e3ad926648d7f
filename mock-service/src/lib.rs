use axum::{
    debug_handler,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use serde::Serialize;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

type Limiters = Arc<RwLock<HashMap<String, Arc<DefaultDirectRateLimiter>>>>;

#[derive(Clone, Default)]
struct AppState {
    limiters: Limiters,
}

pub fn router() -> Router {
    Router::new()
        .route("/status/:code/delay/ms/:delay_ms", get(status))
        .route("/tracking/:vehicle_id", get(tracking))
        .route(
            "/limited/:max_tps/delay/ms/:delay_ms/server/:server_id",
            get(limited),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(AppState::default())
}

pub async fn run(addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Mock service listening on {}", listener.local_addr()?);
    axum::serve(listener, router()).await?;
    Ok(())
}

/// Serve on an ephemeral local port in the background and return its address.
pub async fn spawn() -> anyhow::Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, router()).await {
            tracing::error!("Mock service stopped: {err}");
        }
    });
    Ok(addr)
}

/// Respond with `code` after `delay_ms`.
#[debug_handler]
async fn status(Path((code, delay_ms)): Path<(u16, u64)>) -> Result<StatusCode, StatusCode> {
    TPS_MEASURE.fetch_add(1, Ordering::Relaxed);
    let code = StatusCode::from_u16(code).map_err(|_| StatusCode::BAD_REQUEST)?;
    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    Ok(code)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub vehicle_id: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Vehicles with an even numeric suffix are known; everything else is a 404,
/// like a read path queried before ingestion caught up.
#[debug_handler]
async fn tracking(Path(vehicle_id): Path<String>) -> Result<Json<Location>, StatusCode> {
    TPS_MEASURE.fetch_add(1, Ordering::Relaxed);
    match vehicle_number(&vehicle_id) {
        Some(n) if n % 2 == 0 => Ok(Json(Location {
            vehicle_id,
            latitude: 37.7749,
            longitude: -122.4194,
        })),
        _ => Err(StatusCode::NOT_FOUND),
    }
}

fn vehicle_number(vehicle_id: &str) -> Option<u64> {
    vehicle_id.rsplit('-').next()?.parse().ok()
}

/// Allow `max_tps` requests per second per `server_id`; the rest get a 429.
#[debug_handler]
async fn limited(
    State(state): State<AppState>,
    Path((max_tps, delay_ms, server_id)): Path<(u32, u64, String)>,
) -> StatusCode {
    TPS_MEASURE.fetch_add(1, Ordering::Relaxed);
    let Some(max_tps) = NonZeroU32::new(max_tps) else {
        return StatusCode::BAD_REQUEST;
    };
    tokio::time::sleep(Duration::from_millis(delay_ms)).await;

    let existing = state
        .limiters
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&server_id)
        .cloned();
    let limiter = match existing {
        Some(limiter) => limiter,
        None => state
            .limiters
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(server_id)
            .or_insert_with(|| Arc::new(rate_limiter(max_tps)))
            .clone(),
    };

    match limiter.check() {
        Ok(_) => StatusCode::OK,
        Err(_) => {
            debug!("Rejecting request over {max_tps} TPS");
            StatusCode::TOO_MANY_REQUESTS
        }
    }
}

fn rate_limiter(tps: NonZeroU32) -> DefaultDirectRateLimiter {
    RateLimiter::direct(Quota::per_second(tps))
}

static TPS_MEASURE: AtomicU64 = AtomicU64::new(0);

/// Log the number of requests served every second.
pub async fn tps_measure_task() {
    loop {
        tokio::time::sleep(Duration::from_secs(1)).await;
        let transactions = TPS_MEASURE.swap(0, Ordering::Relaxed);
        info!("{transactions} TPS");
    }
}
