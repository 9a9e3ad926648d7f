//! Unary `SendPing` calls against a location ingestion service.
use super::pb::{LocationPing, PingResponse};
use crate::error::IssuerError;
use barrage::prelude::*;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::error::Error as StdError;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::{Channel, Endpoint};
use tonic::{Code, Status};
#[allow(unused)]
use tracing::{debug, trace, warn};

pub const DEFAULT_METHOD: &str = "/tracker.TrackerService/SendPing";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const VEHICLES: u32 = 1000;
const BASE_LAT: f64 = 37.7749;
const BASE_LONG: f64 = -122.4194;

/// Minimal client for the single unary method a run needs.
#[derive(Debug, Clone)]
pub struct TrackerClient {
    inner: tonic::client::Grpc<Channel>,
    method: PathAndQuery,
}

impl TrackerClient {
    pub fn new(channel: Channel, method: PathAndQuery) -> Self {
        Self {
            inner: tonic::client::Grpc::new(channel),
            method,
        }
    }

    pub async fn send_ping(&mut self, ping: LocationPing) -> Result<PingResponse, Status> {
        self.inner
            .ready()
            .await
            .map_err(|e| Status::unknown(format!("Service was not ready: {e}")))?;
        let codec = tonic::codec::ProstCodec::default();
        let response = self
            .inner
            .unary(tonic::Request::new(ping), self.method.clone(), codec)
            .await?;
        Ok(response.into_inner())
    }
}

/// Dials one connection per worker.
#[derive(Debug)]
pub struct GrpcFactory {
    endpoint: Endpoint,
    method: PathAndQuery,
}

impl GrpcFactory {
    pub fn new(addr: &str, method: &str, timeout: Option<Duration>) -> Result<Self, IssuerError> {
        let uri = endpoint_uri(addr);
        let mut endpoint = Endpoint::from_shared(uri.clone())
            .map_err(|source| IssuerError::InvalidEndpoint {
                endpoint: uri,
                source,
            })?
            .connect_timeout(CONNECT_TIMEOUT);
        if let Some(timeout) = timeout {
            endpoint = endpoint.timeout(timeout);
        }

        Ok(Self {
            endpoint,
            method: parse_method(method)?,
        })
    }
}

impl IssuerFactory for GrpcFactory {
    type Issuer = GrpcIssuer;
    type Error = IssuerError;

    async fn connect(&self, worker: usize) -> Result<GrpcIssuer, IssuerError> {
        let channel = self
            .endpoint
            .connect()
            .await
            .map_err(|source| IssuerError::GrpcConnect {
                endpoint: self.endpoint.uri().to_string(),
                source,
            })?;
        debug!(worker, "Connected to {}", self.endpoint.uri());

        Ok(GrpcIssuer {
            client: TrackerClient::new(channel, self.method.clone()),
            rng: SmallRng::from_entropy(),
        })
    }
}

pub struct GrpcIssuer {
    client: TrackerClient,
    rng: SmallRng,
}

impl Issuer for GrpcIssuer {
    async fn execute(&mut self, _ctx: &RequestContext) -> Outcome {
        let ping = random_ping(&mut self.rng);
        let result = self.client.send_ping(ping).await;
        if let Err(status) = &result {
            trace!("SendPing failed: {status}");
        }
        classify(result)
    }
}

pub fn classify(result: Result<PingResponse, Status>) -> Outcome {
    match result {
        Ok(response) if response.success => Outcome::Success,
        Ok(_) => Outcome::Error,
        Err(status) => match status.code() {
            Code::ResourceExhausted => Outcome::Throttled,
            // Transport failures also surface as UNAVAILABLE, but carry the
            // underlying error as their source.
            Code::Unavailable if status.source().is_none() => Outcome::Throttled,
            _ => Outcome::Error,
        },
    }
}

fn random_ping(rng: &mut impl Rng) -> LocationPing {
    LocationPing {
        vehicle_id: format!("bench-veh-{}", rng.gen_range(0..VEHICLES)),
        latitude: BASE_LAT + (rng.gen::<f64>() - 0.5),
        longitude: BASE_LONG + (rng.gen::<f64>() - 0.5),
        timestamp: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|since| since.as_secs() as i64)
            .unwrap_or_default(),
    }
}

/// Bare `host:port` addresses are dialed over plaintext HTTP/2.
fn endpoint_uri(addr: &str) -> String {
    if addr.contains("://") {
        addr.to_string()
    } else {
        format!("http://{addr}")
    }
}

fn parse_method(method: &str) -> Result<PathAndQuery, IssuerError> {
    if !method.starts_with('/') || method.matches('/').count() != 2 {
        return Err(IssuerError::InvalidMethod(method.to_string()));
    }
    method
        .parse()
        .map_err(|_| IssuerError::InvalidMethod(method.to_string()))
}
