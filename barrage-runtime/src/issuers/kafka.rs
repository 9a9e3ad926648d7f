//! Route-request publishing through a Kafka producer.
use crate::error::IssuerError;
use barrage::prelude::*;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rdkafka::config::ClientConfig;
use rdkafka::error::{KafkaError, RDKafkaErrorCode};
use rdkafka::producer::{FutureProducer, FutureRecord};
use serde::Serialize;
use std::time::Duration;
#[allow(unused)]
use tracing::{debug, trace, warn};

const BASE_LAT: f64 = 37.7749;
const BASE_LONG: f64 = -122.4194;

/// Delivery timeout used when the run has no request timeout of its own.
/// librdkafka would otherwise wait up to five minutes for a report.
pub const DEFAULT_MESSAGE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRequest {
    pub vehicle_id: String,
    pub current_lat: f64,
    pub current_long: f64,
}

/// One producer per worker, publishing to `topic`.
#[derive(Debug, Clone)]
pub struct KafkaFactory {
    brokers: String,
    topic: String,
    vehicles: u32,
    timeout: Option<Duration>,
}

impl KafkaFactory {
    pub fn new(brokers: &str, topic: &str, vehicles: u32, timeout: Option<Duration>) -> Self {
        Self {
            brokers: brokers.to_string(),
            topic: topic.to_string(),
            vehicles: vehicles.max(1),
            timeout,
        }
    }

    fn client_config(&self) -> ClientConfig {
        let timeout = self.timeout.unwrap_or(DEFAULT_MESSAGE_TIMEOUT);
        let mut config = ClientConfig::new();
        config
            .set("bootstrap.servers", &self.brokers)
            .set("message.timeout.ms", timeout.as_millis().to_string());
        config
    }
}

impl IssuerFactory for KafkaFactory {
    type Issuer = KafkaIssuer;
    type Error = IssuerError;

    async fn connect(&self, worker: usize) -> Result<KafkaIssuer, IssuerError> {
        let producer: FutureProducer = self.client_config().create()?;
        debug!(worker, "Created producer for {}", self.brokers);

        Ok(KafkaIssuer {
            producer,
            topic: self.topic.clone(),
            vehicles: self.vehicles,
            rng: SmallRng::from_entropy(),
        })
    }
}

pub struct KafkaIssuer {
    producer: FutureProducer,
    topic: String,
    vehicles: u32,
    rng: SmallRng,
}

impl Issuer for KafkaIssuer {
    async fn execute(&mut self, _ctx: &RequestContext) -> Outcome {
        let request = RouteRequest {
            vehicle_id: format!("stress-veh-{}", self.rng.gen_range(0..self.vehicles)),
            current_lat: BASE_LAT + (self.rng.gen::<f64>() - 0.5),
            current_long: BASE_LONG + (self.rng.gen::<f64>() - 0.5),
        };
        let payload = match serde_json::to_vec(&request) {
            Ok(payload) => payload,
            Err(err) => {
                warn!("Failed to encode route request: {err}");
                return Outcome::Error;
            }
        };

        let record = FutureRecord::to(&self.topic)
            .key(&request.vehicle_id)
            .payload(&payload);
        // Fail fast on a full local queue instead of blocking the worker.
        match self.producer.send(record, Duration::ZERO).await {
            Ok(_) => Outcome::Success,
            Err((err, _)) => classify(&err),
        }
    }
}

fn classify(err: &KafkaError) -> Outcome {
    match err.rdkafka_error_code() {
        Some(RDKafkaErrorCode::QueueFull) => Outcome::Throttled,
        _ => {
            trace!("Publish failed: {err}");
            Outcome::Error
        }
    }
}
