//! Concrete transports plugged into the engine.
pub mod grpc;
pub mod http;
#[cfg(feature = "kafka")]
pub mod kafka;
pub mod pb;

pub use grpc::{GrpcFactory, GrpcIssuer, TrackerClient};
pub use http::{HttpFactory, HttpIssuer, StatusPolicy, UrlSource};
#[cfg(feature = "kafka")]
pub use kafka::{KafkaFactory, KafkaIssuer};
