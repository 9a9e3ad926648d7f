use thiserror::Error;

/// Failures while preparing an issuer. These abort a run before any request
/// is issued.
#[derive(Debug, Error)]
pub enum IssuerError {
    #[error("Invalid target URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Invalid gRPC method path {0:?}")]
    InvalidMethod(String),

    #[error("Invalid gRPC endpoint {endpoint}: {source}")]
    InvalidEndpoint {
        endpoint: String,
        #[source]
        source: tonic::transport::Error,
    },

    #[error("Failed to connect to {endpoint}: {source}")]
    GrpcConnect {
        endpoint: String,
        #[source]
        source: tonic::transport::Error,
    },

    #[cfg(feature = "kafka")]
    #[error("Failed to create Kafka producer: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),
}
