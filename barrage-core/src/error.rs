use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Concurrency must be at least 1.")]
    ZeroConcurrency,

    #[error("Target descriptor is empty.")]
    EmptyTarget,

    #[error("Request timeout must be greater than zero.")]
    ZeroTimeout,
}
