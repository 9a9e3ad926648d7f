use std::error::Error as StdError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("Worker {worker} could not be set up: {source}")]
    Setup {
        worker: usize,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("Worker task failed: {0}")]
    WorkerPanicked(#[from] tokio::task::JoinError),
}
