#![cfg_attr(docsrs, feature(doc_cfg))]
//! A fixed-concurrency, deadline-bounded load generation engine.
//!
//! A run spawns `concurrency` workers, each owning one [`Issuer`]. Workers issue
//! requests back to back until the [`Deadline`] expires, recording every
//! attempt into a shared [`Aggregator`]. Once every worker has been joined the
//! counters and latency samples are turned into a [`Report`].
//!
//! ```no_run
//! use barrage::prelude::*;
//! use std::time::Duration;
//!
//! #[derive(Clone)]
//! struct Noop;
//!
//! impl Issuer for Noop {
//!     async fn execute(&mut self, _ctx: &RequestContext) -> Outcome {
//!         Outcome::Success
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RunConfig::new("noop", "memory", 8, Duration::from_secs(5))?;
//!     let report = barrage::run(&config, &Shared(Noop)).await?;
//!     println!("{report}");
//!     Ok(())
//! }
//! ```
pub mod aggregator;
pub mod deadline;
pub mod error;
pub mod issuer;
pub mod report;
pub mod run;
mod worker;

pub use aggregator::Aggregator;
pub use barrage_core::{
    resolve_target, resolve_target_with, Attempt, ConfigError, Counters, Outcome, ResolvedTarget,
    RunConfig, TargetSource, DEFAULT_CONCURRENCY, DEFAULT_DURATION,
};
pub use deadline::{Deadline, DeadlineState};
pub use error::RunError;
pub use issuer::{Issuer, IssuerFactory, RequestContext, Shared};
pub use report::{LatencySummary, Report};
pub use run::{run, run_until};

pub mod prelude {
    pub use crate::issuer::{Issuer, IssuerFactory, RequestContext, Shared};
    pub use crate::report::Report;
    pub use crate::run::{run, run_until};
    pub use barrage_core::{Outcome, RunConfig};
}
