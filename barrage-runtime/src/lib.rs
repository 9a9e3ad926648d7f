//! The `barrage` command-line load generator.
//!
//! Wires concrete transports (HTTP, gRPC, Kafka) into the `barrage` engine and
//! exposes one preset per benchmark as a subcommand.
pub mod cli;
pub mod error;
pub mod issuers;
pub mod logging;
pub mod output;
pub mod presets;

pub use error::IssuerError;
