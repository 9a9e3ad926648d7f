#![cfg_attr(docsrs, feature(doc_cfg))]
//! Data model shared by the barrage engine and runtime.
mod config;
mod constants;
mod error;
mod outcome;
mod stats;
mod target;

pub use config::*;
pub use constants::*;
pub use error::*;
pub use outcome::*;
pub use stats::*;
pub use target::*;
