//! # tasker-shared
//!
//! Domain types, configuration, error taxonomy, logging, and resilience
//! primitives shared between the orchestrator, the dispatch client, and the
//! compute worker.

pub mod config;
pub mod errors;
pub mod logging;
pub mod pairing;
#[cfg(feature = "grpc")]
pub mod proto;
pub mod resilience;
pub mod types;

pub use errors::{TaskerError, TaskerResult};
