//! # tasker-client
//!
//! Thin async gRPC client over the arithmetic orchestrator's Dispatch
//! Protocol (spec §4.F), used by `tasker-worker`'s poll loop and by
//! integration tests that want to drive the server without reimplementing
//! the wire format.

pub mod client;
pub mod error;

pub use client::{DispatchClient, FetchedTask};
pub use error::{ClientError, ClientResult};
