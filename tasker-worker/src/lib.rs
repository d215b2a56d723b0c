//! # tasker-worker
//!
//! Stateless compute worker for the arithmetic orchestrator: polls
//! `FetchTask`, performs the primitive binary operation, calls
//! `SubmitResult`. Ships a production poll-loop fleet ([`Worker`]) and an
//! in-process [`simulator::WorkerSimulator`] used by integration tests.

pub mod simulator;
pub mod worker;

pub use simulator::WorkerSimulator;
pub use worker::{shutdown, shutdown_channel, Worker};
