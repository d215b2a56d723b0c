//! Structured logging init, grounded in
//! `tasker-orchestration/src/bin/server.rs`'s `logging::init_tracing()` call.

use tracing_subscriber::{fmt, EnvFilter};

/// Initialize a process-wide `tracing` subscriber.
///
/// Honors `RUST_LOG`; defaults to `info` when unset. Safe to call more than
/// once per process (subsequent calls are no-ops) so both binaries and tests
/// can call it unconditionally.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}
