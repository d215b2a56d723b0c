//! Shared state handed to the Dispatch Protocol service: the three
//! registries plus a persistence handle, each already independently
//! synchronized (spec §5 "Shared-resource policy"), so cloning this struct
//! is just an `Arc` bump, never a lock.

use std::sync::Arc;

use crate::expression_registry::ExpressionRegistry;
use crate::in_flight::InFlightRegistry;
use crate::persistence::Persistence;

/// Everything the gRPC [`DispatchServiceImpl`][super::service::DispatchServiceImpl]
/// needs to serve `FetchTask`/`SubmitResult` concurrently.
#[derive(Clone)]
pub struct DispatchState {
    pub expressions: Arc<ExpressionRegistry>,
    pub in_flight: Arc<InFlightRegistry>,
    pub persistence: Arc<dyn Persistence>,
}

impl std::fmt::Debug for DispatchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchState")
            .field("live_expressions", &self.expressions.len())
            .field("in_flight", &self.in_flight.len())
            .finish()
    }
}

impl DispatchState {
    pub fn new(
        expressions: Arc<ExpressionRegistry>,
        in_flight: Arc<InFlightRegistry>,
        persistence: Arc<dyn Persistence>,
    ) -> Self {
        DispatchState {
            expressions,
            in_flight,
            persistence,
        }
    }
}
