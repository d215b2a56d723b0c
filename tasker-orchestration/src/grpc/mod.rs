//! The Dispatch Protocol (spec §4.F): `FetchTask` / `SubmitResult` served
//! over tonic, backed by the Expression Registry, In-Flight Registry, and
//! Persistence Adapter.

mod service;
mod state;

pub use service::DispatchServiceImpl;
pub use state::DispatchState;

pub use tasker_shared::proto::tasker::v1::dispatch_service_server::DispatchServiceServer;
