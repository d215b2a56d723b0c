//! Expression-to-task decomposition, the per-expression scheduler, the
//! registries that hold live expressions and in-flight dispatches, the gRPC
//! dispatch service, and the persistence adapter for the arithmetic
//! orchestrator.

pub mod bootstrap;
pub mod expression_registry;
pub mod grpc;
pub mod in_flight;
pub mod persistence;
pub mod task_factory;
pub mod task_graph;
pub mod translator;
