//! Generated Dispatch Protocol types (spec §4.F, §6), compiled from
//! `proto/tasker/v1/dispatch.proto` by `build.rs` when the `grpc` feature is
//! enabled.

#![allow(clippy::all)]

pub mod tasker {
    pub mod v1 {
        tonic::include_proto!("tasker.v1");
    }
}
