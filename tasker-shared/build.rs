//! Build script for tasker-shared.
//!
//! Compiles the Dispatch Protocol definitions (spec §4.F, §6) when the
//! `grpc` feature is enabled. Generated code lands in `$OUT_DIR` and is
//! pulled in via `include!` from `src/proto/mod.rs`.
//!
//! Requires the `protoc` compiler on the system (`apt install protobuf-compiler`
//! / `brew install protobuf`).

fn main() -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(feature = "grpc")]
    {
        use std::path::PathBuf;

        let manifest_dir = PathBuf::from(std::env::var("CARGO_MANIFEST_DIR")?);
        let proto_root = manifest_dir.join("proto");
        let proto_file = proto_root.join("tasker/v1/dispatch.proto");
        if !proto_file.exists() {
            panic!("Proto file not found: {proto_file:?}");
        }

        tonic_prost_build::configure()
            .build_server(true)
            .build_client(true)
            .compile_protos(&[proto_file.clone()], &[proto_root.clone()])?;

        println!("cargo:rerun-if-changed={}", proto_file.display());
    }

    Ok(())
}
