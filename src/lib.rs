#![forbid(unsafe_code)]
//! Umbrella crate re-exporting the reshelf workspace surface.
//!
//! The workspace's integration tests and downstream embedders use this
//! facade; the `reshelf` binary lives in `reshelf-cli`.

pub use reshelf_core::{config, hash, Action, ActionRecord, DestinationKey, Manifest};
pub use reshelf_engine::{classify, execute, report, verify, ReorgReport, VerifySummary};
pub use reshelf_io::{
    decode_manifest, encode_manifest, read_manifest_file, write_manifest_file,
};
pub use reshelf_store::{
    build_store_from_config, source_identity, BlobStore, CopyState, CopyToken, FsStore,
    MemoryStore, ObjectMeta,
};
