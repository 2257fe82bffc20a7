#![forbid(unsafe_code)]
//! reshelf-io: persisted manifest codec and report writers.
//!
//! The manifest's persisted form is a Parquet file with one column per
//! `ActionRecord` field; reports derive from a loaded manifest and are
//! written as a CSV table (duplicates) and sectioned text (collisions).

pub mod error;
pub mod manifest;
pub mod report;

pub use error::{Error, Result};
pub use manifest::{decode_manifest, encode_manifest, read_manifest_file, write_manifest_file};
