#![forbid(unsafe_code)]
//! reshelf-engine: the four phases of a reorganization run.
//!
//! classify → manifest (write) → {execute, verify, report} (read). The
//! phases share nothing but the manifest; each can be invoked independently
//! and repeatedly against the same artifact.

pub mod classify;
pub mod execute;
pub mod pool;
pub mod report;
pub mod rules;
pub mod verify;

pub use classify::classify;
pub use execute::execute;
pub use report::{report, CollisionGroup, DuplicateGroup, ReorgReport};
pub use verify::{verify, VerifySummary};
