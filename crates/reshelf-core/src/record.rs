//! Action records and the in-memory manifest they form.
//!
//! One record per scanned object, written exactly once by classification and
//! never mutated afterwards. Downstream phases treat the manifest as a set of
//! independent facts; row order carries no meaning.

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Whether a record should be replayed by the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Move,
    Error,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Move => "MOVE",
            Action::Error => "ERROR",
        }
    }

    pub fn parse(s: &str) -> Result<Self, Error> {
        match s {
            "MOVE" => Ok(Action::Move),
            "ERROR" => Ok(Action::Error),
            other => Err(Error::Action(other.to_string())),
        }
    }
}

/// Classification bucket. Each bucket maps to a fixed destination prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DestinationKey {
    Archive,
    Discard,
    LabsDump,
    Get,
    Default,
    Error,
}

impl DestinationKey {
    /// Fixed per-key destination prefix, including the trailing slash.
    pub fn prefix(&self) -> &'static str {
        match self {
            DestinationKey::Archive => "archive/",
            DestinationKey::Discard => "discard/",
            DestinationKey::LabsDump => "labs_dump/",
            DestinationKey::Get => "get/",
            DestinationKey::Default => "shared/",
            DestinationKey::Error => "error/",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DestinationKey::Archive => "ARCHIVE",
            DestinationKey::Discard => "DISCARD",
            DestinationKey::LabsDump => "LABS_DUMP",
            DestinationKey::Get => "GET",
            DestinationKey::Default => "DEFAULT",
            DestinationKey::Error => "ERROR",
        }
    }

    pub fn parse(s: &str) -> Result<Self, Error> {
        match s {
            "ARCHIVE" => Ok(DestinationKey::Archive),
            "DISCARD" => Ok(DestinationKey::Discard),
            "LABS_DUMP" => Ok(DestinationKey::LabsDump),
            "GET" => Ok(DestinationKey::Get),
            "DEFAULT" => Ok(DestinationKey::Default),
            "ERROR" => Ok(DestinationKey::Error),
            other => Err(Error::DestinationKey(other.to_string())),
        }
    }
}

/// Basename of an object key (everything after the last `/`).
pub fn file_name(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

/// One row of the manifest: a single object's classification outcome and
/// intended destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub source_container: String,
    pub source_path: String,
    /// Basename, kept for display/report convenience.
    pub file_name: String,
    pub size_bytes: u64,
    /// MD5 hex at classification time; used for move-integrity comparison
    /// and duplicate detection.
    pub content_hash: String,
    pub action: Action,
    pub destination_key: DestinationKey,
    /// Target key for MOVE records; error text for ERROR records.
    pub destination_path: String,
}

impl ActionRecord {
    /// Record for a successfully classified object.
    pub fn moved(
        container: &str,
        source_path: &str,
        size_bytes: u64,
        content_hash: &str,
        key: DestinationKey,
    ) -> Self {
        let name = file_name(source_path);
        Self {
            source_container: container.to_string(),
            source_path: source_path.to_string(),
            file_name: name.to_string(),
            size_bytes,
            content_hash: content_hash.to_string(),
            action: Action::Move,
            destination_key: key,
            destination_path: format!("{}{}", key.prefix(), name),
        }
    }

    /// Record for an object whose classification failed. The record stays in
    /// the manifest so the scan remains a complete inventory; the error text
    /// rides in `destination_path` for diagnostics.
    pub fn scan_error(container: &str, source_path: &str, size_bytes: u64, error: &str) -> Self {
        Self {
            source_container: container.to_string(),
            source_path: source_path.to_string(),
            file_name: file_name(source_path).to_string(),
            size_bytes,
            content_hash: String::new(),
            action: Action::Error,
            destination_key: DestinationKey::Error,
            destination_path: error.to_string(),
        }
    }

    pub fn is_move(&self) -> bool {
        self.action == Action::Move
    }
}

/// Ordered, immutable collection of action records.
///
/// Created once by classification, then read any number of times by the
/// executor, verifier, and reporter. Holds no connection to any store; the
/// persisted form (see `reshelf-io`) is a flat portable artifact.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Manifest {
    records: Vec<ActionRecord>,
}

impl Manifest {
    pub fn from_records(records: Vec<ActionRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[ActionRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<ActionRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records the executor replays.
    pub fn moves(&self) -> impl Iterator<Item = &ActionRecord> {
        self.records.iter().filter(|r| r.is_move())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destination_path_joins_prefix_and_basename() {
        let rec = ActionRecord::moved("bucket", "in/deep/report.pdf", 10, "h", DestinationKey::Get);
        assert_eq!(rec.file_name, "report.pdf");
        assert_eq!(rec.destination_path, "get/report.pdf");
    }

    #[test]
    fn scan_error_keeps_record_in_inventory() {
        let rec = ActionRecord::scan_error("bucket", "in/x.log", 3, "read failed: timeout");
        assert_eq!(rec.action, Action::Error);
        assert_eq!(rec.destination_key, DestinationKey::Error);
        assert_eq!(rec.destination_path, "read failed: timeout");
        assert!(!rec.is_move());
    }

    #[test]
    fn action_and_key_round_trip_their_wire_names() {
        for action in [Action::Move, Action::Error] {
            assert_eq!(Action::parse(action.as_str()).expect("parse"), action);
        }
        for key in [
            DestinationKey::Archive,
            DestinationKey::Discard,
            DestinationKey::LabsDump,
            DestinationKey::Get,
            DestinationKey::Default,
            DestinationKey::Error,
        ] {
            assert_eq!(DestinationKey::parse(key.as_str()).expect("parse"), key);
        }
        assert!(Action::parse("COPY").is_err());
    }

    #[test]
    fn moves_filters_out_error_records() {
        let manifest = Manifest::from_records(vec![
            ActionRecord::moved("b", "a.csv", 1, "h1", DestinationKey::Default),
            ActionRecord::scan_error("b", "bad.bin", 0, "boom"),
        ]);
        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest.moves().count(), 1);
    }
}
