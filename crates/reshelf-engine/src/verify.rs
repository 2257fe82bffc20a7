//! Verify phase: independent existence audit of every MOVE record.
//!
//! Runs sequentially: this is cheap metadata-only work, and a stable line
//! order matters for human review. A record passes iff its source is gone
//! and its destination exists; every other combination is itemized.

use reshelf_core::{ActionRecord, Manifest};
use reshelf_store::BlobStore;

#[derive(Debug, Clone, Default)]
pub struct VerifySummary {
    pub ok_count: usize,
    pub failed_count: usize,
    /// One line per verified record, in manifest order.
    pub lines: Vec<String>,
}

impl VerifySummary {
    pub fn passed(&self) -> bool {
        self.failed_count == 0
    }

    /// True when the manifest had no MOVE records to check.
    pub fn is_empty(&self) -> bool {
        self.ok_count == 0 && self.failed_count == 0
    }
}

/// Re-examine the live store against the manifest.
pub fn verify(store: &dyn BlobStore, manifest: &Manifest) -> VerifySummary {
    let mut summary = VerifySummary::default();

    for record in manifest.moves() {
        let line = verify_record(store, record);
        if line.starts_with("OK") {
            summary.ok_count += 1;
        } else {
            summary.failed_count += 1;
        }
        summary.lines.push(line);
    }

    tracing::debug!(
        ok = summary.ok_count,
        failed = summary.failed_count,
        "verification finished"
    );
    summary
}

fn verify_record(store: &dyn BlobStore, record: &ActionRecord) -> String {
    let mut problems: Vec<String> = Vec::new();

    match store.head(&record.source_path) {
        Ok(Some(_)) => problems.push("source still present".to_string()),
        Ok(None) => {}
        Err(err) => problems.push(format!("source check failed: {err}")),
    }

    match store.head(&record.destination_path) {
        Ok(Some(_)) => {}
        Ok(None) => problems.push("destination missing".to_string()),
        Err(err) => problems.push(format!("destination check failed: {err}")),
    }

    if problems.is_empty() {
        format!("OK: {} -> {}", record.source_path, record.destination_path)
    } else {
        format!(
            "FAILED: {} -> {} ({})",
            record.source_path,
            record.destination_path,
            problems.join("; ")
        )
    }
}
