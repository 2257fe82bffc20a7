//! Execute phase: replay MOVE records as copy → integrity check → delete.
//!
//! Each record is one task; a task's failure becomes a `FAILURE:` outcome
//! string and never aborts the batch. The copy is driven through the
//! `CopyState` machine until the adapter stops returning continuation
//! tokens; a single logical copy may span many round trips.

use reshelf_core::{ActionRecord, Manifest};
use reshelf_store::{BlobStore, CopyState, Error as StoreError};

use crate::classify::object_md5;
use crate::pool;

/// Replay the manifest's MOVE records with at most `width` workers.
/// Returns one outcome string per record, in completion order.
pub fn execute(store: &dyn BlobStore, manifest: &Manifest, width: usize) -> Vec<String> {
    let records: Vec<&ActionRecord> = manifest.records().iter().collect();
    tracing::debug!(
        records = records.len(),
        moves = manifest.moves().count(),
        width,
        "executing manifest"
    );

    pool::run(width, records, |record| {
        if !record.is_move() {
            return format!("SKIPPED: {}", record.source_path);
        }
        match move_record(store, record) {
            Ok(outcome) => outcome,
            Err(err) => format!("FAILURE: {err}"),
        }
    })
}

fn move_record(store: &dyn BlobStore, record: &ActionRecord) -> Result<String, StoreError> {
    if store.head(&record.source_path)?.is_none() {
        return Ok(format!(
            "ERROR: source not found: {}",
            record.source_path
        ));
    }

    let mut state = CopyState::Pending;
    while !state.is_done() {
        let next = store.copy_step(
            &record.source_path,
            &record.destination_path,
            state.token().cloned(),
        )?;
        state = state.advance(next);
    }

    let destination = store.head(&record.destination_path)?.ok_or_else(|| {
        StoreError::Storage(format!(
            "destination missing after copy: {}",
            record.destination_path
        ))
    })?;

    let destination_hash = match destination.checksum {
        Some(hash) => hash,
        None => object_md5(store, &record.destination_path, destination.size)?,
    };
    if destination_hash != record.content_hash {
        // Non-fatal: the source is still deleted. The warning is the
        // operator's only signal that the copy may be corrupt.
        tracing::warn!(
            source = %record.source_path,
            destination = %record.destination_path,
            expected = %record.content_hash,
            actual = %destination_hash,
            "integrity mismatch after copy; proceeding to delete source"
        );
    }

    store.delete(&record.source_path)?;

    Ok(format!(
        "SUCCESS: moved {} to {}",
        record.source_path, record.destination_path
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reshelf_core::{ActionRecord, DestinationKey, Manifest};
    use reshelf_core::hash::md5_hex;
    use reshelf_store::MemoryStore;

    fn move_manifest(store: &MemoryStore, key: &str, body: &[u8]) -> Manifest {
        store.insert(key, body.to_vec());
        Manifest::from_records(vec![ActionRecord::moved(
            "memory",
            key,
            body.len() as u64,
            &md5_hex(body),
            DestinationKey::Archive,
        )])
    }

    #[test]
    fn successful_move_deletes_source() {
        let store = MemoryStore::new();
        let manifest = move_manifest(&store, "in/a.bak", b"payload");

        let outcomes = execute(&store, &manifest, 2);
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0], "SUCCESS: moved in/a.bak to archive/a.bak");
        assert!(!store.contains("in/a.bak"));
        assert!(store.contains("archive/a.bak"));
    }

    #[test]
    fn chunked_copy_is_driven_to_completion() {
        let store = MemoryStore::new().with_copy_chunk(2);
        let manifest = move_manifest(&store, "in/b.bak", b"0123456789");

        let outcomes = execute(&store, &manifest, 1);
        assert_eq!(outcomes[0], "SUCCESS: moved in/b.bak to archive/b.bak");
        assert_eq!(
            store.read_range("archive/b.bak", 0, 10).expect("read"),
            b"0123456789"
        );
        assert!(!store.contains("in/b.bak"));
    }

    #[test]
    fn missing_source_mutates_nothing() {
        let store = MemoryStore::new();
        let manifest = Manifest::from_records(vec![ActionRecord::moved(
            "memory",
            "in/ghost.bak",
            3,
            "abc",
            DestinationKey::Archive,
        )]);

        let outcomes = execute(&store, &manifest, 1);
        assert!(outcomes[0].starts_with("ERROR: source not found"));
        assert!(!store.contains("archive/ghost.bak"));
    }

    #[test]
    fn skipped_records_touch_the_store_zero_times() {
        let store = MemoryStore::new();
        let manifest = Manifest::from_records(vec![ActionRecord::scan_error(
            "memory",
            "in/broken.bin",
            0,
            "sample read failed",
        )]);

        let outcomes = execute(&store, &manifest, 4);
        assert_eq!(outcomes, vec!["SKIPPED: in/broken.bin".to_string()]);
        assert_eq!(store.op_count(), 0);
    }
}
