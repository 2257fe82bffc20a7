//! Classify phase: list a prefix, fan out, emit one record per object.
//!
//! Every listed object produces exactly one `ActionRecord`: classification
//! failures become `ERROR` records rather than dropped rows, so the manifest
//! is a complete inventory of the scanned prefix. Records land in completion
//! order; row order carries no meaning downstream.

use reshelf_core::config::ReshelfConfig;
use reshelf_core::hash::Md5Stream;
use reshelf_core::{ActionRecord, Manifest};
use reshelf_store::{BlobStore, ObjectMeta};

use crate::pool;
use crate::rules::{self, Outcome};

const HASH_CHUNK_BYTES: usize = 4 * 1024 * 1024;

/// Scan `prefix` and produce the manifest. Returns `None` when the prefix
/// lists no objects (information for the caller, not an error). Only the
/// listing itself can fail; per-object failures become records.
pub fn classify(
    store: &dyn BlobStore,
    container: &str,
    prefix: &str,
    cfg: &ReshelfConfig,
) -> Result<Option<Manifest>, reshelf_store::Error> {
    let listing = store.list(prefix)?;
    if listing.is_empty() {
        tracing::info!(prefix, "no objects under prefix; nothing to classify");
        return Ok(None);
    }

    tracing::debug!(
        objects = listing.len(),
        workers = cfg.classify_workers,
        "classifying prefix"
    );
    let sample_cap = cfg.sample_bytes.min(rules::SAMPLE_BYTES);
    let records = pool::run(cfg.classify_workers, listing, |meta| {
        classify_object(store, container, sample_cap, meta)
    });
    Ok(Some(Manifest::from_records(records)))
}

fn classify_object(
    store: &dyn BlobStore,
    container: &str,
    sample_cap: usize,
    meta: ObjectMeta,
) -> ActionRecord {
    match try_classify(store, container, sample_cap, &meta) {
        Ok(record) => record,
        Err(err) => {
            tracing::debug!(key = %meta.key, error = %err, "classification failed");
            ActionRecord::scan_error(container, &meta.key, meta.size, &err.to_string())
        }
    }
}

fn try_classify(
    store: &dyn BlobStore,
    container: &str,
    sample_cap: usize,
    meta: &ObjectMeta,
) -> Result<ActionRecord, reshelf_store::Error> {
    let rule = rules::first_match(&meta.key);
    let destination = match rule.outcome {
        Outcome::Assign(key) => key,
        Outcome::SampleKeywords {
            keywords,
            on_match,
            otherwise,
        } => {
            let sample = read_sample(store, meta, sample_cap)?;
            if rules::sample_contains(&sample, keywords) {
                on_match
            } else {
                otherwise
            }
        }
        Outcome::ParsePython {
            on_error,
            otherwise,
        } => {
            let sample = read_sample(store, meta, sample_cap)?;
            if rules::python_parses(&sample) {
                otherwise
            } else {
                on_error
            }
        }
    };

    let content_hash = match &meta.checksum {
        Some(hash) => hash.clone(),
        None => object_md5(store, &meta.key, meta.size)?,
    };

    Ok(ActionRecord::moved(
        container,
        &meta.key,
        meta.size,
        &content_hash,
        destination,
    ))
}

fn read_sample(
    store: &dyn BlobStore,
    meta: &ObjectMeta,
    sample_cap: usize,
) -> Result<Vec<u8>, reshelf_store::Error> {
    let len = (meta.size as usize).min(sample_cap);
    if len == 0 {
        return Ok(Vec::new());
    }
    store.read_range(&meta.key, 0, len)
}

/// MD5 of a whole object, streamed in fixed-size ranges. Used when the
/// backend cannot supply a comparable checksum (e.g. multipart ETags).
pub(crate) fn object_md5(
    store: &dyn BlobStore,
    key: &str,
    size: u64,
) -> Result<String, reshelf_store::Error> {
    let mut hasher = Md5Stream::new();
    let mut offset = 0u64;
    while offset < size {
        let len = ((size - offset) as usize).min(HASH_CHUNK_BYTES);
        let chunk = store.read_range(key, offset, len)?;
        if chunk.is_empty() {
            break;
        }
        offset += chunk.len() as u64;
        hasher.update(&chunk);
    }
    Ok(hasher.finish_hex())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reshelf_core::hash::md5_hex;
    use reshelf_core::DestinationKey;
    use reshelf_store::MemoryStore;

    #[test]
    fn object_md5_streams_in_chunks() {
        let store = MemoryStore::new();
        let body = vec![0xabu8; HASH_CHUNK_BYTES + 17];
        store.insert("big.bin", body.clone());
        let hash = object_md5(&store, "big.bin", body.len() as u64).expect("hash");
        assert_eq!(hash, md5_hex(&body));
    }

    #[test]
    fn empty_prefix_yields_no_manifest() {
        let store = MemoryStore::new();
        let cfg = ReshelfConfig::default();
        let manifest = classify(&store, "memory", "inbox/", &cfg).expect("classify");
        assert!(manifest.is_none());
    }

    #[test]
    fn error_record_shape() {
        let rec = ActionRecord::scan_error("memory", "inbox/x.log", 5, "storage error: boom");
        assert_eq!(rec.destination_key, DestinationKey::Error);
        assert!(rec.destination_path.contains("boom"));
    }
}
