use reshelf_core::config::ReshelfConfig;
use reshelf_core::hash::md5_hex;
use reshelf_core::{ActionRecord, DestinationKey, Manifest};
use reshelf_engine::classify;
use reshelf_store::{BlobStore, CopyToken, Error, MemoryStore, ObjectMeta};

fn classify_store(store: &MemoryStore) -> Manifest {
    let cfg = ReshelfConfig::default();
    classify(store, "memory", "in/", &cfg)
        .expect("classify")
        .expect("manifest")
}

fn record<'a>(manifest: &'a Manifest, source: &str) -> &'a ActionRecord {
    manifest
        .records()
        .iter()
        .find(|r| r.source_path == source)
        .unwrap_or_else(|| panic!("record for {source}"))
}

#[test]
fn archive_extensions_dominate_regardless_of_content() {
    let store = MemoryStore::new();
    store.insert("in/backup.bak", b"confidential FATAL payload".to_vec());
    store.insert("in/scratch.tmp", b"anything".to_vec());
    store.insert("in/notes.old", b"ERROR".to_vec());
    store.insert("in/snap.archive", b"x".to_vec());

    let manifest = classify_store(&store);
    for source in ["in/backup.bak", "in/scratch.tmp", "in/notes.old", "in/snap.archive"] {
        let rec = record(&manifest, source);
        assert_eq!(rec.destination_key, DestinationKey::Archive, "{source}");
        assert!(rec.destination_path.starts_with("archive/"));
        assert!(rec.is_move());
    }
}

#[test]
fn log_severity_sniffing() {
    let store = MemoryStore::new();
    store.insert("in/crash.log", b"2024-01-01 FaTaL: disk gone".to_vec());
    store.insert("in/errors.log", b"level=error retrying".to_vec());
    store.insert("in/clean.log", b"all systems nominal".to_vec());

    let manifest = classify_store(&store);
    assert_eq!(record(&manifest, "in/crash.log").destination_key, DestinationKey::Discard);
    assert_eq!(record(&manifest, "in/errors.log").destination_key, DestinationKey::Discard);
    assert_eq!(record(&manifest, "in/clean.log").destination_key, DestinationKey::Default);
    assert_eq!(
        record(&manifest, "in/clean.log").destination_path,
        "shared/clean.log"
    );
}

#[test]
fn python_syntax_decides_labs_dump() {
    let store = MemoryStore::new();
    store.insert("in/good.py", b"def ok():\n    return 1\n".to_vec());
    store.insert("in/bad.py", b"def broken(:\n pass".to_vec());
    store.insert("in/nb.ipynb", b"{\"cells\": []}".to_vec());

    let manifest = classify_store(&store);
    assert_eq!(record(&manifest, "in/good.py").destination_key, DestinationKey::Default);
    assert_eq!(record(&manifest, "in/bad.py").destination_key, DestinationKey::LabsDump);
    assert_eq!(record(&manifest, "in/nb.ipynb").destination_key, DestinationKey::LabsDump);
    assert_eq!(
        record(&manifest, "in/bad.py").destination_path,
        "labs_dump/bad.py"
    );
}

#[test]
fn fallback_sniffs_for_confidential_content() {
    let store = MemoryStore::new();
    store.insert("in/secret.bin", b"This file is CONFIDENTIAL, do not share".to_vec());
    store.insert("in/plain.bin", b"nothing special here".to_vec());
    store.insert("in/data.csv", b"a,b\n1,2\n".to_vec());
    store.insert("in/doc.pdf", b"%PDF-1.7".to_vec());
    store.insert("in/spec.docx", b"PK..".to_vec());

    let manifest = classify_store(&store);
    assert_eq!(record(&manifest, "in/secret.bin").destination_key, DestinationKey::Discard);
    assert_eq!(record(&manifest, "in/plain.bin").destination_key, DestinationKey::Default);
    assert_eq!(record(&manifest, "in/data.csv").destination_key, DestinationKey::Default);
    assert_eq!(record(&manifest, "in/doc.pdf").destination_key, DestinationKey::Get);
    assert_eq!(record(&manifest, "in/spec.docx").destination_key, DestinationKey::Get);
}

#[test]
fn records_capture_size_and_hash_at_classification_time() {
    let store = MemoryStore::new();
    let body = b"a,b\n1,2\n".to_vec();
    store.insert("in/data.csv", body.clone());

    let manifest = classify_store(&store);
    let rec = record(&manifest, "in/data.csv");
    assert_eq!(rec.size_bytes, body.len() as u64);
    assert_eq!(rec.content_hash, md5_hex(&body));
    assert_eq!(rec.file_name, "data.csv");
    assert_eq!(rec.source_container, "memory");
}

#[test]
fn extension_only_rules_never_read_content() {
    let store = MemoryStore::new();
    store.insert("in/backup.bak", b"does not matter".to_vec());

    let manifest = classify_store(&store);
    assert_eq!(manifest.len(), 1);
    // One list call; the checksum came from the listing, so no reads.
    assert_eq!(store.op_count(), 1);
}

/// Store whose content reads always fail, to force scan errors.
struct UnreadableStore {
    inner: MemoryStore,
}

impl BlobStore for UnreadableStore {
    fn list(&self, prefix: &str) -> Result<Vec<ObjectMeta>, Error> {
        // Strip checksums so classification must read content.
        Ok(self
            .inner
            .list(prefix)?
            .into_iter()
            .map(|meta| ObjectMeta {
                checksum: None,
                ..meta
            })
            .collect())
    }

    fn head(&self, key: &str) -> Result<Option<ObjectMeta>, Error> {
        self.inner.head(key)
    }

    fn read_range(&self, _key: &str, _offset: u64, _len: usize) -> Result<Vec<u8>, Error> {
        Err(Error::Storage("simulated read failure".into()))
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), Error> {
        self.inner.put(key, bytes)
    }

    fn copy_step(
        &self,
        src: &str,
        dst: &str,
        token: Option<CopyToken>,
    ) -> Result<Option<CopyToken>, Error> {
        self.inner.copy_step(src, dst, token)
    }

    fn delete(&self, key: &str) -> Result<(), Error> {
        self.inner.delete(key)
    }
}

#[test]
fn unreadable_objects_become_error_records_not_dropped_rows() {
    let inner = MemoryStore::new();
    inner.insert("in/app.log", b"ERROR: broken".to_vec());
    inner.insert("in/fine.bak", b"archived".to_vec());
    let store = UnreadableStore { inner };

    let cfg = ReshelfConfig::default();
    let manifest = classify(&store, "memory", "in/", &cfg)
        .expect("classify")
        .expect("manifest");

    // The scan is a complete inventory: both objects are present.
    assert_eq!(manifest.len(), 2);

    let log = record(&manifest, "in/app.log");
    assert!(!log.is_move());
    assert_eq!(log.destination_key, DestinationKey::Error);
    assert!(log.destination_path.contains("simulated read failure"));

    // The .bak needed no sample, but its hash fallback also reads content,
    // so it too records the failure rather than a bogus hash.
    let bak = record(&manifest, "in/fine.bak");
    assert!(!bak.is_move());
}

#[test]
fn empty_prefix_produces_no_manifest() {
    let store = MemoryStore::new();
    store.insert("elsewhere/x.csv", b"a".to_vec());

    let cfg = ReshelfConfig::default();
    let manifest = classify(&store, "memory", "in/", &cfg).expect("classify");
    assert!(manifest.is_none());
}
