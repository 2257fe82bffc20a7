//! In-memory store backend for testing.
//!
//! HashMap-based, thread-safe, with a configurable copy chunk size so tests
//! can exercise the multi-step resumable-copy path. Every trait call bumps an
//! operation counter so tests can assert that skipped records touch the store
//! zero times.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use reshelf_core::hash::md5_hex;

use crate::error::{Error, Result};
use crate::{BlobStore, CopyToken, ObjectMeta};

#[derive(Clone)]
pub struct MemoryStore {
    data: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    ops: Arc<AtomicUsize>,
    /// When set, `copy_step` moves at most this many bytes per call.
    copy_chunk: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            data: Arc::new(Mutex::new(HashMap::new())),
            ops: Arc::new(AtomicUsize::new(0)),
            copy_chunk: None,
        }
    }

    /// Force chunked copies: each `copy_step` transfers at most `chunk` bytes
    /// and returns a continuation token until the object is fully copied.
    pub fn with_copy_chunk(mut self, chunk: usize) -> Self {
        self.copy_chunk = Some(chunk.max(1));
        self
    }

    /// Pre-populate data for a key (used by tests).
    pub fn insert(&self, key: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        let mut data = self.data.lock().unwrap();
        data.insert(key.into(), bytes.into());
    }

    /// Check if a key exists.
    pub fn contains(&self, key: &str) -> bool {
        let data = self.data.lock().unwrap();
        data.contains_key(key)
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        let data = self.data.lock().unwrap();
        data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total store calls made through the `BlobStore` interface.
    pub fn op_count(&self) -> usize {
        self.ops.load(Ordering::SeqCst)
    }

    /// Clear all stored data.
    pub fn clear(&self) {
        let mut data = self.data.lock().unwrap();
        data.clear();
    }

    fn bump(&self) {
        self.ops.fetch_add(1, Ordering::SeqCst);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BlobStore for MemoryStore {
    fn list(&self, prefix: &str) -> Result<Vec<ObjectMeta>> {
        self.bump();
        let data = self.data.lock().unwrap();
        let mut out: Vec<ObjectMeta> = data
            .iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| ObjectMeta {
                key: k.clone(),
                size: v.len() as u64,
                checksum: Some(md5_hex(v)),
            })
            .collect();
        out.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(out)
    }

    fn head(&self, key: &str) -> Result<Option<ObjectMeta>> {
        self.bump();
        let data = self.data.lock().unwrap();
        Ok(data.get(key).map(|v| ObjectMeta {
            key: key.to_string(),
            size: v.len() as u64,
            checksum: Some(md5_hex(v)),
        }))
    }

    fn read_range(&self, key: &str, offset: u64, len: usize) -> Result<Vec<u8>> {
        self.bump();
        let data = self.data.lock().unwrap();
        let bytes = data
            .get(key)
            .ok_or_else(|| Error::NotFound(key.to_string()))?;

        let start = (offset as usize).min(bytes.len());
        let end = start.saturating_add(len).min(bytes.len());
        Ok(bytes[start..end].to_vec())
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        self.bump();
        let mut data = self.data.lock().unwrap();
        data.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn copy_step(&self, src: &str, dst: &str, token: Option<CopyToken>) -> Result<Option<CopyToken>> {
        self.bump();
        let mut data = self.data.lock().unwrap();
        let source = data
            .get(src)
            .ok_or_else(|| Error::NotFound(src.to_string()))?
            .clone();

        let Some(chunk) = self.copy_chunk else {
            data.insert(dst.to_string(), source);
            return Ok(None);
        };

        let offset = match token {
            None => 0usize,
            Some(token) => token
                .as_str()
                .parse::<usize>()
                .map_err(|_| Error::CopyToken(token.as_str().to_string()))?,
        };

        let end = offset.saturating_add(chunk).min(source.len());
        let piece = &source[offset.min(source.len())..end];
        let entry = if offset == 0 {
            data.insert(dst.to_string(), Vec::new());
            data.get_mut(dst).expect("just inserted")
        } else {
            data.get_mut(dst)
                .ok_or_else(|| Error::Storage(format!("resumed copy without partial object: {dst}")))?
        };
        entry.extend_from_slice(piece);

        if end >= source.len() {
            Ok(None)
        } else {
            Ok(Some(CopyToken::new(end.to_string())))
        }
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.bump();
        let mut data = self.data.lock().unwrap();
        data.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_write_read() {
        let store = MemoryStore::new();
        store.put("test/file.txt", b"hello world").unwrap();
        let read = store.read_range("test/file.txt", 0, 11).unwrap();
        assert_eq!(read, b"hello world");
    }

    #[test]
    fn test_memory_store_read_range_truncates() {
        let store = MemoryStore::new();
        store.put("test/file.txt", b"hello world").unwrap();
        let partial = store.read_range("test/file.txt", 6, 100).unwrap();
        assert_eq!(partial, b"world");
    }

    #[test]
    fn test_memory_store_head_and_delete() {
        let store = MemoryStore::new();
        store.put("a.txt", b"data").unwrap();
        let meta = store.head("a.txt").unwrap().expect("exists");
        assert_eq!(meta.size, 4);
        assert_eq!(meta.checksum.as_deref(), Some(md5_hex(b"data").as_str()));

        store.delete("a.txt").unwrap();
        assert!(store.head("a.txt").unwrap().is_none());
        // deleting again is fine
        store.delete("a.txt").unwrap();
    }

    #[test]
    fn test_memory_store_list_by_prefix() {
        let store = MemoryStore::new();
        store.put("dir/file1.txt", b"1").unwrap();
        store.put("dir/file2.txt", b"2").unwrap();
        store.put("other/file3.txt", b"3").unwrap();

        let listed = store.list("dir/").unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].key, "dir/file1.txt");
    }

    #[test]
    fn test_single_step_copy() {
        let store = MemoryStore::new();
        store.put("src.bin", b"payload").unwrap();
        let token = store.copy_step("src.bin", "dst.bin", None).unwrap();
        assert!(token.is_none());
        assert_eq!(store.read_range("dst.bin", 0, 7).unwrap(), b"payload");
    }

    #[test]
    fn test_chunked_copy_needs_multiple_steps() {
        let store = MemoryStore::new().with_copy_chunk(3);
        store.put("src.bin", b"0123456789").unwrap();

        let mut steps = 0;
        let mut token = None;
        loop {
            steps += 1;
            token = store.copy_step("src.bin", "dst.bin", token).unwrap();
            if token.is_none() {
                break;
            }
        }
        assert_eq!(steps, 4); // ceil(10 / 3)
        assert_eq!(store.read_range("dst.bin", 0, 10).unwrap(), b"0123456789");
    }

    #[test]
    fn test_op_count_tracks_every_call() {
        let store = MemoryStore::new();
        assert_eq!(store.op_count(), 0);
        store.put("k", b"v").unwrap();
        let _ = store.head("k").unwrap();
        assert_eq!(store.op_count(), 2);
    }
}
