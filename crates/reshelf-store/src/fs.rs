//! Local filesystem store rooted at a directory.
//!
//! Keys are slash-separated paths relative to the root. Listing is cheap and
//! carries no checksum; `head` hashes the file so integrity comparisons work
//! the same way they do against a remote backend.

use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use reshelf_core::hash::Md5Stream;

use crate::error::{Error, Result};
use crate::{BlobStore, CopyToken, ObjectMeta};

#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn abs(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    fn rel_key(&self, path: &Path) -> Option<String> {
        path.strip_prefix(&self.root)
            .ok()
            .and_then(|p| p.to_str())
            .map(|s| s.replace('\\', "/"))
    }
}

fn file_md5(path: &Path) -> Result<String> {
    let mut f = File::open(path).map_err(|e| Error::Storage(format!("open: {e}")))?;
    let mut hasher = Md5Stream::new();
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let n = f
            .read(&mut buf)
            .map_err(|e| Error::Storage(format!("read: {e}")))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finish_hex())
}

fn visit_dirs(dir: &Path, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
    if dir.is_dir() {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_dir() {
                visit_dirs(&path, out)?;
            } else {
                out.push(path);
            }
        }
    }
    Ok(())
}

impl BlobStore for FsStore {
    fn list(&self, prefix: &str) -> Result<Vec<ObjectMeta>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut paths = Vec::new();
        visit_dirs(&self.root, &mut paths).map_err(|e| Error::Storage(format!("list: {e}")))?;

        let mut out = Vec::new();
        for path in paths {
            let Some(key) = self.rel_key(&path) else {
                continue;
            };
            if !key.starts_with(prefix) {
                continue;
            }
            let meta = fs::metadata(&path).map_err(|e| Error::Storage(format!("stat: {e}")))?;
            out.push(ObjectMeta {
                key,
                size: meta.len(),
                checksum: None,
            });
        }
        out.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(out)
    }

    fn head(&self, key: &str) -> Result<Option<ObjectMeta>> {
        let path = self.abs(key);
        if !path.is_file() {
            return Ok(None);
        }
        let meta = fs::metadata(&path).map_err(|e| Error::Storage(format!("stat: {e}")))?;
        Ok(Some(ObjectMeta {
            key: key.to_string(),
            size: meta.len(),
            checksum: Some(file_md5(&path)?),
        }))
    }

    fn read_range(&self, key: &str, offset: u64, len: usize) -> Result<Vec<u8>> {
        let path = self.abs(key);
        if !path.is_file() {
            return Err(Error::NotFound(key.to_string()));
        }
        let mut f = File::open(&path).map_err(|e| Error::Storage(format!("open: {e}")))?;
        f.seek(SeekFrom::Start(offset))
            .map_err(|e| Error::Storage(format!("seek: {e}")))?;
        let mut buf = vec![0u8; len];
        let mut filled = 0usize;
        while filled < len {
            let n = f
                .read(&mut buf[filled..])
                .map_err(|e| Error::Storage(format!("read: {e}")))?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        buf.truncate(filled);
        Ok(buf)
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.abs(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::Storage(format!("mkparent: {e}")))?;
        }
        fs::write(&path, bytes).map_err(|e| Error::Storage(format!("write: {e}")))?;
        Ok(())
    }

    fn copy_step(&self, src: &str, dst: &str, _token: Option<CopyToken>) -> Result<Option<CopyToken>> {
        let from = self.abs(src);
        if !from.is_file() {
            return Err(Error::NotFound(src.to_string()));
        }
        let to = self.abs(dst);
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::Storage(format!("mkparent: {e}")))?;
        }
        // Local copies complete in one round trip.
        fs::copy(&from, &to).map_err(|e| Error::Storage(format!("copy: {e}")))?;
        Ok(None)
    }

    fn delete(&self, key: &str) -> Result<()> {
        let path = self.abs(key);
        if path.exists() {
            fs::remove_file(&path).map_err(|e| Error::Storage(format!("delete: {e}")))?;
        }
        Ok(())
    }
}
