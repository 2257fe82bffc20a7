#![forbid(unsafe_code)]
//! Blob-store client interface and adapters.
//!
//! - `memory`: in-process store for tests (`memory://`).
//! - `fs`: local filesystem rooted at a directory (`file://` or bare path).
//! - `cloud`: S3/GCS/Azure built on `object_store` (feature-gated).
//!
//! Also exposes `RetryConfig` and `build_store_from_config`, which chooses
//! the adapter from the configured URI scheme.

pub mod error;
mod fs;
mod memory;

#[cfg(any(feature = "s3", feature = "gcs", feature = "azure"))]
mod cloud;

pub use error::{Error, Result};
pub use fs::FsStore;
pub use memory::MemoryStore;

#[cfg(any(feature = "s3", feature = "gcs", feature = "azure"))]
pub use cloud::CloudStoreBuilderError;
#[cfg(feature = "azure")]
pub use cloud::AzureStore;
#[cfg(feature = "gcs")]
pub use cloud::GcsStore;
#[cfg(feature = "s3")]
pub use cloud::S3Store;

use std::time::Duration;

use reshelf_core::config::StoreConfig;

/// Metadata for one stored object. Keys are container-relative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMeta {
    pub key: String,
    pub size: u64,
    /// MD5 hex when the backend can provide one (plain-upload ETags);
    /// `None` when callers must hash the content themselves.
    pub checksum: Option<String>,
}

/// Opaque handle returned by a partially completed copy, passed back in to
/// resume it. Only the adapter that issued a token can interpret it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyToken(String);

impl CopyToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Copy progress as an explicit state machine.
///
/// A copy may span several round trips; drivers feed each `copy_step`
/// response back through [`CopyState::advance`] until the state is `Done`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyState {
    /// No step issued yet.
    Pending,
    /// A step completed but the copy is unfinished; resume with this token.
    InProgress(CopyToken),
    /// The adapter reported completion.
    Done,
}

impl CopyState {
    pub fn token(&self) -> Option<&CopyToken> {
        match self {
            CopyState::InProgress(token) => Some(token),
            _ => None,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, CopyState::Done)
    }

    /// Fold one adapter response into the machine.
    pub fn advance(self, next: Option<CopyToken>) -> CopyState {
        match next {
            Some(token) => CopyState::InProgress(token),
            None => CopyState::Done,
        }
    }
}

/// Client interface to a single container of a blob store.
///
/// Every method is a potential blocking point; adapters own their timeout and
/// per-call retry policy.
pub trait BlobStore: Send + Sync {
    /// List all objects whose key starts with `prefix`.
    fn list(&self, prefix: &str) -> Result<Vec<ObjectMeta>>;

    /// Metadata for a single key; `None` when the object does not exist.
    fn head(&self, key: &str) -> Result<Option<ObjectMeta>>;

    /// Read a byte range. Ranges past end-of-object truncate; callers that
    /// need exact lengths must clamp against `head` first.
    fn read_range(&self, key: &str, offset: u64, len: usize) -> Result<Vec<u8>>;

    /// Write a whole object, replacing any previous content.
    fn put(&self, key: &str, bytes: &[u8]) -> Result<()>;

    /// Advance a copy by one step. `None` starts the copy; a returned token
    /// means the copy is incomplete and must be resumed with that token.
    fn copy_step(&self, src: &str, dst: &str, token: Option<CopyToken>) -> Result<Option<CopyToken>>;

    /// Delete a key. Idempotent (no error if the key does not exist).
    fn delete(&self, key: &str) -> Result<()>;
}

/// Retry/backoff configuration shared across cloud adapters.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: usize,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(5),
        }
    }
}

impl RetryConfig {
    pub fn from_store_config(cfg: &StoreConfig) -> Self {
        Self {
            max_retries: cfg.retry_max_retries,
            initial_backoff: Duration::from_millis(cfg.retry_initial_backoff_ms),
            max_backoff: Duration::from_millis(cfg.retry_max_backoff_ms),
        }
    }
}

/// Identity of a scan source: the container label recorded in manifest rows
/// and the in-container key prefix to scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceId {
    pub container: String,
    pub prefix: String,
}

/// Split a store URI into the container label and scan prefix.
///
/// `s3://bucket/some/prefix` → container `bucket`, prefix `some/prefix`.
/// `file:///data/inbox` and bare paths → container is the root directory,
/// prefix empty (the adapter is rooted there).
pub fn source_identity(cfg: &StoreConfig) -> Result<SourceId> {
    let uri = cfg.uri.as_deref().unwrap_or_default();
    match cfg.scheme() {
        Some("s3") | Some("gs") | Some("gcs") => {
            let rest = uri.split_once("://").map(|(_, r)| r).unwrap_or_default();
            let (bucket, prefix) = rest.split_once('/').unwrap_or((rest, ""));
            if bucket.is_empty() {
                return Err(Error::Config(format!("URI '{uri}' missing bucket component")));
            }
            Ok(SourceId {
                container: bucket.to_string(),
                prefix: prefix.trim_start_matches('/').to_string(),
            })
        }
        Some("azure") | Some("azblob") => {
            // azure://account/container/prefix
            let rest = uri.split_once("://").map(|(_, r)| r).unwrap_or_default();
            let mut segments = rest.splitn(3, '/');
            let _account = segments.next().unwrap_or_default();
            let container = segments
                .next()
                .filter(|s| !s.is_empty())
                .ok_or_else(|| Error::Config(format!("URI '{uri}' missing container segment")))?;
            let prefix = segments.next().unwrap_or("");
            Ok(SourceId {
                container: container.to_string(),
                prefix: prefix.to_string(),
            })
        }
        Some("memory") => Ok(SourceId {
            container: "memory".to_string(),
            prefix: uri.split_once("://").map(|(_, r)| r).unwrap_or_default().to_string(),
        }),
        Some("file") => Ok(SourceId {
            container: file_uri_to_path(uri).unwrap_or_else(|| uri.to_string()),
            prefix: String::new(),
        }),
        None => Ok(SourceId {
            container: uri.to_string(),
            prefix: String::new(),
        }),
        Some(other) => Err(Error::Config(format!("unsupported store scheme '{other}'"))),
    }
}

/// Build the correct store backend using the provided configuration.
pub fn build_store_from_config(cfg: &StoreConfig) -> Result<Box<dyn BlobStore>> {
    match cfg.scheme() {
        Some("s3") => {
            #[cfg(feature = "s3")]
            {
                let store = S3Store::new(cfg)?;
                Ok(Box::new(store))
            }

            #[cfg(not(feature = "s3"))]
            {
                Err(Error::Config(
                    "reshelf was built without the `s3` feature; rebuild with `--features reshelf-store/s3`"
                        .into(),
                ))
            }
        }
        Some("gs") | Some("gcs") => {
            #[cfg(feature = "gcs")]
            {
                let store = GcsStore::new(cfg)?;
                Ok(Box::new(store))
            }

            #[cfg(not(feature = "gcs"))]
            {
                Err(Error::Config(
                    "reshelf was built without the `gcs` feature; rebuild with `--features reshelf-store/gcs`"
                        .into(),
                ))
            }
        }
        Some("azure") | Some("azblob") => {
            #[cfg(feature = "azure")]
            {
                let store = AzureStore::new(cfg)?;
                Ok(Box::new(store))
            }

            #[cfg(not(feature = "azure"))]
            {
                Err(Error::Config(
                    "reshelf was built without the `azure` feature; rebuild with `--features reshelf-store/azure`"
                        .into(),
                ))
            }
        }
        Some("memory") => Ok(Box::new(MemoryStore::new())),
        Some("file") => {
            let uri = cfg.uri.as_deref().unwrap_or_default();
            let root = file_uri_to_path(uri)
                .ok_or_else(|| Error::Config(format!("malformed file URI '{uri}'")))?;
            Ok(Box::new(FsStore::new(root)))
        }
        None => {
            // Bare path: treat as a local root directory.
            let root = cfg.uri.clone().unwrap_or_else(|| ".".to_string());
            Ok(Box::new(FsStore::new(root)))
        }
        Some(other) => Err(Error::Config(format!("unsupported store scheme '{other}'"))),
    }
}

fn file_uri_to_path(uri: &str) -> Option<String> {
    let stripped = uri.strip_prefix("file://")?;
    if stripped.starts_with('/') {
        Some(stripped.to_string())
    } else {
        Some(format!("/{}", stripped))
    }
}
