//! Cloud store adapters (S3/GCS/Azure) built on `object_store`.
//!
//! Each adapter is scoped to one bucket/container; keys are plain object
//! keys. The async `object_store` client is bridged onto blocking callers
//! with an owned runtime, and transient failures are retried with
//! exponential backoff on top of the client's own retry layer.

use std::future::Future;
use std::sync::Arc;
use std::thread;

use bytes::Bytes;
use futures::StreamExt;
use object_store::client::backoff::BackoffConfig;
use object_store::path::Path as ObjectPath;
use object_store::{Error as ObjectStoreError, ObjectStore};
use tokio::runtime::Runtime;
use url::Url;

use reshelf_core::config::StoreConfig;
use reshelf_core::hash::normalize_etag;

use crate::error::{Error, Result};
use crate::{BlobStore, CopyToken, ObjectMeta, RetryConfig};

#[cfg(feature = "s3")]
use object_store::aws::{AmazonS3, AmazonS3Builder};
#[cfg(feature = "azure")]
use object_store::azure::{MicrosoftAzure, MicrosoftAzureBuilder};
#[cfg(feature = "gcs")]
use object_store::gcp::{GoogleCloudStorage, GoogleCloudStorageBuilder};

#[derive(Debug, thiserror::Error)]
pub enum CloudStoreBuilderError {
    #[error("missing store URI for {scheme} storage")]
    MissingUri { scheme: &'static str },

    #[error("unsupported or malformed URI '{uri}': {source}")]
    InvalidUri {
        uri: String,
        #[source]
        source: url::ParseError,
    },

    #[error("URI '{uri}' missing bucket/container component")]
    MissingBucket { uri: String },

    #[error("URI '{uri}' missing container segment")]
    MissingContainer { uri: String },

    #[error("failed to initialize async runtime: {0}")]
    Runtime(String),

    #[error("object_store builder error: {0}")]
    Builder(String),
}

impl From<CloudStoreBuilderError> for Error {
    fn from(err: CloudStoreBuilderError) -> Self {
        Error::Config(err.to_string())
    }
}

struct CloudStore {
    runtime: Runtime,
    store: Arc<dyn ObjectStore>,
    retry: RetryConfig,
}

impl CloudStore {
    fn new(store: Arc<dyn ObjectStore>, retry: RetryConfig) -> Result<Self> {
        let runtime = Runtime::new()
            .map_err(|e| CloudStoreBuilderError::Runtime(e.to_string()))?;
        Ok(Self {
            runtime,
            store,
            retry,
        })
    }

    fn run_with_retry<F, Fut, T>(&self, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = object_store::Result<T>>,
    {
        let mut attempt = 0usize;
        let mut backoff = self.retry.initial_backoff;

        loop {
            let result = self.runtime.block_on(op());
            match result {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if attempt >= self.retry.max_retries || !is_retryable(&err) {
                        return Err(map_err(err));
                    }
                    attempt += 1;
                    thread::sleep(backoff);
                    backoff = std::cmp::min(backoff * 2, self.retry.max_backoff);
                }
            }
        }
    }
}

fn is_retryable(err: &ObjectStoreError) -> bool {
    !matches!(
        err,
        ObjectStoreError::NotFound { .. } | ObjectStoreError::AlreadyExists { .. }
    )
}

fn map_err(err: ObjectStoreError) -> Error {
    match err {
        ObjectStoreError::NotFound { path, .. } => Error::NotFound(path),
        other => Error::Storage(format!("{other}")),
    }
}

fn to_meta(meta: object_store::ObjectMeta) -> ObjectMeta {
    ObjectMeta {
        key: meta.location.as_ref().to_string(),
        size: meta.size as u64,
        checksum: meta.e_tag.as_deref().and_then(normalize_etag),
    }
}

impl BlobStore for CloudStore {
    fn list(&self, prefix: &str) -> Result<Vec<ObjectMeta>> {
        let prefix_path = if prefix.is_empty() {
            None
        } else {
            Some(ObjectPath::from(prefix))
        };
        let store = Arc::clone(&self.store);
        self.runtime.block_on(async move {
            let mut stream = store.list(prefix_path.as_ref());
            let mut out = Vec::new();
            while let Some(item) = stream.next().await {
                let meta = item.map_err(map_err)?;
                out.push(to_meta(meta));
            }
            Ok(out)
        })
    }

    fn head(&self, key: &str) -> Result<Option<ObjectMeta>> {
        let path = ObjectPath::from(key);
        let result = self.run_with_retry(|| {
            let store = Arc::clone(&self.store);
            let path = path.clone();
            async move { store.head(&path).await }
        });
        match result {
            Ok(meta) => Ok(Some(to_meta(meta))),
            Err(Error::NotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn read_range(&self, key: &str, offset: u64, len: usize) -> Result<Vec<u8>> {
        let path = ObjectPath::from(key);
        let range = (offset as usize)..(offset as usize + len);
        self.run_with_retry(|| {
            let store = Arc::clone(&self.store);
            let path = path.clone();
            let range = range.clone();
            async move { store.get_range(&path, range).await }
        })
        .map(|bytes| bytes.to_vec())
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = ObjectPath::from(key);
        let data = Bytes::copy_from_slice(bytes);
        self.run_with_retry(|| {
            let store = Arc::clone(&self.store);
            let path = path.clone();
            let bytes = data.clone();
            async move { store.put(&path, bytes).await.map(|_| ()) }
        })
    }

    fn copy_step(&self, src: &str, dst: &str, _token: Option<CopyToken>) -> Result<Option<CopyToken>> {
        // The client performs a server-side copy in one round trip, so no
        // continuation token is ever issued from this adapter.
        let from = ObjectPath::from(src);
        let to = ObjectPath::from(dst);
        self.run_with_retry(|| {
            let store = Arc::clone(&self.store);
            let from = from.clone();
            let to = to.clone();
            async move { store.copy(&from, &to).await }
        })?;
        Ok(None)
    }

    fn delete(&self, key: &str) -> Result<()> {
        let path = ObjectPath::from(key);
        let result = self.run_with_retry(|| {
            let store = Arc::clone(&self.store);
            let path = path.clone();
            async move { store.delete(&path).await }
        });
        match result {
            Ok(()) | Err(Error::NotFound(_)) => Ok(()),
            Err(err) => Err(err),
        }
    }
}

fn object_store_retry(retry: &RetryConfig) -> object_store::RetryConfig {
    object_store::RetryConfig {
        max_retries: retry.max_retries,
        retry_timeout: retry.max_backoff,
        backoff: BackoffConfig {
            init_backoff: retry.initial_backoff,
            max_backoff: retry.max_backoff,
            base: 2.0,
        },
    }
}

#[cfg(any(feature = "s3", feature = "gcs"))]
fn bucket_from_uri(uri: &str) -> std::result::Result<String, CloudStoreBuilderError> {
    let parsed = Url::parse(uri).map_err(|source| CloudStoreBuilderError::InvalidUri {
        uri: uri.to_string(),
        source,
    })?;
    parsed
        .host_str()
        .map(|s| s.to_string())
        .ok_or_else(|| CloudStoreBuilderError::MissingBucket {
            uri: uri.to_string(),
        })
}

#[cfg(feature = "s3")]
pub struct S3Store {
    inner: CloudStore,
}

#[cfg(feature = "s3")]
impl S3Store {
    pub fn new(cfg: &StoreConfig) -> Result<Self> {
        let uri = cfg
            .uri
            .as_deref()
            .ok_or(CloudStoreBuilderError::MissingUri { scheme: "s3" })?;
        let bucket = bucket_from_uri(uri)?;
        let retry = RetryConfig::from_store_config(cfg);
        let mut builder = AmazonS3Builder::new().with_bucket_name(bucket);
        if let Some(region) = &cfg.aws_region {
            builder = builder.with_region(region.clone());
        }
        if let Some(access_key) = &cfg.aws_access_key_id {
            builder = builder.with_access_key_id(access_key.clone());
        }
        if let Some(secret_key) = &cfg.aws_secret_access_key {
            builder = builder.with_secret_access_key(secret_key.clone());
        }
        if let Some(token) = &cfg.aws_session_token {
            builder = builder.with_token(token.clone());
        }
        builder = builder.with_retry(object_store_retry(&retry));
        let store: AmazonS3 = builder
            .build()
            .map_err(|e| CloudStoreBuilderError::Builder(e.to_string()))?;
        let inner = CloudStore::new(Arc::new(store), retry)?;
        Ok(Self { inner })
    }
}

#[cfg(feature = "gcs")]
pub struct GcsStore {
    inner: CloudStore,
}

#[cfg(feature = "gcs")]
impl GcsStore {
    pub fn new(cfg: &StoreConfig) -> Result<Self> {
        let uri = cfg
            .uri
            .as_deref()
            .ok_or(CloudStoreBuilderError::MissingUri { scheme: "gs" })?;
        let bucket = bucket_from_uri(uri)?;
        let retry = RetryConfig::from_store_config(cfg);
        let mut builder = GoogleCloudStorageBuilder::new().with_bucket_name(bucket);
        if let Some(sa_path) = &cfg.gcs_service_account_path {
            builder = builder.with_service_account_path(sa_path);
        }
        builder = builder.with_retry(object_store_retry(&retry));
        let store: GoogleCloudStorage = builder
            .build()
            .map_err(|e| CloudStoreBuilderError::Builder(e.to_string()))?;
        let inner = CloudStore::new(Arc::new(store), retry)?;
        Ok(Self { inner })
    }
}

#[cfg(feature = "azure")]
pub struct AzureStore {
    inner: CloudStore,
}

#[cfg(feature = "azure")]
impl AzureStore {
    pub fn new(cfg: &StoreConfig) -> Result<Self> {
        let uri = cfg
            .uri
            .as_deref()
            .ok_or(CloudStoreBuilderError::MissingUri { scheme: "azure" })?;
        let parsed = Url::parse(uri).map_err(|source| CloudStoreBuilderError::InvalidUri {
            uri: uri.to_string(),
            source,
        })?;
        let account = parsed
            .host_str()
            .ok_or_else(|| CloudStoreBuilderError::MissingBucket {
                uri: uri.to_string(),
            })?
            .to_string();
        let container = parsed
            .path()
            .trim_matches('/')
            .split('/')
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| CloudStoreBuilderError::MissingContainer {
                uri: uri.to_string(),
            })?
            .to_string();
        let retry = RetryConfig::from_store_config(cfg);
        let mut builder = MicrosoftAzureBuilder::new()
            .with_account(account)
            .with_container_name(container)
            .with_retry(object_store_retry(&retry));
        if let Some(key) = &cfg.azure_access_key {
            builder = builder.with_access_key(key.clone());
        }
        let store: MicrosoftAzure = builder
            .build()
            .map_err(|e| CloudStoreBuilderError::Builder(e.to_string()))?;
        let inner = CloudStore::new(Arc::new(store), retry)?;
        Ok(Self { inner })
    }
}

macro_rules! delegate_blob_store {
    ($ty:ty) => {
        impl BlobStore for $ty {
            fn list(&self, prefix: &str) -> Result<Vec<ObjectMeta>> {
                self.inner.list(prefix)
            }

            fn head(&self, key: &str) -> Result<Option<ObjectMeta>> {
                self.inner.head(key)
            }

            fn read_range(&self, key: &str, offset: u64, len: usize) -> Result<Vec<u8>> {
                self.inner.read_range(key, offset, len)
            }

            fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
                self.inner.put(key, bytes)
            }

            fn copy_step(
                &self,
                src: &str,
                dst: &str,
                token: Option<CopyToken>,
            ) -> Result<Option<CopyToken>> {
                self.inner.copy_step(src, dst, token)
            }

            fn delete(&self, key: &str) -> Result<()> {
                self.inner.delete(key)
            }
        }
    };
}

#[cfg(feature = "s3")]
delegate_blob_store!(S3Store);
#[cfg(feature = "gcs")]
delegate_blob_store!(GcsStore);
#[cfg(feature = "azure")]
delegate_blob_store!(AzureStore);
