//! Runtime configuration that downstream crates can serialize/deserialize.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReshelfConfig {
    /// Classification pool width. Each worker classifies one object at a time.
    pub classify_workers: usize,

    /// Execution pool width, independent of the classifier's.
    pub execute_workers: usize,

    /// Maximum content-sample size for sniffing rules, in bytes.
    pub sample_bytes: usize,

    /// Fully-qualified store URI (e.g. `s3://bucket/prefix`, `file:///data`).
    pub store_uri: Option<String>,

    /// Cloud credential hints / overrides.
    pub aws_region: Option<String>,
    pub aws_access_key_id: Option<String>,
    pub aws_secret_access_key: Option<String>,
    pub aws_session_token: Option<String>,
    pub gcs_service_account_path: Option<String>,
    pub azure_access_key: Option<String>,

    /// Retry policy for individual store calls (client policy, not batch policy).
    pub retry_max_retries: usize,
    pub retry_initial_backoff_ms: u64,
    pub retry_max_backoff_ms: u64,
}

impl Default for ReshelfConfig {
    fn default() -> Self {
        Self {
            classify_workers: 8,
            execute_workers: 8,
            sample_bytes: 4096,
            store_uri: None,
            aws_region: None,
            aws_access_key_id: None,
            aws_secret_access_key: None,
            aws_session_token: None,
            gcs_service_account_path: None,
            azure_access_key: None,
            retry_max_retries: 3,
            retry_initial_backoff_ms: 200,
            retry_max_backoff_ms: 5_000,
        }
    }
}

impl ReshelfConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `RESHELF_CLASSIFY_WORKERS`: classification pool width
    /// - `RESHELF_EXECUTE_WORKERS`: execution pool width
    /// - `RESHELF_SAMPLE_BYTES`: content-sample cap in bytes
    /// - `RESHELF_STORE_URI`: store URI
    /// - `RESHELF_AWS_REGION` / `RESHELF_AWS_ACCESS_KEY_ID` /
    ///   `RESHELF_AWS_SECRET_ACCESS_KEY` / `RESHELF_AWS_SESSION_TOKEN`
    /// - `RESHELF_GCS_SA_PATH`, `RESHELF_AZURE_ACCESS_KEY`
    /// - `RESHELF_RETRY_MAX_RETRIES` / `RESHELF_RETRY_INITIAL_MS` /
    ///   `RESHELF_RETRY_MAX_MS`
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("RESHELF_CLASSIFY_WORKERS") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.classify_workers = v;
            }
        }

        if let Ok(s) = std::env::var("RESHELF_EXECUTE_WORKERS") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.execute_workers = v;
            }
        }

        if let Ok(s) = std::env::var("RESHELF_SAMPLE_BYTES") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.sample_bytes = v;
            }
        }

        if let Ok(s) = std::env::var("RESHELF_STORE_URI") {
            cfg.store_uri = Some(s);
        }

        if let Ok(s) = std::env::var("RESHELF_AWS_REGION") {
            cfg.aws_region = Some(s);
        }

        if let Ok(s) = std::env::var("RESHELF_AWS_ACCESS_KEY_ID") {
            cfg.aws_access_key_id = Some(s);
        }

        if let Ok(s) = std::env::var("RESHELF_AWS_SECRET_ACCESS_KEY") {
            cfg.aws_secret_access_key = Some(s);
        }

        if let Ok(s) = std::env::var("RESHELF_AWS_SESSION_TOKEN") {
            cfg.aws_session_token = Some(s);
        }

        if let Ok(s) = std::env::var("RESHELF_GCS_SA_PATH") {
            cfg.gcs_service_account_path = Some(s);
        }

        if let Ok(s) = std::env::var("RESHELF_AZURE_ACCESS_KEY") {
            cfg.azure_access_key = Some(s);
        }

        if let Ok(s) = std::env::var("RESHELF_RETRY_MAX_RETRIES") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.retry_max_retries = v;
            }
        }

        if let Ok(s) = std::env::var("RESHELF_RETRY_INITIAL_MS") {
            if let Ok(v) = s.parse::<u64>() {
                cfg.retry_initial_backoff_ms = v;
            }
        }

        if let Ok(s) = std::env::var("RESHELF_RETRY_MAX_MS") {
            if let Ok(v) = s.parse::<u64>() {
                cfg.retry_max_backoff_ms = v;
            }
        }

        cfg
    }

    /// Produce the storage configuration snapshot used by the store layer.
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            uri: self.store_uri.clone(),
            aws_region: self.aws_region.clone(),
            aws_access_key_id: self.aws_access_key_id.clone(),
            aws_secret_access_key: self.aws_secret_access_key.clone(),
            aws_session_token: self.aws_session_token.clone(),
            gcs_service_account_path: self.gcs_service_account_path.clone(),
            azure_access_key: self.azure_access_key.clone(),
            retry_max_retries: self.retry_max_retries,
            retry_initial_backoff_ms: self.retry_initial_backoff_ms,
            retry_max_backoff_ms: self.retry_max_backoff_ms,
        }
    }
}

/// Store-facing slice of the configuration, handed to adapter builders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub uri: Option<String>,
    pub aws_region: Option<String>,
    pub aws_access_key_id: Option<String>,
    pub aws_secret_access_key: Option<String>,
    pub aws_session_token: Option<String>,
    pub gcs_service_account_path: Option<String>,
    pub azure_access_key: Option<String>,
    pub retry_max_retries: usize,
    pub retry_initial_backoff_ms: u64,
    pub retry_max_backoff_ms: u64,
}

impl StoreConfig {
    pub fn scheme(&self) -> Option<&str> {
        self.uri
            .as_deref()
            .and_then(|uri| uri.split_once("://"))
            .map(|(scheme, _)| scheme.trim())
            .filter(|s| !s.is_empty())
    }
}
