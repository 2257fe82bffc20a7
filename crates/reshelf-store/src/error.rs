use thiserror::Error;

/// Result type local to reshelf-store.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("store configuration: {0}")]
    Config(String),

    #[error("object not found: {0}")]
    NotFound(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("invalid copy token '{0}'")]
    CopyToken(String),
}
