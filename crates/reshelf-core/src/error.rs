use thiserror::Error;

/// Canonical result for core.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Unknown action '{0}'")]
    Action(String),

    #[error("Unknown destination key '{0}'")]
    DestinationKey(String),
}
