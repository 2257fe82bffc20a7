use thiserror::Error;

/// Result type local to reshelf-io.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow_schema::ArrowError),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("manifest schema: {0}")]
    Schema(String),

    #[error("invalid record: {0}")]
    Record(String),
}
