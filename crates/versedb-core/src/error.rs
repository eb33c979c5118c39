use thiserror::Error;

/// Error taxonomy for the retrieval core.
///
/// `Ingest` and `IndexInconsistency` are recovered locally (skip-and-log or
/// retry the whole rebuild); `Provider` degrades a single retrieval stream and
/// only surfaces when every stream fails. Budget truncation and empty fusion
/// results are ordinary return values, never errors.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Ingest failed: {0}")]
    Ingest(String),

    #[error("Embedding provider failed: {0}")]
    Provider(String),

    #[error("Index rebuild inconsistent: {0}")]
    IndexInconsistency(String),

    #[error("Storage operation failed: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, Error>;
