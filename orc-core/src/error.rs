use thiserror::Error;

/// Error taxonomy for the engine, modeled as enum variants rather than
/// separate exception types (spec kinds: ConfigError, IoError,
/// ResourceExhausted, IntegrityViolation, Cancelled).
#[derive(Error, Debug)]
pub enum CoreError {
    /// Invalid CLI/config option. No side effects; caller should print to
    /// stderr and exit non-zero.
    #[error("configuration error: {0}")]
    Config(String),

    /// Source read, archive write, or upload failure. Logged and
    /// surfaced as a `FailedToCompute` limit-status for the affected
    /// sample; the run continues.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Allocation failure or similar unrecoverable resource condition.
    /// Deterministic: the termination cascade runs and the process exits.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    /// Column count mismatch on `end_of_line`. Fatal: the writer is
    /// producing garbage, the set is aborted, but the archive is closed
    /// so prior rows are preserved.
    #[error("table integrity violation: {0}")]
    IntegrityViolation(String),

    /// Termination signal or user abort. Cooperative; cascades through
    /// the termination handlers.
    #[error("cancelled")]
    Cancelled,

    #[error(transparent)]
    Contract(#[from] orc_contracts::ContractError),

    #[error(transparent)]
    Model(#[from] orc_model::ModelError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

pub type Result<T> = std::result::Result<T, CoreError>;
