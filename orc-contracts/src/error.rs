use thiserror::Error;

/// Errors that can cross a contract boundary (walker, archive, upload).
/// Deliberately flat: each collaborator is implemented outside this crate,
/// so the contract only needs enough structure for the core to decide
/// whether to retry, mark a sample `FailedToCompute`, or abort a set.
#[derive(Error, Debug)]
pub enum ContractError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("backend reported: {0}")]
    Backend(String),

    #[error("operation cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, ContractError>;
