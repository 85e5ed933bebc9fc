use thiserror::Error;

/// Errors surfaced while building or validating the data model.
///
/// This is deliberately small: most of the model is plain data, and the
/// bulk of the error taxonomy described by the engine (IoError,
/// ResourceExhausted, Cancelled, ...) belongs to `orc-core`, which performs
/// the actual I/O.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("schema already has {0} columns, row only wrote {1}")]
    ColumnCountTooFew(usize, usize),

    #[error("schema has {0} columns, row tried to write {1}")]
    ColumnCountTooMany(usize, usize),

    #[error("schema is immutable after the first row has been written")]
    SchemaAlreadyFrozen,

    #[error("invalid content-spec string: {0}")]
    InvalidContentSpec(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ModelError>;
