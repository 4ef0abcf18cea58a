//! Error types for dso-output.
//!
//! Nothing here is retried: a failed open or write aborts the run, and a
//! schema mismatch indicates a configuration defect, not a transient
//! condition.  A silently incomplete event is worse than a halted run.

use thiserror::Error;

/// Errors that can occur while opening a channel or writing event output.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("encode error: {0}")]
    Encode(#[from] bincode::Error),

    #[error("unknown output kind {requested:?} (known kinds: {known})")]
    UnknownKind { requested: String, known: String },

    #[error("no bank registered for category {0:?}")]
    MissingBank(String),

    #[error("bank {bank:?} has no field {field:?}")]
    SchemaMismatch { bank: String, field: String },

    #[error("sequencing error: {0}")]
    Sequence(String),

    #[error("channel error: {0}")]
    Channel(String),
}

/// Alias for `Result<T, OutputError>`.
pub type OutputResult<T> = Result<T, OutputError>;
