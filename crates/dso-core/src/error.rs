//! Core error type.
//!
//! `dso-output` defines its own error enum and wraps `DsoError` as one
//! variant; accumulation itself never fails (pure in-memory mutation), so
//! the only core-side failure is a bad named-variable lookup.

use thiserror::Error;

/// The top-level error type for `dso-core`.
#[derive(Debug, Error)]
pub enum DsoError {
    #[error("unknown variable name: {0}")]
    UnknownVariable(String),
}

/// Shorthand result type for `dso-core` lookups.
pub type DsoResult<T> = Result<T, DsoError>;
