//! Placement error types.

use thiserror::Error;

/// Structural errors detected before any allocation begins.
///
/// Per-unit placement failures are data (`PlacementResult::Failed`), never
/// errors; these variants reject the whole call.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PoolError {
    #[error("candidate pool is empty")]
    Empty,

    #[error("requested instance count must be at least 1")]
    ZeroCount,

    #[error("duplicate candidate host: {0}")]
    DuplicateHost(String),
}

pub type PoolResult<T> = Result<T, PoolError>;
