//! Scheduler error types.

use thiserror::Error;

/// Errors that reject a scheduling or forecast call outright.
///
/// Per-unit placement failures never surface here; they are entries in the
/// returned `ScheduleOutput`.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("rejected scheduling request: {0}")]
    Request(#[from] hostvane_placement::PoolError),
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;
