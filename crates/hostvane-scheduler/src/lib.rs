//! hostvane-scheduler — the scheduling service façade.
//!
//! Wires the placement engine to its side effects: request validation,
//! dispatch to the allocators, pending-usage reservations against the
//! shared table, and the non-committing forecast mode.
//!
//! # Architecture
//!
//! ```text
//! Scheduler
//!   ├── CandidatePool (one per call, exclusively owned)
//!   │     └── allocate::run (simple or pair)
//!   ├── PendingUsageStore (shared, linearizable per host)
//!   └── forecast (replay on an independent pool + rejection log)
//! ```

pub mod error;
pub mod forecast;
pub mod scheduler;

pub use error::{SchedulerError, SchedulerResult};
pub use forecast::{ForecastFilter, ForecastReport, Rejection, RejectionLog};
pub use scheduler::Scheduler;
