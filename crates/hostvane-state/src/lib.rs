//! hostvane-state — shared domain types and the pending-usage table.
//!
//! Everything that crosses a boundary between the predicate engine, the
//! placement engine, and the task engine lives here: the ranked-host input
//! record, the request descriptor, the per-unit placement outcomes, driver
//! capability flags, and the concurrent pending-usage reservation table.
//!
//! The `PendingUsageStore` is `Clone` + `Send` + `Sync` (a handle over an
//! `Arc`-shared table) and is the only state shared between concurrent
//! scheduling calls.

pub mod pending;
pub mod types;

pub use pending::{PendingUsageEntry, PendingUsageStore, Reservation};
pub use types::*;
