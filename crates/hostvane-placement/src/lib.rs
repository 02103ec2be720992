//! hostvane-placement — the placement decision engine.
//!
//! Turns a ranked, capacity-annotated candidate pool into per-unit
//! placement outcomes. Pure in-memory computation: no I/O, no async, no
//! shared state. Side effects (pending-usage reservations) belong to
//! `hostvane-scheduler`.
//!
//! # Components
//!
//! - **`pool`** — `CandidatePool`, sole owner of per-call capacity state
//! - **`wires`** — wire → candidates index for the HA pair search
//! - **`simple`** — greedy single-host allocation
//! - **`pair`** — HA primary/backup pairing across wires
//! - **`allocate`** — dispatch façade over the two allocators

pub mod allocate;
pub mod error;
pub mod pair;
pub mod pool;
pub mod simple;
pub mod wires;

pub use error::{PoolError, PoolResult};
pub use pool::{Candidate, CandidatePool};
pub use simple::OUT_OF_RESOURCE;
pub use wires::WireGroups;
