//! Domain types shared across the hostvane scheduling stack.
//!
//! These types cross the boundaries between the predicate engine (which
//! ranks hosts), the placement engine (which materializes decisions), and
//! the task engine (which consumes the output). All of them are
//! serializable so pool snapshots and scheduling outputs can travel as JSON.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Unique identifier for a candidate host.
pub type HostId = String;

/// Unique identifier for a network wire (L2 reachability domain).
pub type WireId = String;

/// Correlates all placement results produced by one scheduling call.
pub type SessionId = String;

// ── Candidate input ───────────────────────────────────────────────

/// A candidate host as ranked by the external predicate engine.
///
/// `capacity` is the number of placement slots left after every predicate
/// ran; `capacity_by_filter` breaks that down per predicate so the forecast
/// engine can attribute shortfalls. The sequence handed to the scheduler is
/// in descending priority order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredHost {
    pub id: HostId,
    pub name: String,
    /// Backend/hypervisor type this host serves ("kvm", "baremetal", ...).
    pub backend: String,
    /// Remaining placement slots.
    pub capacity: i64,
    /// Remaining slots attributable to each predicate, read-only here.
    #[serde(default)]
    pub capacity_by_filter: BTreeMap<String, i64>,
    /// Network wires this host is reachable on.
    #[serde(default)]
    pub wires: Vec<WireId>,
}

// ── Request descriptor ────────────────────────────────────────────

/// One scheduling call's request descriptor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduleRequest {
    pub session_id: SessionId,
    /// Number of workload instances to place. Must be at least 1.
    pub count: u32,
    /// Request HA primary/backup pairs instead of single hosts.
    #[serde(default)]
    pub ha: bool,
    /// Preferred primary host. A hard constraint, never relaxed.
    #[serde(default)]
    pub prefer_host: Option<HostId>,
    /// Preferred backup host. A hard constraint, never relaxed.
    #[serde(default)]
    pub prefer_backup_host: Option<HostId>,
    /// Backend/hypervisor type; scopes the forecast pool and selects the
    /// driver capabilities used for pending-usage gating.
    pub backend: String,
    /// Named instance groups. A non-empty list routes to the pair allocator.
    #[serde(default)]
    pub instance_groups: Vec<String>,
    /// Dry-run: compute the decision but record no pending usage.
    #[serde(default)]
    pub suggestion: bool,
    /// Explicit opt-out of pending-usage recording.
    #[serde(default)]
    pub skip_pending: bool,
    /// Per-instance vCPU reservation carried into pending usage.
    #[serde(default)]
    pub vcpu_count: u32,
    /// Per-instance memory reservation (MiB) carried into pending usage.
    #[serde(default)]
    pub vmem_size_mb: u64,
}

impl ScheduleRequest {
    /// Whether this request routes to the HA pair allocator.
    pub fn needs_pairing(&self) -> bool {
        self.ha || !self.instance_groups.is_empty()
    }
}

// ── Placement output ──────────────────────────────────────────────

/// Outcome for a single requested unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PlacementResult {
    /// The unit was placed on `host_id` (and `backup_host_id` for HA pairs).
    Placed {
        host_id: HostId,
        backup_host_id: Option<HostId>,
        session_id: SessionId,
    },
    /// The unit could not be placed.
    Failed { reason: String },
}

impl PlacementResult {
    pub fn is_placed(&self) -> bool {
        matches!(self, PlacementResult::Placed { .. })
    }
}

/// Ordered outcomes for one scheduling call: exactly `count` entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ScheduleOutput {
    pub results: Vec<PlacementResult>,
}

impl ScheduleOutput {
    /// Number of successfully placed units.
    pub fn placed_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_placed()).count()
    }

    /// Number of units that failed to place.
    pub fn failed_count(&self) -> usize {
        self.results.len() - self.placed_count()
    }
}

// ── Driver capabilities ───────────────────────────────────────────

/// Scheduling-filter support advertised by a backend driver.
///
/// A driver that does not run all three resource filters has no meaningful
/// notion of pending usage, so reservations are skipped for it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DriverCapabilities {
    pub cpu_filter: bool,
    pub memory_filter: bool,
    pub storage_filter: bool,
}

impl DriverCapabilities {
    /// Whether placements on this driver should be reserved as pending usage.
    pub fn tracks_usage(&self) -> bool {
        self.cpu_filter && self.memory_filter && self.storage_filter
    }
}

impl Default for DriverCapabilities {
    fn default() -> Self {
        Self {
            cpu_filter: true,
            memory_filter: true,
            storage_filter: true,
        }
    }
}
