//! Pending-usage table — optimistic reservations against chosen hosts.
//!
//! After a placement decision is computed, one reservation per placed unit
//! is recorded against each chosen host (primary and backup) so concurrent
//! scheduling rounds see the capacity as taken before provisioning lands.
//! The scheduler side only ever adds; the external reconciliation job
//! settles or removes reservations once durable state reflects them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{HostId, SessionId};

/// One reserved instance on one host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reservation {
    pub session_id: SessionId,
    pub vcpu_count: u32,
    pub vmem_size_mb: u64,
}

/// Aggregated pending usage for one host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PendingUsageEntry {
    pub host_id: HostId,
    pub instance_count: u32,
    pub vcpu_count: u64,
    pub vmem_size_mb: u64,
    /// Session ids that contributed, one per reserved instance.
    pub sessions: Vec<SessionId>,
}

/// Concurrent pending-usage table, shared across scheduling calls.
///
/// Cloning produces another handle onto the same table. Updates are
/// linearizable per host: every read-modify-write happens under the table
/// mutex, and the critical sections are constant-time map operations.
#[derive(Debug, Clone, Default)]
pub struct PendingUsageStore {
    reservations: Arc<Mutex<HashMap<HostId, Vec<Reservation>>>>,
}

impl PendingUsageStore {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<HostId, Vec<Reservation>>> {
        // A panicked writer can only have left a fully applied push/remove.
        self.reservations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Reserve one instance worth of capacity on `host_id`.
    pub fn reserve(&self, host_id: &str, session_id: &str, vcpu_count: u32, vmem_size_mb: u64) {
        let mut table = self.lock();
        table
            .entry(host_id.to_string())
            .or_default()
            .push(Reservation {
                session_id: session_id.to_string(),
                vcpu_count,
                vmem_size_mb,
            });
        debug!(host = host_id, session = session_id, "pending usage reserved");
    }

    /// Aggregated pending usage for a host, if any is recorded.
    pub fn get(&self, host_id: &str) -> Option<PendingUsageEntry> {
        let table = self.lock();
        let reservations = table.get(host_id)?;
        Some(aggregate(host_id, reservations))
    }

    /// Reconciler interface: drop every reservation a session placed on a
    /// host, returning how many were released. Removes the host entry when
    /// it ends up empty.
    pub fn release_session(&self, host_id: &str, session_id: &str) -> usize {
        let mut table = self.lock();
        let Some(reservations) = table.get_mut(host_id) else {
            return 0;
        };
        let before = reservations.len();
        reservations.retain(|r| r.session_id != session_id);
        let released = before - reservations.len();
        if reservations.is_empty() {
            table.remove(host_id);
        }
        if released > 0 {
            debug!(host = host_id, session = session_id, released, "pending usage released");
        }
        released
    }

    /// Reconciler interface: drop every reservation on a host.
    pub fn remove(&self, host_id: &str) -> bool {
        self.lock().remove(host_id).is_some()
    }

    /// Total reserved instances across all hosts.
    pub fn total_instances(&self) -> usize {
        self.lock().values().map(Vec::len).sum()
    }

    /// Number of hosts with at least one reservation.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Aggregated view of the whole table, ordered by host id.
    pub fn snapshot(&self) -> Vec<PendingUsageEntry> {
        let table = self.lock();
        let mut entries: Vec<PendingUsageEntry> = table
            .iter()
            .map(|(host, reservations)| aggregate(host, reservations))
            .collect();
        entries.sort_by(|a, b| a.host_id.cmp(&b.host_id));
        entries
    }
}

fn aggregate(host_id: &str, reservations: &[Reservation]) -> PendingUsageEntry {
    PendingUsageEntry {
        host_id: host_id.to_string(),
        instance_count: reservations.len() as u32,
        vcpu_count: reservations.iter().map(|r| u64::from(r.vcpu_count)).sum(),
        vmem_size_mb: reservations.iter().map(|r| r.vmem_size_mb).sum(),
        sessions: reservations.iter().map(|r| r.session_id.clone()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserve_accumulates_per_host() {
        let store = PendingUsageStore::new();
        store.reserve("h1", "s1", 2, 2048);
        store.reserve("h1", "s2", 4, 4096);

        let entry = store.get("h1").unwrap();
        assert_eq!(entry.instance_count, 2);
        assert_eq!(entry.vcpu_count, 6);
        assert_eq!(entry.vmem_size_mb, 6144);
        assert_eq!(entry.sessions, vec!["s1".to_string(), "s2".to_string()]);
    }

    #[test]
    fn get_missing_host_is_none() {
        let store = PendingUsageStore::new();
        assert!(store.get("h1").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn release_session_drops_only_that_session() {
        let store = PendingUsageStore::new();
        store.reserve("h1", "s1", 1, 1024);
        store.reserve("h1", "s1", 1, 1024);
        store.reserve("h1", "s2", 1, 1024);

        assert_eq!(store.release_session("h1", "s1"), 2);

        let entry = store.get("h1").unwrap();
        assert_eq!(entry.instance_count, 1);
        assert_eq!(entry.sessions, vec!["s2".to_string()]);
    }

    #[test]
    fn release_last_reservation_removes_entry() {
        let store = PendingUsageStore::new();
        store.reserve("h1", "s1", 1, 1024);

        assert_eq!(store.release_session("h1", "s1"), 1);
        assert!(store.get("h1").is_none());
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn release_unknown_host_is_zero() {
        let store = PendingUsageStore::new();
        assert_eq!(store.release_session("h1", "s1"), 0);
    }

    #[test]
    fn remove_clears_host() {
        let store = PendingUsageStore::new();
        store.reserve("h1", "s1", 1, 1024);
        store.reserve("h2", "s1", 1, 1024);

        assert!(store.remove("h1"));
        assert!(!store.remove("h1"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn snapshot_is_ordered_by_host() {
        let store = PendingUsageStore::new();
        store.reserve("h2", "s1", 1, 1024);
        store.reserve("h1", "s1", 1, 1024);

        let hosts: Vec<String> = store.snapshot().into_iter().map(|e| e.host_id).collect();
        assert_eq!(hosts, vec!["h1".to_string(), "h2".to_string()]);
    }

    #[test]
    fn clones_share_the_same_table() {
        let store = PendingUsageStore::new();
        let other = store.clone();
        store.reserve("h1", "s1", 1, 1024);

        assert_eq!(other.get("h1").unwrap().instance_count, 1);
    }

    #[test]
    fn concurrent_reserves_are_not_lost() {
        use std::thread;

        let store = PendingUsageStore::new();
        let mut handles = vec![];
        for t in 0..2 {
            let store = store.clone();
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    store.reserve("h1", &format!("s{t}"), 1, 512);
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(store.get("h1").unwrap().instance_count, 200);
        assert_eq!(store.total_instances(), 200);
    }
}
