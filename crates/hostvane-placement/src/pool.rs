//! Candidate pool — exclusive owner of per-call capacity state.
//!
//! The pool holds the ranked candidates for exactly one scheduling call.
//! Capacity and the assigned counter are mutated only through [`CandidatePool::assign`],
//! so no other component can observe a half-updated candidate. The pool is
//! `Clone` so the forecast engine can replay allocation on an independent
//! copy without touching the committing call's state.

use std::collections::{BTreeMap, HashSet};

use hostvane_state::{HostId, ScheduleRequest, ScoredHost, WireId};

use crate::error::{PoolError, PoolResult};

/// A host under consideration, with capacity state owned by the pool.
#[derive(Debug, Clone)]
pub struct Candidate {
    host_id: HostId,
    name: String,
    backend: String,
    capacity: i64,
    assigned: u32,
    capacity_by_filter: BTreeMap<String, i64>,
    wires: Vec<WireId>,
}

impl Candidate {
    fn from_scored(host: ScoredHost) -> Self {
        Self {
            host_id: host.id,
            name: host.name,
            backend: host.backend,
            capacity: host.capacity,
            assigned: 0,
            capacity_by_filter: host.capacity_by_filter,
            wires: host.wires,
        }
    }

    pub fn host_id(&self) -> &str {
        &self.host_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn backend(&self) -> &str {
        &self.backend
    }

    /// Remaining placement slots.
    pub fn capacity(&self) -> i64 {
        self.capacity
    }

    /// Units placed on this candidate during the current call.
    pub fn assigned(&self) -> u32 {
        self.assigned
    }

    pub fn wires(&self) -> &[WireId] {
        &self.wires
    }

    /// Per-predicate capacity breakdown, as supplied by the predicate engine.
    pub fn capacity_by_filter(&self) -> &BTreeMap<String, i64> {
        &self.capacity_by_filter
    }
}

/// The ranked candidate pool for one scheduling call.
#[derive(Debug, Clone)]
pub struct CandidatePool {
    candidates: Vec<Candidate>,
    request: ScheduleRequest,
}

impl CandidatePool {
    /// Build a pool from ranked hosts and the request descriptor.
    ///
    /// Rejects an empty pool, a zero instance count, and duplicate host ids
    /// before any allocation can start.
    pub fn new(hosts: Vec<ScoredHost>, request: ScheduleRequest) -> PoolResult<Self> {
        if request.count == 0 {
            return Err(PoolError::ZeroCount);
        }
        if hosts.is_empty() {
            return Err(PoolError::Empty);
        }
        let mut seen = HashSet::with_capacity(hosts.len());
        for host in &hosts {
            if !seen.insert(host.id.clone()) {
                return Err(PoolError::DuplicateHost(host.id.clone()));
            }
        }
        Ok(Self {
            candidates: hosts.into_iter().map(Candidate::from_scored).collect(),
            request,
        })
    }

    pub fn request(&self) -> &ScheduleRequest {
        &self.request
    }

    pub fn session_id(&self) -> &str {
        &self.request.session_id
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Candidates in descending priority order.
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn host_id(&self, idx: usize) -> &str {
        self.candidates[idx].host_id()
    }

    pub fn capacity(&self, idx: usize) -> i64 {
        self.candidates[idx].capacity
    }

    /// Pool index of a host id, if present.
    pub fn find(&self, host_id: &str) -> Option<usize> {
        self.candidates.iter().position(|c| c.host_id == host_id)
    }

    /// Place one unit on the candidate: capacity down, assigned up.
    ///
    /// Callers check capacity first; the allocators never assign past zero.
    pub fn assign(&mut self, idx: usize) {
        let candidate = &mut self.candidates[idx];
        debug_assert!(candidate.capacity > 0, "assign past zero capacity");
        candidate.capacity -= 1;
        candidate.assigned += 1;
    }

    /// Units placed across all candidates during this call.
    pub fn assigned_total(&self) -> u32 {
        self.candidates.iter().map(|c| c.assigned).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host(id: &str, capacity: i64) -> ScoredHost {
        ScoredHost {
            id: id.to_string(),
            name: format!("host-{id}"),
            backend: "kvm".to_string(),
            capacity,
            capacity_by_filter: BTreeMap::new(),
            wires: vec!["w1".to_string()],
        }
    }

    fn request(count: u32) -> ScheduleRequest {
        ScheduleRequest {
            session_id: "s1".to_string(),
            count,
            ha: false,
            prefer_host: None,
            prefer_backup_host: None,
            backend: "kvm".to_string(),
            instance_groups: Vec::new(),
            suggestion: false,
            skip_pending: false,
            vcpu_count: 1,
            vmem_size_mb: 1024,
        }
    }

    #[test]
    fn rejects_empty_pool() {
        assert_eq!(
            CandidatePool::new(vec![], request(1)).unwrap_err(),
            PoolError::Empty
        );
    }

    #[test]
    fn rejects_zero_count() {
        assert_eq!(
            CandidatePool::new(vec![host("h1", 1)], request(0)).unwrap_err(),
            PoolError::ZeroCount
        );
    }

    #[test]
    fn rejects_duplicate_host_ids() {
        let err = CandidatePool::new(vec![host("h1", 1), host("h1", 2)], request(1)).unwrap_err();
        assert_eq!(err, PoolError::DuplicateHost("h1".to_string()));
    }

    #[test]
    fn preserves_priority_order() {
        let pool =
            CandidatePool::new(vec![host("h2", 1), host("h1", 5)], request(1)).unwrap();
        assert_eq!(pool.host_id(0), "h2");
        assert_eq!(pool.host_id(1), "h1");
    }

    #[test]
    fn assign_moves_capacity_to_assigned() {
        let mut pool = CandidatePool::new(vec![host("h1", 2)], request(1)).unwrap();
        pool.assign(0);

        assert_eq!(pool.capacity(0), 1);
        assert_eq!(pool.candidates()[0].assigned(), 1);
        assert_eq!(pool.assigned_total(), 1);
    }

    #[test]
    fn find_locates_hosts_by_id() {
        let pool =
            CandidatePool::new(vec![host("h1", 1), host("h2", 1)], request(1)).unwrap();
        assert_eq!(pool.find("h2"), Some(1));
        assert_eq!(pool.find("h3"), None);
    }

    #[test]
    fn clone_is_independent() {
        let mut pool = CandidatePool::new(vec![host("h1", 2)], request(1)).unwrap();
        let snapshot = pool.clone();
        pool.assign(0);

        assert_eq!(pool.capacity(0), 1);
        assert_eq!(snapshot.capacity(0), 2);
    }
}
