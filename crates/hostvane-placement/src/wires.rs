//! Wire grouping index for the HA pair search.
//!
//! Maps each network wire to the pool indices of the candidates reachable
//! on it. Groups are kept sorted by current capacity descending; the sort
//! is stable, so candidates with equal capacity stay in the scorer's
//! priority order. Iteration follows ascending wire id, which makes every
//! tie-break downstream deterministic.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use hostvane_state::WireId;

use crate::pool::CandidatePool;

/// Wire id → candidate pool indices, capacity-descending per group.
#[derive(Debug)]
pub struct WireGroups {
    groups: BTreeMap<WireId, Vec<usize>>,
}

impl WireGroups {
    /// Build the index from the pool's current wire membership.
    ///
    /// A candidate reachable on a wire joins that wire's group exactly once.
    pub fn build(pool: &CandidatePool) -> Self {
        let mut groups: BTreeMap<WireId, Vec<usize>> = BTreeMap::new();
        for (idx, candidate) in pool.candidates().iter().enumerate() {
            for wire in candidate.wires() {
                let members = groups.entry(wire.clone()).or_default();
                if !members.contains(&idx) {
                    members.push(idx);
                }
            }
        }
        let mut index = Self { groups };
        index.resort(pool);
        index
    }

    /// Re-sort every group by current capacity. Required after any
    /// capacity mutation, before the next pairing decision.
    pub fn resort(&mut self, pool: &CandidatePool) {
        for members in self.groups.values_mut() {
            members.sort_by_key(|&idx| Reverse(pool.capacity(idx)));
        }
    }

    /// Groups in ascending wire-id order.
    pub fn iter(&self) -> impl Iterator<Item = (&WireId, &[usize])> {
        self.groups.iter().map(|(wire, members)| (wire, members.as_slice()))
    }

    pub fn get(&self, wire: &str) -> Option<&[usize]> {
        self.groups.get(wire).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostvane_state::{ScheduleRequest, ScoredHost};

    fn host(id: &str, capacity: i64, wires: &[&str]) -> ScoredHost {
        ScoredHost {
            id: id.to_string(),
            name: format!("host-{id}"),
            backend: "kvm".to_string(),
            capacity,
            capacity_by_filter: Default::default(),
            wires: wires.iter().map(|w| w.to_string()).collect(),
        }
    }

    fn pool(hosts: Vec<ScoredHost>) -> CandidatePool {
        let request = ScheduleRequest {
            session_id: "s1".to_string(),
            count: 1,
            ha: true,
            prefer_host: None,
            prefer_backup_host: None,
            backend: "kvm".to_string(),
            instance_groups: Vec::new(),
            suggestion: false,
            skip_pending: false,
            vcpu_count: 1,
            vmem_size_mb: 1024,
        };
        CandidatePool::new(hosts, request).unwrap()
    }

    #[test]
    fn groups_candidates_by_wire() {
        let pool = pool(vec![
            host("h1", 1, &["w1", "w2"]),
            host("h2", 1, &["w1"]),
            host("h3", 1, &["w2"]),
        ]);
        let groups = WireGroups::build(&pool);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups.get("w1").unwrap().len(), 2);
        assert_eq!(groups.get("w2").unwrap().len(), 2);
    }

    #[test]
    fn duplicate_wire_membership_is_collapsed() {
        let pool = pool(vec![host("h1", 1, &["w1", "w1"])]);
        let groups = WireGroups::build(&pool);

        assert_eq!(groups.get("w1").unwrap(), &[0]);
    }

    #[test]
    fn groups_sort_by_capacity_descending() {
        let pool = pool(vec![
            host("h1", 1, &["w1"]),
            host("h2", 5, &["w1"]),
            host("h3", 3, &["w1"]),
        ]);
        let groups = WireGroups::build(&pool);

        // Indices of h2 (cap 5), h3 (cap 3), h1 (cap 1).
        assert_eq!(groups.get("w1").unwrap(), &[1, 2, 0]);
    }

    #[test]
    fn equal_capacity_keeps_priority_order() {
        let pool = pool(vec![host("h1", 2, &["w1"]), host("h2", 2, &["w1"])]);
        let groups = WireGroups::build(&pool);

        assert_eq!(groups.get("w1").unwrap(), &[0, 1]);
    }

    #[test]
    fn resort_tracks_capacity_changes() {
        let mut pool = pool(vec![host("h1", 2, &["w1"]), host("h2", 1, &["w1"])]);
        let mut groups = WireGroups::build(&pool);
        assert_eq!(groups.get("w1").unwrap(), &[0, 1]);

        pool.assign(0);
        pool.assign(0);
        groups.resort(&pool);

        assert_eq!(groups.get("w1").unwrap(), &[1, 0]);
    }

    #[test]
    fn iteration_is_wire_id_ordered() {
        let pool = pool(vec![host("h1", 1, &["w9", "w1", "w5"])]);
        let groups = WireGroups::build(&pool);

        let wires: Vec<&str> = groups.iter().map(|(w, _)| w.as_str()).collect();
        assert_eq!(wires, vec!["w1", "w5", "w9"]);
    }
}
