//! Dispatch façade — routes a request to the right allocator.

use hostvane_state::ScheduleOutput;
use tracing::debug;

use crate::pool::CandidatePool;
use crate::{pair, simple};

/// Run the allocation for the pool's request: HA and instance-group
/// requests go to the pair allocator, everything else to the simple
/// greedy allocator. Always returns exactly `request.count` results.
pub fn run(pool: &mut CandidatePool) -> ScheduleOutput {
    let pairing = pool.request().needs_pairing();
    debug!(
        session = pool.session_id(),
        count = pool.request().count,
        pairing,
        "allocation started"
    );
    let results = if pairing {
        pair::allocate(pool)
    } else {
        simple::allocate(pool)
    };
    ScheduleOutput { results }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostvane_state::{PlacementResult, ScheduleRequest, ScoredHost};

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

    fn request(count: u32, ha: bool) -> ScheduleRequest {
        ScheduleRequest {
            session_id: "s1".to_string(),
            count,
            ha,
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
    fn non_ha_requests_place_single_hosts() {
        let hosts = vec![host("h1", 2, &["w1"]), host("h2", 2, &["w1"])];
        let mut pool = CandidatePool::new(hosts, request(2, false)).unwrap();
        let output = run(&mut pool);

        assert_eq!(output.results.len(), 2);
        assert!(output.results.iter().all(|r| matches!(
            r,
            PlacementResult::Placed { backup_host_id: None, .. }
        )));
    }

    #[test]
    fn ha_requests_place_pairs() {
        let hosts = vec![host("h1", 2, &["w1"]), host("h2", 2, &["w1"])];
        let mut pool = CandidatePool::new(hosts, request(1, true)).unwrap();
        let output = run(&mut pool);

        assert!(matches!(
            &output.results[0],
            PlacementResult::Placed { backup_host_id: Some(_), .. }
        ));
    }

    #[test]
    fn instance_groups_route_to_the_pair_allocator() {
        let hosts = vec![host("h1", 2, &["w1"]), host("h2", 2, &["w1"])];
        let mut req = request(1, false);
        req.instance_groups = vec!["grp-1".to_string()];
        let mut pool = CandidatePool::new(hosts, req).unwrap();
        let output = run(&mut pool);

        assert!(matches!(
            &output.results[0],
            PlacementResult::Placed { backup_host_id: Some(_), .. }
        ));
    }

    #[test]
    fn output_length_always_matches_count() {
        let hosts = vec![host("h1", 1, &["w1"])];
        let mut pool = CandidatePool::new(hosts, request(4, false)).unwrap();
        let output = run(&mut pool);

        assert_eq!(output.results.len(), 4);
        assert_eq!(output.placed_count(), 1);
        assert_eq!(output.failed_count(), 3);
    }
}
