//! Greedy single-host allocation for non-HA requests.
//!
//! Walks the pool in priority order with a cursor: each unit lands on the
//! first candidate that still has capacity. One left-to-right pass is
//! enough — a candidate behind the cursor can never regain capacity during
//! the call.

use hostvane_state::PlacementResult;
use tracing::{debug, warn};

use crate::pool::CandidatePool;

/// Failure reason when the pool runs dry before the batch is satisfied.
pub const OUT_OF_RESOURCE: &str = "Out of resource";

/// Place `request.count` units, one result per unit.
pub fn allocate(pool: &mut CandidatePool) -> Vec<PlacementResult> {
    let count = pool.request().count as usize;
    let session_id = pool.session_id().to_string();
    let mut results = Vec::with_capacity(count);
    let mut cursor = 0;

    for _ in 0..count {
        while cursor < pool.len() && pool.capacity(cursor) <= 0 {
            cursor += 1;
        }
        if cursor >= pool.len() {
            results.push(PlacementResult::Failed {
                reason: OUT_OF_RESOURCE.to_string(),
            });
            continue;
        }

        pool.assign(cursor);
        debug!(
            host = pool.host_id(cursor),
            remaining = pool.capacity(cursor),
            "unit placed"
        );
        results.push(PlacementResult::Placed {
            host_id: pool.host_id(cursor).to_string(),
            backup_host_id: None,
            session_id: session_id.clone(),
        });
    }

    let failed = results.iter().filter(|r| !r.is_placed()).count();
    if failed > 0 {
        warn!(
            session = session_id.as_str(),
            requested = count,
            failed,
            "pool exhausted before batch was satisfied"
        );
    }
    results
}
