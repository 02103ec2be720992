//! HA pair allocation — primary/backup pairs sharing a network wire.
//!
//! For each requested unit, every wire with at least two reachable
//! candidates proposes a (master, backup) pair; the wire with the highest
//! combined remaining capacity wins. Host hints are hard constraints: a
//! hinted host that is missing from a wire rules that wire out, and a
//! hinted host that is out of capacity fails the unit outright — capacity
//! is a per-host quantity, so no other wire can validate the same host.
//!
//! Wires are scanned in ascending id order and the comparison is strictly
//! greater-than, so capacity ties resolve to the lowest wire id.

use hostvane_state::{HostId, PlacementResult};
use tracing::{debug, warn};

use crate::pool::CandidatePool;
use crate::wires::WireGroups;

/// Why a unit could not be paired.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PairFailure {
    MasterNotFound { hint: Option<HostId> },
    BackupNotFound { hint: Option<HostId>, master: HostId },
}

impl PairFailure {
    fn reason(&self) -> String {
        match self {
            PairFailure::MasterNotFound { hint } => {
                format!("Can't find master host {:?}", hint.as_deref().unwrap_or(""))
            }
            PairFailure::BackupNotFound { hint, master } => format!(
                "Can't find backup host {:?} by master {:?}",
                hint.as_deref().unwrap_or(""),
                master
            ),
        }
    }
}

/// Place `request.count` HA pairs, one result per unit.
///
/// Units are independent: a failed unit never aborts its siblings. Groups
/// are re-sorted between units so each pairing decision sees the mutated
/// capacities.
pub fn allocate(pool: &mut CandidatePool) -> Vec<PlacementResult> {
    let count = pool.request().count as usize;
    let session_id = pool.session_id().to_string();
    let mut groups = WireGroups::build(pool);
    let mut results = Vec::with_capacity(count);

    for unit in 0..count {
        if unit > 0 {
            groups.resort(pool);
        }
        match select_pair(pool, &groups) {
            Ok((master, backup)) => {
                pool.assign(master);
                pool.assign(backup);
                debug!(
                    master = pool.host_id(master),
                    backup = pool.host_id(backup),
                    "pair placed"
                );
                results.push(PlacementResult::Placed {
                    host_id: pool.host_id(master).to_string(),
                    backup_host_id: Some(pool.host_id(backup).to_string()),
                    session_id: session_id.clone(),
                });
            }
            Err(failure) => {
                warn!(session = session_id.as_str(), unit, "pairing failed");
                results.push(PlacementResult::Failed {
                    reason: failure.reason(),
                });
            }
        }
    }
    results
}

/// Pick the best feasible (master, backup) pool-index pair across all wires.
fn select_pair(pool: &CandidatePool, groups: &WireGroups) -> Result<(usize, usize), PairFailure> {
    let prefer_master = pool.request().prefer_host.clone();
    let prefer_backup = pool.request().prefer_backup_host.clone();
    let mut best: Option<(i64, usize, usize)> = None;

    for (_wire, members) in groups.iter() {
        if members.len() < 2 {
            continue;
        }

        // Master slot: the hint if present on this wire, otherwise the
        // highest-capacity member that is not the preferred backup.
        let master = match &prefer_master {
            Some(hint) => {
                let Some(pos) = members.iter().position(|&i| pool.host_id(i) == hint) else {
                    continue;
                };
                if pool.capacity(members[pos]) <= 0 {
                    return Err(PairFailure::MasterNotFound {
                        hint: prefer_master.clone(),
                    });
                }
                pos
            }
            None => {
                let Some(pos) = members
                    .iter()
                    .position(|&i| Some(pool.host_id(i)) != prefer_backup.as_deref())
                else {
                    continue;
                };
                if pool.capacity(members[pos]) <= 0 {
                    continue;
                }
                pos
            }
        };

        // Backup slot: same rules, excluding the chosen master.
        let backup = match &prefer_backup {
            Some(hint) => {
                let Some(pos) = members.iter().position(|&i| pool.host_id(i) == hint) else {
                    continue;
                };
                if pos == master {
                    continue;
                }
                if pool.capacity(members[pos]) <= 0 {
                    return Err(PairFailure::BackupNotFound {
                        hint: prefer_backup.clone(),
                        master: pool.host_id(members[master]).to_string(),
                    });
                }
                pos
            }
            None => {
                let Some(pos) = (0..members.len()).find(|&i| i != master) else {
                    continue;
                };
                if pool.capacity(members[pos]) <= 0 {
                    continue;
                }
                pos
            }
        };

        let combined = pool.capacity(members[master]) + pool.capacity(members[backup]);
        if best.is_none_or(|(score, _, _)| combined > score) {
            best = Some((combined, members[master], members[backup]));
        }
    }

    match best {
        Some((_, master, backup)) => Ok((master, backup)),
        None => Err(PairFailure::MasterNotFound {
            hint: prefer_master,
        }),
    }
}
