//! Forecast — non-committing allocation replay with cause attribution.
//!
//! Answers "why can't this batch be created" without touching anything the
//! committing path uses. Two passes over a backend-scoped copy of the
//! pool: first fold the predicate engine's rejection messages for every
//! exhausted filter into per-filter buckets, then replay the allocator on
//! an independent pool and fold per-unit failures into a synthetic
//! `select_candidate` bucket.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use hostvane_placement::{CandidatePool, OUT_OF_RESOURCE, PoolError, allocate};
use hostvane_state::{HostId, PlacementResult, ScheduleOutput, ScheduleRequest, ScoredHost};

use crate::error::SchedulerResult;

/// Bucket name for failures produced by the allocation replay itself.
const SELECT_CANDIDATE: &str = "select_candidate";

/// One rejection recorded by the predicate engine for a host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Rejection {
    /// Filter/predicate that zeroed the capacity.
    pub filter: String,
    /// Human-readable explanation.
    pub message: String,
}

/// Structured rejection log, keyed by host id.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RejectionLog {
    entries: HashMap<HostId, Vec<Rejection>>,
}

impl RejectionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a rejection message for a host under a filter name.
    pub fn record(&mut self, host_id: &str, filter: &str, message: &str) {
        self.entries
            .entry(host_id.to_string())
            .or_default()
            .push(Rejection {
                filter: filter.to_string(),
                message: message.to_string(),
            });
    }

    /// All rejections recorded for a host.
    pub fn get(&self, host_id: &str) -> &[Rejection] {
        self.entries.get(host_id).map_or(&[], Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One cause bucket in a forecast report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForecastFilter {
    /// Filter name; `None` for the top-level shortfall summary.
    pub filter: Option<String>,
    pub affected_count: u64,
    pub messages: Vec<String>,
}

/// The forecast verdict with its cause buckets and the attempted output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForecastReport {
    pub can_create: bool,
    pub reasons: Vec<ForecastFilter>,
    pub attempts: ScheduleOutput,
}

/// Run a forecast for `request` against `hosts` and `rejections`.
///
/// Never mutates its inputs; calling twice with unchanged inputs returns
/// an identical report.
pub fn run(
    hosts: &[ScoredHost],
    request: &ScheduleRequest,
    rejections: &RejectionLog,
) -> SchedulerResult<ForecastReport> {
    if request.count == 0 {
        return Err(PoolError::ZeroCount.into());
    }
    if hosts.is_empty() {
        return Err(PoolError::Empty.into());
    }

    let scoped: Vec<ScoredHost> = hosts
        .iter()
        .filter(|h| h.backend == request.backend)
        .cloned()
        .collect();

    let mut reasons: Vec<ForecastFilter> = Vec::new();

    // Pass 1: attribute exhausted per-filter capacity to logged rejections.
    for host in &scoped {
        for (filter, remaining) in &host.capacity_by_filter {
            if *remaining > 0 {
                continue;
            }
            let logged: Vec<&Rejection> = rejections
                .get(&host.id)
                .iter()
                .filter(|r| r.filter == *filter)
                .collect();
            if logged.is_empty() {
                warn!(
                    host = host.id.as_str(),
                    filter = filter.as_str(),
                    "filter exhausted but no rejection logged"
                );
                continue;
            }
            for rejection in logged {
                fold(&mut reasons, filter, rejection.message.clone());
            }
        }
    }

    // Pass 2: replay the allocator on an independent pool.
    let attempts = if scoped.is_empty() {
        ScheduleOutput {
            results: (0..request.count)
                .map(|_| PlacementResult::Failed {
                    reason: OUT_OF_RESOURCE.to_string(),
                })
                .collect(),
        }
    } else {
        let mut pool = CandidatePool::new(scoped, request.clone())?;
        allocate::run(&mut pool)
    };

    for result in &attempts.results {
        if let PlacementResult::Failed { reason } = result {
            fold(&mut reasons, SELECT_CANDIDATE, reason.clone());
        }
    }

    let placed = attempts.placed_count();
    let can_create = placed >= request.count as usize;
    if !can_create {
        reasons.push(ForecastFilter {
            filter: None,
            affected_count: 0,
            messages: vec![format!(
                "No enough resources: {placed}/{}(free/request)",
                request.count
            )],
        });
    }

    Ok(ForecastReport {
        can_create,
        reasons,
        attempts,
    })
}

/// Fold one message into its bucket, keeping first-seen bucket order.
fn fold(reasons: &mut Vec<ForecastFilter>, filter: &str, message: String) {
    match reasons
        .iter_mut()
        .find(|r| r.filter.as_deref() == Some(filter))
    {
        Some(bucket) => {
            bucket.affected_count += 1;
            bucket.messages.push(message);
        }
        None => reasons.push(ForecastFilter {
            filter: Some(filter.to_string()),
            affected_count: 1,
            messages: vec![message],
        }),
    }
}
