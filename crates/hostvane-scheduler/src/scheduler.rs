//! Scheduler — commits placement decisions and records pending usage.
//!
//! The `Scheduler` is the entry point the task engine calls. It validates
//! the request, runs the placement engine against a pool it exclusively
//! owns for the call, then records optimistic reservations in the shared
//! pending-usage table so concurrent rounds do not over-commit the same
//! hosts. The decision is authoritative once computed; reservation
//! bookkeeping never alters or rolls it back.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info};

use hostvane_placement::{CandidatePool, allocate};
use hostvane_state::{
    DriverCapabilities, PendingUsageStore, PlacementResult, ScheduleOutput, ScheduleRequest,
    ScoredHost,
};

use crate::error::SchedulerResult;
use crate::forecast::{self, ForecastReport, RejectionLog};

/// The scheduling service façade.
pub struct Scheduler {
    /// Reservation table shared across concurrent scheduling calls.
    pending: PendingUsageStore,
    /// Per-backend driver capabilities: backend type → flags.
    drivers: Arc<RwLock<HashMap<String, DriverCapabilities>>>,
}

impl Scheduler {
    /// Create a scheduler around a (possibly shared) pending-usage table.
    pub fn new(pending: PendingUsageStore) -> Self {
        Self {
            pending,
            drivers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// The pending-usage table this scheduler records into.
    pub fn pending(&self) -> &PendingUsageStore {
        &self.pending
    }

    /// Register (or replace) a backend driver's capability flags.
    pub async fn register_driver(&self, backend: &str, caps: DriverCapabilities) {
        let mut drivers = self.drivers.write().await;
        drivers.insert(backend.to_string(), caps);
        debug!(backend, "driver registered");
    }

    /// Capability flags for a backend. Unregistered backends get the
    /// default (all filters on, usage tracked).
    pub async fn driver(&self, backend: &str) -> DriverCapabilities {
        let drivers = self.drivers.read().await;
        drivers.get(backend).copied().unwrap_or_default()
    }

    /// Compute a committed scheduling decision.
    ///
    /// Returns exactly `request.count` placement results; per-unit failures
    /// are entries, not errors. Pending usage is recorded for every placed
    /// host unless the request or the backend driver opts out.
    pub async fn schedule(
        &self,
        hosts: Vec<ScoredHost>,
        request: ScheduleRequest,
    ) -> SchedulerResult<ScheduleOutput> {
        let caps = self.driver(&request.backend).await;
        let mut pool = CandidatePool::new(hosts, request)?;
        let output = allocate::run(&mut pool);

        self.record_pending(&output, pool.request(), caps);

        info!(
            session = pool.session_id(),
            requested = pool.request().count,
            placed = output.placed_count(),
            failed = output.failed_count(),
            "scheduling decision computed"
        );
        Ok(output)
    }

    /// Explain whether the request could be satisfied, without committing
    /// anything: replays the allocator on an independent pool and folds
    /// predicate rejections into cause buckets.
    pub async fn forecast(
        &self,
        hosts: &[ScoredHost],
        request: &ScheduleRequest,
        rejections: &RejectionLog,
    ) -> SchedulerResult<ForecastReport> {
        forecast::run(hosts, request, rejections)
    }

    /// Reserve pending usage for every placed host in the output.
    fn record_pending(
        &self,
        output: &ScheduleOutput,
        request: &ScheduleRequest,
        caps: DriverCapabilities,
    ) {
        if request.suggestion || request.skip_pending || !caps.tracks_usage() {
            debug!(
                session = request.session_id.as_str(),
                suggestion = request.suggestion,
                skip_pending = request.skip_pending,
                tracks_usage = caps.tracks_usage(),
                "pending usage recording skipped"
            );
            return;
        }

        for result in &output.results {
            if let PlacementResult::Placed {
                host_id,
                backup_host_id,
                session_id,
            } = result
            {
                self.pending
                    .reserve(host_id, session_id, request.vcpu_count, request.vmem_size_mb);
                if let Some(backup) = backup_host_id {
                    self.pending
                        .reserve(backup, session_id, request.vcpu_count, request.vmem_size_mb);
                }
            }
        }
    }
}
