use std::sync::atomic::{AtomicBool, Ordering};

use log::{info, warn};

use crate::backend::{TaskRecord, TrackerBackend};
use crate::error::{TrackerError, TrackerResult};
use crate::ledger::{build_records, Identity, RecordContext, SegmentPair};

/// What a restored draft contributes to reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcileInput {
    pub task_id: String,
    pub elapsed_seconds: u64,
    pub pairs: Vec<SegmentPair>,
    /// The records already reached the server in an earlier attempt.
    pub records_already_submitted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    pub task_id: String,
    pub total_seconds: u64,
    pub timing_updated: bool,
    pub records_submitted: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Completed(ReconcileReport),
    /// The server does not list the task yet; the draft stays for a retry.
    TaskNotFound,
    InFlight,
    AlreadyDone,
}

/// Merges a recovered draft into server state at most once per process.
#[derive(Debug, Default)]
pub struct Reconciler {
    in_flight: AtomicBool,
    completed: AtomicBool,
    records_submitted: AtomicBool,
}

/// Exclusive right to submit the recovered session. Dropping it releases the
/// guard for a later attempt.
#[derive(Debug)]
pub struct ReconcileClaim<'a> {
    reconciler: &'a Reconciler,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_completed(&self) -> bool {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// True once a submission of the recovered records has succeeded.
    pub fn records_submitted(&self) -> bool {
        self.records_submitted.load(Ordering::SeqCst)
    }

    /// `None` when the work is done or another attempt holds the guard.
    pub fn try_claim(&self) -> Option<ReconcileClaim<'_>> {
        if self.is_completed() {
            return None;
        }
        self.in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()?;
        if self.is_completed() {
            self.in_flight.store(false, Ordering::SeqCst);
            return None;
        }
        Some(ReconcileClaim { reconciler: self })
    }

    pub async fn run(
        &self,
        input: &ReconcileInput,
        tasks: &[TaskRecord],
        identity: &Identity,
        backend: &dyn TrackerBackend,
    ) -> TrackerResult<ReconcileOutcome> {
        if self.is_completed() {
            return Ok(ReconcileOutcome::AlreadyDone);
        }
        let Some(claim) = self.try_claim() else {
            return Ok(if self.is_completed() {
                ReconcileOutcome::AlreadyDone
            } else {
                ReconcileOutcome::InFlight
            });
        };
        claim.run(input, tasks, identity, backend).await
    }
}

impl ReconcileClaim<'_> {
    pub async fn run(
        self,
        input: &ReconcileInput,
        tasks: &[TaskRecord],
        identity: &Identity,
        backend: &dyn TrackerBackend,
    ) -> TrackerResult<ReconcileOutcome> {
        let outcome = reconcile_once(self.reconciler, input, tasks, identity, backend).await?;
        if matches!(outcome, ReconcileOutcome::Completed(_)) {
            self.complete();
        }
        Ok(outcome)
    }

    /// Marks the recovered session as saved through whichever path held the
    /// claim.
    pub fn complete(self) {
        self.reconciler.completed.store(true, Ordering::SeqCst);
    }
}

impl Drop for ReconcileClaim<'_> {
    fn drop(&mut self) {
        self.reconciler.in_flight.store(false, Ordering::SeqCst);
    }
}

async fn reconcile_once(
    reconciler: &Reconciler,
    input: &ReconcileInput,
    tasks: &[TaskRecord],
    identity: &Identity,
    backend: &dyn TrackerBackend,
) -> TrackerResult<ReconcileOutcome> {
    let Some(task) = tasks.iter().find(|task| task.id == input.task_id) else {
        warn!(
            "task {} not in server task list yet; keeping draft for a later retry",
            input.task_id
        );
        return Ok(ReconcileOutcome::TaskNotFound);
    };

    let server_seconds = task.last_timing.max(0.0);
    let total_seconds = (input.elapsed_seconds as f64).max(server_seconds).floor() as u64;

    let timing_updated = server_seconds < total_seconds as f64;
    if timing_updated {
        backend
            .update_task_timing(&task.id, total_seconds)
            .await
            .map_err(TrackerError::network)?;
        info!("task {} timing raised to {total_seconds}s", task.id);
    }

    let ctx = RecordContext {
        task_id: &task.id,
        project_id: &task.project_id,
        identity,
    };
    let records = build_records(&input.pairs, &ctx);
    if input.records_already_submitted || reconciler.records_submitted() {
        info!("recovered records for task {} already submitted; skipping", task.id);
    } else if !records.is_empty() {
        backend
            .submit_time_tracking_records(&records)
            .await
            .map_err(TrackerError::network)?;
        reconciler.records_submitted.store(true, Ordering::SeqCst);
        info!("submitted {} recovered time records for task {}", records.len(), task.id);
    }

    backend
        .set_task_in_progress(&task.id, false)
        .await
        .map_err(TrackerError::network)?;

    Ok(ReconcileOutcome::Completed(ReconcileReport {
        task_id: task.id.clone(),
        total_seconds,
        timing_updated,
        records_submitted: records.len(),
    }))
}
