use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::IdleConfig;
use crate::draft::{DraftCursor, DraftSnapshot, RestoredDraft, SnapshotSource};
use crate::idle::IdleSampler;
use crate::ledger::{Ledger, SegmentPair};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum SessionStatus {
    #[default]
    Idle,
    Capturing,
    Paused,
}

/// The task picked in the task list, with what the server already counted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSelection {
    pub task_id: String,
    pub task_name: String,
    pub project_id: String,
    pub last_timing_seconds: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionState {
    pub status: SessionStatus,
    pub selected_task_id: Option<String>,
    pub selected_task_name: Option<String>,
    pub project_id: Option<String>,
    pub known_task_seconds: u64,
    pub elapsed_seconds: u64,
    pub started_at: Option<DateTime<Utc>>,
    /// The session's records reached the server; only the task total is left.
    pub records_submitted: bool,
    /// Seconds accumulated by earlier capturing windows; combines with
    /// `running_since` to compute the live elapsed value.
    #[serde(skip)]
    pub elapsed_baseline: u64,
    #[serde(skip)]
    pub running_since: Option<DateTime<Utc>>,
}

impl SessionState {
    pub fn select_task(&mut self, selection: &TaskSelection) {
        self.selected_task_id = Some(selection.task_id.clone());
        self.selected_task_name = Some(selection.task_name.clone());
        self.project_id = Some(selection.project_id.clone());
        self.known_task_seconds = selection.last_timing_seconds;
    }

    pub fn current_elapsed_seconds(&self, now: DateTime<Utc>) -> u64 {
        match (self.status, self.running_since) {
            (SessionStatus::Capturing, Some(anchor)) => {
                let running = (now - anchor).num_seconds().max(0) as u64;
                self.elapsed_baseline
                    .saturating_add(running)
                    .max(self.elapsed_seconds)
            }
            _ => self.elapsed_seconds,
        }
    }

    pub fn sync_elapsed(&mut self, now: DateTime<Utc>) -> u64 {
        self.elapsed_seconds = self.current_elapsed_seconds(now);
        self.elapsed_seconds
    }

    pub fn begin_capture(&mut self, now: DateTime<Utc>) {
        self.status = SessionStatus::Capturing;
        self.elapsed_baseline = self.elapsed_seconds;
        self.running_since = Some(now);
        self.started_at.get_or_insert(now);
    }

    pub fn freeze(&mut self, now: DateTime<Utc>, status: SessionStatus) {
        self.sync_elapsed(now);
        self.status = status;
        self.running_since = None;
        self.elapsed_baseline = self.elapsed_seconds;
    }
}

/// All mutable tracking state, owned by the controller behind one lock.
#[derive(Debug, Clone)]
pub struct TrackerCore {
    pub session: SessionState,
    pub ledger: Ledger,
    pub sampler: IdleSampler,
    /// A restored draft is waiting for reconciliation.
    pub recovering: bool,
    pub finishing: bool,
    pub ticks: u32,
}

impl TrackerCore {
    pub fn new(idle: &IdleConfig) -> Self {
        Self {
            session: SessionState::default(),
            ledger: Ledger::new(),
            sampler: IdleSampler::new(idle.idle_sample_threshold_secs, idle.idle_warning_secs),
            recovering: false,
            finishing: false,
            ticks: 0,
        }
    }

    pub fn is_capturing(&self) -> bool {
        self.session.status == SessionStatus::Capturing
    }

    pub fn begin_capture(&mut self, now: DateTime<Utc>) {
        self.ledger.open(now, self.sampler.total_idle_seconds());
        self.session.begin_capture(now);
    }

    /// Closes the open window and freezes elapsed time.
    pub fn halt_capture(&mut self, now: DateTime<Utc>, status: SessionStatus) -> Option<SegmentPair> {
        let closed = self.ledger.close(now, self.sampler.total_idle_seconds());
        self.session.freeze(now, status);
        self.sampler.stop();
        closed
    }

    pub fn reset(&mut self) {
        self.session = SessionState::default();
        self.ledger.clear();
        self.sampler.reset_totals();
        self.recovering = false;
        self.finishing = false;
        self.ticks = 0;
    }

    pub fn restore(&mut self, restored: RestoredDraft) {
        self.reset();
        self.session = restored.session;
        self.ledger.inject(restored.pairs);
        self.recovering = true;
    }
}

impl SnapshotSource for TrackerCore {
    fn draft_snapshot(&self, saved_at: DateTime<Utc>, pending_auto_submit: bool) -> Option<DraftSnapshot> {
        if self.finishing || self.session.selected_task_id.is_none() {
            return None;
        }
        if self.session.status == SessionStatus::Idle && self.ledger.is_empty() {
            return None;
        }

        let mut session = self.session.clone();
        session.elapsed_seconds = session.current_elapsed_seconds(saved_at);

        let idle_total = self.sampler.total_idle_seconds();
        let open_cursor = self.ledger.open_cursor().map(|cursor| DraftCursor {
            pair_id: cursor.pair_id,
            raw_start: cursor.raw_start,
            active_start: cursor.active_start,
            idle_seconds: cursor.idle_since_open(idle_total),
        });

        Some(DraftSnapshot::new(
            session,
            self.ledger.pairs().to_vec(),
            open_cursor,
            pending_auto_submit,
            saved_at,
        ))
    }
}
