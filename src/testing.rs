//! In-memory fakes for the engine's collaborators.

use std::{
    collections::{HashMap, VecDeque},
    sync::{
        atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering},
        Mutex,
    },
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use tokio::time::Instant;

use crate::{
    backend::{
        ApprovalState, ApprovalStatus, ScreenshotReport, TaskRecord, TrackerBackend, UserRole,
    },
    clock::Clock,
    draft::{ConnectivityProbe, DraftStorage},
    events::{EventSink, TrackerEvent},
    idle::IdleProbe,
    ledger::TimeTrackingRecord,
    screenshot::{CaptureUpload, Capturer},
};

pub fn epoch() -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).unwrap()
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl DraftStorage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.raw(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    Submit(Vec<TimeTrackingRecord>),
    Timing(String, u64),
    InProgress(String, bool),
    FetchTask(String),
    ListTasks,
    Approval,
    Screenshot(ScreenshotReport),
}

/// Records every call; writes can be made to fail a set number of times.
#[derive(Debug)]
pub struct FakeBackend {
    calls: Mutex<Vec<BackendCall>>,
    tasks: Mutex<Vec<TaskRecord>>,
    approval: Mutex<ApprovalState>,
    failing_submissions: AtomicU32,
    failing_timing_updates: AtomicU32,
    failing_in_progress_updates: AtomicU32,
    list_delay: Mutex<Option<std::time::Duration>>,
    approval_unreachable: AtomicBool,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            tasks: Mutex::new(Vec::new()),
            approval: Mutex::new(ApprovalState {
                role: UserRole::Employee,
                approval: ApprovalStatus::Approved,
            }),
            failing_submissions: AtomicU32::new(0),
            failing_timing_updates: AtomicU32::new(0),
            failing_in_progress_updates: AtomicU32::new(0),
            list_delay: Mutex::new(None),
            approval_unreachable: AtomicBool::new(false),
        }
    }
}

impl FakeBackend {
    pub fn with_tasks(tasks: Vec<TaskRecord>) -> Self {
        let backend = Self::default();
        *backend.tasks.lock().unwrap() = tasks;
        backend
    }

    pub fn set_tasks(&self, tasks: Vec<TaskRecord>) {
        *self.tasks.lock().unwrap() = tasks;
    }

    pub fn set_approval(&self, role: UserRole, approval: ApprovalStatus) {
        *self.approval.lock().unwrap() = ApprovalState { role, approval };
    }

    pub fn set_approval_unreachable(&self, unreachable: bool) {
        self.approval_unreachable.store(unreachable, Ordering::SeqCst);
    }

    pub fn fail_submissions(&self, count: u32) {
        self.failing_submissions.store(count, Ordering::SeqCst);
    }

    pub fn fail_timing_updates(&self, count: u32) {
        self.failing_timing_updates.store(count, Ordering::SeqCst);
    }

    pub fn fail_in_progress_updates(&self, count: u32) {
        self.failing_in_progress_updates.store(count, Ordering::SeqCst);
    }

    /// Every `list_tasks` call sleeps this long before answering.
    pub fn delay_task_listing(&self, delay: std::time::Duration) {
        *self.list_delay.lock().unwrap() = Some(delay);
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn submitted_batches(&self) -> Vec<Vec<TimeTrackingRecord>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                BackendCall::Submit(records) => Some(records),
                _ => None,
            })
            .collect()
    }

    pub fn timing_updates(&self) -> Vec<(String, u64)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                BackendCall::Timing(task_id, seconds) => Some((task_id, seconds)),
                _ => None,
            })
            .collect()
    }

    pub fn in_progress_updates(&self) -> Vec<(String, bool)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                BackendCall::InProgress(task_id, flag) => Some((task_id, flag)),
                _ => None,
            })
            .collect()
    }

    pub fn screenshot_reports(&self) -> Vec<ScreenshotReport> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                BackendCall::Screenshot(report) => Some(report),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: BackendCall) {
        self.calls.lock().unwrap().push(call);
    }
}

fn take_failure(counter: &AtomicU32) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

#[async_trait]
impl TrackerBackend for FakeBackend {
    async fn submit_time_tracking_records(&self, records: &[TimeTrackingRecord]) -> Result<()> {
        if take_failure(&self.failing_submissions) {
            return Err(anyhow!("submission rejected: connection reset"));
        }
        self.record(BackendCall::Submit(records.to_vec()));
        Ok(())
    }

    async fn update_task_timing(&self, task_id: &str, total_seconds: u64) -> Result<()> {
        if take_failure(&self.failing_timing_updates) {
            return Err(anyhow!("timing update rejected: 502 bad gateway"));
        }
        self.record(BackendCall::Timing(task_id.to_string(), total_seconds));
        Ok(())
    }

    async fn set_task_in_progress(&self, task_id: &str, in_progress: bool) -> Result<()> {
        if take_failure(&self.failing_in_progress_updates) {
            return Err(anyhow!("task update rejected: 503 service unavailable"));
        }
        self.record(BackendCall::InProgress(task_id.to_string(), in_progress));
        Ok(())
    }

    async fn fetch_task_by_id(&self, task_id: &str) -> Result<Option<TaskRecord>> {
        self.record(BackendCall::FetchTask(task_id.to_string()));
        Ok(self
            .tasks
            .lock()
            .unwrap()
            .iter()
            .find(|task| task.id == task_id)
            .cloned())
    }

    async fn list_tasks(&self) -> Result<Vec<TaskRecord>> {
        self.record(BackendCall::ListTasks);
        let delay = *self.list_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.tasks.lock().unwrap().clone())
    }

    async fn current_user_approval_state(&self) -> Result<ApprovalState> {
        self.record(BackendCall::Approval);
        if self.approval_unreachable.load(Ordering::SeqCst) {
            return Err(anyhow!("approval lookup timed out"));
        }
        Ok(*self.approval.lock().unwrap())
    }

    async fn report_screenshot(&self, report: &ScreenshotReport) -> Result<()> {
        self.record(BackendCall::Screenshot(report.clone()));
        Ok(())
    }
}

/// Wall clock that follows tokio's (possibly paused) time.
#[derive(Debug)]
pub struct TokioClock {
    base: DateTime<Utc>,
    origin: Instant,
}

impl TokioClock {
    pub fn starting_at(base: DateTime<Utc>) -> Self {
        Self {
            base,
            origin: Instant::now(),
        }
    }
}

impl Clock for TokioClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = Instant::now().duration_since(self.origin);
        self.base + Duration::milliseconds(elapsed.as_millis() as i64)
    }
}

/// Plays back queued readings, then repeats the fallback.
#[derive(Debug, Default)]
pub struct ScriptedIdleProbe {
    readings: Mutex<VecDeque<u64>>,
    fallback: AtomicU64,
}

impl ScriptedIdleProbe {
    pub fn constant(seconds: u64) -> Self {
        let probe = Self::default();
        probe.fallback.store(seconds, Ordering::SeqCst);
        probe
    }

    pub fn push(&self, readings: impl IntoIterator<Item = u64>) {
        self.readings.lock().unwrap().extend(readings);
    }
}

#[async_trait]
impl IdleProbe for ScriptedIdleProbe {
    async fn system_idle_seconds(&self) -> Result<u64> {
        let next = self.readings.lock().unwrap().pop_front();
        Ok(next.unwrap_or_else(|| self.fallback.load(Ordering::SeqCst)))
    }
}

#[derive(Debug, Default)]
pub struct FakeCapturer {
    captures: AtomicU32,
}

impl FakeCapturer {
    pub fn captures(&self) -> u32 {
        self.captures.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Capturer for FakeCapturer {
    async fn capture_and_upload(&self) -> Result<CaptureUpload> {
        let n = self.captures.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(CaptureUpload {
            url: format!("https://cdn.example.test/shots/{n}.png"),
        })
    }
}

#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<TrackerEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<TrackerEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, matches: impl Fn(&TrackerEvent) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|e| matches(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: TrackerEvent) {
        self.events.lock().unwrap().push(event);
    }
}

#[derive(Debug)]
pub struct ToggleConnectivity {
    online: AtomicBool,
}

impl Default for ToggleConnectivity {
    fn default() -> Self {
        Self {
            online: AtomicBool::new(true),
        }
    }
}

impl ToggleConnectivity {
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

#[async_trait]
impl ConnectivityProbe for ToggleConnectivity {
    async fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}
