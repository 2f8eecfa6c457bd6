use std::sync::Arc;

use futures::FutureExt;
use log::{error, info, warn};
use rand::thread_rng;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::{
    backend::{ScreenshotReport, TrackerBackend},
    clock::Clock,
    config::TrackerConfig,
    draft::{
        ConnectivityChange, ConnectivityMonitor, ConnectivityProbe, DraftStorage, DraftStore,
        PersistReason, RestoredDraft,
    },
    error::{TrackerError, TrackerResult},
    events::{EventSink, NoticeLevel, TrackerEvent},
    idle::{IdleCounters, IdleProbe},
    ledger::{build_records, RecordContext},
    reconcile::{ReconcileInput, ReconcileOutcome, ReconcileReport, Reconciler},
    scheduler::{Scheduler, TaskHandle},
    screenshot::{evaluate, plan_block_offsets, Capturer, Evaluation},
};

use super::{SessionState, SessionStatus, TaskSelection, TrackerCore};

// The pollers fire every second; keep their chatter switchable.
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

/// Collaborators the controller drives.
pub struct TrackerDeps {
    pub backend: Arc<dyn TrackerBackend>,
    pub storage: Arc<dyn DraftStorage>,
    pub capturer: Arc<dyn Capturer>,
    pub idle_probe: Arc<dyn IdleProbe>,
    pub connectivity: Arc<dyn ConnectivityProbe>,
    pub scheduler: Arc<dyn Scheduler>,
    pub clock: Arc<dyn Clock>,
    pub events: Arc<dyn EventSink>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerSnapshot {
    pub state: SessionState,
    pub segments: usize,
    pub window_seconds: i64,
    pub active_seconds: i64,
    pub idle: IdleCounters,
    pub idle_warning_visible: bool,
    pub recovering: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FinishSummary {
    pub task_id: String,
    pub records: usize,
    pub total_seconds: u64,
    pub window_seconds: i64,
    pub active_seconds: i64,
}

/// Host window events that put unsaved time at risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    WindowHidden,
    BeforeUnload,
    Offline,
}

#[derive(Default)]
struct ActivityHandles {
    ticker: Option<TaskHandle>,
    idle_poll: Option<TaskHandle>,
    screenshot_block: Option<TaskHandle>,
    screenshot_shots: Vec<TaskHandle>,
}

impl ActivityHandles {
    fn stop_all(&mut self) {
        for handle in [
            self.ticker.take(),
            self.idle_poll.take(),
            self.screenshot_block.take(),
        ]
        .into_iter()
        .flatten()
        {
            handle.cancel();
        }
        for handle in self.screenshot_shots.drain(..) {
            handle.cancel();
        }
    }
}

#[derive(Default)]
struct BackgroundHandles {
    connectivity: Option<TaskHandle>,
    reconcile_retry: Option<TaskHandle>,
    reload: Option<TaskHandle>,
}

#[derive(Clone)]
pub struct TrackerController {
    core: Arc<Mutex<TrackerCore>>,
    activity: Arc<Mutex<ActivityHandles>>,
    background: Arc<Mutex<BackgroundHandles>>,
    connectivity_state: Arc<Mutex<ConnectivityMonitor>>,
    draft: Arc<DraftStore>,
    reconciler: Arc<Reconciler>,
    backend: Arc<dyn TrackerBackend>,
    capturer: Arc<dyn Capturer>,
    idle_probe: Arc<dyn IdleProbe>,
    connectivity: Arc<dyn ConnectivityProbe>,
    scheduler: Arc<dyn Scheduler>,
    clock: Arc<dyn Clock>,
    events: Arc<dyn EventSink>,
    config: Arc<TrackerConfig>,
}

impl TrackerController {
    pub fn new(config: TrackerConfig, deps: TrackerDeps) -> Self {
        Self {
            core: Arc::new(Mutex::new(TrackerCore::new(&config.idle))),
            activity: Arc::new(Mutex::new(ActivityHandles::default())),
            background: Arc::new(Mutex::new(BackgroundHandles::default())),
            connectivity_state: Arc::new(Mutex::new(ConnectivityMonitor::new(true))),
            draft: Arc::new(DraftStore::new(deps.storage)),
            reconciler: Arc::new(Reconciler::new()),
            backend: deps.backend,
            capturer: deps.capturer,
            idle_probe: deps.idle_probe,
            connectivity: deps.connectivity,
            scheduler: deps.scheduler,
            clock: deps.clock,
            events: deps.events,
            config: Arc::new(config),
        }
    }

    pub async fn get_state(&self) -> SessionState {
        let now = self.clock.now();
        let mut guard = self.core.lock().await;
        guard.session.sync_elapsed(now);
        guard.session.clone()
    }

    pub async fn get_snapshot(&self) -> TrackerSnapshot {
        let now = self.clock.now();
        let mut guard = self.core.lock().await;
        guard.session.sync_elapsed(now);
        TrackerSnapshot {
            state: guard.session.clone(),
            segments: guard.ledger.pairs().len(),
            window_seconds: guard.ledger.window_seconds(),
            active_seconds: guard.ledger.active_seconds(),
            idle: guard.sampler.counters(),
            idle_warning_visible: guard.sampler.warning_visible(),
            recovering: guard.recovering,
        }
    }

    pub async fn is_capturing(&self) -> bool {
        self.core.lock().await.is_capturing()
    }

    /// Restores any draft left by a previous process, starts connectivity
    /// polling and makes the first reconciliation attempt.
    pub async fn boot(&self) -> TrackerResult<Option<RestoredDraft>> {
        let restored = self.draft.restore().await?;

        if let Some(restored) = &restored {
            let task_id = restored.task_id().unwrap_or_default().to_string();
            let segments = restored.pairs.len();
            self.core.lock().await.restore(restored.clone());
            self.events
                .emit(TrackerEvent::DraftRecovered { task_id, segments });
            self.emit_state_changed().await;
        }

        self.start_background(restored.is_some()).await;

        if restored.is_some() {
            if let Err(err) = self.try_reconcile().await {
                warn!("reconciliation deferred: {err}");
            }
        }
        Ok(restored)
    }

    /// Builds a selection for `task_id` carrying the server's current total.
    pub async fn select_task(
        &self,
        task_id: &str,
        project_id: &str,
        task_name: &str,
    ) -> TrackerResult<TaskSelection> {
        let task = self
            .backend
            .fetch_task_by_id(task_id)
            .await
            .map_err(TrackerError::network)?
            .ok_or_else(|| TrackerError::validation(format!("task {task_id} was not found")))?;

        Ok(TaskSelection {
            task_name: if task_name.is_empty() {
                task.name
            } else {
                task_name.to_string()
            },
            project_id: if project_id.is_empty() {
                task.project_id
            } else {
                project_id.to_string()
            },
            last_timing_seconds: task.last_timing.max(0.0).floor() as u64,
            task_id: task.id,
        })
    }

    pub async fn start(&self, selection: TaskSelection) -> TrackerResult<SessionState> {
        if selection.task_id.trim().is_empty() {
            return Err(self.reject(TrackerError::validation("select a task before starting")));
        }
        {
            let core = self.core.lock().await;
            ensure_startable(&core).map_err(|err| self.reject(err))?;
        }
        self.check_approval().await.map_err(|err| self.reject(err))?;

        let now = self.clock.now();
        {
            let mut core = self.core.lock().await;
            ensure_startable(&core)?;
            core.reset();
            core.session.select_task(&selection);
            core.begin_capture(now);
        }
        info!(
            "capture started for task {} ({})",
            selection.task_id, selection.task_name
        );

        self.start_activity().await;
        if let Err(err) = self
            .backend
            .set_task_in_progress(&selection.task_id, true)
            .await
        {
            warn!("failed to flag task {} in progress: {err:#}", selection.task_id);
        }
        self.persist(PersistReason::StateChange, false).await;
        self.emit_state_changed().await;

        Ok(self.get_state().await)
    }

    pub async fn pause(&self) -> TrackerResult<SessionState> {
        if !self.is_capturing().await {
            return Err(self.reject(TrackerError::validation("no session is being captured")));
        }
        match self.backend.current_user_approval_state().await {
            Ok(approval) if approval.is_blocked() => {
                return Err(self.reject(TrackerError::ApprovalBlocked));
            }
            Ok(_) => {}
            Err(err) => warn!("approval lookup failed; pausing anyway: {err:#}"),
        }

        let now = self.clock.now();
        let closed = {
            let mut core = self.core.lock().await;
            if !core.is_capturing() {
                return Err(TrackerError::validation("no session is being captured"));
            }
            core.halt_capture(now, SessionStatus::Paused)
        };
        self.stop_activity().await;

        if let Some(pair) = closed {
            info!(
                "capture paused: {}s window, {}s active",
                pair.window_seconds(),
                pair.active_seconds()
            );
        }
        self.persist(PersistReason::StateChange, false).await;
        self.emit_state_changed().await;

        Ok(self.get_state().await)
    }

    pub async fn resume(&self) -> TrackerResult<SessionState> {
        {
            let core = self.core.lock().await;
            ensure_resumable(&core).map_err(|err| self.reject(err))?;
        }
        self.check_approval().await.map_err(|err| self.reject(err))?;

        let now = self.clock.now();
        {
            let mut core = self.core.lock().await;
            ensure_resumable(&core)?;
            core.begin_capture(now);
        }
        info!("capture resumed");

        self.start_activity().await;
        self.persist(PersistReason::StateChange, false).await;
        self.emit_state_changed().await;

        Ok(self.get_state().await)
    }

    /// Submits one record per captured window, raises the task total and
    /// clears the session. Any failed step keeps the session paused with
    /// every segment; a retry skips the records that already went through.
    pub async fn finish(&self) -> TrackerResult<FinishSummary> {
        let now = self.clock.now();
        let (pairs, task_id, project_id, elapsed, known, already_submitted, claim) = {
            let mut core = self.core.lock().await;
            if core.finishing {
                return Err(TrackerError::validation("finish is already in progress"));
            }
            if !core.ledger.would_capture(now) {
                return Err(self.reject(TrackerError::NothingCaptured));
            }
            let Some(task_id) = core.session.selected_task_id.clone() else {
                return Err(self.reject(TrackerError::validation("no task is selected")));
            };
            let claim = if core.recovering {
                let Some(claim) = self.reconciler.try_claim() else {
                    return Err(self.reject(TrackerError::validation(
                        "the recovered session is being saved; try again shortly",
                    )));
                };
                Some(claim)
            } else {
                None
            };
            if core.is_capturing() {
                core.halt_capture(now, SessionStatus::Paused);
            }
            core.finishing = true;
            (
                core.ledger.pairs().to_vec(),
                task_id,
                core.session.project_id.clone().unwrap_or_default(),
                core.session.elapsed_seconds,
                core.session.known_task_seconds,
                core.session.records_submitted || self.reconciler.records_submitted(),
                claim,
            )
        };
        self.stop_activity().await;

        let ctx = RecordContext {
            task_id: &task_id,
            project_id: &project_id,
            identity: &self.config.identity,
        };
        let records = build_records(&pairs, &ctx);

        if already_submitted {
            info!("records for task {task_id} already submitted; retrying the total only");
        } else if let Err(err) = self.backend.submit_time_tracking_records(&records).await {
            let err = TrackerError::network(err);
            error!("finish failed for task {task_id}; session kept paused: {err}");
            self.abort_finish().await;
            self.events.emit(TrackerEvent::notice(
                NoticeLevel::Error,
                "Could not submit your time. Nothing was lost; please try finishing again.",
            ));
            self.emit_state_changed().await;
            return Err(err);
        } else {
            self.core.lock().await.session.records_submitted = true;
        }

        let total_seconds = elapsed.max(known);
        if let Err(err) = self.backend.update_task_timing(&task_id, total_seconds).await {
            let err = TrackerError::network(err);
            error!("records submitted but timing update for task {task_id} failed: {err}");
            self.abort_finish().await;
            self.events.emit(TrackerEvent::notice(
                NoticeLevel::Error,
                "Time saved, but the task total could not be updated. Please try finishing again.",
            ));
            self.emit_state_changed().await;
            return Err(err);
        }
        if let Err(err) = self.backend.set_task_in_progress(&task_id, false).await {
            warn!("failed to clear in-progress flag on task {task_id}: {err:#}");
        }

        let window_seconds = pairs.iter().map(|pair| pair.window_seconds()).sum();
        let active_seconds = pairs.iter().map(|pair| pair.active_seconds()).sum();

        self.core.lock().await.reset();
        if let Err(err) = self.draft.clear().await {
            error!("session submitted but its draft could not be deleted: {err}");
        }
        if let Some(claim) = claim {
            claim.complete();
            self.background.lock().await.reconcile_retry = None;
        }

        info!(
            "session finished for task {task_id}: {} records, {total_seconds}s total",
            records.len()
        );
        self.emit_state_changed().await;

        Ok(FinishSummary {
            task_id,
            records: records.len(),
            total_seconds,
            window_seconds,
            active_seconds,
        })
    }

    /// Leaves a failed finish paused and saved for another attempt.
    async fn abort_finish(&self) {
        self.core.lock().await.finishing = false;
        self.persist(PersistReason::FinishFailed, true).await;
    }

    pub async fn acknowledge_idle_warning(&self) {
        self.core.lock().await.sampler.acknowledge_warning();
    }

    pub async fn handle_lifecycle_event(&self, event: LifecycleEvent) -> TrackerResult<()> {
        match event {
            LifecycleEvent::WindowHidden => {
                self.persist_now(PersistReason::WindowHidden, true).await?;
            }
            LifecycleEvent::BeforeUnload => {
                self.persist_now(PersistReason::BeforeUnload, true).await?;
            }
            LifecycleEvent::Offline => {
                self.connectivity_state.lock().await.observe(false);
                self.handle_network_loss(PersistReason::Offline).await;
            }
        }
        Ok(())
    }

    pub async fn poll_connectivity(&self) {
        let online = self.connectivity.is_online().await;
        let change = self.connectivity_state.lock().await.observe(online);
        match change {
            Some(ConnectivityChange::WentOffline) => {
                self.handle_network_loss(PersistReason::NetworkLost).await;
            }
            Some(ConnectivityChange::CameOnline) => info!("connectivity restored"),
            None => {}
        }
    }

    /// Attempts reconciliation of a restored draft. `Ok(None)` means there
    /// was nothing to reconcile.
    pub async fn try_reconcile(&self) -> TrackerResult<Option<ReconcileOutcome>> {
        let (input, claim) = {
            let core = self.core.lock().await;
            if !core.recovering || core.finishing || self.reconciler.is_completed() {
                return Ok(None);
            }
            let Some(task_id) = core.session.selected_task_id.clone() else {
                return Ok(None);
            };
            let Some(claim) = self.reconciler.try_claim() else {
                return Ok(Some(ReconcileOutcome::InFlight));
            };
            let input = ReconcileInput {
                task_id,
                elapsed_seconds: core.session.elapsed_seconds,
                pairs: core.ledger.pairs().to_vec(),
                records_already_submitted: core.session.records_submitted,
            };
            (input, claim)
        };

        let tasks = self
            .backend
            .list_tasks()
            .await
            .map_err(TrackerError::network)?;
        let result = claim
            .run(&input, &tasks, &self.config.identity, self.backend.as_ref())
            .await;

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(err) => {
                if self.reconciler.records_submitted() && !input.records_already_submitted {
                    self.core.lock().await.session.records_submitted = true;
                    self.persist(PersistReason::StateChange, false).await;
                }
                return Err(err);
            }
        };
        if let ReconcileOutcome::Completed(report) = &outcome {
            self.complete_recovery(report).await;
        }
        Ok(Some(outcome))
    }

    /// Re-enables draft writes once the UI has reloaded after a recovery.
    pub async fn reload(&self) {
        self.draft.enable_writes().await;
        info!("reload requested after recovery");
        self.events.emit(TrackerEvent::ReloadRequested);
    }

    pub async fn shutdown(&self) {
        self.stop_activity().await;
        let mut background = self.background.lock().await;
        *background = BackgroundHandles::default();
    }

    async fn complete_recovery(&self, report: &ReconcileReport) {
        self.events.emit(TrackerEvent::notice(
            NoticeLevel::Info,
            format!(
                "Recovered your unsaved session and saved it ({}s on the task).",
                report.total_seconds
            ),
        ));
        self.events.emit(TrackerEvent::ReconciliationCompleted {
            task_id: report.task_id.clone(),
            total_seconds: report.total_seconds,
            records: report.records_submitted,
        });

        self.draft.disable_writes().await;
        self.core.lock().await.reset();
        self.stop_activity().await;
        if let Err(err) = self.draft.clear().await {
            error!("recovered session saved but its draft could not be deleted: {err}");
        }
        self.emit_state_changed().await;

        let controller = self.clone();
        let reload = self.scheduler.schedule_once(
            self.config.intervals.reload_delay(),
            async move { controller.reload().await }.boxed(),
        );

        let mut background = self.background.lock().await;
        background.reload = Some(reload);
        background.reconcile_retry = None;
    }

    async fn handle_network_loss(&self, reason: PersistReason) {
        let now = self.clock.now();
        let was_capturing = {
            let mut core = self.core.lock().await;
            if core.is_capturing() {
                core.halt_capture(now, SessionStatus::Paused);
                true
            } else {
                false
            }
        };
        self.stop_activity().await;

        if let Err(err) = self.persist_now(reason, true).await {
            warn!("draft save after network loss failed: {err}");
        }

        if was_capturing {
            warn!("network lost; capture paused at {now}");
            self.events.emit(TrackerEvent::NetworkLost);
            self.events.emit(TrackerEvent::notice(
                NoticeLevel::Warning,
                "Connection lost. Tracking was paused and your time is saved locally.",
            ));
            self.emit_state_changed().await;
        }
    }

    async fn check_approval(&self) -> TrackerResult<()> {
        let approval = self
            .backend
            .current_user_approval_state()
            .await
            .map_err(TrackerError::network)?;
        if approval.is_blocked() {
            return Err(TrackerError::ApprovalBlocked);
        }
        Ok(())
    }

    async fn start_activity(&self) {
        let mut handles = self.activity.lock().await;
        handles.stop_all();

        let intervals = &self.config.intervals;

        let ticker = self.clone();
        handles.ticker = Some(self.scheduler.schedule(
            intervals.tick(),
            Box::new(move || {
                let controller = ticker.clone();
                async move { controller.on_tick().await }.boxed()
            }),
        ));

        let sampler = self.clone();
        handles.idle_poll = Some(self.scheduler.schedule(
            intervals.idle_poll(),
            Box::new(move || {
                let controller = sampler.clone();
                async move { controller.on_idle_poll().await }.boxed()
            }),
        ));

        let planner = self.clone();
        handles.screenshot_block = Some(self.scheduler.schedule(
            self.config.screenshots.block(),
            Box::new(move || {
                let controller = planner.clone();
                async move { controller.plan_screenshot_block().await }.boxed()
            }),
        ));
        drop(handles);

        self.plan_screenshot_block().await;
    }

    async fn stop_activity(&self) {
        self.activity.lock().await.stop_all();
    }

    async fn start_background(&self, recovering: bool) {
        let mut background = self.background.lock().await;

        let poller = self.clone();
        background.connectivity = Some(self.scheduler.schedule(
            self.config.intervals.connectivity_poll(),
            Box::new(move || {
                let controller = poller.clone();
                async move { controller.poll_connectivity().await }.boxed()
            }),
        ));

        if recovering {
            let retrier = self.clone();
            background.reconcile_retry = Some(self.scheduler.schedule(
                self.config.intervals.reconcile_retry(),
                Box::new(move || {
                    let controller = retrier.clone();
                    async move {
                        if let Err(err) = controller.try_reconcile().await {
                            warn!("reconciliation retry failed: {err}");
                        }
                    }
                    .boxed()
                }),
            ));
        }
    }

    async fn on_tick(&self) {
        let now = self.clock.now();
        let (elapsed_seconds, autosave) = {
            let mut core = self.core.lock().await;
            if !core.is_capturing() {
                return;
            }
            let elapsed = core.session.sync_elapsed(now);
            core.ticks = core.ticks.wrapping_add(1);
            let every = self.config.intervals.autosave_every_ticks.max(1);
            (elapsed, core.ticks % every == 0)
        };

        self.events.emit(TrackerEvent::Tick { elapsed_seconds });
        if autosave {
            self.persist(PersistReason::Autosave, false).await;
        }
    }

    async fn on_idle_poll(&self) {
        let reading = match self.idle_probe.system_idle_seconds().await {
            Ok(seconds) => seconds,
            Err(err) => {
                log_warn!("idle probe failed: {err:#}");
                return;
            }
        };

        let warning = {
            let mut core = self.core.lock().await;
            if !core.is_capturing() {
                return;
            }
            core.sampler.record_sample(reading)
        };

        if let Some(warning) = warning {
            log_info!("idle for {}s; warning raised", warning.streak_secs);
            self.events.emit(TrackerEvent::IdleWarning {
                streak_seconds: warning.streak_secs,
            });
        }
    }

    async fn plan_screenshot_block(&self) {
        if !self.is_capturing().await {
            return;
        }
        let offsets = {
            let mut rng = thread_rng();
            plan_block_offsets(&mut rng, &self.config.screenshots)
        };
        log_debug!("screenshot block planned at offsets {offsets:?}");

        let shots: Vec<TaskHandle> = offsets
            .into_iter()
            .map(|offset| {
                let controller = self.clone();
                self.scheduler.schedule_once(
                    offset,
                    async move { controller.evaluate_screenshot().await }.boxed(),
                )
            })
            .collect();

        self.activity.lock().await.screenshot_shots = shots;
    }

    async fn evaluate_screenshot(&self) {
        let (evaluation, task_id) = {
            let mut core = self.core.lock().await;
            let evaluation = evaluate(
                core.is_capturing(),
                core.sampler.idle_seconds_this_cycle(),
                &self.config.screenshots,
            );
            core.sampler.reset_cycle();
            (evaluation, core.session.selected_task_id.clone())
        };

        let Evaluation::Capture {
            active_secs,
            idle_secs,
        } = evaluation
        else {
            log_debug!("screenshot skipped: {evaluation:?}");
            return;
        };
        let Some(task_id) = task_id else {
            return;
        };

        match self.capturer.capture_and_upload().await {
            Ok(upload) => {
                let report = ScreenshotReport {
                    task_id,
                    url: upload.url,
                    captured_at: self.clock.now(),
                    idle_seconds: idle_secs,
                    active_seconds: active_secs,
                };
                if let Err(err) = self.backend.report_screenshot(&report).await {
                    log_warn!("screenshot uploaded but report failed: {err:#}");
                } else {
                    log_debug!("screenshot reported: {}", report.url);
                }
            }
            Err(err) => log_warn!("screenshot capture failed: {err:#}"),
        }
    }

    async fn persist_now(&self, reason: PersistReason, force_pending: bool) -> TrackerResult<bool> {
        self.draft
            .persist(self.core.as_ref(), self.clock.now(), force_pending, reason)
            .await
    }

    /// Periodic and best-effort saves: a failure waits for the next attempt.
    async fn persist(&self, reason: PersistReason, force_pending: bool) {
        if let Err(err) = self.persist_now(reason, force_pending).await {
            warn!("draft save ({reason:?}) failed; will retry: {err}");
        }
    }

    async fn emit_state_changed(&self) {
        let state = self.get_state().await;
        self.events.emit(TrackerEvent::StateChanged { state });
    }

    /// Surfaces user-facing failures as a notification.
    fn reject(&self, err: TrackerError) -> TrackerError {
        let level = match err {
            TrackerError::TransientNetwork(_) | TrackerError::Storage(_) => NoticeLevel::Error,
            _ => NoticeLevel::Warning,
        };
        self.events
            .emit(TrackerEvent::notice(level, err.to_string()));
        err
    }
}

fn ensure_startable(core: &TrackerCore) -> TrackerResult<()> {
    if core.recovering || core.finishing {
        return Err(TrackerError::validation(
            "a previous session is still being saved",
        ));
    }
    match core.session.status {
        SessionStatus::Idle => Ok(()),
        SessionStatus::Capturing => Err(TrackerError::validation(
            "a session is already being captured",
        )),
        SessionStatus::Paused => Err(TrackerError::validation(
            "resume or finish the paused session first",
        )),
    }
}

fn ensure_resumable(core: &TrackerCore) -> TrackerResult<()> {
    if core.recovering || core.finishing {
        return Err(TrackerError::validation(
            "a previous session is still being saved",
        ));
    }
    if core.session.status != SessionStatus::Paused {
        return Err(TrackerError::validation("no paused session to resume"));
    }
    if core.session.records_submitted {
        return Err(TrackerError::validation(
            "this session was already submitted; finish again to save the task total",
        ));
    }
    Ok(())
}
