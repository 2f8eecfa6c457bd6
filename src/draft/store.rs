use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use tokio::sync::Mutex;

use crate::error::{TrackerError, TrackerResult};
use crate::ledger::SegmentPair;
use crate::timer::{SessionState, SessionStatus};

use super::snapshot::{DraftSnapshot, DRAFT_KEY};

/// Key-value persistence for the draft. Any medium works.
#[async_trait]
pub trait DraftStorage: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
}

/// Anything that can mirror itself into a draft.
pub trait SnapshotSource {
    fn draft_snapshot(&self, saved_at: DateTime<Utc>, pending_auto_submit: bool) -> Option<DraftSnapshot>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistReason {
    Autosave,
    StateChange,
    WindowHidden,
    BeforeUnload,
    Offline,
    NetworkLost,
    FinishFailed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RestoredDraft {
    pub session: SessionState,
    pub pairs: Vec<SegmentPair>,
    /// Closing segment rebuilt from the open cursor, also present in `pairs`.
    pub synthesized: Option<SegmentPair>,
    pub pending_auto_submit: bool,
    pub saved_at: DateTime<Utc>,
}

impl RestoredDraft {
    pub fn task_id(&self) -> Option<&str> {
        self.session.selected_task_id.as_deref()
    }
}

#[derive(Debug)]
struct DraftState {
    writes_enabled: bool,
    pending_auto_submit: bool,
    last_saved_at: Option<DateTime<Utc>>,
}

/// Persists and restores the ledger mirror under a single well-known key.
///
/// Writes and deletes are serialized through one lock so a late auto-save can
/// never land after a `clear`.
pub struct DraftStore {
    storage: Arc<dyn DraftStorage>,
    state: Mutex<DraftState>,
}

impl DraftStore {
    pub fn new(storage: Arc<dyn DraftStorage>) -> Self {
        Self {
            storage,
            state: Mutex::new(DraftState {
                writes_enabled: true,
                pending_auto_submit: false,
                last_saved_at: None,
            }),
        }
    }

    /// Overwrites the draft with the current state of `source`. Returns
    /// whether anything was written.
    pub async fn persist<S: SnapshotSource + Send>(
        &self,
        source: &Mutex<S>,
        now: DateTime<Utc>,
        force_pending: bool,
        reason: PersistReason,
    ) -> TrackerResult<bool> {
        let mut state = self.state.lock().await;
        if !state.writes_enabled {
            debug!("draft writes disabled; skipping {reason:?} persist");
            return Ok(false);
        }

        let pending = state.pending_auto_submit || force_pending;
        let snapshot = {
            let guard = source.lock().await;
            guard.draft_snapshot(now, pending)
        };
        let Some(snapshot) = snapshot else {
            return Ok(false);
        };

        let payload = snapshot.to_json()?;
        self.storage
            .set(DRAFT_KEY, &payload)
            .await
            .map_err(TrackerError::storage)?;

        state.pending_auto_submit = pending;
        state.last_saved_at = Some(now);
        if reason == PersistReason::Autosave {
            debug!("draft auto-saved ({} segments)", snapshot.segments.len());
        } else {
            info!(
                "draft saved ({reason:?}, {} segments, capturing={})",
                snapshot.segments.len(),
                snapshot.was_capturing()
            );
        }
        Ok(true)
    }

    /// Reads the draft left by a previous process, if any. The restored
    /// session is always paused.
    pub async fn restore(&self) -> TrackerResult<Option<RestoredDraft>> {
        let raw = self
            .storage
            .get(DRAFT_KEY)
            .await
            .map_err(TrackerError::storage)?;
        let Some(raw) = raw else {
            return Ok(None);
        };

        let snapshot = match DraftSnapshot::parse(&raw) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!("ignoring unreadable draft: {err}");
                return Ok(None);
            }
        };
        if snapshot.session.selected_task_id.is_none() {
            debug!("draft has no task id; nothing to restore");
            return Ok(None);
        }

        let mut pairs = snapshot.resolved_pairs();
        let synthesized = snapshot.synthesized_closing_pair();
        if let Some(pair) = synthesized {
            info!(
                "recovering {}s captured after the last save before shutdown",
                pair.window_seconds()
            );
            pairs.push(pair);
        }

        let mut session = snapshot.session.clone();
        session.status = SessionStatus::Paused;
        session.running_since = None;
        session.elapsed_baseline = session.elapsed_seconds;

        {
            let mut state = self.state.lock().await;
            state.pending_auto_submit = snapshot.pending_auto_submit;
            state.last_saved_at = Some(snapshot.saved_at);
        }

        info!(
            "restored draft for task {} ({} segments, saved at {})",
            session.selected_task_id.as_deref().unwrap_or_default(),
            pairs.len(),
            snapshot.saved_at
        );

        Ok(Some(RestoredDraft {
            session,
            pairs,
            synthesized,
            pending_auto_submit: snapshot.pending_auto_submit,
            saved_at: snapshot.saved_at,
        }))
    }

    pub async fn clear(&self) -> TrackerResult<()> {
        let mut state = self.state.lock().await;
        self.storage
            .remove(DRAFT_KEY)
            .await
            .map_err(TrackerError::storage)?;
        state.pending_auto_submit = false;
        state.last_saved_at = None;
        info!("draft cleared");
        Ok(())
    }

    pub async fn disable_writes(&self) {
        self.state.lock().await.writes_enabled = false;
    }

    pub async fn enable_writes(&self) {
        self.state.lock().await.writes_enabled = true;
    }

    pub async fn pending_auto_submit(&self) -> bool {
        self.state.lock().await.pending_auto_submit
    }

    pub async fn last_saved_at(&self) -> Option<DateTime<Utc>> {
        self.state.lock().await.last_saved_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IdleConfig;
    use crate::testing::MemoryStorage;
    use crate::timer::{TaskSelection, TrackerCore};
    use chrono::{Duration, TimeZone};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn capturing_core(start: DateTime<Utc>) -> Mutex<TrackerCore> {
        let mut core = TrackerCore::new(&IdleConfig::default());
        core.session.select_task(&TaskSelection {
            task_id: "task-1".into(),
            task_name: "Review".into(),
            project_id: "proj-1".into(),
            last_timing_seconds: 0,
        });
        core.begin_capture(start);
        Mutex::new(core)
    }

    #[tokio::test]
    async fn unclean_shutdown_closes_segment_at_saved_at() {
        let storage = Arc::new(MemoryStorage::default());
        let store = DraftStore::new(storage.clone());
        let core = capturing_core(at(0));

        let saved_at = at(0) + Duration::seconds(40);
        assert!(store
            .persist(&core, saved_at, false, PersistReason::Autosave)
            .await
            .unwrap());

        // A new process starts much later.
        let restarted = DraftStore::new(storage);
        let restored = restarted.restore().await.unwrap().unwrap();

        let closing = restored.synthesized.unwrap();
        assert_eq!(closing.raw.start_at, at(0));
        assert_eq!(closing.raw.end_at, saved_at);
        assert_eq!(restored.pairs.len(), 1);
        assert_eq!(restored.session.status, SessionStatus::Paused);
        assert_eq!(restored.session.elapsed_seconds, 40);
        assert_eq!(restored.task_id(), Some("task-1"));
    }

    #[tokio::test]
    async fn paused_draft_gets_no_synthesized_segment() {
        let storage = Arc::new(MemoryStorage::default());
        let store = DraftStore::new(storage.clone());
        let core = capturing_core(at(0));
        core.lock().await.halt_capture(at(30), SessionStatus::Paused);

        store
            .persist(&core, at(90), false, PersistReason::StateChange)
            .await
            .unwrap();
        let restored = DraftStore::new(storage).restore().await.unwrap().unwrap();
        assert!(restored.synthesized.is_none());
        assert_eq!(restored.pairs.len(), 1);
        assert_eq!(restored.pairs[0].raw.end_at, at(30));
    }

    #[tokio::test]
    async fn disabled_writes_are_a_no_op() {
        let storage = Arc::new(MemoryStorage::default());
        let store = DraftStore::new(storage.clone());
        let core = capturing_core(at(0));

        store.disable_writes().await;
        let written = store
            .persist(&core, at(10), true, PersistReason::BeforeUnload)
            .await
            .unwrap();
        assert!(!written);
        assert!(storage.get(DRAFT_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn forced_pending_flag_survives_restore() {
        let storage = Arc::new(MemoryStorage::default());
        let store = DraftStore::new(storage.clone());
        let core = capturing_core(at(0));

        store
            .persist(&core, at(5), true, PersistReason::WindowHidden)
            .await
            .unwrap();
        assert!(store.pending_auto_submit().await);

        let restarted = DraftStore::new(storage);
        let restored = restarted.restore().await.unwrap().unwrap();
        assert!(restored.pending_auto_submit);
        assert!(restarted.pending_auto_submit().await);
    }

    #[tokio::test]
    async fn corrupt_or_taskless_drafts_restore_as_nothing() {
        let storage = Arc::new(MemoryStorage::default());
        let store = DraftStore::new(storage.clone());

        storage.set(DRAFT_KEY, "not json").await.unwrap();
        assert!(store.restore().await.unwrap().is_none());

        storage
            .set(DRAFT_KEY, r#"{"session": {"status": "capturing"}, "savedAt": "2024-05-01T09:00:00Z"}"#)
            .await
            .unwrap();
        assert!(store.restore().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn clear_is_idempotent() {
        let storage = Arc::new(MemoryStorage::default());
        let store = DraftStore::new(storage.clone());
        let core = capturing_core(at(0));
        store
            .persist(&core, at(5), true, PersistReason::Offline)
            .await
            .unwrap();

        store.clear().await.unwrap();
        store.clear().await.unwrap();
        assert!(storage.get(DRAFT_KEY).await.unwrap().is_none());
        assert!(!store.pending_auto_submit().await);
        assert!(store.restore().await.unwrap().is_none());
    }
}
