use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{TrackerError, TrackerResult};
use crate::ledger::{Segment, SegmentPair};
use crate::timer::{SessionState, SessionStatus};

pub const DRAFT_KEY: &str = "shiftclock.session_draft";
pub const DRAFT_VERSION: u32 = 2;

fn legacy_version() -> u32 {
    1
}

/// Open-cursor timestamps as they were at save time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DraftCursor {
    #[serde(default = "Uuid::new_v4")]
    pub pair_id: Uuid,
    pub raw_start: DateTime<Utc>,
    pub active_start: DateTime<Utc>,
    /// Idle seconds sampled inside the open window before the save.
    #[serde(default)]
    pub idle_seconds: u64,
}

/// Persisted mirror of the ledger. Version 1 drafts stored two parallel
/// arrays (`activeSegments`, optional `rawSegments`) paired by index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DraftSnapshot {
    #[serde(default = "legacy_version")]
    pub version: u32,
    pub session: SessionState,
    #[serde(default)]
    pub segments: Vec<SegmentPair>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub active_segments: Vec<Segment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_segments: Option<Vec<Segment>>,
    #[serde(default)]
    pub open_cursor: Option<DraftCursor>,
    #[serde(default)]
    pub pending_auto_submit: bool,
    pub saved_at: DateTime<Utc>,
}

impl DraftSnapshot {
    pub fn new(
        session: SessionState,
        segments: Vec<SegmentPair>,
        open_cursor: Option<DraftCursor>,
        pending_auto_submit: bool,
        saved_at: DateTime<Utc>,
    ) -> Self {
        Self {
            version: DRAFT_VERSION,
            session,
            segments,
            active_segments: Vec::new(),
            raw_segments: None,
            open_cursor,
            pending_auto_submit,
            saved_at,
        }
    }

    pub fn parse(raw: &str) -> TrackerResult<Self> {
        let snapshot: DraftSnapshot =
            serde_json::from_str(raw).map_err(|err| TrackerError::CorruptDraft(err.to_string()))?;
        if snapshot.version > DRAFT_VERSION {
            return Err(TrackerError::CorruptDraft(format!(
                "draft version {} is newer than supported version {DRAFT_VERSION}",
                snapshot.version
            )));
        }
        Ok(snapshot)
    }

    pub fn to_json(&self) -> TrackerResult<String> {
        serde_json::to_string(self).map_err(|err| TrackerError::Storage(err.to_string()))
    }

    pub fn was_capturing(&self) -> bool {
        self.session.status == SessionStatus::Capturing
    }

    /// Closed pairs, upgrading index-paired legacy tracks. A legacy draft
    /// without a raw track uses its active track as raw.
    pub fn resolved_pairs(&self) -> Vec<SegmentPair> {
        if !self.segments.is_empty() {
            return self.segments.clone();
        }
        let raw = self
            .raw_segments
            .clone()
            .unwrap_or_else(|| self.active_segments.clone());

        raw.into_iter()
            .enumerate()
            .map(|(index, raw)| {
                SegmentPair::from_tracks(Uuid::new_v4(), raw, self.active_segments.get(index).copied())
            })
            .collect()
    }

    /// The window that was still open at save time, closed at `saved_at`.
    pub fn synthesized_closing_pair(&self) -> Option<SegmentPair> {
        if !self.was_capturing() {
            return None;
        }
        let cursor = self.open_cursor?;
        if self.saved_at <= cursor.raw_start {
            return None;
        }
        Some(SegmentPair::close(
            cursor.pair_id,
            cursor.raw_start,
            cursor.active_start,
            self.saved_at,
            cursor.idle_seconds,
        ))
    }
}
