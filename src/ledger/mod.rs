pub mod records;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use records::{build_records, Identity, RecordContext, TimeTrackingRecord};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
}

impl Segment {
    pub fn new(start_at: DateTime<Utc>, end_at: DateTime<Utc>) -> Self {
        Self { start_at, end_at }
    }

    pub fn duration_secs(&self) -> i64 {
        (self.end_at - self.start_at).num_seconds()
    }

    pub fn is_valid(&self) -> bool {
        self.end_at > self.start_at
    }
}

/// One capturing window: the literal wall-clock span plus its idle-deducted
/// counterpart. The active segment always lies inside the raw one.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SegmentPair {
    pub id: Uuid,
    pub raw: Segment,
    pub active: Segment,
}

impl SegmentPair {
    pub fn close(
        id: Uuid,
        raw_start: DateTime<Utc>,
        active_start: DateTime<Utc>,
        end_at: DateTime<Utc>,
        idle_secs: u64,
    ) -> Self {
        let active_start = active_start.clamp(raw_start, end_at);
        let span = (end_at - active_start).num_seconds().max(0);
        let idle = i64::try_from(idle_secs).unwrap_or(i64::MAX).min(span);
        let active_end = (end_at - Duration::seconds(idle)).max(active_start);

        Self {
            id,
            raw: Segment::new(raw_start, end_at),
            active: Segment::new(active_start, active_end),
        }
    }

    /// Builds a pair from separately stored tracks, pulling the active side
    /// back inside the raw bounds.
    pub fn from_tracks(id: Uuid, raw: Segment, active: Option<Segment>) -> Self {
        let active = active.unwrap_or(raw);
        let start = active.start_at.clamp(raw.start_at, raw.end_at);
        let end = active.end_at.clamp(start, raw.end_at);
        Self {
            id,
            raw,
            active: Segment::new(start, end),
        }
    }

    pub fn window_seconds(&self) -> i64 {
        self.raw.duration_secs().max(0)
    }

    pub fn active_seconds(&self) -> i64 {
        self.active.duration_secs().clamp(0, self.window_seconds())
    }

    pub fn idle_seconds(&self) -> i64 {
        self.window_seconds() - self.active_seconds()
    }
}

/// The segment currently being captured. Lives outside the closed list until
/// it is closed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OpenCursor {
    pub pair_id: Uuid,
    pub raw_start: DateTime<Utc>,
    pub active_start: DateTime<Utc>,
    /// Session idle total when the cursor opened.
    pub idle_baseline: u64,
}

impl OpenCursor {
    pub fn idle_since_open(&self, idle_total: u64) -> u64 {
        idle_total.saturating_sub(self.idle_baseline)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Ledger {
    pairs: Vec<SegmentPair>,
    open: Option<OpenCursor>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pairs(&self) -> &[SegmentPair] {
        &self.pairs
    }

    pub fn open_cursor(&self) -> Option<&OpenCursor> {
        self.open.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Opens a cursor at `now`; an already open cursor is kept as is.
    pub fn open(&mut self, now: DateTime<Utc>, idle_total: u64) -> Uuid {
        if let Some(cursor) = &self.open {
            return cursor.pair_id;
        }
        let cursor = OpenCursor {
            pair_id: Uuid::new_v4(),
            raw_start: now,
            active_start: now,
            idle_baseline: idle_total,
        };
        self.open = Some(cursor);
        cursor.pair_id
    }

    /// Closes the open cursor into the track. Windows shorter than one whole
    /// second are dropped.
    pub fn close(&mut self, now: DateTime<Utc>, idle_total: u64) -> Option<SegmentPair> {
        let cursor = self.open.take()?;
        if !spans_a_second(cursor.raw_start, now) {
            return None;
        }
        let pair = SegmentPair::close(
            cursor.pair_id,
            cursor.raw_start,
            cursor.active_start,
            now,
            cursor.idle_since_open(idle_total),
        );
        self.pairs.push(pair);
        Some(pair)
    }

    /// True when closing at `now` would leave at least one segment.
    pub fn would_capture(&self, now: DateTime<Utc>) -> bool {
        !self.pairs.is_empty()
            || self
                .open
                .is_some_and(|cursor| spans_a_second(cursor.raw_start, now))
    }

    pub fn inject(&mut self, pairs: Vec<SegmentPair>) {
        self.pairs
            .extend(pairs.into_iter().filter(|pair| pair.window_seconds() > 0));
    }

    pub fn clear(&mut self) {
        self.pairs.clear();
        self.open = None;
    }

    pub fn window_seconds(&self) -> i64 {
        self.pairs.iter().map(SegmentPair::window_seconds).sum()
    }

    pub fn active_seconds(&self) -> i64 {
        self.pairs.iter().map(SegmentPair::active_seconds).sum()
    }
}

fn spans_a_second(start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    (end - start).num_seconds() > 0
}
