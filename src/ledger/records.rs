use chrono::{FixedOffset, Offset, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::SegmentPair;

/// Who is tracking, as supplied by the login collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Identity {
    pub developer_id: String,
    pub tenant_id: String,
    pub timezone: String,
    pub utc_offset_minutes: i32,
}

impl Identity {
    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes.saturating_mul(60))
            .unwrap_or_else(|| Utc.fix())
    }
}

#[derive(Debug, Clone)]
pub struct RecordContext<'a> {
    pub task_id: &'a str,
    pub project_id: &'a str,
    pub identity: &'a Identity,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeTrackingRecord {
    pub task_id: String,
    pub project_id: String,
    pub developer_id: String,
    pub work_date: String,
    pub task_start: String,
    pub task_end: String,
    pub tenant_id: String,
    pub timezone: String,
    pub utc_offset_minutes: i32,
    pub window_seconds: i64,
    pub active_seconds: i64,
    pub idle_seconds: i64,
    pub tracked_seconds: i64,
}

/// One record per capturing window. Windows under one whole second, or
/// inverted, are skipped.
pub fn build_records(pairs: &[SegmentPair], ctx: &RecordContext<'_>) -> Vec<TimeTrackingRecord> {
    let offset = ctx.identity.offset();

    pairs
        .iter()
        .filter(|pair| pair.window_seconds() > 0)
        .map(|pair| {
            let window_seconds = pair.window_seconds();
            let active_seconds = pair.active_seconds();
            let local_start = pair.raw.start_at.with_timezone(&offset);

            TimeTrackingRecord {
                task_id: ctx.task_id.to_string(),
                project_id: ctx.project_id.to_string(),
                developer_id: ctx.identity.developer_id.clone(),
                work_date: local_start.format("%Y-%m-%d").to_string(),
                task_start: pair.raw.start_at.to_rfc3339_opts(SecondsFormat::Secs, true),
                task_end: pair.raw.end_at.to_rfc3339_opts(SecondsFormat::Secs, true),
                tenant_id: ctx.identity.tenant_id.clone(),
                timezone: ctx.identity.timezone.clone(),
                utc_offset_minutes: ctx.identity.utc_offset_minutes,
                window_seconds,
                active_seconds,
                idle_seconds: window_seconds - active_seconds,
                tracked_seconds: active_seconds,
            }
        })
        .collect()
}
