use log::{info, warn};
use serde::Serialize;

use crate::timer::SessionState;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Outbound signals for the UI collaborator.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TrackerEvent {
    StateChanged { state: SessionState },
    Tick { elapsed_seconds: u64 },
    IdleWarning { streak_seconds: u64 },
    NetworkLost,
    DraftRecovered { task_id: String, segments: usize },
    ReconciliationCompleted { task_id: String, total_seconds: u64, records: usize },
    Notification { level: NoticeLevel, message: String },
    ReloadRequested,
}

impl TrackerEvent {
    pub fn notice(level: NoticeLevel, message: impl Into<String>) -> Self {
        TrackerEvent::Notification {
            level,
            message: message.into(),
        }
    }
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: TrackerEvent);
}

/// Writes every event to the log as JSON; ticks go to debug.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&self, event: TrackerEvent) {
        let payload = match serde_json::to_string(&event) {
            Ok(payload) => payload,
            Err(err) => {
                warn!("failed to serialize tracker event: {err}");
                return;
            }
        };
        match event {
            TrackerEvent::Tick { .. } => log::debug!("event {payload}"),
            _ => info!("event {payload}"),
        }
    }
}
