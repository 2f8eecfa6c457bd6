pub mod http;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ledger::TimeTrackingRecord;

pub use http::HttpBackend;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskRecord {
    pub id: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub name: String,
    /// Cumulative seconds the server already knows about.
    #[serde(default)]
    pub last_timing: f64,
    #[serde(default)]
    pub in_progress: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Freelancer,
    Employee,
    Admin,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Approved,
    Pending,
    Rejected,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApprovalState {
    pub role: UserRole,
    pub approval: ApprovalStatus,
}

impl ApprovalState {
    /// Freelancers cannot track time until their account is approved.
    pub fn is_blocked(&self) -> bool {
        self.role == UserRole::Freelancer && self.approval != ApprovalStatus::Approved
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScreenshotReport {
    pub task_id: String,
    pub url: String,
    pub captured_at: DateTime<Utc>,
    pub idle_seconds: u64,
    pub active_seconds: u64,
}

/// Everything the engine needs from the server.
#[async_trait]
pub trait TrackerBackend: Send + Sync {
    async fn submit_time_tracking_records(&self, records: &[TimeTrackingRecord]) -> Result<()>;
    async fn update_task_timing(&self, task_id: &str, total_seconds: u64) -> Result<()>;
    async fn set_task_in_progress(&self, task_id: &str, in_progress: bool) -> Result<()>;
    async fn fetch_task_by_id(&self, task_id: &str) -> Result<Option<TaskRecord>>;
    async fn list_tasks(&self) -> Result<Vec<TaskRecord>>;
    async fn current_user_approval_state(&self) -> Result<ApprovalState>;
    async fn report_screenshot(&self, report: &ScreenshotReport) -> Result<()>;
}
