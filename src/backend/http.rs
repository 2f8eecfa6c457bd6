use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Serialize;

use crate::config::BackendConfig;
use crate::ledger::TimeTrackingRecord;

use super::{ApprovalState, ScreenshotReport, TaskRecord, TrackerBackend};

#[derive(Serialize)]
struct SubmitRecordsRequest<'a> {
    records: &'a [TimeTrackingRecord],
}

#[derive(Serialize)]
struct UpdateTimingRequest {
    total_seconds: u64,
}

#[derive(Serialize)]
struct InProgressRequest {
    in_progress: bool,
}

/// JSON-over-HTTP client for the task server.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    api_token: Option<String>,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn auth_request(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response> {
        let response = self
            .auth_request(request)
            .send()
            .await
            .with_context(|| format!("{what}: request failed"))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(anyhow!("{what}: server returned {status}: {error_text}"));
        }
        Ok(response)
    }
}

#[async_trait]
impl TrackerBackend for HttpBackend {
    async fn submit_time_tracking_records(&self, records: &[TimeTrackingRecord]) -> Result<()> {
        let request = self
            .client
            .post(self.url("time-tracking"))
            .json(&SubmitRecordsRequest { records });
        self.send(request, "submit time tracking records").await?;
        Ok(())
    }

    async fn update_task_timing(&self, task_id: &str, total_seconds: u64) -> Result<()> {
        let request = self
            .client
            .put(self.url(&format!("tasks/{task_id}/timing")))
            .json(&UpdateTimingRequest { total_seconds });
        self.send(request, "update task timing").await?;
        Ok(())
    }

    async fn set_task_in_progress(&self, task_id: &str, in_progress: bool) -> Result<()> {
        let request = self
            .client
            .put(self.url(&format!("tasks/{task_id}/in-progress")))
            .json(&InProgressRequest { in_progress });
        self.send(request, "set task in-progress flag").await?;
        Ok(())
    }

    async fn fetch_task_by_id(&self, task_id: &str) -> Result<Option<TaskRecord>> {
        let request = self.auth_request(self.client.get(self.url(&format!("tasks/{task_id}"))));
        let response = request.send().await.context("fetch task: request failed")?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = response
            .error_for_status()
            .context("fetch task: server error")?;
        let task = response
            .json::<TaskRecord>()
            .await
            .context("fetch task: invalid response body")?;
        Ok(Some(task))
    }

    async fn list_tasks(&self) -> Result<Vec<TaskRecord>> {
        let response = self.send(self.client.get(self.url("tasks")), "list tasks").await?;
        response
            .json::<Vec<TaskRecord>>()
            .await
            .context("list tasks: invalid response body")
    }

    async fn current_user_approval_state(&self) -> Result<ApprovalState> {
        let response = self
            .send(self.client.get(self.url("me/approval")), "fetch approval state")
            .await?;
        response
            .json::<ApprovalState>()
            .await
            .context("fetch approval state: invalid response body")
    }

    async fn report_screenshot(&self, report: &ScreenshotReport) -> Result<()> {
        let request = self.client.post(self.url("screenshots")).json(report);
        self.send(request, "report screenshot").await?;
        Ok(())
    }
}
