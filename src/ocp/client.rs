use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::io::Write;
use std::time::Duration;

use super::api::{
    report_path, reports_path, snapshots_path, task_path, Envelope, Page, TaskInstance,
};
use super::{
    ControlPlane, Credentials, ReportEntry, ReportRequest, SnapshotEntry, SubmittedReport, Target,
    TaskStatus,
};
use crate::error::GatherError;

/// Blocking HTTP client for one target cluster, authenticating every request
/// with basic auth.
pub struct OcpClient {
    http: Client,
    base_url: String,
    cluster_id: i64,
    cluster_name: String,
    credentials: Credentials,
}

impl OcpClient {
    pub fn new(target: &Target, timeout: Duration) -> Result<Self, GatherError> {
        let http = Client::builder()
            .user_agent(concat!("awr-gather/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|err| GatherError::ControlPlane(format!("failed to build HTTP client: {err}")))?;
        Ok(Self {
            http,
            base_url: target.base_url.trim_end_matches('/').to_string(),
            cluster_id: target.cluster_id,
            cluster_name: target.cluster_name.clone(),
            credentials: target.credentials.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn send(&self, request: RequestBuilder) -> Result<Response, String> {
        let response = request
            .basic_auth(&self.credentials.user, Some(&self.credentials.password))
            .send()
            .map_err(|err| err.to_string())?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(format!("{status} {}", text.trim()));
        }
        Ok(response)
    }

    fn get_data<T: DeserializeOwned>(&self, path: &str) -> Result<T, String> {
        let response = self.send(self.http.get(self.url(path)))?;
        let envelope: Envelope<T> = response
            .json()
            .map_err(|err| format!("invalid response from {path}: {err}"))?;
        Ok(envelope.data)
    }
}

impl ControlPlane for OcpClient {
    fn list_snapshots(&self) -> Result<Vec<SnapshotEntry>, GatherError> {
        let page: Page<serde_json::Value> = self
            .get_data(&snapshots_path(self.cluster_id))
            .map_err(GatherError::ControlPlane)?;
        let mut entries = Vec::with_capacity(page.contents.len());
        for raw in page.contents {
            match serde_json::from_value::<SnapshotEntry>(raw) {
                Ok(entry) => entries.push(entry),
                Err(err) => tracing::warn!(
                    cluster = %self.cluster_name,
                    error = %err,
                    "skipping malformed snapshot entry"
                ),
            }
        }
        tracing::debug!(cluster = %self.cluster_name, count = entries.len(), "fetched snapshot inventory");
        Ok(entries)
    }

    fn submit_report(&self, request: &ReportRequest) -> Result<SubmittedReport, GatherError> {
        let response = self
            .send(
                self.http
                    .post(self.url(&reports_path(self.cluster_id)))
                    .form(request),
            )
            .map_err(GatherError::SubmissionError)?;
        let envelope: Envelope<SubmittedReport> = response
            .json()
            .map_err(|err| GatherError::SubmissionError(format!("invalid submission response: {err}")))?;
        Ok(envelope.data)
    }

    fn task_status(&self, task_instance_id: i64) -> Result<TaskStatus, GatherError> {
        let task: TaskInstance = self
            .get_data(&task_path(task_instance_id))
            .map_err(GatherError::ControlPlane)?;
        Ok(TaskStatus::parse(&task.status))
    }

    fn list_reports(&self) -> Result<Vec<ReportEntry>, GatherError> {
        let page: Page<ReportEntry> = self
            .get_data(&reports_path(self.cluster_id))
            .map_err(GatherError::ControlPlane)?;
        Ok(page.contents)
    }

    fn fetch_report(&self, report_id: i64, dest: &mut dyn Write) -> Result<u64, GatherError> {
        let mut response = self
            .send(
                self.http
                    .get(self.url(&report_path(self.cluster_id, report_id))),
            )
            .map_err(GatherError::DownloadError)?;
        response
            .copy_to(dest)
            .map_err(|err| GatherError::DownloadError(err.to_string()))
    }
}
