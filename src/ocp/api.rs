use serde::{Deserialize, Serialize};

use crate::constants::{CLUSTER_API_ROOT, TASK_API_ROOT};

#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub data: T,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Page<T> {
    #[serde(default = "Vec::new")]
    pub contents: Vec<T>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotEntry {
    pub snapshot_id: i64,
    pub snapshot_time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    pub name: String,
    pub start_snapshot_id: i64,
    pub end_snapshot_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedReport {
    pub task_instance_id: i64,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TaskInstance {
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Running,
    Successful,
    Failed,
    Other(String),
}

impl TaskStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "RUNNING" => Self::Running,
            "SUCCESSFUL" => Self::Successful,
            "FAILED" => Self::Failed,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Running => "RUNNING",
            Self::Successful => "SUCCESSFUL",
            Self::Failed => "FAILED",
            Self::Other(raw) => raw,
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub(crate) fn snapshots_path(cluster_id: i64) -> String {
    format!("{CLUSTER_API_ROOT}/{cluster_id}/performance/workload/snapshots")
}

pub(crate) fn reports_path(cluster_id: i64) -> String {
    format!("{CLUSTER_API_ROOT}/{cluster_id}/performance/workload/reports")
}

pub(crate) fn report_path(cluster_id: i64, report_id: i64) -> String {
    format!("{}/{report_id}", reports_path(cluster_id))
}

pub(crate) fn task_path(task_instance_id: i64) -> String {
    format!("{TASK_API_ROOT}/{task_instance_id}")
}
