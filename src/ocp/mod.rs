//! The cluster-management control plane, seen from one target cluster.

mod api;
pub mod client;
pub mod task;

use std::io::Write;

use crate::error::GatherError;

pub use api::{ReportEntry, ReportRequest, SnapshotEntry, SubmittedReport, TaskStatus};
pub use client::OcpClient;

#[derive(Clone)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"REDACTED")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Target {
    pub cluster_name: String,
    pub cluster_id: i64,
    pub base_url: String,
    pub credentials: Credentials,
}

/// Workload-report operations the gather pipeline needs, bound to a single
/// cluster.
pub trait ControlPlane: Send + Sync {
    fn list_snapshots(&self) -> Result<Vec<SnapshotEntry>, GatherError>;

    fn submit_report(&self, request: &ReportRequest) -> Result<SubmittedReport, GatherError>;

    fn task_status(&self, task_instance_id: i64) -> Result<TaskStatus, GatherError>;

    fn list_reports(&self) -> Result<Vec<ReportEntry>, GatherError>;

    /// Stream the report body into `dest`, returning the number of bytes written.
    fn fetch_report(&self, report_id: i64, dest: &mut dyn Write) -> Result<u64, GatherError>;
}
