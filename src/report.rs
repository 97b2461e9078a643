//! Report generation and lookup on the control plane.

use crate::constants::REPORT_NAME_PREFIX;
use crate::error::GatherError;
use crate::ocp::task::{wait_done, PollPolicy};
use crate::ocp::{ControlPlane, ReportRequest, SubmittedReport};
use crate::runner::Deadline;
use crate::snapshots::SnapshotRange;
use crate::timeutil::filename_stamp;

pub fn report_name(cluster_name: &str, range: &SnapshotRange) -> String {
    format!(
        "{REPORT_NAME_PREFIX}_{cluster_name}_{}_{}",
        filename_stamp(range.start.snapshot_time),
        filename_stamp(range.end.snapshot_time)
    )
}

pub fn submit(
    control_plane: &dyn ControlPlane,
    cluster_name: &str,
    range: &SnapshotRange,
) -> Result<SubmittedReport, GatherError> {
    let request = ReportRequest {
        name: report_name(cluster_name, range),
        start_snapshot_id: range.start.snapshot_id,
        end_snapshot_id: range.end.snapshot_id,
    };
    tracing::info!(
        cluster = %cluster_name,
        report = %request.name,
        start_snapshot_id = request.start_snapshot_id,
        end_snapshot_id = request.end_snapshot_id,
        snapshots = range.count,
        "submitting AWR report generation"
    );
    let mut submitted = control_plane.submit_report(&request)?;
    if submitted.name.trim().is_empty() {
        submitted.name = request.name;
    }
    Ok(submitted)
}

/// Wait for the generation task and return the generated report name.
pub fn await_completion(
    control_plane: &dyn ControlPlane,
    submitted: &SubmittedReport,
    policy: &PollPolicy,
    deadline: &Deadline,
) -> Result<String, GatherError> {
    wait_done(control_plane, submitted.task_instance_id, policy, deadline)?;
    Ok(submitted.name.clone())
}

pub fn locate(control_plane: &dyn ControlPlane, report_name: &str) -> Result<i64, GatherError> {
    control_plane
        .list_reports()?
        .into_iter()
        .find(|entry| entry.name == report_name)
        .map(|entry| entry.id)
        .ok_or_else(|| GatherError::ReportNotFound(report_name.to_string()))
}
