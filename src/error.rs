//! Error taxonomy for a gather run.
//!
//! `WindowError` aborts the whole session before any network call.
//! `GatherError` is scoped to one target and ends up as an error row in the
//! summary; it never escapes the per-target runner.

use std::time::Duration;

use crate::runner::Stage;

pub mod codes {
    pub const SUCCESS: u8 = 0;
    pub const CONFIG_ERROR: u8 = 1;
    pub const TIME_WINDOW_ERROR: u8 = 2;
}

#[derive(Debug, thiserror::Error)]
pub enum WindowError {
    #[error(
        "datetime is invalid, must be in format yyyy-mm-dd hh:mm:ss (from={from}, to={to})"
    )]
    InvalidTimeFormat { from: String, to: String },

    #[error("from datetime {from} is not earlier than to datetime {to}")]
    InvalidTimeRange { from: String, to: String },

    #[error("no time window given, pass --since or both --from and --to")]
    MissingTimeSpec,

    #[error("invalid --since value {0:?}, expected <n><m|h|d>")]
    InvalidSince(String),
}

#[derive(Debug, thiserror::Error)]
pub enum GatherError {
    #[error("AWR report needs at least 2 snapshots in the window, found {found}")]
    InsufficientSnapshots { found: usize },

    #[error("report generation request rejected: {0}")]
    SubmissionError(String),

    #[error("report task {task_instance_id} ended with status {status}")]
    TaskFailed { task_instance_id: i64, status: String },

    #[error("report {0} not found in the report inventory")]
    ReportNotFound(String),

    #[error("report download failed: {0}")]
    DownloadError(String),

    #[error("timed out after {}s while {stage}", .after.as_secs())]
    Timeout { stage: Stage, after: Duration },

    #[error("control plane request failed: {0}")]
    ControlPlane(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Map a session-fatal error to its process exit code.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    if err.downcast_ref::<WindowError>().is_some() {
        codes::TIME_WINDOW_ERROR
    } else {
        codes::CONFIG_ERROR
    }
}
