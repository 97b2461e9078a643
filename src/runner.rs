//! Per-target gather pipeline and the worker pool that runs one pipeline per
//! target.
//!
//! Each target walks `Idle -> GeneratingReport -> AwaitingTask ->
//! LocatingReport -> Downloading` and ends in exactly one
//! [`GatheredArtifact`], successful or not. Target-scoped errors stop at this
//! boundary.

use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use crate::download::{download_report, DownloadedReport};
use crate::error::GatherError;
use crate::ocp::task::PollPolicy;
use crate::ocp::{ControlPlane, Target};
use crate::report;
use crate::session::GatherSession;
use crate::snapshots::select_report_range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    GeneratingReport,
    AwaitingTask,
    LocatingReport,
    Downloading,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "selecting snapshots",
            Self::GeneratingReport => "submitting report generation",
            Self::AwaitingTask => "awaiting report task",
            Self::LocatingReport => "locating report",
            Self::Downloading => "downloading report",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    at: Instant,
}

impl Deadline {
    pub fn after(timeout: Duration) -> Self {
        let started = Instant::now();
        Self {
            started,
            at: far_instant(started, timeout),
        }
    }

    pub fn expired(&self) -> bool {
        Instant::now() >= self.at
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// The earlier of this deadline and `from + timeout`.
    pub fn earliest(&self, from: Instant, timeout: Duration) -> Instant {
        far_instant(from, timeout).min(self.at)
    }
}

fn far_instant(from: Instant, timeout: Duration) -> Instant {
    // Instant arithmetic panics on overflow; clamp absurd timeouts to a century.
    const CENTURY: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);
    from.checked_add(timeout.min(CENTURY)).unwrap_or(from)
}

#[derive(Debug, Clone, Copy)]
pub struct RunSettings {
    pub poll: PollPolicy,
    pub target_timeout: Duration,
}

/// Outcome of one target. Built once, when the target reaches a terminal state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatheredArtifact {
    pub cluster_name: String,
    pub is_error: bool,
    pub error_message: String,
    pub size_bytes: u64,
    pub elapsed_seconds: u64,
    pub local_path: Option<PathBuf>,
}

impl GatheredArtifact {
    pub fn completed(cluster_name: &str, report: DownloadedReport, elapsed: Duration) -> Self {
        Self {
            cluster_name: cluster_name.to_string(),
            is_error: false,
            error_message: String::new(),
            size_bytes: report.size_bytes,
            elapsed_seconds: elapsed.as_secs(),
            local_path: Some(report.path),
        }
    }

    pub fn failed(cluster_name: &str, error: &GatherError, elapsed: Duration) -> Self {
        Self {
            cluster_name: cluster_name.to_string(),
            is_error: true,
            error_message: error.to_string(),
            size_bytes: 0,
            elapsed_seconds: elapsed.as_secs(),
            local_path: None,
        }
    }
}

fn advance(
    cluster_name: &str,
    from: Stage,
    to: Stage,
    deadline: &Deadline,
) -> Result<Stage, GatherError> {
    if deadline.expired() {
        return Err(GatherError::Timeout {
            stage: from,
            after: deadline.elapsed(),
        });
    }
    tracing::debug!(cluster = %cluster_name, from = %from, to = %to, "state transition");
    Ok(to)
}

fn execute(
    cluster_name: &str,
    control_plane: &dyn ControlPlane,
    session: &GatherSession,
    settings: &RunSettings,
    deadline: &Deadline,
) -> Result<DownloadedReport, GatherError> {
    let stage = Stage::Idle;
    let range = select_report_range(control_plane, cluster_name, &session.window)?;

    let stage = advance(cluster_name, stage, Stage::GeneratingReport, deadline)?;
    let submitted = report::submit(control_plane, cluster_name, &range)?;
    tracing::info!(
        cluster = %cluster_name,
        task_instance_id = submitted.task_instance_id,
        "report generation accepted"
    );

    let stage = advance(cluster_name, stage, Stage::AwaitingTask, deadline)?;
    let report_name = report::await_completion(control_plane, &submitted, &settings.poll, deadline)?;

    let stage = advance(cluster_name, stage, Stage::LocatingReport, deadline)?;
    let report_id = report::locate(control_plane, &report_name)?;

    advance(cluster_name, stage, Stage::Downloading, deadline)?;
    download_report(control_plane, &session.pack_dir, &report_name, report_id)
}

/// Run the full pipeline for one target. Never fails; errors become an error
/// artifact.
pub fn run_target(
    cluster_name: &str,
    control_plane: &dyn ControlPlane,
    session: &GatherSession,
    settings: &RunSettings,
) -> GatheredArtifact {
    let deadline = Deadline::after(settings.target_timeout);
    run_target_until(cluster_name, control_plane, session, settings, &deadline)
}

/// Like [`run_target`], against a deadline that may already be running.
pub fn run_target_until(
    cluster_name: &str,
    control_plane: &dyn ControlPlane,
    session: &GatherSession,
    settings: &RunSettings,
    deadline: &Deadline,
) -> GatheredArtifact {
    match execute(cluster_name, control_plane, session, settings, deadline) {
        Ok(report) => {
            tracing::info!(
                cluster = %cluster_name,
                path = %report.path.display(),
                size_bytes = report.size_bytes,
                "AWR report gathered"
            );
            GatheredArtifact::completed(cluster_name, report, deadline.elapsed())
        }
        Err(err) => {
            tracing::warn!(cluster = %cluster_name, error = %err, "AWR gather failed");
            GatheredArtifact::failed(cluster_name, &err, deadline.elapsed())
        }
    }
}

/// Run every target on its own worker thread and wait for all of them.
///
/// `connect` builds the control-plane handle for a target; a connect failure
/// is recorded like any other target error, and connecting counts against the
/// target timeout. Results are ordered by cluster
/// name.
pub fn run_all<C, F>(
    targets: &[Target],
    connect: F,
    session: &GatherSession,
    settings: &RunSettings,
) -> Vec<GatheredArtifact>
where
    C: ControlPlane,
    F: Fn(&Target) -> Result<C, GatherError> + Sync,
{
    let (tx, rx) = mpsc::channel::<GatheredArtifact>();
    let mut artifacts = Vec::with_capacity(targets.len());

    thread::scope(|scope| {
        let mut workers = Vec::with_capacity(targets.len());
        for target in targets {
            let tx = tx.clone();
            let connect = &connect;
            let spawned = thread::Builder::new()
                .name(format!("awr-{}", target.cluster_name))
                .spawn_scoped(scope, move || {
                    let deadline = Deadline::after(settings.target_timeout);
                    let artifact = match connect(target) {
                        Ok(control_plane) => run_target_until(
                            &target.cluster_name,
                            &control_plane,
                            session,
                            settings,
                            &deadline,
                        ),
                        Err(err) => {
                            tracing::warn!(cluster = %target.cluster_name, error = %err, "failed to reach control plane");
                            GatheredArtifact::failed(&target.cluster_name, &err, deadline.elapsed())
                        }
                    };
                    let _ = tx.send(artifact);
                });
            match spawned {
                Ok(handle) => workers.push((target, handle)),
                Err(err) => artifacts.push(GatheredArtifact::failed(
                    &target.cluster_name,
                    &GatherError::Io(err),
                    Duration::ZERO,
                )),
            }
        }
        for (target, handle) in workers {
            if handle.join().is_err() {
                tracing::error!(cluster = %target.cluster_name, "gather worker panicked");
                artifacts.push(GatheredArtifact::failed(
                    &target.cluster_name,
                    &GatherError::ControlPlane("gather worker panicked".to_string()),
                    Duration::ZERO,
                ));
            }
        }
    });
    drop(tx);

    artifacts.extend(rx.iter());
    artifacts.sort_by(|a, b| a.cluster_name.cmp(&b.cluster_name));
    artifacts
}
