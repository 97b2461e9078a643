//! Polling of asynchronous control-plane tasks.

use std::time::{Duration, Instant};

use super::{ControlPlane, TaskStatus};
use crate::error::GatherError;
use crate::runner::{Deadline, Stage};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_interval: Duration,
    pub backoff_factor: f64,
    /// Ceiling for a single task, independent of the target deadline.
    pub timeout: Duration,
}

impl PollPolicy {
    pub fn next_interval(&self, current: Duration) -> Duration {
        Duration::try_from_secs_f64(current.as_secs_f64() * self.backoff_factor.max(1.0))
            .unwrap_or(self.max_interval)
            .min(self.max_interval)
    }
}

/// Block until the task reaches a terminal state, the policy timeout elapses,
/// or the target deadline passes.
pub fn wait_done(
    control_plane: &dyn ControlPlane,
    task_instance_id: i64,
    policy: &PollPolicy,
    deadline: &Deadline,
) -> Result<(), GatherError> {
    let started = Instant::now();
    let give_up_at = deadline.earliest(started, policy.timeout);
    let mut interval = policy.interval;
    let mut polls: u64 = 0;
    loop {
        polls += 1;
        match control_plane.task_status(task_instance_id) {
            Ok(TaskStatus::Successful) => {
                tracing::debug!(task_instance_id, polls, "report task finished");
                return Ok(());
            }
            Ok(TaskStatus::Failed) => {
                return Err(GatherError::TaskFailed {
                    task_instance_id,
                    status: TaskStatus::Failed.to_string(),
                });
            }
            Ok(status) => {
                tracing::debug!(task_instance_id, status = %status, "report task still running");
            }
            Err(err) => {
                tracing::warn!(task_instance_id, error = %err, "task status poll failed, retrying");
            }
        }

        let now = Instant::now();
        if now >= give_up_at {
            return Err(GatherError::Timeout {
                stage: Stage::AwaitingTask,
                after: started.elapsed(),
            });
        }
        std::thread::sleep(interval.min(give_up_at - now));
        interval = policy.next_interval(interval);
    }
}
