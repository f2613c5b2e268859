//! Long-running task state.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a long-running provider job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Succeeded | TaskStatus::Failed)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::Running => write!(f, "running"),
            TaskStatus::Succeeded => write!(f, "succeeded"),
            TaskStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Snapshot of a job, created by a submit step and replaced by each poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskState {
    pub id: String,
    pub status: TaskStatus,
    /// Provider payload once the job succeeded (opaque to the poller).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl TaskState {
    pub fn new(id: impl Into<String>, status: TaskStatus) -> Self {
        Self {
            id: id.into(),
            status,
            result: None,
            failure_reason: None,
        }
    }

    pub fn pending(id: impl Into<String>) -> Self {
        Self::new(id, TaskStatus::Pending)
    }

    pub fn running(id: impl Into<String>) -> Self {
        Self::new(id, TaskStatus::Running)
    }

    pub fn succeeded(id: impl Into<String>, result: serde_json::Value) -> Self {
        Self {
            result: Some(result),
            ..Self::new(id, TaskStatus::Succeeded)
        }
    }

    pub fn failed(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            failure_reason: Some(reason.into()),
            ..Self::new(id, TaskStatus::Failed)
        }
    }

    /// `Failed` state standing in for a poller that gave up waiting.
    pub fn timed_out(id: impl Into<String>, attempts: u32, elapsed: std::time::Duration) -> Self {
        Self::failed(
            id,
            format!("polling timed out after {attempts} attempt(s) ({elapsed:?})"),
        )
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
