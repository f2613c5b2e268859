//! Submit-then-poll for provider task APIs

use async_trait::async_trait;
use serde_json::Value;

use crate::error::LlmError;
use crate::polling::{PollOptions, poll_until_terminal};
use crate::types::TaskState;
use crate::utils::cancel::CancelHandle;

/// A provider API that runs jobs asynchronously.
#[async_trait]
pub trait TaskClient: Send + Sync {
    /// Start a job. The returned state carries the job id.
    async fn submit(&self, request: &Value) -> Result<TaskState, LlmError>;

    /// Fetch the current state of a job.
    async fn poll(&self, task_id: &str) -> Result<TaskState, LlmError>;
}

/// Poll an already-submitted job until it succeeds or fails.
pub async fn poll_task<C>(
    client: &C,
    task_id: &str,
    options: &PollOptions,
    cancel: &CancelHandle,
) -> Result<TaskState, LlmError>
where
    C: TaskClient + ?Sized,
{
    poll_until_terminal(move || client.poll(task_id), TaskState::is_terminal, options, cancel).await
}

/// Submit a job and poll it to a terminal state.
///
/// Running out of time or attempts is `LlmError::PollingTimedOut`, distinct from a
/// provider-reported `Failed` state.
pub async fn run_task<C>(
    client: &C,
    request: &Value,
    options: &PollOptions,
    cancel: &CancelHandle,
) -> Result<TaskState, LlmError>
where
    C: TaskClient + ?Sized,
{
    let submitted = cancel.run(client.submit(request)).await??;
    tracing::debug!(task_id = %submitted.id, status = %submitted.status, "task submitted");
    if submitted.is_terminal() {
        return Ok(submitted);
    }
    poll_task(client, &submitted.id, options, cancel).await
}

/// Like `run_task`, but a timeout is reported as a `Failed` state with a timeout reason.
pub async fn run_task_or_timeout<C>(
    client: &C,
    request: &Value,
    options: &PollOptions,
    cancel: &CancelHandle,
) -> Result<TaskState, LlmError>
where
    C: TaskClient + ?Sized,
{
    let submitted = cancel.run(client.submit(request)).await??;
    if submitted.is_terminal() {
        return Ok(submitted);
    }
    match poll_task(client, &submitted.id, options, cancel).await {
        Err(LlmError::PollingTimedOut { attempts, elapsed }) => {
            tracing::warn!(task_id = %submitted.id, attempts, elapsed = ?elapsed, "task polling timed out");
            Ok(TaskState::timed_out(submitted.id, attempts, elapsed))
        }
        other => other,
    }
}
