//! Poll-until-terminal combinator

use std::future::Future;

use tokio::time::Instant;

use crate::error::LlmError;
use crate::polling::PollOptions;
use crate::utils::cancel::CancelHandle;

/// Repeatedly invoke `poll` until `is_terminal` accepts its result.
///
/// - The first poll happens immediately; later polls are `options.interval` apart.
/// - `LlmError::PollingTimedOut` once `options.timeout` has elapsed since the first
///   poll or `options.max_attempts` polls have been made. The last wait is clamped to
///   the remaining time so the deadline is never overshot.
/// - `LlmError::Cancelled` as soon as `cancel` fires, whether during the wait or
///   during an in-flight poll.
/// - An error returned by `poll` is propagated immediately and not retried.
pub async fn poll_until_terminal<T, F, Fut, P>(
    mut poll: F,
    is_terminal: P,
    options: &PollOptions,
    cancel: &CancelHandle,
) -> Result<T, LlmError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LlmError>>,
    P: Fn(&T) -> bool,
{
    options.validate()?;

    let started = Instant::now();
    let mut attempts: u32 = 0;

    loop {
        if cancel.is_cancelled() {
            return Err(LlmError::Cancelled);
        }

        attempts += 1;
        let outcome = cancel.run(poll()).await??;
        if is_terminal(&outcome) {
            tracing::debug!(attempts, elapsed = ?started.elapsed(), "task reached terminal state");
            return Ok(outcome);
        }

        let timed_out = |attempts: u32| LlmError::PollingTimedOut {
            attempts,
            elapsed: started.elapsed(),
        };

        if options.max_attempts.is_some_and(|max| attempts >= max) {
            tracing::debug!(attempts, "poll attempts exhausted");
            return Err(timed_out(attempts));
        }

        let wait = match options.timeout {
            Some(timeout) => {
                let remaining = timeout.saturating_sub(started.elapsed());
                if remaining.is_zero() {
                    return Err(timed_out(attempts));
                }
                options.interval.min(remaining)
            }
            None => options.interval,
        };

        tracing::debug!(attempts, wait = ?wait, "task not terminal; waiting");
        cancel.run(tokio::time::sleep(wait)).await?;

        if options
            .timeout
            .is_some_and(|timeout| started.elapsed() >= timeout)
        {
            tracing::debug!(attempts, "poll timeout elapsed");
            return Err(timed_out(attempts));
        }
    }
}
