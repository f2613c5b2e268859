//! Long-running Task Polling
//!
//! One shared combinator (`poll_until_terminal`) for every "accepted, check back
//! later" integration, plus a `TaskClient` seam that pairs a submit call with it.

mod options;
mod poller;
mod task;

pub use options::PollOptions;
pub use poller::poll_until_terminal;
pub use task::{TaskClient, poll_task, run_task, run_task_or_timeout};
