//! Progress reporting interface.

use crate::download::task::{DownloadTask, TaskOutcome};
use crate::error::Error;

/// Receives progress events from the fetcher and the scheduler.
///
/// Events for different tasks may arrive concurrently from different worker
/// threads, so implementations must only need `&self`. All methods default to
/// doing nothing.
pub trait ProgressReporter: Send + Sync {
    /// A streamed transfer is about to start. `offset` bytes are already on disk.
    fn transfer_started(&self, _task: &DownloadTask, _expected_size: u64, _offset: u64) {}

    /// A chunk of `bytes` was appended to the destination.
    fn chunk_written(&self, _task: &DownloadTask, _bytes: u64) {}

    /// Attempt number `attempt` failed with a transient error.
    fn attempt_failed(&self, _task: &DownloadTask, _attempt: u32, _error: &Error) {}

    /// The task reached a terminal state. Emitted once per task by the scheduler.
    fn task_finished(&self, _task: &DownloadTask, _outcome: &TaskOutcome) {}
}

/// Reporter that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {}
