//! Download task model and per-task transfer state.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::SizePolicy;

/// One remote-file-to-local-path download unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    /// Fully resolved remote URL.
    pub url: String,
    /// Sanitized destination path, unique within a batch.
    pub destination: PathBuf,
    /// Human readable label used in logs and progress bars.
    pub label: String,
    /// Position in the original listing, for display ordering only.
    pub ordinal: usize,
}

impl DownloadTask {
    pub fn new(
        url: impl Into<String>,
        destination: impl Into<PathBuf>,
        label: impl Into<String>,
        ordinal: usize,
    ) -> Self {
        Self {
            url: url.into(),
            destination: destination.into(),
            label: label.into(),
            ordinal,
        }
    }
}

/// Phases of a single task's transfer.
///
/// ```text
/// Probing -> Resuming -> Streaming -> Completed
///    ^          |            |
///    |          v            v
///    +---- Retrying(n) <-----+        (n == max_retries -> Failed)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPhase {
    /// Asking the server for the total size.
    Probing,
    /// Comparing the local file with the remote size.
    Resuming,
    /// Appending the missing bytes.
    Streaming,
    /// Waiting out the delay after failed attempt `n`.
    Retrying(u32),
    Completed,
    Failed,
}

impl FetchPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, FetchPhase::Completed | FetchPhase::Failed)
    }

    /// Whether `next` is a legal successor of this phase.
    pub fn can_enter(&self, next: FetchPhase) -> bool {
        use FetchPhase::*;
        if self.is_terminal() {
            return false;
        }
        match (*self, next) {
            (Probing, Resuming) | (Probing, Retrying(_)) | (Probing, Failed) => true,
            (Resuming, Streaming) | (Resuming, Completed) | (Resuming, Failed) => true,
            (Streaming, Completed) | (Streaming, Retrying(_)) | (Streaming, Failed) => true,
            (Retrying(_), Probing) | (Retrying(_), Failed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for FetchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchPhase::Probing => write!(f, "probing"),
            FetchPhase::Resuming => write!(f, "resuming"),
            FetchPhase::Streaming => write!(f, "streaming"),
            FetchPhase::Retrying(n) => write!(f, "retrying ({})", n),
            FetchPhase::Completed => write!(f, "completed"),
            FetchPhase::Failed => write!(f, "failed"),
        }
    }
}

/// Why a task ended in the failed state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    #[error("gave up after {attempts} attempts: {last_error}")]
    ExhaustedRetries { attempts: u32, last_error: String },

    #[error("cannot write destination: {0}")]
    Setup(String),

    #[error("local file has {local} bytes but the server reports {expected}")]
    LocalLarger { local: u64, expected: u64 },

    #[error("cancelled")]
    Cancelled,
}

/// Terminal outcome of a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Completed {
        /// Bytes appended during this run.
        bytes_written: u64,
        /// The file was already complete; nothing was transferred.
        already_present: bool,
        attempts: u32,
    },
    Failed(FailureReason),
}

impl TaskOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, TaskOutcome::Completed { .. })
    }
}

/// A task paired with its terminal outcome.
#[derive(Debug, Clone)]
pub struct TaskReport {
    pub task: DownloadTask,
    pub outcome: TaskOutcome,
}

/// Mutable state of one task while it is being processed. Never persisted.
#[derive(Debug)]
pub struct TransferState {
    phase: FetchPhase,
    /// Completion target, in bytes. 0 means unknown.
    pub expected_size: u64,
    /// Bytes found on disk at the start of the current attempt.
    pub local_size: u64,
    /// Failed attempts so far.
    pub retries: u32,
    /// Bytes appended across all attempts.
    pub bytes_written: u64,
    first_probe: Option<u64>,
    last_probe: Option<u64>,
}

impl Default for TransferState {
    fn default() -> Self {
        Self::new()
    }
}

impl TransferState {
    pub fn new() -> Self {
        Self {
            phase: FetchPhase::Probing,
            expected_size: 0,
            local_size: 0,
            retries: 0,
            bytes_written: 0,
            first_probe: None,
            last_probe: None,
        }
    }

    pub fn phase(&self) -> FetchPhase {
        self.phase
    }

    /// Attempt currently running, starting at 1.
    pub fn attempt(&self) -> u32 {
        self.retries + 1
    }

    /// Move to `next`. Illegal transitions are a bug in the caller.
    pub fn enter(&mut self, next: FetchPhase) {
        debug_assert!(
            self.phase.can_enter(next),
            "illegal transition {} -> {}",
            self.phase,
            next
        );
        self.phase = next;
    }

    /// Record a size probe and update the completion target.
    ///
    /// Returns the previous probe when the server now reports a different
    /// size.
    pub fn record_probe(&mut self, size: u64, policy: SizePolicy) -> Option<u64> {
        let changed = self.last_probe.filter(|previous| *previous != size);
        self.last_probe = Some(size);

        if self.first_probe.is_none() && size > 0 {
            self.first_probe = Some(size);
        }

        self.expected_size = match policy {
            SizePolicy::Revalidate => size,
            SizePolicy::TrustFirst => self.first_probe.unwrap_or(size),
        };

        changed
    }

    /// Count a failed attempt. Returns the next phase: `Retrying(n)` while
    /// attempts remain, `Failed` once `max_retries` attempts have failed.
    pub fn register_failure(&mut self, max_retries: u32) -> FetchPhase {
        self.retries += 1;
        let next = if self.retries >= max_retries {
            FetchPhase::Failed
        } else {
            FetchPhase::Retrying(self.retries)
        };
        self.enter(next);
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        let mut state = TransferState::new();
        assert_eq!(state.phase(), FetchPhase::Probing);
        state.enter(FetchPhase::Resuming);
        state.enter(FetchPhase::Streaming);
        state.enter(FetchPhase::Completed);
        assert!(state.phase().is_terminal());
    }

    #[test]
    fn test_illegal_transitions() {
        assert!(!FetchPhase::Probing.can_enter(FetchPhase::Streaming));
        assert!(!FetchPhase::Completed.can_enter(FetchPhase::Probing));
        assert!(!FetchPhase::Failed.can_enter(FetchPhase::Retrying(1)));
        assert!(!FetchPhase::Completed.can_enter(FetchPhase::Failed));
        assert!(!FetchPhase::Retrying(1).can_enter(FetchPhase::Streaming));
    }

    #[test]
    fn test_register_failure_bound() {
        let mut state = TransferState::new();
        assert_eq!(state.register_failure(3), FetchPhase::Retrying(1));
        state.enter(FetchPhase::Probing);
        assert_eq!(state.attempt(), 2);
        assert_eq!(state.register_failure(3), FetchPhase::Retrying(2));
        state.enter(FetchPhase::Probing);
        assert_eq!(state.register_failure(3), FetchPhase::Failed);
        assert_eq!(state.retries, 3);
    }

    #[test]
    fn test_single_attempt_fails_immediately() {
        let mut state = TransferState::new();
        assert_eq!(state.register_failure(1), FetchPhase::Failed);
    }

    #[test]
    fn test_record_probe_revalidate() {
        let mut state = TransferState::new();
        assert_eq!(state.record_probe(100, SizePolicy::Revalidate), None);
        assert_eq!(state.expected_size, 100);
        assert_eq!(state.record_probe(100, SizePolicy::Revalidate), None);
        assert_eq!(state.record_probe(120, SizePolicy::Revalidate), Some(100));
        assert_eq!(state.expected_size, 120);
    }

    #[test]
    fn test_record_probe_trust_first() {
        let mut state = TransferState::new();
        state.record_probe(0, SizePolicy::TrustFirst);
        assert_eq!(state.expected_size, 0);
        state.record_probe(100, SizePolicy::TrustFirst);
        assert_eq!(state.expected_size, 100);
        assert_eq!(state.record_probe(150, SizePolicy::TrustFirst), Some(100));
        assert_eq!(state.expected_size, 100);
    }

    #[test]
    fn test_failure_reason_messages() {
        let reason = FailureReason::ExhaustedRetries {
            attempts: 3,
            last_error: "HTTP 500".to_string(),
        };
        assert_eq!(reason.to_string(), "gave up after 3 attempts: HTTP 500");
        assert_eq!(FailureReason::Cancelled.to_string(), "cancelled");
    }
}
