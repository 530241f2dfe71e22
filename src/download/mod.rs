//! Download engine.
//!
//! This module provides:
//! - Download task and transfer state model
//! - Resumable, retrying single-file fetcher
//! - Bounded worker pool scheduler
//! - Progress reporting and cancellation hooks
//! - Download statistics

pub mod cancel;
pub mod fetcher;
pub mod progress;
pub mod scheduler;
pub mod state;
pub mod task;

pub use cancel::CancelToken;
pub use fetcher::{Fetch, FetchSettings, Fetcher};
pub use progress::{NoProgress, ProgressReporter};
pub use scheduler::{Scheduler, Summary};
pub use state::{DownloadState, GlobalState};
pub use task::{DownloadTask, FailureReason, FetchPhase, TaskOutcome, TaskReport, TransferState};
