//! Coomer Downloader - resumable concurrent video downloads for coomer creators.
//!
//! This library lists a creator's posts, turns every video attachment into a
//! download task and runs the tasks through a bounded pool of workers.
//!
//! # Features
//!
//! - Paginated post listing with polite delays between pages
//! - Resume of partial files through HTTP range requests
//! - Bounded retries per file, isolated failures per batch
//! - Parallel transfers with a configurable worker count
//! - Cooperative cancellation
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use coomer_downloader::{
//!     api::build_http_client, CancelToken, Config, DownloadTask, FetchSettings, Fetcher,
//!     NoProgress, Scheduler,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let client = build_http_client(&config.network)?;
//!     let fetcher = Fetcher::new(client, FetchSettings::from_config(&config));
//!     let scheduler = Scheduler::new(Arc::new(fetcher), 2);
//!
//!     let tasks = vec![DownloadTask::new(
//!         "https://example.com/a.mp4",
//!         "Download/a.mp4",
//!         "a",
//!         0,
//!     )];
//!     let summary = scheduler
//!         .run(tasks, Arc::new(NoProgress), CancelToken::new())
//!         .await;
//!     println!("{} completed, {} failed", summary.completed, summary.failed);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod fs;
pub mod media;
pub mod output;

// Re-exports for convenience
pub use api::{CoomerApi, Creator};
pub use config::{Config, SizePolicy};
pub use download::{
    CancelToken, DownloadState, DownloadTask, FailureReason, Fetch, FetchSettings, Fetcher,
    GlobalState, NoProgress, ProgressReporter, Scheduler, Summary, TaskOutcome,
};
pub use error::{Error, Result};
pub use media::VideoPost;
