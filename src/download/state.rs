//! Download statistics per creator and across the whole run.

use std::path::PathBuf;

use crate::download::scheduler::Summary;

/// Per-creator download state.
#[derive(Debug, Default)]
pub struct DownloadState {
    // Creator info
    pub creator_name: Option<String>,
    pub service: Option<String>,

    // Paths
    pub base_path: Option<PathBuf>,

    // Listing statistics
    pub posts_found: u64,
    pub videos_found: u64,
    pub images_skipped: u64,
    pub posts_without_media: u64,

    // Transfer statistics
    pub completed: u64,
    pub already_present: u64,
    pub failed: u64,
    pub bytes_written: u64,
}

impl DownloadState {
    /// Create a new download state for a creator.
    pub fn new(creator_name: String, service: String) -> Self {
        Self {
            creator_name: Some(creator_name),
            service: Some(service),
            ..Default::default()
        }
    }

    /// Fold a finished batch into the creator's counters.
    pub fn add_summary(&mut self, summary: &Summary) {
        self.completed += summary.completed as u64;
        self.already_present += summary.already_present as u64;
        self.failed += summary.failed as u64;
        self.bytes_written += summary.bytes_written;
    }

    /// Files fetched during this run (excludes already complete ones).
    pub fn total_downloaded(&self) -> u64 {
        self.completed - self.already_present
    }
}

/// Global statistics across all creators.
#[derive(Debug, Default)]
pub struct GlobalState {
    pub completed: u64,
    pub already_present: u64,
    pub failed: u64,
    pub images_skipped: u64,
    pub bytes_written: u64,
    pub creators_processed: u64,
    pub creators_failed: u64,
}

impl GlobalState {
    /// Add statistics from a creator's download state.
    pub fn add_creator_stats(&mut self, state: &DownloadState) {
        self.completed += state.completed;
        self.already_present += state.already_present;
        self.failed += state.failed;
        self.images_skipped += state.images_skipped;
        self.bytes_written += state.bytes_written;
        self.creators_processed += 1;
    }

    /// Mark a creator as failed.
    pub fn mark_creator_failed(&mut self) {
        self.creators_failed += 1;
    }

    /// Get total downloaded count.
    pub fn total_downloaded(&self) -> u64 {
        self.completed - self.already_present
    }
}
