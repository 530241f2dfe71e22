//! Progress bar utilities.

use std::collections::HashMap;
use std::sync::Mutex;

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::download::{DownloadTask, ProgressReporter, TaskOutcome};
use crate::error::Error;

/// Longest label shown next to a bar, in characters.
const LABEL_WIDTH: usize = 32;

/// Create a spinner for long-running operations.
pub fn create_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));
    spinner
}

/// Create a progress bar for downloads.
pub fn create_download_bar(total: u64) -> ProgressBar {
    let bar = ProgressBar::new(total);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} {msg:32} [{bar:30.cyan/blue}] {bytes}/{total_bytes} ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    bar
}

/// Create a byte counter for downloads of unknown size.
pub fn create_unsized_bar() -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg:32} {bytes} ({bytes_per_sec})")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar
}

/// Create a progress bar for item counts.
pub fn create_item_bar(total: u64, message: &str) -> ProgressBar {
    let bar = ProgressBar::new(total);
    bar.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} {} [{{bar:40.cyan/blue}}] {{pos}}/{{len}}",
                message
            ))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    bar
}

/// Terminal progress display: one byte bar per active transfer plus an
/// overall counter of finished tasks.
pub struct ConsoleProgress {
    multi: MultiProgress,
    overall: ProgressBar,
    bars: Mutex<HashMap<usize, ProgressBar>>,
}

impl ConsoleProgress {
    /// `enabled = false` keeps the bookkeeping but draws nothing.
    pub fn new(total_tasks: u64, enabled: bool) -> Self {
        let multi = if enabled {
            MultiProgress::new()
        } else {
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
        };
        let overall = multi.add(create_item_bar(total_tasks, "Videos"));

        Self {
            multi,
            overall,
            bars: Mutex::new(HashMap::new()),
        }
    }

    /// Clear the display once the batch is over.
    pub fn finish(&self) {
        if let Ok(mut bars) = self.bars.lock() {
            for (_, bar) in bars.drain() {
                bar.finish_and_clear();
            }
        }
        self.overall.finish_and_clear();
    }

    fn with_bar(&self, task: &DownloadTask, f: impl FnOnce(&ProgressBar)) {
        if let Ok(bars) = self.bars.lock() {
            if let Some(bar) = bars.get(&task.ordinal) {
                f(bar);
            }
        }
    }
}

fn short_label(label: &str) -> String {
    if label.chars().count() <= LABEL_WIDTH {
        label.to_string()
    } else {
        let mut short: String = label.chars().take(LABEL_WIDTH - 1).collect();
        short.push('…');
        short
    }
}

impl ProgressReporter for ConsoleProgress {
    fn transfer_started(&self, task: &DownloadTask, expected_size: u64, offset: u64) {
        let bar = if expected_size > 0 {
            create_download_bar(expected_size)
        } else {
            create_unsized_bar()
        };
        bar.set_message(short_label(&task.label));
        bar.set_position(offset);

        if let Ok(mut bars) = self.bars.lock() {
            // A retry replaces the bar of the previous attempt.
            if let Some(previous) = bars.remove(&task.ordinal) {
                previous.finish_and_clear();
                self.multi.remove(&previous);
            }
            let bar = self.multi.insert_before(&self.overall, bar);
            bars.insert(task.ordinal, bar);
        }
    }

    fn chunk_written(&self, task: &DownloadTask, bytes: u64) {
        self.with_bar(task, |bar| bar.inc(bytes));
    }

    fn attempt_failed(&self, task: &DownloadTask, attempt: u32, _error: &Error) {
        self.with_bar(task, |bar| {
            bar.set_message(format!("{} (retry {})", short_label(&task.label), attempt))
        });
    }

    fn task_finished(&self, task: &DownloadTask, _outcome: &TaskOutcome) {
        if let Ok(mut bars) = self.bars.lock() {
            if let Some(bar) = bars.remove(&task.ordinal) {
                bar.finish_and_clear();
                self.multi.remove(&bar);
            }
        }
        self.overall.inc(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::FailureReason;

    #[test]
    fn test_short_label() {
        assert_eq!(short_label("short"), "short");
        let long = "x".repeat(100);
        let short = short_label(&long);
        assert_eq!(short.chars().count(), LABEL_WIDTH);
        assert!(short.ends_with('…'));
    }

    #[test]
    fn test_console_progress_bookkeeping() {
        let progress = ConsoleProgress::new(2, false);
        let task = DownloadTask::new("http://h/a", "/tmp/a.mp4", "a", 0);

        progress.transfer_started(&task, 100, 40);
        progress.chunk_written(&task, 10);
        progress.with_bar(&task, |bar| assert_eq!(bar.position(), 50));

        // A retry resets the bar to the new offset.
        progress.transfer_started(&task, 100, 50);
        progress.with_bar(&task, |bar| assert_eq!(bar.position(), 50));

        progress.task_finished(&task, &TaskOutcome::Failed(FailureReason::Cancelled));
        assert!(progress.bars.lock().unwrap().is_empty());
        assert_eq!(progress.overall.position(), 1);
        progress.finish();
    }
}
