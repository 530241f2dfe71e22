//! Bounded worker pool running a fetcher over a batch of tasks.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};

use crate::download::cancel::CancelToken;
use crate::download::fetcher::Fetch;
use crate::download::progress::ProgressReporter;
use crate::download::task::{DownloadTask, FailureReason, TaskOutcome, TaskReport};

/// Aggregate result of a batch.
#[derive(Debug, Default)]
pub struct Summary {
    pub completed: usize,
    pub failed: usize,
    /// Completed tasks whose file was already on disk.
    pub already_present: usize,
    pub bytes_written: u64,
    /// One report per submitted task, sorted by ordinal.
    pub reports: Vec<TaskReport>,
}

impl Summary {
    pub fn from_reports(mut reports: Vec<TaskReport>) -> Self {
        reports.sort_by_key(|report| report.task.ordinal);

        let mut summary = Summary::default();
        for report in &reports {
            match &report.outcome {
                TaskOutcome::Completed {
                    bytes_written,
                    already_present,
                    ..
                } => {
                    summary.completed += 1;
                    summary.bytes_written += bytes_written;
                    if *already_present {
                        summary.already_present += 1;
                    }
                }
                TaskOutcome::Failed(_) => summary.failed += 1,
            }
        }
        summary.reports = reports;
        summary
    }

    pub fn total(&self) -> usize {
        self.reports.len()
    }

    /// Reports of tasks that failed, in ordinal order.
    pub fn failures(&self) -> impl Iterator<Item = &TaskReport> {
        self.reports
            .iter()
            .filter(|report| !report.outcome.is_completed())
    }
}

/// Runs tasks on a fixed number of workers.
///
/// Tasks are queued on a bounded channel and pulled by `concurrency` workers,
/// so at most that many tasks are in flight at any time. A failed task never
/// stops the others; the scheduler itself never retries.
pub struct Scheduler<F> {
    fetcher: Arc<F>,
    concurrency: usize,
}

impl<F: Fetch + 'static> Scheduler<F> {
    pub fn new(fetcher: Arc<F>, concurrency: usize) -> Self {
        Self {
            fetcher,
            concurrency: concurrency.max(1),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Run every task to a terminal state and summarize.
    pub async fn run(
        &self,
        tasks: Vec<DownloadTask>,
        reporter: Arc<dyn ProgressReporter>,
        cancel: CancelToken,
    ) -> Summary {
        if tasks.is_empty() {
            return Summary::default();
        }

        let worker_count = self.concurrency.min(tasks.len());
        tracing::debug!(
            "Scheduling {} tasks on {} workers",
            tasks.len(),
            worker_count
        );

        let (task_sender, task_receiver) = mpsc::channel::<DownloadTask>(worker_count);
        let task_receiver = Arc::new(Mutex::new(task_receiver));
        let (result_sender, mut result_receiver) = mpsc::unbounded_channel::<TaskReport>();

        let mut workers = Vec::with_capacity(worker_count);
        for id in 0..worker_count {
            let fetcher = Arc::clone(&self.fetcher);
            let receiver = Arc::clone(&task_receiver);
            let results = result_sender.clone();
            let reporter = Arc::clone(&reporter);
            let cancel = cancel.clone();

            workers.push(tokio::spawn(async move {
                run_worker(id, fetcher, receiver, results, reporter, cancel).await;
            }));
        }
        // Only workers hold senders now; the result channel closes when they exit.
        drop(result_sender);

        for task in tasks {
            if task_sender.send(task).await.is_err() {
                break;
            }
        }
        drop(task_sender);

        let mut reports = Vec::new();
        while let Some(report) = result_receiver.recv().await {
            reports.push(report);
        }

        for worker in workers {
            if let Err(e) = worker.await {
                tracing::error!("Download worker stopped unexpectedly: {}", e);
            }
        }

        let summary = Summary::from_reports(reports);
        tracing::info!(
            "Batch finished: {} completed, {} failed",
            summary.completed,
            summary.failed
        );
        summary
    }
}

async fn run_worker<F: Fetch + 'static>(
    id: usize,
    fetcher: Arc<F>,
    receiver: Arc<Mutex<mpsc::Receiver<DownloadTask>>>,
    results: mpsc::UnboundedSender<TaskReport>,
    reporter: Arc<dyn ProgressReporter>,
    cancel: CancelToken,
) {
    loop {
        let next = receiver.lock().await.recv().await;
        let Some(task) = next else {
            break;
        };

        let outcome = if cancel.is_cancelled() {
            TaskOutcome::Failed(FailureReason::Cancelled)
        } else {
            tracing::debug!("Worker #{} picked up {}", id, task.label);
            fetch_isolated(&fetcher, &task, &reporter, &cancel).await
        };

        match &outcome {
            TaskOutcome::Failed(reason) => {
                tracing::error!("{} failed: {}", task.label, reason);
            }
            TaskOutcome::Completed { .. } => {}
        }

        reporter.task_finished(&task, &outcome);
        if results.send(TaskReport { task, outcome }).is_err() {
            break;
        }
    }
}

/// Run one fetch on its own tokio task so a panic only fails that task.
async fn fetch_isolated<F: Fetch + 'static>(
    fetcher: &Arc<F>,
    task: &DownloadTask,
    reporter: &Arc<dyn ProgressReporter>,
    cancel: &CancelToken,
) -> TaskOutcome {
    let fetcher = Arc::clone(fetcher);
    let owned_task = task.clone();
    let reporter = Arc::clone(reporter);
    let cancel = cancel.clone();

    let handle = tokio::spawn(async move {
        fetcher
            .fetch(&owned_task, reporter.as_ref(), &cancel)
            .await
    });

    match handle.await {
        Ok(outcome) => outcome,
        Err(e) => TaskOutcome::Failed(FailureReason::Setup(format!(
            "download worker panicked: {}",
            e
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::progress::NoProgress;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Fetcher that sleeps, tracks how many calls overlap and fails on demand.
    #[derive(Default)]
    struct ScriptedFetcher {
        active: AtomicUsize,
        peak: AtomicUsize,
        calls: AtomicUsize,
        failing: HashSet<String>,
        panicking: HashSet<String>,
    }

    #[async_trait]
    impl Fetch for ScriptedFetcher {
        async fn fetch(
            &self,
            task: &DownloadTask,
            _reporter: &dyn ProgressReporter,
            _cancel: &CancelToken,
        ) -> TaskOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            tokio::time::sleep(Duration::from_millis(15)).await;
            self.active.fetch_sub(1, Ordering::SeqCst);

            if self.panicking.contains(&task.url) {
                panic!("scripted panic for {}", task.url);
            }
            if self.failing.contains(&task.url) {
                TaskOutcome::Failed(FailureReason::ExhaustedRetries {
                    attempts: 3,
                    last_error: "HTTP 500".to_string(),
                })
            } else {
                TaskOutcome::Completed {
                    bytes_written: 10,
                    already_present: false,
                    attempts: 1,
                }
            }
        }
    }

    fn tasks(n: usize) -> Vec<DownloadTask> {
        (0..n)
            .map(|i| {
                DownloadTask::new(
                    format!("http://host/{}", i),
                    format!("/tmp/{}.mp4", i),
                    format!("video {}", i),
                    i,
                )
            })
            .collect()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_bound() {
        let fetcher = Arc::new(ScriptedFetcher::default());
        let scheduler = Scheduler::new(Arc::clone(&fetcher), 3);

        let summary = scheduler
            .run(tasks(20), Arc::new(NoProgress), CancelToken::new())
            .await;

        assert_eq!(summary.completed, 20);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 20);
        let peak = fetcher.peak.load(Ordering::SeqCst);
        assert!(peak <= 3, "peak concurrency was {}", peak);
        assert!(peak >= 2, "workers never overlapped");
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_batch() {
        let fetcher = Arc::new(ScriptedFetcher {
            failing: ["http://host/0".to_string(), "http://host/4".to_string()]
                .into_iter()
                .collect(),
            ..Default::default()
        });
        let scheduler = Scheduler::new(fetcher, 2);

        let summary = scheduler
            .run(tasks(6), Arc::new(NoProgress), CancelToken::new())
            .await;

        assert_eq!(summary.completed, 4);
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.total(), 6);
        let ordinals: Vec<usize> = summary.reports.iter().map(|r| r.task.ordinal).collect();
        assert_eq!(ordinals, vec![0, 1, 2, 3, 4, 5]);
        let failed: Vec<usize> = summary.failures().map(|r| r.task.ordinal).collect();
        assert_eq!(failed, vec![0, 4]);
    }

    #[tokio::test]
    async fn test_panicking_fetch_is_isolated() {
        let fetcher = Arc::new(ScriptedFetcher {
            panicking: ["http://host/1".to_string()].into_iter().collect(),
            ..Default::default()
        });
        let scheduler = Scheduler::new(fetcher, 2);

        let summary = scheduler
            .run(tasks(3), Arc::new(NoProgress), CancelToken::new())
            .await;

        assert_eq!(summary.completed, 2);
        assert_eq!(summary.failed, 1);
        assert!(matches!(
            summary.reports[1].outcome,
            TaskOutcome::Failed(FailureReason::Setup(_))
        ));
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let fetcher = Arc::new(ScriptedFetcher::default());
        let scheduler = Scheduler::new(Arc::clone(&fetcher), 2);
        let cancel = CancelToken::new();
        cancel.cancel();

        let summary = scheduler.run(tasks(4), Arc::new(NoProgress), cancel).await;

        assert_eq!(summary.failed, 4);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
        assert!(summary
            .reports
            .iter()
            .all(|r| r.outcome == TaskOutcome::Failed(FailureReason::Cancelled)));
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let scheduler = Scheduler::new(Arc::new(ScriptedFetcher::default()), 0);
        assert_eq!(scheduler.concurrency(), 1);

        let summary = scheduler
            .run(Vec::new(), Arc::new(NoProgress), CancelToken::new())
            .await;
        assert_eq!(summary.total(), 0);
    }
}
