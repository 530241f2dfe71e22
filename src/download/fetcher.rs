//! Resumable, retrying single-file fetcher.
//!
//! Each attempt probes the remote size with a HEAD request, compares it with
//! the bytes already on disk and appends the missing range. Failed attempts
//! are retried after a fixed delay, always re-reading the local size from
//! disk rather than trusting an in-memory offset.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{HeaderMap, ACCEPT, CONTENT_LENGTH, RANGE};
use reqwest::{Client, Response, StatusCode};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::time::{sleep, timeout};

use crate::config::{Config, SizePolicy};
use crate::download::cancel::CancelToken;
use crate::download::progress::ProgressReporter;
use crate::download::task::{
    DownloadTask, FailureReason, FetchPhase, TaskOutcome, TransferState,
};
use crate::error::{Error, Result};

/// Tunables for one fetcher.
#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// Bytes written per chunk.
    pub chunk_size: usize,
    /// Total attempts before a task fails.
    pub max_retries: u32,
    /// Fixed delay between attempts.
    pub retry_delay: Duration,
    /// Timeout for the HEAD size probe.
    pub probe_timeout: Duration,
    /// Timeout for the GET to start and for each body read.
    pub transfer_timeout: Duration,
    pub size_policy: SizePolicy,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            chunk_size: 1024 * 1024,
            max_retries: 5,
            retry_delay: Duration::from_secs(2),
            probe_timeout: Duration::from_secs(10),
            transfer_timeout: Duration::from_secs(30),
            size_policy: SizePolicy::Revalidate,
        }
    }
}

impl FetchSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            chunk_size: config.download.chunk_size.max(1),
            max_retries: config.download.max_retries.max(1),
            retry_delay: config.download.retry_delay(),
            probe_timeout: config.network.probe_timeout(),
            transfer_timeout: config.network.transfer_timeout(),
            size_policy: config.download.size_policy,
        }
    }
}

/// Something that can drive one task to a terminal outcome.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(
        &self,
        task: &DownloadTask,
        reporter: &dyn ProgressReporter,
        cancel: &CancelToken,
    ) -> TaskOutcome;
}

/// How a streamed transfer ended.
enum StreamEnd {
    /// The body was read to its end.
    Finished,
    /// The server reported nothing left after the local bytes.
    AlreadyComplete,
}

/// HTTP fetcher with byte-range resume.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    settings: FetchSettings,
}

#[async_trait]
impl Fetch for Fetcher {
    async fn fetch(
        &self,
        task: &DownloadTask,
        reporter: &dyn ProgressReporter,
        cancel: &CancelToken,
    ) -> TaskOutcome {
        self.fetch_task(task, reporter, cancel).await
    }
}

impl Fetcher {
    pub fn new(client: Client, settings: FetchSettings) -> Self {
        Self { client, settings }
    }

    /// Run one task through the transfer state machine.
    pub async fn fetch_task(
        &self,
        task: &DownloadTask,
        reporter: &dyn ProgressReporter,
        cancel: &CancelToken,
    ) -> TaskOutcome {
        let mut state = TransferState::new();

        loop {
            match state.phase() {
                FetchPhase::Probing => {
                    if cancel.is_cancelled() {
                        state.enter(FetchPhase::Failed);
                        return TaskOutcome::Failed(FailureReason::Cancelled);
                    }

                    match self.probe(task, cancel).await {
                        Ok(size) => {
                            if let Some(previous) =
                                state.record_probe(size, self.settings.size_policy)
                            {
                                tracing::warn!(
                                    "{}: remote size changed from {} to {} bytes (policy: {})",
                                    task.label,
                                    previous,
                                    size,
                                    self.settings.size_policy
                                );
                            }
                            state.enter(FetchPhase::Resuming);
                        }
                        Err(Error::Cancelled) => {
                            state.enter(FetchPhase::Failed);
                            return TaskOutcome::Failed(FailureReason::Cancelled);
                        }
                        Err(e) => {
                            if let Some(outcome) = self.attempt_failed(task, &mut state, e, reporter)
                            {
                                return outcome;
                            }
                        }
                    }
                }

                FetchPhase::Resuming => {
                    state.local_size = match local_size(&task.destination).await {
                        Ok(size) => size,
                        Err(e) => {
                            state.enter(FetchPhase::Failed);
                            return TaskOutcome::Failed(FailureReason::Setup(e.to_string()));
                        }
                    };

                    let expected = state.expected_size;
                    if expected != 0 && state.local_size == expected {
                        tracing::info!(
                            "{}: already complete ({} bytes), skipping",
                            task.label,
                            expected
                        );
                        state.enter(FetchPhase::Completed);
                        return TaskOutcome::Completed {
                            bytes_written: state.bytes_written,
                            already_present: state.bytes_written == 0,
                            attempts: state.attempt(),
                        };
                    }

                    if expected != 0 && state.local_size > expected {
                        state.enter(FetchPhase::Failed);
                        return TaskOutcome::Failed(FailureReason::LocalLarger {
                            local: state.local_size,
                            expected,
                        });
                    }

                    state.enter(FetchPhase::Streaming);
                }

                FetchPhase::Streaming => match self.stream(task, &mut state, reporter, cancel).await {
                    Ok(StreamEnd::AlreadyComplete) => {
                        tracing::info!(
                            "{}: server has no bytes past {}, treating as complete",
                            task.label,
                            state.local_size
                        );
                        state.enter(FetchPhase::Completed);
                        return TaskOutcome::Completed {
                            bytes_written: state.bytes_written,
                            already_present: state.bytes_written == 0,
                            attempts: state.attempt(),
                        };
                    }
                    Ok(StreamEnd::Finished) => {
                        let on_disk = local_size(&task.destination).await.unwrap_or(0);
                        if state.expected_size != 0 && on_disk != state.expected_size {
                            tracing::warn!(
                                "{}: transfer ended with {} bytes on disk, server announced {}",
                                task.label,
                                on_disk,
                                state.expected_size
                            );
                        }
                        tracing::info!("{}: download complete", task.label);
                        state.enter(FetchPhase::Completed);
                        return TaskOutcome::Completed {
                            bytes_written: state.bytes_written,
                            already_present: false,
                            attempts: state.attempt(),
                        };
                    }
                    Err(Error::Cancelled) => {
                        state.enter(FetchPhase::Failed);
                        return TaskOutcome::Failed(FailureReason::Cancelled);
                    }
                    Err(e) if e.is_transient() => {
                        if let Some(outcome) = self.attempt_failed(task, &mut state, e, reporter) {
                            return outcome;
                        }
                    }
                    Err(e) => {
                        state.enter(FetchPhase::Failed);
                        return TaskOutcome::Failed(FailureReason::Setup(e.to_string()));
                    }
                },

                FetchPhase::Retrying(_) => {
                    tokio::select! {
                        _ = sleep(self.settings.retry_delay) => state.enter(FetchPhase::Probing),
                        _ = cancel.cancelled() => {
                            state.enter(FetchPhase::Failed);
                            return TaskOutcome::Failed(FailureReason::Cancelled);
                        }
                    }
                }

                // Terminal phases always return from the arm that entered them.
                FetchPhase::Completed | FetchPhase::Failed => {
                    unreachable!("terminal phase {} reached the loop head", state.phase())
                }
            }
        }
    }

    /// Book a failed attempt. Returns the terminal outcome once attempts are exhausted.
    fn attempt_failed(
        &self,
        task: &DownloadTask,
        state: &mut TransferState,
        error: Error,
        reporter: &dyn ProgressReporter,
    ) -> Option<TaskOutcome> {
        let attempt = state.attempt();
        reporter.attempt_failed(task, attempt, &error);

        match state.register_failure(self.settings.max_retries) {
            FetchPhase::Failed => {
                tracing::error!(
                    "{}: giving up after {} attempts: {}",
                    task.label,
                    attempt,
                    error
                );
                Some(TaskOutcome::Failed(FailureReason::ExhaustedRetries {
                    attempts: attempt,
                    last_error: error.to_string(),
                }))
            }
            _ => {
                tracing::warn!(
                    "{}: attempt {}/{} failed: {}. Retrying in {:?}",
                    task.label,
                    attempt,
                    self.settings.max_retries,
                    error,
                    self.settings.retry_delay
                );
                None
            }
        }
    }

    /// HEAD the remote resource and return its declared length (0 if unknown).
    async fn probe(&self, task: &DownloadTask, cancel: &CancelToken) -> Result<u64> {
        tracing::debug!("HEAD {}", task.url);

        let request = self
            .client
            .head(&task.url)
            .header(ACCEPT, "*/*")
            .timeout(self.settings.probe_timeout)
            .send();

        let response = tokio::select! {
            response = request => response.map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout {
                        operation: "size probe",
                        after: self.settings.probe_timeout,
                    }
                } else {
                    Error::Http(e)
                }
            })?,
            _ = cancel.cancelled() => return Err(Error::Cancelled),
        };

        check_status(&response)?;
        Ok(declared_length(response.headers()))
    }

    /// Append the bytes after `state.local_size` to the destination.
    async fn stream(
        &self,
        task: &DownloadTask,
        state: &mut TransferState,
        reporter: &dyn ProgressReporter,
        cancel: &CancelToken,
    ) -> Result<StreamEnd> {
        if let Some(parent) = task.destination.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&task.destination)
            .await?;

        let mut offset = state.local_size;
        tracing::debug!("GET {} (Range: bytes={}-)", task.url, offset);

        let request = self
            .client
            .get(&task.url)
            .header(RANGE, format!("bytes={}-", offset))
            .send();

        let response = tokio::select! {
            response = timeout(self.settings.transfer_timeout, request) => match response {
                Ok(response) => response?,
                Err(_) => {
                    return Err(Error::Timeout {
                        operation: "transfer request",
                        after: self.settings.transfer_timeout,
                    })
                }
            },
            _ = cancel.cancelled() => return Err(Error::Cancelled),
        };

        // Unknown remote size and a range starting at the end of the file.
        if response.status() == StatusCode::RANGE_NOT_SATISFIABLE
            && offset > 0
            && state.expected_size == 0
        {
            return Ok(StreamEnd::AlreadyComplete);
        }

        check_status(&response)?;

        if offset > 0 && response.status() == StatusCode::OK {
            // The range was ignored and the full body follows.
            tracing::warn!(
                "{}: server ignored the range request, restarting from byte 0",
                task.label
            );
            file.set_len(0).await?;
            offset = 0;
            state.local_size = 0;
        }

        reporter.transfer_started(task, state.expected_size, offset);

        let chunk_size = self.settings.chunk_size;
        let mut buffer: Vec<u8> = Vec::with_capacity(chunk_size);
        let mut body = response.bytes_stream();

        let result = loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => break Err(Error::Cancelled),
                next = timeout(self.settings.transfer_timeout, body.next()) => next,
            };

            match next {
                Err(_) => {
                    break Err(Error::Timeout {
                        operation: "body read",
                        after: self.settings.transfer_timeout,
                    })
                }
                Ok(None) => break Ok(()),
                Ok(Some(Err(e))) => break Err(Error::Http(e)),
                Ok(Some(Ok(bytes))) => {
                    buffer.extend_from_slice(&bytes);
                    while buffer.len() >= chunk_size {
                        let rest = buffer.split_off(chunk_size);
                        write_chunk(&mut file, &buffer, task, state, reporter).await?;
                        buffer = rest;
                    }
                }
            }
        };

        // Bytes received before a failure are still a valid continuation.
        if !buffer.is_empty() {
            write_chunk(&mut file, &buffer, task, state, reporter).await?;
        }

        result.map(|()| StreamEnd::Finished)
    }
}

/// Append one chunk and flush it before the next one is requested.
async fn write_chunk(
    file: &mut File,
    chunk: &[u8],
    task: &DownloadTask,
    state: &mut TransferState,
    reporter: &dyn ProgressReporter,
) -> Result<()> {
    file.write_all(chunk).await?;
    file.flush().await?;

    let len = chunk.len() as u64;
    state.bytes_written += len;
    reporter.chunk_written(task, len);
    Ok(())
}

/// Size of the file at `path`, or 0 if it does not exist.
pub async fn local_size(path: &Path) -> Result<u64> {
    match fs::metadata(path).await {
        Ok(metadata) => Ok(metadata.len()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0),
        Err(e) => Err(Error::Io(e)),
    }
}

/// `Content-Length` from a response's headers; 0 when absent or unparsable.
///
/// Read from the header map because the body of a HEAD response is always
/// empty.
pub fn declared_length(headers: &HeaderMap) -> u64 {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(0)
}

fn check_status(response: &Response) -> Result<()> {
    let status = response.status();
    if status.is_success() || status.is_redirection() {
        Ok(())
    } else {
        Err(Error::HttpStatus {
            status,
            url: response.url().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_declared_length() {
        let mut headers = HeaderMap::new();
        assert_eq!(declared_length(&headers), 0);

        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("1048576"));
        assert_eq!(declared_length(&headers), 1_048_576);

        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("garbage"));
        assert_eq!(declared_length(&headers), 0);
    }

    #[tokio::test]
    async fn test_local_size_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(local_size(&dir.path().join("nope.mp4")).await.unwrap(), 0);

        let path = dir.path().join("partial.mp4");
        std::fs::write(&path, b"12345").unwrap();
        assert_eq!(local_size(&path).await.unwrap(), 5);
    }

    #[test]
    fn test_settings_from_config() {
        let mut config = Config::default();
        config.download.max_retries = 3;
        config.download.retry_delay_secs = 7;
        config.network.probe_timeout_secs = 4;

        let settings = FetchSettings::from_config(&config);
        assert_eq!(settings.max_retries, 3);
        assert_eq!(settings.retry_delay, Duration::from_secs(7));
        assert_eq!(settings.probe_timeout, Duration::from_secs(4));
        assert_eq!(settings.transfer_timeout, Duration::from_secs(30));
        assert_eq!(settings.chunk_size, 1024 * 1024);
    }
}
