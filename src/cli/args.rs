//! Command-line argument definitions using clap.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::config::{Config, SizePolicy};

/// Coomer video downloader CLI.
#[derive(Parser, Debug)]
#[command(
    name = "coomer-downloader",
    version,
    about = "Download videos from coomer creators",
    long_about = "A CLI tool to download every video posted by a coomer creator.\n\n\
                  Downloads resume where they stopped, failed transfers are retried, \
                  and several files are fetched in parallel."
)]
pub struct Args {
    /// Creator profile URL(s), e.g. https://coomer.su/onlyfans/user/name.
    /// Prompted for when neither given here nor in the config file.
    pub urls: Vec<String>,

    /// Base directory for downloads.
    #[arg(short = 'd', long = "directory")]
    pub download_directory: Option<PathBuf>,

    /// Proxy for all requests, e.g. http://127.0.0.1:7897.
    #[arg(long, env = "COOMER_PROXY")]
    pub proxy: Option<String>,

    /// Browser user agent string.
    #[arg(short = 'a', long = "user-agent", env = "COOMER_USER_AGENT")]
    pub user_agent: Option<String>,

    /// Number of files downloaded in parallel.
    #[arg(short = 'j', long)]
    pub concurrency: Option<usize>,

    /// Attempts per file before giving up.
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Seconds to wait between attempts.
    #[arg(long = "retry-delay")]
    pub retry_delay: Option<u64>,

    /// Bytes written per chunk.
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// How to treat a remote size that changes between attempts.
    #[arg(long, value_enum)]
    pub size_policy: Option<SizePolicyArg>,

    /// Path to configuration file.
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Hide progress bars.
    #[arg(long, short)]
    pub quiet: bool,

    /// Enable debug logging.
    #[arg(long)]
    pub debug: bool,
}

/// CLI size policy argument.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SizePolicyArg {
    /// Use the latest probe on every attempt.
    Revalidate,
    /// Keep the first reported size.
    TrustFirst,
}

impl From<SizePolicyArg> for SizePolicy {
    fn from(arg: SizePolicyArg) -> Self {
        match arg {
            SizePolicyArg::Revalidate => SizePolicy::Revalidate,
            SizePolicyArg::TrustFirst => SizePolicy::TrustFirst,
        }
    }
}

impl Args {
    /// Merge CLI arguments into an existing config, overriding where specified.
    pub fn merge_into_config(self, config: &mut Config) {
        if !self.urls.is_empty() {
            config.targeted_creator.profile_urls = self.urls;
        }

        if let Some(dir) = self.download_directory {
            config.download.download_directory = Some(dir);
        }

        if let Some(proxy) = self.proxy {
            config.network.proxy = Some(proxy);
        }

        if let Some(user_agent) = self.user_agent {
            config.network.user_agent = user_agent;
        }

        if let Some(concurrency) = self.concurrency {
            config.download.concurrency = concurrency;
        }

        if let Some(max_retries) = self.max_retries {
            config.download.max_retries = max_retries;
        }

        if let Some(delay) = self.retry_delay {
            config.download.retry_delay_secs = delay;
        }

        if let Some(chunk_size) = self.chunk_size {
            config.download.chunk_size = chunk_size;
        }

        if let Some(policy) = self.size_policy {
            config.download.size_policy = policy.into();
        }

        if self.quiet {
            config.options.show_progress = false;
        }
    }
}
