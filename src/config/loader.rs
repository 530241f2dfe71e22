//! Configuration structures and loading logic.

use crate::config::modes::SizePolicy;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default coomer host.
pub const DEFAULT_HOST: &str = "https://coomer.su";

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub targeted_creator: CreatorConfig,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub download: DownloadConfig,

    #[serde(default)]
    pub options: OptionsConfig,
}

/// Creator targeting configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreatorConfig {
    /// Creator profile URLs, e.g. `https://coomer.su/onlyfans/user/name`.
    #[serde(default)]
    pub profile_urls: Vec<String>,
}

/// HTTP client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Base URL used for API requests.
    #[serde(default = "default_host")]
    pub host: String,

    /// Browser user agent string sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Optional proxy for all requests (http, https or socks URL).
    #[serde(default)]
    pub proxy: Option<String>,

    /// Timeout for the size probe, in seconds.
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,

    /// Timeout for establishing a transfer and for each body read, in seconds.
    #[serde(default = "default_transfer_timeout")]
    pub transfer_timeout_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            user_agent: default_user_agent(),
            proxy: None,
            probe_timeout_secs: default_probe_timeout(),
            transfer_timeout_secs: default_transfer_timeout(),
        }
    }
}

/// Download engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Base directory for downloads.
    #[serde(default)]
    pub download_directory: Option<PathBuf>,

    /// Bytes written per chunk.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Attempts per file before giving up.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Seconds to wait between attempts.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,

    /// Number of files downloaded in parallel.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// How the remote size is treated when it changes between attempts.
    #[serde(default)]
    pub size_policy: SizePolicy,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            download_directory: None,
            chunk_size: default_chunk_size(),
            max_retries: default_max_retries(),
            retry_delay_secs: default_retry_delay(),
            concurrency: default_concurrency(),
            size_policy: SizePolicy::default(),
        }
    }
}

/// Presentation and listing options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionsConfig {
    /// Whether to show per-file progress bars.
    #[serde(default = "default_true")]
    pub show_progress: bool,

    /// Lower bound of the random delay between listing pages, in milliseconds.
    #[serde(default = "default_page_delay_min")]
    pub page_delay_min_ms: u64,

    /// Upper bound of the random delay between listing pages, in milliseconds.
    #[serde(default = "default_page_delay_max")]
    pub page_delay_max_ms: u64,
}

impl Default for OptionsConfig {
    fn default() -> Self {
        Self {
            show_progress: true,
            page_delay_min_ms: default_page_delay_min(),
            page_delay_max_ms: default_page_delay_max(),
        }
    }
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36".to_string()
}

fn default_probe_timeout() -> u64 {
    10
}

fn default_transfer_timeout() -> u64 {
    30
}

fn default_chunk_size() -> usize {
    1024 * 1024
}

fn default_max_retries() -> u32 {
    5
}

fn default_retry_delay() -> u64 {
    2
}

fn default_concurrency() -> usize {
    5
}

fn default_true() -> bool {
    true
}

fn default_page_delay_min() -> u64 {
    500
}

fn default_page_delay_max() -> u64 {
    1500
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::Config(format!(
                    "Configuration file not found: {}",
                    path.display()
                ))
            } else {
                Error::Io(e)
            }
        })?;

        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Get the effective download directory.
    pub fn download_directory(&self) -> PathBuf {
        self.download.download_directory.clone().unwrap_or_else(|| {
            std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join("Download")
        })
    }
}

impl NetworkConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn transfer_timeout(&self) -> Duration {
        Duration::from_secs(self.transfer_timeout_secs)
    }
}

impl DownloadConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}
