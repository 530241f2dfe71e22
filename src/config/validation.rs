//! Configuration validation logic.

use crate::api::Creator;
use crate::config::loader::Config;
use crate::error::{Error, Result};
use regex::Regex;

/// Upper bound on parallel downloads.
const MAX_CONCURRENCY: usize = 64;

/// Smallest accepted chunk size (4 KiB).
const MIN_CHUNK_SIZE: usize = 4 * 1024;

/// Minimum length for user agent.
const MIN_USER_AGENT_LENGTH: usize = 20;

/// Hosts that serve the coomer API.
const PROFILE_URL_PATTERN: &str =
    r"^(https?://(?:www\.)?coomer\.(?:su|st|party))/([A-Za-z0-9]+)/user/([A-Za-z0-9_.\-]+)/?(?:[?#].*)?$";

/// Validate the entire configuration.
pub fn validate_config(config: &Config) -> Result<()> {
    validate_host(&config.network.host)?;
    validate_user_agent(&config.network.user_agent)?;
    if let Some(proxy) = &config.network.proxy {
        validate_proxy(proxy)?;
    }
    validate_timeouts(
        config.network.probe_timeout_secs,
        config.network.transfer_timeout_secs,
    )?;
    validate_download_settings(
        config.download.chunk_size,
        config.download.max_retries,
        config.download.concurrency,
    )?;

    if config.options.page_delay_min_ms > config.options.page_delay_max_ms {
        return Err(Error::ConfigValidation {
            field: "page_delay_min_ms".to_string(),
            message: "Minimum page delay must not exceed the maximum".to_string(),
        });
    }

    for url in &config.targeted_creator.profile_urls {
        parse_profile_url(url)?;
    }

    Ok(())
}

/// Validate the API host.
pub fn validate_host(host: &str) -> Result<()> {
    let parsed = url::Url::parse(host)?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(Error::ConfigValidation {
            field: "host".to_string(),
            message: format!("Host must be an http(s) URL (got '{}')", host),
        });
    }
    Ok(())
}

/// Validate the user agent string.
pub fn validate_user_agent(user_agent: &str) -> Result<()> {
    if user_agent.is_empty() {
        return Err(Error::MissingConfig("user_agent".to_string()));
    }

    if user_agent.len() < MIN_USER_AGENT_LENGTH {
        return Err(Error::ConfigValidation {
            field: "user_agent".to_string(),
            message: format!(
                "User agent must be at least {} characters (got {})",
                MIN_USER_AGENT_LENGTH,
                user_agent.len()
            ),
        });
    }

    Ok(())
}

/// Validate a proxy URL.
pub fn validate_proxy(proxy: &str) -> Result<()> {
    let parsed = url::Url::parse(proxy)?;
    match parsed.scheme() {
        "http" | "https" | "socks5" | "socks5h" => Ok(()),
        other => Err(Error::ConfigValidation {
            field: "proxy".to_string(),
            message: format!("Unsupported proxy scheme '{}'", other),
        }),
    }
}

/// Validate request timeouts.
pub fn validate_timeouts(probe_secs: u64, transfer_secs: u64) -> Result<()> {
    if probe_secs == 0 {
        return Err(Error::ConfigValidation {
            field: "probe_timeout_secs".to_string(),
            message: "Timeout must be at least 1 second".to_string(),
        });
    }
    if transfer_secs == 0 {
        return Err(Error::ConfigValidation {
            field: "transfer_timeout_secs".to_string(),
            message: "Timeout must be at least 1 second".to_string(),
        });
    }
    Ok(())
}

/// Validate chunk size, retry count and pool width.
pub fn validate_download_settings(
    chunk_size: usize,
    max_retries: u32,
    concurrency: usize,
) -> Result<()> {
    if chunk_size < MIN_CHUNK_SIZE {
        return Err(Error::ConfigValidation {
            field: "chunk_size".to_string(),
            message: format!(
                "Chunk size must be at least {} bytes (got {})",
                MIN_CHUNK_SIZE, chunk_size
            ),
        });
    }

    if max_retries == 0 {
        return Err(Error::ConfigValidation {
            field: "max_retries".to_string(),
            message: "At least one attempt is required".to_string(),
        });
    }

    if concurrency == 0 || concurrency > MAX_CONCURRENCY {
        return Err(Error::ConfigValidation {
            field: "concurrency".to_string(),
            message: format!(
                "Concurrency must be between 1 and {} (got {})",
                MAX_CONCURRENCY, concurrency
            ),
        });
    }

    Ok(())
}

/// Extract host, service and user name from a creator profile URL.
///
/// Accepts URLs like `https://coomer.su/onlyfans/user/somebody`.
pub fn parse_profile_url(input: &str) -> Result<Creator> {
    let input = input.trim();
    let pattern = Regex::new(PROFILE_URL_PATTERN).expect("profile URL pattern is valid");

    let captures = pattern
        .captures(input)
        .ok_or_else(|| Error::InvalidProfileUrl(input.to_string()))?;

    Ok(Creator {
        host: captures[1].to_string(),
        service: captures[2].to_string(),
        user_name: captures[3].to_string(),
    })
}
