//! Configuration module for the coomer-downloader.
//!
//! This module handles:
//! - Loading configuration from TOML files
//! - Size revalidation policy
//! - Configuration validation and profile URL parsing

pub mod loader;
pub mod modes;
pub mod validation;

pub use loader::{
    Config, CreatorConfig, DownloadConfig, NetworkConfig, OptionsConfig, DEFAULT_HOST,
};
pub use modes::SizePolicy;
pub use validation::{parse_profile_url, validate_config};
