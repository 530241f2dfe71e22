//! Coomer API module.
//!
//! This module provides:
//! - HTTP client construction (user agent, proxy)
//! - Paginated post listing for a creator
//! - API response types

pub mod client;
pub mod types;

pub use client::{build_http_client, CoomerApi, PAGE_SIZE};
pub use types::*;
