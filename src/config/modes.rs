//! Size revalidation policy definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the remote size reported by the probe is used across attempts.
///
/// The probe is issued on every attempt either way; the policy only decides
/// which value is the completion target when probes disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizePolicy {
    /// Use the most recent probe (default). A change is logged.
    #[default]
    Revalidate,
    /// Keep the first non-zero probe as the target for the whole task.
    TrustFirst,
}

impl fmt::Display for SizePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizePolicy::Revalidate => write!(f, "revalidate"),
            SizePolicy::TrustFirst => write!(f, "trust_first"),
        }
    }
}

impl FromStr for SizePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "revalidate" => Ok(SizePolicy::Revalidate),
            "trust_first" => Ok(SizePolicy::TrustFirst),
            _ => Err(format!("Unknown size policy: {}", s)),
        }
    }
}
