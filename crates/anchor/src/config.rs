//! Configuration

use serde::{Deserialize, Serialize};
use std::env;

const DEFAULT_SERVICE_URL: &str = "http://localhost:8080";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_HASH_CHUNK_SIZE: usize = 256;

/// Anchoring client configuration
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnchorConfig {
    /// Base URL of the anchoring microservice
    pub service_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Records hashed between two yields when preparing large batches
    pub hash_chunk_size: usize,
}

impl Default for AnchorConfig {
    fn default() -> Self {
        Self {
            service_url: DEFAULT_SERVICE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            hash_chunk_size: DEFAULT_HASH_CHUNK_SIZE,
        }
    }
}

impl AnchorConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load from an arbitrary key lookup; unparsable values fall back to defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            service_url: lookup("ANCHOR_SERVICE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_SERVICE_URL.to_string()),
            timeout_secs: lookup("ANCHOR_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
            hash_chunk_size: lookup("HASH_CHUNK_SIZE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_HASH_CHUNK_SIZE),
        }
    }
}
