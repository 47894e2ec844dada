use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Bounded exponential backoff for transient failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts per request, including the first one.
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff_ms: 500,
            max_backoff_ms: 8_000,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_backoff_ms: u64, max_backoff_ms: u64) -> Self {
        Self {
            max_attempts,
            initial_backoff_ms,
            max_backoff_ms,
        }
    }
}

/// How to reach and authenticate against the NSX Manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NsxConnection {
    /// Management IP address or FQDN of the manager.
    pub mgmt_ip: String,
    pub username: String,
    pub password: String,
    /// When false, the TLS chain is not verified.
    pub validate_certs: bool,
    pub request_timeout_secs: u64,
    pub retry: RetryPolicy,
}

impl NsxConnection {
    pub fn base_url(&self) -> String {
        format!("https://{}", self.mgmt_ip)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
