//! Configuration for the Retriever

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// User agent sent with every request
pub const DEFAULT_USER_AGENT: &str = concat!(
    "carbonscan/",
    env!("CARGO_PKG_VERSION"),
    " (sustainability report ingestion)"
);

/// Configuration for the Retriever
///
/// # Examples
///
/// ```
/// use carbonscan_retriever::RetrieverConfig;
///
/// let config = RetrieverConfig::default();
/// assert_eq!(config.timeout_secs, 30);
/// assert_eq!(config.max_attempts, 3);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrieverConfig {
    /// User agent header value
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout (seconds)
    /// Default: 30
    pub timeout_secs: u64,

    /// Largest body accepted (bytes)
    /// Default: 50 MB
    pub max_bytes: u64,

    /// Attempts per URL before giving up
    /// Default: 3
    pub max_attempts: u32,

    /// Delay before the first retry (milliseconds), doubled on each retry
    /// Default: 1000
    pub initial_backoff_ms: u64,
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: 30,
            max_bytes: 50 * 1024 * 1024,
            max_attempts: 3,
            initial_backoff_ms: 1000,
        }
    }
}

impl RetrieverConfig {
    /// Aggressive preset: fail fast, smaller documents only
    pub fn aggressive() -> Self {
        Self {
            timeout_secs: 10,
            max_bytes: 20 * 1024 * 1024,
            max_attempts: 2,
            initial_backoff_ms: 500,
            ..Self::default()
        }
    }

    /// Lenient preset: slow hosts and very large annual reports
    pub fn lenient() -> Self {
        Self {
            timeout_secs: 120,
            max_bytes: 200 * 1024 * 1024,
            max_attempts: 5,
            initial_backoff_ms: 2000,
            ..Self::default()
        }
    }

    /// Per-request timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Delay to wait after the given failed attempt (1-based)
    ///
    /// ```
    /// use carbonscan_retriever::RetrieverConfig;
    /// use std::time::Duration;
    ///
    /// let config = RetrieverConfig::default();
    /// assert_eq!(config.backoff_delay(1), Duration::from_secs(1));
    /// assert_eq!(config.backoff_delay(3), Duration::from_secs(4));
    /// ```
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
        Duration::from_millis(self.initial_backoff_ms.saturating_mul(factor))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.user_agent.trim().is_empty() {
            return Err("user_agent must not be empty".to_string());
        }
        if self.timeout_secs == 0 {
            return Err("timeout_secs must be greater than 0".to_string());
        }
        if self.max_bytes == 0 {
            return Err("max_bytes must be greater than 0".to_string());
        }
        if self.max_attempts == 0 {
            return Err("max_attempts must be at least 1".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
