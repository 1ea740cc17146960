//! Carbonscan reasoning-service providers
//!
//! Implementations of the `ReasoningService` trait from `carbonscan-domain`.
//!
//! # Providers
//!
//! - `MockProvider`: deterministic responses for tests and offline runs
//! - `AnthropicProvider`: the Anthropic messages API over HTTPS
//!
//! # Examples
//!
//! ```
//! use carbonscan_llm::MockProvider;
//! use carbonscan_domain::traits::ReasoningService;
//!
//! let rt = tokio::runtime::Runtime::new().unwrap();
//! let provider = MockProvider::new(r#"{"scope_1": null}"#);
//! let result = rt.block_on(provider.generate("any prompt")).unwrap();
//! assert_eq!(result, r#"{"scope_1": null}"#);
//! ```

#![warn(missing_docs)]

pub mod anthropic;

use async_trait::async_trait;
use carbonscan_domain::traits::ReasoningService;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

pub use anthropic::AnthropicProvider;

/// Errors that can occur while calling a reasoning service
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Response body did not have the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded after all retries
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Credentials rejected
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

#[derive(Debug, Clone)]
enum MockReply {
    Text(String),
    Error,
}

/// Mock reasoning service for deterministic testing
///
/// Returns pre-configured responses without making any network calls. A
/// registered response is used when its key occurs anywhere in the prompt
/// (first registration wins), so tests can target individual chunks by a
/// phrase they contain.
///
/// # Examples
///
/// ```
/// use carbonscan_llm::MockProvider;
/// use carbonscan_domain::traits::ReasoningService;
///
/// let rt = tokio::runtime::Runtime::new().unwrap();
/// let mut provider = MockProvider::default();
/// provider.add_response("PAGE 3", "page three answer");
///
/// assert_eq!(rt.block_on(provider.generate("=== TEXT ON PAGE 3 ===")).unwrap(), "page three answer");
/// assert_eq!(rt.block_on(provider.generate("other")).unwrap(), "{}");
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    responses: Arc<Mutex<Vec<(String, MockReply)>>>,
    call_count: Arc<Mutex<usize>>,
    prompts: Arc<Mutex<Vec<String>>>,
    latency: Option<Duration>,
}

impl MockProvider {
    /// Create a MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            responses: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
            prompts: Arc::new(Mutex::new(Vec::new())),
            latency: None,
        }
    }

    /// Respond with `response` whenever the prompt contains `key`
    pub fn add_response(&mut self, key: impl Into<String>, response: impl Into<String>) {
        self.lock_responses()
            .push((key.into(), MockReply::Text(response.into())));
    }

    /// Fail whenever the prompt contains `key`
    pub fn add_error(&mut self, key: impl Into<String>) {
        self.lock_responses().push((key.into(), MockReply::Error));
    }

    /// Delay every response by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Number of calls made so far
    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Reset the call count and recorded prompts
    pub fn reset(&self) {
        *self.call_count.lock().unwrap_or_else(|e| e.into_inner()) = 0;
        self.prompts.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    /// Prompts received so far, in call order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn lock_responses(&self) -> std::sync::MutexGuard<'_, Vec<(String, MockReply)>> {
        self.responses.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn reply_for(&self, prompt: &str) -> Result<String, LlmError> {
        *self.call_count.lock().unwrap_or_else(|e| e.into_inner()) += 1;
        self.prompts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(prompt.to_string());

        let responses = self.lock_responses();
        match responses.iter().find(|(key, _)| prompt.contains(key.as_str())) {
            Some((_, MockReply::Text(text))) => Ok(text.clone()),
            Some((_, MockReply::Error)) => Err(LlmError::Other("Mock error".to_string())),
            None => Ok(self.default_response.clone()),
        }
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("{}")
    }
}

#[async_trait]
impl ReasoningService for MockProvider {
    type Error = LlmError;

    async fn generate(&self, prompt: &str) -> Result<String, Self::Error> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.reply_for(prompt)
    }

    async fn generate_structured(&self, prompt: &str, _schema: &str) -> Result<String, Self::Error> {
        // The mock ignores the schema; tests control the payload directly
        self.generate(prompt).await
    }
}
