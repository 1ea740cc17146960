//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the pipeline and the outside
//! world. Infrastructure implementations live in other crates.

use crate::Document;
use async_trait::async_trait;

/// Trait for fetching raw documents
///
/// Implemented by the infrastructure layer (carbonscan-retriever)
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Error type for fetch operations
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetch the document at `url`
    async fn fetch(&self, url: &str) -> Result<Document, Self::Error>;
}

/// Trait for the external reasoning service
///
/// Implemented by the infrastructure layer (carbonscan-llm)
#[async_trait]
pub trait ReasoningService: Send + Sync {
    /// Error type for service calls
    type Error: std::error::Error + Send + Sync + 'static;

    /// Generate a free-form completion
    async fn generate(&self, prompt: &str) -> Result<String, Self::Error>;

    /// Generate a completion constrained to `schema` (if the backend supports it)
    async fn generate_structured(&self, prompt: &str, schema: &str) -> Result<String, Self::Error>;
}
