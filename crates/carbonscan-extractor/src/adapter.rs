//! Chunk extraction through the reasoning service

use crate::error::ExtractionError;
use crate::parser::parse_candidate;
use crate::prompt::{PromptBuilder, OUTPUT_SCHEMA};
use crate::types::CompanyContext;
use carbonscan_domain::{CandidateResult, Chunk, ReasoningService};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

/// Sends one chunk to the reasoning service and parses the answer
pub struct ExtractionAdapter<R>
where
    R: ReasoningService,
{
    service: Arc<R>,
    call_timeout: Duration,
}

impl<R: ReasoningService> Clone for ExtractionAdapter<R> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            call_timeout: self.call_timeout,
        }
    }
}

impl<R> ExtractionAdapter<R>
where
    R: ReasoningService,
{
    /// Create an adapter; every call is bounded by `call_timeout`
    pub fn new(service: Arc<R>, call_timeout: Duration) -> Self {
        Self {
            service,
            call_timeout,
        }
    }

    /// Extract a candidate from one chunk
    ///
    /// A well-formed answer with no figures is a valid, empty candidate.
    pub async fn extract(
        &self,
        chunk: &Chunk,
        context: &CompanyContext,
    ) -> Result<CandidateResult, ExtractionError> {
        let text = chunk.text();
        let prompt = PromptBuilder::new(&text, context).build();
        debug!("Chunk {}: prompt length {} chars", chunk.index, prompt.len());

        let response = timeout(
            self.call_timeout,
            self.service.generate_structured(&prompt, OUTPUT_SCHEMA),
        )
        .await
        .map_err(|_| {
            ExtractionError::ServiceError(format!(
                "timed out after {}s",
                self.call_timeout.as_secs_f64()
            ))
        })?
        .map_err(|e| ExtractionError::ServiceError(e.to_string()))?;

        debug!("Chunk {}: response length {} chars", chunk.index, response.len());

        let mut candidate = parse_candidate(&response, chunk.index)?;
        candidate.page_indices = chunk.page_indices.clone();
        Ok(candidate)
    }
}
