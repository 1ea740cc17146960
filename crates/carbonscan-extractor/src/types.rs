//! Request and outcome types for the pipeline

use crate::metrics::PipelineMetrics;
use carbonscan_domain::EmissionRecord;

/// What is known about the reporting company before extraction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompanyContext {
    /// Company name, if known
    pub name: Option<String>,
    /// Reporting year the document is expected to cover
    pub year_hint: Option<i32>,
}

impl CompanyContext {
    /// Create a context
    pub fn new(name: Option<String>, year_hint: Option<i32>) -> Self {
        Self { name, year_hint }
    }
}

/// A document to process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRequest {
    /// Where the document lives
    pub url: String,
    /// Company the document belongs to
    pub company: Option<String>,
    /// Reporting-year hint from discovery
    pub year_hint: Option<i32>,
}

impl DocumentRequest {
    /// Request a document by URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            company: None,
            year_hint: None,
        }
    }

    /// Attach a company name
    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = Some(company.into());
        self
    }

    /// Attach a reporting-year hint
    pub fn with_year_hint(mut self, year: i32) -> Self {
        self.year_hint = Some(year);
        self
    }

    /// Company context for extraction prompts
    pub fn context(&self) -> CompanyContext {
        CompanyContext::new(self.company.clone(), self.year_hint)
    }
}

/// A chunk whose extraction failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkFailure {
    /// Chunk index, when known
    pub chunk_index: Option<usize>,
    /// Why it failed
    pub reason: String,
}

impl std::fmt::Display for ChunkFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.chunk_index {
            Some(index) => write!(f, "chunk {}: {}", index, self.reason),
            None => write!(f, "chunk task: {}", self.reason),
        }
    }
}

/// Result of processing one document
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    /// The merged record
    pub record: EmissionRecord,
    /// Counters and stage timings
    pub metrics: PipelineMetrics,
    /// Chunks that produced no candidate
    pub failures: Vec<ChunkFailure>,
    /// Whether extraction stopped early (cancel or deadline)
    pub cancelled: bool,
}
