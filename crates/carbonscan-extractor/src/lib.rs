//! Carbonscan Extractor
//!
//! Turns segmented sustainability reports into normalized greenhouse-gas
//! emission records.
//!
//! # Overview
//!
//! Large reports are mostly irrelevant to emissions figures. The extractor
//! selects the regions that matter, packs them into bounded chunks for an
//! external reasoning service, and merges the partial answers into one
//! [`EmissionRecord`](carbonscan_domain::EmissionRecord).
//!
//! # Architecture
//!
//! ```text
//! Document → Segmenter → Pages → Classifier → Spans → ChunkBuilder → Chunks
//!     → ExtractionAdapter → reasoning service → CandidateResults
//!     → aggregate → EmissionRecord
//! ```
//!
//! # Key Features
//!
//! - **Relevance classification**: tables first, then scope lines, then
//!   section headings, with context windows and neighbouring pages
//! - **Table preservation**: tables are never split across chunks
//! - **Robust response parsing**: JSON is recovered from code fences and
//!   surrounding prose
//! - **Deterministic merging**: chunk index is the only tie-breaker, so
//!   completion order never matters
//! - **Partial results**: failed chunks and cancellation become warnings on
//!   the record
//!
//! # Example Usage
//!
//! ```
//! use carbonscan_domain::{Document, ScopeCategory, SourceKind};
//! use carbonscan_extractor::{CompanyContext, Pipeline, PipelineConfig};
//! use carbonscan_llm::MockProvider;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let service = MockProvider::new(
//!     r#"{"current_year": {"year": 2023, "scope_1": {"value": "1,200", "unit": "tCO2e"}}}"#,
//! );
//! let pipeline = Pipeline::with_retriever(service, PipelineConfig::default())?;
//!
//! let html = b"<h2>GHG Emissions</h2><p>Scope 1: 1,200 tCO2e</p>".to_vec();
//! let document = Document::new("https://example.com/esg.html", SourceKind::Html, html);
//!
//! let runtime = tokio::runtime::Runtime::new()?;
//! let outcome = runtime.block_on(pipeline.process_document(document, CompanyContext::default()))?;
//!
//! assert_eq!(outcome.record.current_year.value(ScopeCategory::Scope1), Some(1200.0));
//! assert_eq!(outcome.record.current_year.year, Some(2023));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod adapter;
mod aggregator;
mod chunking;
mod classifier;
mod config;
mod error;
mod metrics;
mod normalize;
mod parser;
mod pipeline;
mod prompt;
mod render;
mod rules;
mod types;


pub use adapter::ExtractionAdapter;
pub use aggregator::aggregate;
pub use chunking::ChunkBuilder;
pub use classifier::Classifier;
pub use config::{ChunkConfig, ClassifierConfig, ExtractionConfig, PipelineConfig};
pub use error::{AggregationError, ConfigError, ExtractionError, PipelineError};
pub use metrics::{PipelineMetrics, Stage};
pub use normalize::{
    canonical_unit, normalize_period, normalize_scope, normalize_year, parse_value, MAX_YEAR,
    MIN_YEAR,
};
pub use parser::{parse_candidate, recover_json};
pub use pipeline::Pipeline;
pub use prompt::{PromptBuilder, OUTPUT_SCHEMA};
pub use render::{render_table, render_text, table_marker, text_marker};
pub use rules::{Rule, RuleSet, KEYWORD_WEIGHT, RULESET_VERSION, SCOPE_WEIGHT, SECTION_WEIGHT};
pub use types::{ChunkFailure, CompanyContext, DocumentRequest, PipelineOutcome};
