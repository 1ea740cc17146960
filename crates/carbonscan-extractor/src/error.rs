//! Error types for extraction, aggregation and the pipeline

use carbonscan_retriever::FetchError;
use carbonscan_segmenter::SegmentationError;
use thiserror::Error;

/// Errors from a single chunk's extraction call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// No JSON object could be recovered from the response
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The service returned nothing
    #[error("Empty response")]
    EmptyResponse,

    /// The service call failed or timed out
    #[error("Service error: {0}")]
    ServiceError(String),
}

/// Errors from merging candidates
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AggregationError {
    /// Nothing to merge
    #[error("No candidate results to aggregate")]
    NoCandidates,
}

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// TOML could not be parsed or serialized
    #[error("Config parse error: {0}")]
    Parse(String),

    /// A value is out of range
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// The config file could not be read
    #[error("Config I/O error: {0}")]
    Io(String),
}

/// Document-level pipeline failures
///
/// Chunk-level problems never surface here; they become warnings on the
/// record. Only a total absence of usable input is an error.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The document could not be retrieved
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// The document could not be opened
    #[error("Segmentation failed: {0}")]
    Segmentation(#[from] SegmentationError),

    /// The document has no pages
    #[error("Document has no pages")]
    NoPages,

    /// No span of the document looked relevant
    #[error("No relevant content found")]
    NoChunks,

    /// No chunk produced a usable candidate
    #[error("Aggregation failed: {0}")]
    Aggregation(#[from] AggregationError),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A background task failed
    #[error("Worker error: {0}")]
    Worker(String),
}
