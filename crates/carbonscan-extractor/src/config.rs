//! Configuration for classification, chunking, extraction and the pipeline

use crate::error::ConfigError;
use carbonscan_retriever::RetrieverConfig;
use carbonscan_segmenter::SegmenterConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

fn default_keywords() -> Vec<String> {
    [
        "scope 1",
        "scope 2",
        "scope 3",
        "ghg emissions",
        "greenhouse gas",
        "carbon footprint",
        "tonnes co2e",
        "metric tons",
        "tco2e",
        "mtco2e",
        "co2 equivalent",
        "direct emissions",
        "indirect emissions",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_section_phrases() -> Vec<String> {
    [
        "Greenhouse Gas Emissions",
        "GHG Emissions",
        "Environmental Data",
        "Climate Change",
        "Carbon Emissions",
        "Energy and Emissions",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Configuration for the relevance classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Domain keywords (case-insensitive, whitespace-flexible)
    pub keywords: Vec<String>,

    /// Section headings that open a narrative span
    pub section_phrases: Vec<String>,

    /// Lines of context added before and after every text span
    /// Default: 15
    pub context_lines: usize,

    /// Pages on each side of a relevant page included as context
    /// Default: 1
    pub adjacent_pages: usize,

    /// Smallest value considered a plausible emissions figure
    /// Default: 100
    pub min_plausible_value: f64,

    /// Largest value considered a plausible emissions figure
    /// Default: 10,000,000
    pub max_plausible_value: f64,

    /// Longest text span before it is split at line boundaries
    /// Default: None (use the chunk limit)
    pub max_span_chars: Option<usize>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            keywords: default_keywords(),
            section_phrases: default_section_phrases(),
            context_lines: 15,
            adjacent_pages: 1,
            min_plausible_value: 100.0,
            max_plausible_value: 10_000_000.0,
            max_span_chars: None,
        }
    }
}

impl ClassifierConfig {
    /// Aggressive preset: tight windows, no neighbouring pages
    pub fn aggressive() -> Self {
        Self {
            context_lines: 5,
            adjacent_pages: 0,
            ..Self::default()
        }
    }

    /// Lenient preset: wide windows, two neighbouring pages
    pub fn lenient() -> Self {
        Self {
            context_lines: 30,
            adjacent_pages: 2,
            ..Self::default()
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.keywords.iter().all(|k| k.trim().is_empty()) {
            return Err("keywords must contain at least one entry".to_string());
        }
        if self.min_plausible_value > self.max_plausible_value {
            return Err("min_plausible_value cannot exceed max_plausible_value".to_string());
        }
        if self.max_span_chars == Some(0) {
            return Err("max_span_chars must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Configuration for the chunk builder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkConfig {
    /// Largest serialized chunk (characters)
    /// Default: 30,000
    pub max_chars: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self { max_chars: 30_000 }
    }
}

impl ChunkConfig {
    /// Smallest limit that still fits a span marker and some content
    pub const MIN_CHARS: usize = 64;

    /// Aggressive preset: smaller chunks, more calls
    pub fn aggressive() -> Self {
        Self { max_chars: 12_000 }
    }

    /// Lenient preset: fewer, larger chunks
    pub fn lenient() -> Self {
        Self { max_chars: 60_000 }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_chars < Self::MIN_CHARS {
            return Err(format!("max_chars must be at least {}", Self::MIN_CHARS));
        }
        Ok(())
    }
}

/// Configuration for chunk extraction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Concurrent reasoning-service calls per document
    /// Default: 4
    pub concurrency: usize,

    /// Maximum time for a single call (seconds)
    /// Default: 120
    pub call_timeout_secs: u64,

    /// Deadline for a whole document (seconds); partial results are kept
    /// Default: None
    pub document_timeout_secs: Option<u64>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            call_timeout_secs: 120,
            document_timeout_secs: None,
        }
    }
}

impl ExtractionConfig {
    /// Aggressive preset: short timeouts, document deadline
    pub fn aggressive() -> Self {
        Self {
            concurrency: 8,
            call_timeout_secs: 60,
            document_timeout_secs: Some(600),
        }
    }

    /// Lenient preset: long timeouts, gentle on the service
    pub fn lenient() -> Self {
        Self {
            concurrency: 2,
            call_timeout_secs: 300,
            document_timeout_secs: None,
        }
    }

    /// Per-call timeout as a Duration
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    /// Document deadline as a Duration
    pub fn document_timeout(&self) -> Option<Duration> {
        self.document_timeout_secs.map(Duration::from_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.concurrency == 0 {
            return Err("concurrency must be at least 1".to_string());
        }
        if self.call_timeout_secs == 0 {
            return Err("call_timeout_secs must be greater than 0".to_string());
        }
        if self.document_timeout_secs == Some(0) {
            return Err("document_timeout_secs must be greater than 0".to_string());
        }
        Ok(())
    }
}

/// Configuration for every pipeline stage
///
/// # Examples
///
/// ```
/// use carbonscan_extractor::PipelineConfig;
///
/// let config = PipelineConfig::from_toml(r#"
///     [chunking]
///     max_chars = 20000
///
///     [extraction]
///     concurrency = 2
/// "#).unwrap();
///
/// assert_eq!(config.chunking.max_chars, 20_000);
/// assert_eq!(config.extraction.concurrency, 2);
/// assert_eq!(config.classifier.context_lines, 15);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Retriever settings
    pub retriever: RetrieverConfig,
    /// Segmenter settings
    pub segmenter: SegmenterConfig,
    /// Classifier settings
    pub classifier: ClassifierConfig,
    /// Chunk builder settings
    pub chunking: ChunkConfig,
    /// Extraction settings
    pub extraction: ExtractionConfig,
}

impl PipelineConfig {
    /// Aggressive preset for every stage
    pub fn aggressive() -> Self {
        Self {
            retriever: RetrieverConfig::aggressive(),
            segmenter: SegmenterConfig::aggressive(),
            classifier: ClassifierConfig::aggressive(),
            chunking: ChunkConfig::aggressive(),
            extraction: ExtractionConfig::aggressive(),
        }
    }

    /// Lenient preset for every stage
    pub fn lenient() -> Self {
        Self {
            retriever: RetrieverConfig::lenient(),
            segmenter: SegmenterConfig::lenient(),
            classifier: ClassifierConfig::lenient(),
            chunking: ChunkConfig::lenient(),
            extraction: ExtractionConfig::lenient(),
        }
    }

    /// Text span limit: the classifier's own, else the chunk limit
    pub fn span_limit(&self) -> usize {
        self.classifier
            .max_span_chars
            .unwrap_or(self.chunking.max_chars)
            .min(self.chunking.max_chars)
    }

    /// Validate every section
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sections: [(&str, Result<(), String>); 5] = [
            ("retriever", self.retriever.validate()),
            ("segmenter", self.segmenter.validate()),
            ("classifier", self.classifier.validate()),
            ("chunking", self.chunking.validate()),
            ("extraction", self.extraction.validate()),
        ];

        for (section, result) in sections {
            result.map_err(|e| ConfigError::Invalid(format!("[{}] {}", section, e)))?;
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load and validate configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        let config = Self::from_toml(&contents)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_aggressive_config_is_valid() {
        assert!(PipelineConfig::aggressive().validate().is_ok());
    }

    #[test]
    fn test_lenient_config_is_valid() {
        assert!(PipelineConfig::lenient().validate().is_ok());
    }

    #[test]
    fn test_defaults_match_documented_values() {
        let config = PipelineConfig::default();
        assert_eq!(config.chunking.max_chars, 30_000);
        assert_eq!(config.classifier.context_lines, 15);
        assert_eq!(config.classifier.adjacent_pages, 1);
        assert_eq!(config.extraction.concurrency, 4);
        assert_eq!(config.classifier.keywords.len(), 13);
    }

    #[test]
    fn test_invalid_section_is_named() {
        let mut config = PipelineConfig::default();
        config.extraction.concurrency = 0;

        match config.validate() {
            Err(ConfigError::Invalid(message)) => assert!(message.starts_with("[extraction]")),
            other => panic!("expected Invalid, got {:?}", other),
        }
    }

    #[test]
    fn test_span_limit_never_exceeds_chunk_limit() {
        let mut config = PipelineConfig::default();
        assert_eq!(config.span_limit(), 30_000);

        config.classifier.max_span_chars = Some(5_000);
        assert_eq!(config.span_limit(), 5_000);

        config.classifier.max_span_chars = Some(90_000);
        assert_eq!(config.span_limit(), 30_000);
    }

    #[test]
    fn test_tiny_chunk_limit_rejected() {
        let config = ChunkConfig { max_chars: 10 };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = PipelineConfig::lenient();
        let toml_str = config.to_toml().unwrap();
        let parsed = PipelineConfig::from_toml(&toml_str).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_malformed_toml() {
        assert!(matches!(
            PipelineConfig::from_toml("[chunking\nmax_chars = 1"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            PipelineConfig::from_file("/nonexistent/carbonscan.toml"),
            Err(ConfigError::Io(_))
        ));
    }
}
